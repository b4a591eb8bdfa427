//! Paper selection and its persistence.
//!
//! The selected paper id is written under the stable `paperid` key. When
//! the stored id changes, every value derived from the old selection is
//! removed from the store in the same step.

use tracing::{debug, info};

use crate::error::ParliamentResult;
use crate::model::{Paper, PaperId};
use crate::session::Session;
use crate::store::{keys, load_json, save_json, SharedSessionStore};

/// What a selection did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The paper was already selected; nothing changed.
    Unchanged,
    /// First selection of this session.
    Selected { epoch: u64 },
    /// Replaced a previous selection.
    Switched { previous: PaperId, epoch: u64 },
}

impl SelectionOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Persisted selection found at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredSelection {
    pub paper_id: PaperId,
    pub paper: Option<Paper>,
}

pub struct PaperSelector {
    store: SharedSessionStore,
}

impl PaperSelector {
    pub fn new(store: SharedSessionStore) -> Self {
        Self { store }
    }

    /// Record `paper_id` as the selection of `session`.
    pub fn select(
        &self,
        session: &mut Session,
        paper_id: PaperId,
    ) -> ParliamentResult<SelectionOutcome> {
        let previous = session.paper_id.clone();
        if !session.select_paper(paper_id.clone())? {
            debug!(paper_id = %paper_id, "Paper already selected");
            return Ok(SelectionOutcome::Unchanged);
        }
        self.persist(&paper_id)?;
        info!(paper_id = %paper_id, epoch = session.epoch, "Paper selected");
        Ok(match previous {
            Some(previous) => SelectionOutcome::Switched {
                previous,
                epoch: session.epoch,
            },
            None => SelectionOutcome::Selected {
                epoch: session.epoch,
            },
        })
    }

    /// Select a full paper record, also storing it under `paper_info`.
    pub fn select_paper(
        &self,
        session: &mut Session,
        paper: &Paper,
    ) -> ParliamentResult<SelectionOutcome> {
        let outcome = self.select(session, paper.id.clone())?;
        if session.paper.as_ref() != Some(paper) {
            save_json(self.store.as_ref(), keys::PAPER_INFO, paper)?;
            session.paper = Some(paper.clone());
        }
        Ok(outcome)
    }

    /// Selection persisted by an earlier run, if any.
    pub fn restore(&self) -> ParliamentResult<Option<RestoredSelection>> {
        let paper_id = match self.store.get(keys::PAPER_ID)? {
            Some(id) if !id.trim().is_empty() => PaperId::new(id),
            _ => return Ok(None),
        };
        let paper: Option<Paper> = load_json(self.store.as_ref(), keys::PAPER_INFO)?;
        let paper = paper.filter(|p| p.id == paper_id);
        Ok(Some(RestoredSelection { paper_id, paper }))
    }

    fn persist(&self, paper_id: &PaperId) -> ParliamentResult<()> {
        let stored = self.store.get(keys::PAPER_ID)?;
        if stored.as_deref() != Some(paper_id.as_str()) {
            for key in keys::DERIVED {
                self.store.remove(key)?;
            }
            self.store.set(keys::PAPER_ID, paper_id.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemorySessionStore, SessionStore};
    use std::sync::Arc;

    fn paper(id: &str) -> Paper {
        Paper {
            id: PaperId::new(id),
            title: format!("Paper {}", id),
            summary: String::new(),
            source: "arxiv".to_string(),
            url: None,
        }
    }

    #[test]
    fn test_select_persists_and_reports() {
        let store = Arc::new(MemorySessionStore::new());
        let selector = PaperSelector::new(store.clone());
        let mut session = Session::new();

        let outcome = selector.select_paper(&mut session, &paper("1")).unwrap();
        assert_eq!(outcome, SelectionOutcome::Selected { epoch: 1 });
        assert_eq!(store.get(keys::PAPER_ID).unwrap().as_deref(), Some("1"));
        assert!(store.get(keys::PAPER_INFO).unwrap().is_some());

        let outcome = selector.select(&mut session, PaperId::new("1")).unwrap();
        assert_eq!(outcome, SelectionOutcome::Unchanged);
        assert!(!outcome.changed());
    }

    #[test]
    fn test_switch_clears_derived_keys() {
        let store = Arc::new(MemorySessionStore::new());
        let selector = PaperSelector::new(store.clone());
        let mut session = Session::new();
        selector.select_paper(&mut session, &paper("1")).unwrap();
        store.set(keys::DEBATE_ID, "d-1").unwrap();
        store.set(keys::SUMMARY, "{}").unwrap();
        store.set(keys::TRANSCRIPT, "{}").unwrap();

        let outcome = selector.select(&mut session, PaperId::new("2")).unwrap();
        assert_eq!(
            outcome,
            SelectionOutcome::Switched {
                previous: PaperId::new("1"),
                epoch: 2
            }
        );
        assert_eq!(store.get(keys::PAPER_ID).unwrap().as_deref(), Some("2"));
        for key in keys::DERIVED {
            assert_eq!(store.get(key).unwrap(), None, "{} not cleared", key);
        }
    }

    #[test]
    fn test_fresh_session_keeps_matching_store() {
        let store = Arc::new(MemorySessionStore::new());
        store.set(keys::PAPER_ID, "5").unwrap();
        store.set(keys::DEBATE_ID, "d-5").unwrap();
        let selector = PaperSelector::new(store.clone());

        let mut session = Session::new();
        selector.select(&mut session, PaperId::new("5")).unwrap();
        assert_eq!(store.get(keys::DEBATE_ID).unwrap().as_deref(), Some("d-5"));
    }

    #[test]
    fn test_restore() {
        let store = Arc::new(MemorySessionStore::new());
        let selector = PaperSelector::new(store.clone());
        assert_eq!(selector.restore().unwrap(), None);

        let mut session = Session::new();
        selector.select_paper(&mut session, &paper("3")).unwrap();

        let restored = selector.restore().unwrap().unwrap();
        assert_eq!(restored.paper_id, PaperId::new("3"));
        assert_eq!(restored.paper.unwrap().title, "Paper 3");
    }
}
