//! Paper catalog — import and lookup against the backend.
//!
//! Failures never propagate to the view: an unreachable backend produces an
//! empty list (or no paper) plus a warning notice on the event bus.

use tracing::{debug, info, warn};

use crate::backend::SharedBackend;
use crate::events::{NoticeLevel, SessionEvent, SharedEventBus};
use crate::model::{Paper, PaperId};

pub struct PaperCatalog {
    backend: SharedBackend,
    bus: SharedEventBus,
    source: String,
}

impl PaperCatalog {
    pub fn new(backend: SharedBackend, bus: SharedEventBus, source: impl Into<String>) -> Self {
        Self {
            backend,
            bus,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Import up to `max_results` papers. Empty on any failure.
    pub async fn import_papers(&self, max_results: u32) -> Vec<Paper> {
        match self.backend.import_papers(&self.source, max_results).await {
            Ok(mut papers) => {
                let limit = max_results as usize;
                if papers.len() > limit {
                    debug!(
                        source = %self.source,
                        returned = papers.len(),
                        limit,
                        "Backend ignored max_results, truncating"
                    );
                    papers.truncate(limit);
                }
                info!(source = %self.source, count = papers.len(), "Imported papers");
                papers
            }
            Err(e) => {
                warn!(source = %self.source, error = %e, "Paper import failed");
                self.bus
                    .publish(SessionEvent::notice(NoticeLevel::Warning, e.user_notice()));
                Vec::new()
            }
        }
    }

    /// Fetch one paper. `None` on any failure.
    pub async fn lookup(&self, paper_id: &PaperId) -> Option<Paper> {
        match self.backend.get_paper(paper_id).await {
            Ok(paper) => Some(paper),
            Err(e) => {
                warn!(paper_id = %paper_id, error = %e, "Paper lookup failed");
                self.bus
                    .publish(SessionEvent::notice(NoticeLevel::Warning, e.user_notice()));
                None
            }
        }
    }
}
