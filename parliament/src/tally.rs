//! Tally aggregation and release.
//!
//! The tally arrives with the transcript but is withheld from the view until
//! playback completes. Release is gated on the debate id, so a completion
//! from an older debate cannot reveal a newer tally.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ParliamentResult;
use crate::model::{DebateId, DebateTranscript, VoteSummary};

/// What the view may show for the tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TallyView {
    /// No transcript loaded.
    Unavailable,
    /// Known but hidden until playback completes.
    Withheld,
    Final(VoteSummary),
}

/// Holds the pending tally for the loaded debate.
#[derive(Debug, Clone, Default)]
pub struct TallyAggregator {
    pending: Option<(DebateId, VoteSummary)>,
    released: bool,
}

impl TallyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the transcript's summary and normalize its result.
    ///
    /// The counts are authoritative: a result that disagrees with them is
    /// replaced by the derived one.
    pub fn summarize(transcript: &DebateTranscript) -> ParliamentResult<VoteSummary> {
        let mut summary = transcript.summary;
        summary.validate()?;
        let derived = summary.derived_result();
        if summary.result != derived {
            warn!(
                debate_id = %transcript.debate_id,
                reported = %summary.result,
                derived = %derived,
                "Backend vote result disagrees with counts, using derived result"
            );
            summary.result = derived;
        }
        Ok(summary)
    }

    /// Load the tally of a freshly committed transcript. Withheld until
    /// [`TallyAggregator::release`].
    pub fn load(&mut self, transcript: &DebateTranscript) -> ParliamentResult<VoteSummary> {
        let summary = Self::summarize(transcript)?;
        self.pending = Some((transcript.debate_id.clone(), summary));
        self.released = false;
        Ok(summary)
    }

    /// Release the tally for `debate_id`. Returns the summary on the first
    /// matching release only.
    pub fn release(&mut self, debate_id: &DebateId) -> Option<VoteSummary> {
        match &self.pending {
            Some((id, summary)) if id == debate_id => {
                if self.released {
                    return None;
                }
                self.released = true;
                debug!(debate_id = %debate_id, result = %summary.result, "Tally released");
                Some(*summary)
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.pending = None;
        self.released = false;
    }

    pub fn view(&self) -> TallyView {
        match &self.pending {
            None => TallyView::Unavailable,
            Some(_) if !self.released => TallyView::Withheld,
            Some((_, summary)) => TallyView::Final(*summary),
        }
    }
}
