//! Session state machine — phases, transitions, and per-tab session tracking.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ParliamentError, ParliamentResult};
use crate::gate::{GateState, VoteGate};
use crate::model::{DebateId, DebateMessage, DebateTranscript, Paper, PaperId};
use crate::tally::{TallyAggregator, TallyView};

/// Phase of a viewing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No paper selected.
    Idle,
    /// A paper is selected, no debate requested yet.
    PaperSelected,
    /// Waiting for the backend to generate the debate.
    DebateRequested,
    /// Transcript committed, playback not started.
    DebateLoaded,
    /// Debate generation failed; waits for an explicit retry.
    DebateFailed,
    /// Statements are being revealed.
    PlaybackInProgress,
    /// Every statement revealed; vote unlocked, tally visible.
    PlaybackComplete,
}

impl SessionPhase {
    /// Valid transitions from this phase.
    ///
    /// Selecting a different paper is allowed from every phase and always
    /// lands in `PaperSelected`.
    pub fn valid_transitions(self) -> &'static [SessionPhase] {
        match self {
            Self::Idle => &[Self::PaperSelected],
            Self::PaperSelected => &[Self::PaperSelected, Self::DebateRequested],
            Self::DebateRequested => &[
                Self::PaperSelected,
                Self::DebateLoaded,
                Self::DebateFailed,
            ],
            Self::DebateLoaded => &[Self::PaperSelected, Self::PlaybackInProgress],
            Self::DebateFailed => &[Self::PaperSelected, Self::DebateRequested],
            Self::PlaybackInProgress => &[
                Self::PaperSelected,
                Self::PlaybackComplete,
                Self::DebateLoaded,
            ],
            Self::PlaybackComplete => &[Self::PaperSelected],
        }
    }

    pub fn can_transition_to(self, to: SessionPhase) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Whether a transcript is committed in this phase.
    pub fn has_transcript(self) -> bool {
        matches!(
            self,
            Self::DebateLoaded | Self::PlaybackInProgress | Self::PlaybackComplete
        )
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::PaperSelected => write!(f, "paper_selected"),
            Self::DebateRequested => write!(f, "debate_requested"),
            Self::DebateLoaded => write!(f, "debate_loaded"),
            Self::DebateFailed => write!(f, "debate_failed"),
            Self::PlaybackInProgress => write!(f, "playback_in_progress"),
            Self::PlaybackComplete => write!(f, "playback_complete"),
        }
    }
}

/// A phase transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTransition {
    pub from: SessionPhase,
    pub to: SessionPhase,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// One viewing session: the selection, its transcript, and reveal progress.
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier.
    pub id: String,
    pub phase: SessionPhase,
    pub paper_id: Option<PaperId>,
    /// Paper record of the selection, when known.
    pub paper: Option<Paper>,
    pub debate_id: Option<DebateId>,
    pub transcript: Option<Arc<DebateTranscript>>,
    /// Number of statements revealed so far.
    pub revealed_count: usize,
    /// Incremented on every change of selection. In-flight work tagged with
    /// an older epoch is stale.
    pub epoch: u64,
    pub transitions: Vec<SessionTransition>,
    pub last_error: Option<ParliamentError>,
    pub created_at: DateTime<Utc>,
    pub gate: VoteGate,
    pub tally: TallyAggregator,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            phase: SessionPhase::Idle,
            paper_id: None,
            paper: None,
            debate_id: None,
            transcript: None,
            revealed_count: 0,
            epoch: 0,
            transitions: Vec::new(),
            last_error: None,
            created_at: Utc::now(),
            gate: VoteGate::new(),
            tally: TallyAggregator::new(),
        }
    }

    /// Transition to a new phase with a reason.
    pub fn transition(&mut self, to: SessionPhase, reason: &str) -> ParliamentResult<()> {
        if !self.phase.can_transition_to(to) {
            return Err(ParliamentError::InvalidTransition {
                from: self.phase.to_string(),
                to: to.to_string(),
            });
        }
        self.transitions.push(SessionTransition {
            from: self.phase,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;
        Ok(())
    }

    /// Make `paper_id` the selection. Returns `false` if it already was.
    ///
    /// A change clears everything derived from the old selection, relocks the
    /// gate, and bumps the epoch.
    pub fn select_paper(&mut self, paper_id: PaperId) -> ParliamentResult<bool> {
        if self.paper_id.as_ref() == Some(&paper_id) {
            return Ok(false);
        }
        let reason = match &self.paper_id {
            Some(previous) => format!("switched from paper {} to {}", previous, paper_id),
            None => format!("selected paper {}", paper_id),
        };
        self.transition(SessionPhase::PaperSelected, &reason)?;
        self.paper_id = Some(paper_id);
        self.clear_derived();
        self.epoch += 1;
        Ok(true)
    }

    /// The current selection, or a `Validation` error when there is none.
    pub fn require_paper(&self) -> ParliamentResult<&PaperId> {
        self.paper_id
            .as_ref()
            .ok_or_else(|| ParliamentError::validation("no paper selected"))
    }

    /// Drop the debate, progress, gate and tally of the current selection.
    pub fn clear_derived(&mut self) {
        self.paper = None;
        self.debate_id = None;
        self.transcript = None;
        self.revealed_count = 0;
        self.last_error = None;
        self.gate.reset();
        self.tally.reset();
    }

    /// Commit a transcript for the current selection and arm the gate.
    pub fn commit_transcript(
        &mut self,
        transcript: Arc<DebateTranscript>,
        reason: &str,
    ) -> ParliamentResult<()> {
        let mut tally = TallyAggregator::new();
        tally.load(&transcript)?;
        self.transition(SessionPhase::DebateLoaded, reason)?;
        self.tally = tally;
        self.gate.arm(
            self.epoch,
            transcript.debate_id.clone(),
            transcript.paper_id.clone(),
        );
        self.debate_id = Some(transcript.debate_id.clone());
        self.transcript = Some(transcript);
        self.revealed_count = 0;
        self.last_error = None;
        Ok(())
    }

    /// Statements revealed so far, in order.
    pub fn revealed_messages(&self) -> &[DebateMessage] {
        match &self.transcript {
            Some(t) => &t.messages[..self.revealed_count.min(t.messages.len())],
            None => &[],
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            phase: self.phase,
            paper_id: self.paper_id.clone(),
            paper_title: self.paper.as_ref().map(|p| p.title.clone()),
            debate_id: self.debate_id.clone(),
            epoch: self.epoch,
            revealed: self.revealed_count,
            total: self.transcript.as_ref().map_or(0, |t| t.message_count()),
            gate: self.gate.state(),
            tally: self.tally.view(),
            last_error: self.last_error.as_ref().map(|e| e.to_string()),
            transitions: self.transitions.len(),
            created_at: self.created_at,
        }
    }

    /// One-line summary for logs and the CLI.
    pub fn status_line(&self) -> String {
        let paper = self
            .paper_id
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let total = self.transcript.as_ref().map_or(0, |t| t.message_count());
        format!(
            "[{}] paper {} | {}/{} revealed | vote {}",
            self.phase,
            paper,
            self.revealed_count,
            total,
            if self.gate.is_unlocked() {
                "open"
            } else {
                "locked"
            }
        )
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub phase: SessionPhase,
    pub paper_id: Option<PaperId>,
    pub paper_title: Option<String>,
    pub debate_id: Option<DebateId>,
    pub epoch: u64,
    pub revealed: usize,
    pub total: usize,
    pub gate: GateState,
    pub tally: TallyView,
    pub last_error: Option<String>,
    pub transitions: usize,
    pub created_at: DateTime<Utc>,
}
