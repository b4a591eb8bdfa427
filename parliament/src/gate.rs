//! Vote gate — the vote action stays locked until playback of the current
//! transcript has completed.
//!
//! The gate is armed with the selection epoch and debate it belongs to. A
//! completion signal only unlocks it when both match, so a late completion
//! from a superseded playback can never unlock the vote for a newer paper.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ParliamentResult;
use crate::model::{DebateId, PaperId};

/// Whether the vote action is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Locked,
    Unlocked,
}

/// A user's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    For,
    Against,
    Abstain,
}

impl VoteChoice {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "for" | "yes" | "aye" => Some(Self::For),
            "against" | "no" | "nay" => Some(Self::Against),
            "abstain" => Some(Self::Abstain),
            _ => None,
        }
    }
}

impl std::fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::For => write!(f, "for"),
            Self::Against => write!(f, "against"),
            Self::Abstain => write!(f, "abstain"),
        }
    }
}

/// A vote accepted by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCast {
    pub debate_id: DebateId,
    pub paper_id: PaperId,
    pub choice: VoteChoice,
    pub cast_at: DateTime<Utc>,
}

/// Result of attempting to vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteDisposition {
    /// The gate was locked; nothing was recorded.
    Rejected,
    Cast(VoteCast),
}

/// Destination for accepted votes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteSink: Send + Sync {
    async fn record(&self, vote: &VoteCast) -> ParliamentResult<()>;
}

/// Sink that only logs the vote. There is no vote-submission endpoint yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingVoteSink;

#[async_trait]
impl VoteSink for LoggingVoteSink {
    async fn record(&self, vote: &VoteCast) -> ParliamentResult<()> {
        info!(
            debate_id = %vote.debate_id,
            paper_id = %vote.paper_id,
            choice = %vote.choice,
            "Vote recorded"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Armed {
    epoch: u64,
    debate_id: DebateId,
    paper_id: PaperId,
}

/// Locked/unlocked gate bound to one (epoch, debate).
#[derive(Debug, Clone)]
pub struct VoteGate {
    state: GateState,
    armed: Option<Armed>,
}

impl VoteGate {
    pub fn new() -> Self {
        Self {
            state: GateState::Locked,
            armed: None,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == GateState::Unlocked
    }

    /// Bind the gate to a debate. Always relocks.
    pub fn arm(&mut self, epoch: u64, debate_id: DebateId, paper_id: PaperId) {
        self.state = GateState::Locked;
        self.armed = Some(Armed {
            epoch,
            debate_id,
            paper_id,
        });
    }

    /// Apply a completion signal. Returns `true` only on the transition from
    /// locked to unlocked.
    pub fn on_playback_complete(&mut self, epoch: u64, debate_id: &DebateId) -> bool {
        let matches = self
            .armed
            .as_ref()
            .map(|a| a.epoch == epoch && &a.debate_id == debate_id)
            .unwrap_or(false);
        if !matches {
            debug!(epoch, debate_id = %debate_id, "Ignoring completion for a different debate");
            return false;
        }
        if self.state == GateState::Unlocked {
            return false;
        }
        self.state = GateState::Unlocked;
        true
    }

    /// Attempt a vote. Locked gates reject without side effects.
    pub fn cast(&self, choice: VoteChoice) -> VoteDisposition {
        match (&self.state, &self.armed) {
            (GateState::Unlocked, Some(armed)) => VoteDisposition::Cast(VoteCast {
                debate_id: armed.debate_id.clone(),
                paper_id: armed.paper_id.clone(),
                choice,
                cast_at: Utc::now(),
            }),
            _ => VoteDisposition::Rejected,
        }
    }

    pub fn reset(&mut self) {
        self.state = GateState::Locked;
        self.armed = None;
    }
}

impl Default for VoteGate {
    fn default() -> Self {
        Self::new()
    }
}
