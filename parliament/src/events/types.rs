//! Event types published by the session controller
//!
//! The view subscribes to these to render reveals, notices, and the vote
//! button state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gate::VoteChoice;
use crate::model::{DebateId, DebateMessage, PaperId, VoteSummary};

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// All session orchestration events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The user selected a paper (new epoch)
    PaperSelected {
        paper_id: PaperId,
        epoch: u64,
        timestamp: DateTime<Utc>,
    },

    /// A debate request was issued or attached to
    DebateRequested {
        paper_id: PaperId,
        timestamp: DateTime<Utc>,
    },

    /// A transcript was committed to the session
    DebateLoaded {
        paper_id: PaperId,
        debate_id: DebateId,
        message_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Debate generation failed; the session waits for an explicit retry
    DebateFailed {
        paper_id: PaperId,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// A response for a superseded selection was dropped
    StaleResponseDiscarded {
        paper_id: PaperId,
        current_paper_id: Option<PaperId>,
        timestamp: DateTime<Utc>,
    },

    /// Playback of the current transcript began
    PlaybackStarted {
        debate_id: DebateId,
        total: usize,
        timestamp: DateTime<Utc>,
    },

    /// One statement was revealed
    MessageRevealed {
        debate_id: DebateId,
        message: DebateMessage,
        revealed: usize,
        total: usize,
        timestamp: DateTime<Utc>,
    },

    /// All statements were revealed
    PlaybackCompleted {
        debate_id: DebateId,
        timestamp: DateTime<Utc>,
    },

    /// Playback stopped before completion
    PlaybackCancelled {
        debate_id: DebateId,
        revealed: usize,
        timestamp: DateTime<Utc>,
    },

    /// The vote action became available
    VoteUnlocked {
        debate_id: DebateId,
        timestamp: DateTime<Utc>,
    },

    /// The tally is now visible
    TallyReleased {
        debate_id: DebateId,
        summary: VoteSummary,
        timestamp: DateTime<Utc>,
    },

    /// A vote was handed to the vote sink
    VoteCast {
        debate_id: DebateId,
        choice: VoteChoice,
        timestamp: DateTime<Utc>,
    },

    /// Something the user should be told about
    Notice {
        level: NoticeLevel,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl SessionEvent {
    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self::Notice {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Event type name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PaperSelected { .. } => "paper_selected",
            Self::DebateRequested { .. } => "debate_requested",
            Self::DebateLoaded { .. } => "debate_loaded",
            Self::DebateFailed { .. } => "debate_failed",
            Self::StaleResponseDiscarded { .. } => "stale_response_discarded",
            Self::PlaybackStarted { .. } => "playback_started",
            Self::MessageRevealed { .. } => "message_revealed",
            Self::PlaybackCompleted { .. } => "playback_completed",
            Self::PlaybackCancelled { .. } => "playback_cancelled",
            Self::VoteUnlocked { .. } => "vote_unlocked",
            Self::TallyReleased { .. } => "tally_released",
            Self::VoteCast { .. } => "vote_cast",
            Self::Notice { .. } => "notice",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::PaperSelected { timestamp, .. }
            | Self::DebateRequested { timestamp, .. }
            | Self::DebateLoaded { timestamp, .. }
            | Self::DebateFailed { timestamp, .. }
            | Self::StaleResponseDiscarded { timestamp, .. }
            | Self::PlaybackStarted { timestamp, .. }
            | Self::MessageRevealed { timestamp, .. }
            | Self::PlaybackCompleted { timestamp, .. }
            | Self::PlaybackCancelled { timestamp, .. }
            | Self::VoteUnlocked { timestamp, .. }
            | Self::TallyReleased { timestamp, .. }
            | Self::VoteCast { timestamp, .. }
            | Self::Notice { timestamp, .. } => *timestamp,
        }
    }

    /// Debate this event belongs to, if any
    pub fn debate_id(&self) -> Option<&DebateId> {
        match self {
            Self::DebateLoaded { debate_id, .. }
            | Self::PlaybackStarted { debate_id, .. }
            | Self::MessageRevealed { debate_id, .. }
            | Self::PlaybackCompleted { debate_id, .. }
            | Self::PlaybackCancelled { debate_id, .. }
            | Self::VoteUnlocked { debate_id, .. }
            | Self::TallyReleased { debate_id, .. }
            | Self::VoteCast { debate_id, .. } => Some(debate_id),
            _ => None,
        }
    }
}
