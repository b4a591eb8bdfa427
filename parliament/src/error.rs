//! Error types for the parliament session core
//!
//! Every failure in this crate is locally contained: network and backend
//! failures degrade the session to an empty or failed visual state and are
//! never fatal. Errors are `Clone` so a single in-flight debate result can be
//! shared by every caller attached to it.

use thiserror::Error;

/// Result type alias for parliament operations
pub type ParliamentResult<T> = Result<T, ParliamentError>;

/// Errors that can occur while orchestrating a debate session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParliamentError {
    /// Backend unreachable (connect failure, timeout, non-success status)
    #[error("Backend unreachable: {message}")]
    Network { message: String },

    /// Response shape violates the Paper/DebateTranscript/VoteSummary schema
    #[error("Malformed {what} response: {message}")]
    MalformedResponse { what: String, message: String },

    /// Operation attempted without the state it needs (e.g. no selected paper)
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The backend failed to generate a debate for the paper
    #[error("Debate generation failed for paper {paper_id}: {message}")]
    DebateGeneration { paper_id: String, message: String },

    /// Session store read/write failure
    #[error("Session store error: {message}")]
    Store { message: String },

    /// Invalid session state transition
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ParliamentError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn malformed(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            what: what.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn debate_generation(paper_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DebateGeneration {
            paper_id: paper_id.into(),
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network { .. } => "NETWORK",
            Self::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            Self::Validation { .. } => "VALIDATION",
            Self::DebateGeneration { .. } => "DEBATE_GENERATION",
            Self::Store { .. } => "STORE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Config { .. } => "CONFIG",
        }
    }

    /// Short message suitable for a user-visible notice.
    pub fn user_notice(&self) -> String {
        match self {
            Self::Network { .. } => "The parliament backend could not be reached.".to_string(),
            Self::MalformedResponse { what, .. } => {
                format!("The backend sent an unexpected {} response.", what)
            }
            Self::DebateGeneration { .. } => {
                "The debate could not be generated. Try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ParliamentError {
    fn from(e: serde_json::Error) -> Self {
        Self::store(format!("serialization failed: {}", e))
    }
}
