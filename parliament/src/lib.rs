//! AI Parliament session core
//!
//! A user picks a policy paper, the backend generates a multi-party debate
//! over it, and the session replays that debate one statement at a time
//! before revealing the vote tally and opening the vote action.
//!
//! This library provides:
//! - Backend REST client with wire validation into typed records
//! - Paper catalog, selection and session persistence
//! - Deduplicated debate requests with stale-response guards
//! - Cancellable, restartable playback of the transcript
//! - Vote tally release and vote gating after playback
//!
//! # Flow
//!
//! ```text
//! Idle ─▶ PaperSelected ─▶ DebateRequested ─▶ DebateLoaded ─▶ PlaybackInProgress ─▶ PlaybackComplete
//!                               │                   ▲                  │
//!                               ▼                   └──── cancel ──────┘
//!                          DebateFailed ── retry ──▶ DebateRequested
//! ```
//!
//! Selecting a different paper returns to `PaperSelected` from any phase.
//!
//! # Usage
//!
//! ```no_run
//! use parliament::{HttpBackend, MemorySessionStore, ParliamentConfig, SessionController};
//! use std::sync::Arc;
//!
//! # async fn run() -> parliament::ParliamentResult<()> {
//! let config = ParliamentConfig::default();
//! let backend = Arc::new(HttpBackend::from_config(&config)?);
//! let controller = SessionController::new(config, backend, MemorySessionStore::new().shared());
//!
//! let papers = controller.import_papers().await;
//! if let Some(paper) = papers.first() {
//!     controller.select_paper(paper)?;
//!     controller.request_debate().await;
//!     controller.play().await;
//! }
//! # Ok(())
//! # }
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod backend;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod debate_client;
pub mod error;
pub mod events;
pub mod gate;
pub mod model;
pub mod playback;
pub mod selector;
pub mod session;
pub mod store;
pub mod tally;

pub use backend::{HttpBackend, ParliamentBackend, SharedBackend};
pub use catalog::PaperCatalog;
pub use config::ParliamentConfig;
pub use controller::{PlaybackOutcome, RequestOutcome, SessionController};
pub use debate_client::DebateClient;
pub use error::{ParliamentError, ParliamentResult};
pub use events::{EventBus, NoticeLevel, SessionEvent, SharedEventBus};
pub use gate::{
    GateState, LoggingVoteSink, VoteCast, VoteChoice, VoteDisposition, VoteGate, VoteSink,
};
pub use model::{
    seat_distribution, DebateId, DebateMessage, DebateTranscript, Paper, PaperId, RoleProfile,
    SeatAllocation, SpeakerRole, VoteResult, VoteSummary,
};
pub use playback::{Playback, PlaybackEvent, PlaybackHandle, PlaybackScheduler, RevealSchedule};
pub use selector::{PaperSelector, SelectionOutcome};
pub use session::{Session, SessionPhase, SessionSnapshot};
pub use store::{
    FileSessionStore, MemorySessionStore, SessionStore, SharedSessionStore,
};
pub use tally::{TallyAggregator, TallyView};
