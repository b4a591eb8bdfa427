//! Session tracking for one viewer.

pub mod state;

pub use state::{Session, SessionPhase, SessionSnapshot, SessionTransition};
