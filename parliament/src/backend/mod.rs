//! Backend REST boundary
//!
//! The backend that imports papers and generates debates is an opaque REST
//! service. [`ParliamentBackend`] is the seam the session core talks to;
//! [`HttpBackend`] is the `reqwest` implementation. Every method returns
//! validated domain records (see [`wire`]).
//!
//! # Endpoints
//!
//! ```text
//! POST /papers/{source}/import?max_results={N}   → [Paper]
//! GET  /papers/{paperId}                         → Paper
//! POST /debates/{paperId}/start-full-debate      → { debate_id, responses, summary }
//! GET  /health                                   → { status }
//! ```

pub mod http;
pub mod wire;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ParliamentResult;
use crate::model::{DebateTranscript, Paper, PaperId};

pub use http::HttpBackend;

/// Operations the session core needs from the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParliamentBackend: Send + Sync {
    /// Ask the backend to import a fresh batch of papers from `source`.
    async fn import_papers(&self, source: &str, max_results: u32) -> ParliamentResult<Vec<Paper>>;

    /// Fetch a single paper by id.
    async fn get_paper(&self, paper_id: &PaperId) -> ParliamentResult<Paper>;

    /// Generate the full debate for a paper. Expensive on the backend.
    async fn start_full_debate(&self, paper_id: &PaperId) -> ParliamentResult<DebateTranscript>;

    /// Backend liveness status string.
    async fn health(&self) -> ParliamentResult<String>;
}

/// Shared reference to a backend
pub type SharedBackend = Arc<dyn ParliamentBackend>;
