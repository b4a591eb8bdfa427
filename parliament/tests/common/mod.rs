//! Shared fixtures for the integration tests: a scripted in-process backend
//! and transcript builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tokio::time::{Duration, Instant};

use parliament::{
    DebateId, DebateMessage, DebateTranscript, Paper, PaperId, ParliamentBackend,
    ParliamentConfig, ParliamentError, ParliamentResult, SessionController, SessionEvent,
    SharedSessionStore, SpeakerRole, VoteSummary,
};

#[derive(Clone)]
struct Script {
    result: ParliamentResult<DebateTranscript>,
    release: Option<watch::Receiver<bool>>,
}

/// Backend answering from a script. Debate responses can be held back
/// until the test releases them.
#[derive(Default)]
pub struct ScriptedBackend {
    papers: Mutex<Option<ParliamentResult<Vec<Paper>>>>,
    debates: Mutex<HashMap<PaperId, Script>>,
    import_calls: AtomicUsize,
    debate_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_papers(self, papers: Vec<Paper>) -> Self {
        *self.papers.lock().unwrap() = Some(Ok(papers));
        self
    }

    pub fn with_import_failure(self, error: ParliamentError) -> Self {
        *self.papers.lock().unwrap() = Some(Err(error));
        self
    }

    pub fn with_debate(self, transcript: DebateTranscript) -> Self {
        self.debates.lock().unwrap().insert(
            transcript.paper_id.clone(),
            Script {
                result: Ok(transcript),
                release: None,
            },
        );
        self
    }

    pub fn with_debate_failure(self, paper_id: &str, error: ParliamentError) -> Self {
        self.debates.lock().unwrap().insert(
            PaperId::new(paper_id),
            Script {
                result: Err(error),
                release: None,
            },
        );
        self
    }

    /// Hold the debate response for `paper_id` until the returned sender
    /// sends `true`.
    pub fn hold(&self, paper_id: &str) -> watch::Sender<bool> {
        let (tx, rx) = watch::channel(false);
        if let Some(script) = self.debates.lock().unwrap().get_mut(&PaperId::new(paper_id)) {
            script.release = Some(rx);
        }
        tx
    }

    pub fn import_calls(&self) -> usize {
        self.import_calls.load(Ordering::SeqCst)
    }

    pub fn debate_calls(&self) -> usize {
        self.debate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ParliamentBackend for ScriptedBackend {
    async fn import_papers(&self, _source: &str, max_results: u32) -> ParliamentResult<Vec<Paper>> {
        self.import_calls.fetch_add(1, Ordering::SeqCst);
        match self.papers.lock().unwrap().clone() {
            Some(Ok(papers)) => Ok(papers.into_iter().take(max_results as usize).collect()),
            Some(Err(e)) => Err(e),
            None => Ok(vec![]),
        }
    }

    async fn get_paper(&self, paper_id: &PaperId) -> ParliamentResult<Paper> {
        let papers = self.papers.lock().unwrap().clone();
        papers
            .and_then(|r| r.ok())
            .and_then(|papers| papers.into_iter().find(|p| &p.id == paper_id))
            .ok_or_else(|| ParliamentError::network(format!("404 for paper {}", paper_id)))
    }

    async fn start_full_debate(&self, paper_id: &PaperId) -> ParliamentResult<DebateTranscript> {
        self.debate_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.debates.lock().unwrap().get(paper_id).cloned();
        let script = match script {
            Some(script) => script,
            None => {
                return Err(ParliamentError::debate_generation(
                    paper_id.as_str(),
                    "no debate scripted",
                ))
            }
        };
        if let Some(mut release) = script.release {
            let _ = release.wait_for(|open| *open).await;
        }
        script.result
    }

    async fn health(&self) -> ParliamentResult<String> {
        Ok("ok".to_string())
    }
}

/// Route library logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parliament=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

pub fn paper(id: &str) -> Paper {
    Paper {
        id: PaperId::new(id),
        title: format!("AI policy paper {}", id),
        summary: "Regulating frontier models".to_string(),
        source: "arxiv".to_string(),
        url: None,
    }
}

pub fn transcript(
    paper_id: &str,
    statements: &[(SpeakerRole, &str)],
    summary: VoteSummary,
) -> DebateTranscript {
    DebateTranscript {
        debate_id: DebateId::new(format!("debate-{}", paper_id)),
        paper_id: PaperId::new(paper_id),
        messages: statements
            .iter()
            .enumerate()
            .map(|(i, (role, content))| DebateMessage {
                ordinal: i as u32 + 1,
                speaker_role: *role,
                content: content.to_string(),
                color_tag: role.profile().accent_color.to_string(),
            })
            .collect(),
        summary,
    }
}

pub fn two_statement_transcript(paper_id: &str) -> DebateTranscript {
    transcript(
        paper_id,
        &[(SpeakerRole::Corporate, "A"), (SpeakerRole::Government, "B")],
        VoteSummary::from_counts(1, 0, 3),
    )
}

pub fn config(reveal_interval_ms: u64) -> ParliamentConfig {
    ParliamentConfig {
        api_base_url: "http://backend.test".to_string(),
        paper_source: "arxiv".to_string(),
        max_results: 6,
        reveal_interval_ms,
        request_timeout_secs: 5,
        store_path: None,
    }
}

pub fn controller(
    backend: Arc<ScriptedBackend>,
    store: SharedSessionStore,
    reveal_interval_ms: u64,
) -> SessionController {
    SessionController::new(config(reveal_interval_ms), backend, store)
}

/// Wait until the backend has seen `n` debate calls.
pub async fn wait_for_debate_calls(backend: &ScriptedBackend, n: usize) {
    while backend.debate_calls() < n {
        tokio::task::yield_now().await;
    }
}

/// Record every event with its offset from `start` until the bus closes or
/// `stop` matches.
pub fn record_events(
    mut rx: broadcast::Receiver<SessionEvent>,
    start: Instant,
    stop: fn(&SessionEvent) -> bool,
) -> tokio::task::JoinHandle<Vec<(Duration, SessionEvent)>> {
    tokio::spawn(async move {
        let mut events = Vec::new();
        while let Ok(event) = rx.recv().await {
            let done = stop(&event);
            events.push((start.elapsed(), event));
            if done {
                break;
            }
        }
        events
    })
}

/// Drain whatever is currently buffered on the receiver.
pub fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
