//! Session controller — drives one viewing session end to end.
//!
//! ```text
//! import_papers ─▶ select ─▶ request_debate ─▶ play ─▶ (tally released, vote unlocked) ─▶ cast_vote
//!                    ▲                                                     │
//!                    └──────────── select another paper (epoch + 1) ◀──────┘
//! ```
//!
//! The controller is cheap to clone. Session state sits behind a mutex that
//! is only held between suspension points, never across one. Every suspended
//! operation remembers the epoch it started in and re-checks it before
//! touching the session, so work belonging to a superseded selection is
//! dropped instead of applied.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backend::SharedBackend;
use crate::catalog::PaperCatalog;
use crate::config::ParliamentConfig;
use crate::debate_client::DebateClient;
use crate::error::{ParliamentError, ParliamentResult};
use crate::events::{EventBus, NoticeLevel, SessionEvent, SharedEventBus};
use crate::gate::{GateState, LoggingVoteSink, VoteChoice, VoteDisposition, VoteSink};
use crate::model::{DebateMessage, DebateTranscript, Paper, PaperId};
use crate::playback::{PlaybackEvent, PlaybackScheduler};
use crate::selector::{PaperSelector, SelectionOutcome};
use crate::session::{Session, SessionPhase, SessionSnapshot};
use crate::store::{keys, load_json, save_json, SharedSessionStore};
use crate::tally::TallyView;

/// Result of [`SessionController::request_debate`].
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    /// No paper selected. Nothing was sent to the backend.
    NoPaperSelected,
    /// The current selection already has a transcript.
    AlreadyLoaded(Arc<DebateTranscript>),
    /// A transcript was generated and committed.
    Loaded(Arc<DebateTranscript>),
    /// The response arrived for a selection that is no longer current.
    Discarded,
    /// The selection changed (or the view was torn down) while waiting.
    Superseded,
    /// Debate generation failed; the session is in `DebateFailed`.
    Failed(ParliamentError),
}

impl RequestOutcome {
    pub fn transcript(&self) -> Option<&Arc<DebateTranscript>> {
        match self {
            Self::AlreadyLoaded(t) | Self::Loaded(t) => Some(t),
            _ => None,
        }
    }
}

/// Result of [`SessionController::play`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed { revealed: usize },
    Cancelled { revealed: usize },
    /// No loaded transcript to play.
    NotReady,
}

struct ControllerState {
    session: Session,
    scheduler: PlaybackScheduler,
    /// Cancelled whenever the selection changes or the view is torn down.
    request_cancel: CancellationToken,
}

impl ControllerState {
    /// Stop everything belonging to the current selection.
    fn cancel_pending(&mut self) {
        self.scheduler.cancel();
        self.request_cancel.cancel();
        self.request_cancel = CancellationToken::new();
    }
}

struct ControllerInner {
    config: ParliamentConfig,
    catalog: PaperCatalog,
    selector: PaperSelector,
    debates: DebateClient,
    store: SharedSessionStore,
    bus: SharedEventBus,
    sink: Arc<dyn VoteSink>,
    state: Mutex<ControllerState>,
}

/// Orchestrates catalog, selector, debate client, playback, tally and gate
/// for one session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<ControllerInner>,
}

impl SessionController {
    pub fn new(config: ParliamentConfig, backend: SharedBackend, store: SharedSessionStore) -> Self {
        Self::with_parts(
            config,
            backend,
            store,
            EventBus::new().shared(),
            Arc::new(LoggingVoteSink),
        )
    }

    pub fn with_parts(
        config: ParliamentConfig,
        backend: SharedBackend,
        store: SharedSessionStore,
        bus: SharedEventBus,
        sink: Arc<dyn VoteSink>,
    ) -> Self {
        let catalog = PaperCatalog::new(
            Arc::clone(&backend),
            Arc::clone(&bus),
            config.paper_source.clone(),
        );
        let state = ControllerState {
            session: Session::new(),
            scheduler: PlaybackScheduler::new(config.reveal_interval()),
            request_cancel: CancellationToken::new(),
        };
        Self {
            inner: Arc::new(ControllerInner {
                selector: PaperSelector::new(Arc::clone(&store)),
                debates: DebateClient::new(backend),
                catalog,
                store,
                bus,
                sink,
                config,
                state: Mutex::new(state),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, event: SessionEvent) {
        self.inner.bus.publish(event);
    }

    pub fn config(&self) -> &ParliamentConfig {
        &self.inner.config
    }

    pub fn bus(&self) -> SharedEventBus {
        Arc::clone(&self.inner.bus)
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.inner.bus.subscribe()
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Import the configured number of papers. Empty on failure.
    pub async fn import_papers(&self) -> Vec<Paper> {
        self.inner
            .catalog
            .import_papers(self.inner.config.max_results)
            .await
    }

    pub async fn lookup_paper(&self, paper_id: &PaperId) -> Option<Paper> {
        self.inner.catalog.lookup(paper_id).await
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Select a paper by id. Re-selecting the current paper changes nothing.
    pub fn select(&self, paper_id: PaperId) -> ParliamentResult<SelectionOutcome> {
        let mut state = self.lock();
        let outcome = self.inner.selector.select(&mut state.session, paper_id.clone())?;
        if outcome.changed() {
            state.cancel_pending();
        }
        let epoch = state.session.epoch;
        drop(state);
        self.after_selection(&outcome, paper_id, epoch);
        Ok(outcome)
    }

    /// Select a paper record, caching it under `paper_info`.
    pub fn select_paper(&self, paper: &Paper) -> ParliamentResult<SelectionOutcome> {
        let mut state = self.lock();
        let outcome = self.inner.selector.select_paper(&mut state.session, paper)?;
        if outcome.changed() {
            state.cancel_pending();
        }
        let epoch = state.session.epoch;
        drop(state);
        self.after_selection(&outcome, paper.id.clone(), epoch);
        Ok(outcome)
    }

    fn after_selection(&self, outcome: &SelectionOutcome, paper_id: PaperId, epoch: u64) {
        if !outcome.changed() {
            return;
        }
        if let SelectionOutcome::Switched { previous, .. } = outcome {
            self.inner.debates.abandon(previous);
        }
        self.publish(SessionEvent::PaperSelected {
            paper_id,
            epoch,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Resume the selection (and cached debate) persisted by an earlier run.
    pub fn restore(&self) -> ParliamentResult<Option<SessionSnapshot>> {
        let restored = match self.inner.selector.restore()? {
            Some(restored) => restored,
            None => return Ok(None),
        };
        let cached: Option<DebateTranscript> =
            match load_json(self.inner.store.as_ref(), keys::TRANSCRIPT) {
                Ok(cached) => cached,
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable cached transcript");
                    None
                }
            };

        let mut state = self.lock();
        let outcome = self
            .inner
            .selector
            .select(&mut state.session, restored.paper_id.clone())?;
        if outcome.changed() {
            state.cancel_pending();
        }
        if restored.paper.is_some() {
            state.session.paper = restored.paper;
        }

        let mut loaded = None;
        if let Some(transcript) = cached {
            let usable = transcript.paper_id == restored.paper_id
                && transcript.validate().is_ok()
                && state.session.phase == SessionPhase::PaperSelected;
            if usable {
                let transcript = Arc::new(transcript);
                state
                    .session
                    .transition(SessionPhase::DebateRequested, "restoring cached debate")?;
                state
                    .session
                    .commit_transcript(Arc::clone(&transcript), "restored from session store")?;
                loaded = Some(transcript);
            } else {
                debug!(paper_id = %restored.paper_id, "Cached transcript not usable");
            }
        }
        let epoch = state.session.epoch;
        let snapshot = state.session.snapshot();
        drop(state);

        info!(paper_id = %restored.paper_id, debate_loaded = loaded.is_some(), "Session restored");
        self.after_selection(&outcome, restored.paper_id.clone(), epoch);
        if let Some(transcript) = loaded {
            self.publish(SessionEvent::DebateLoaded {
                paper_id: transcript.paper_id.clone(),
                debate_id: transcript.debate_id.clone(),
                message_count: transcript.message_count(),
                timestamp: chrono::Utc::now(),
            });
        }
        Ok(Some(snapshot))
    }

    // ========================================================================
    // Debate
    // ========================================================================

    /// Generate the debate for the current selection.
    ///
    /// With no selection this is a silent no-op. Concurrent calls share one
    /// backend request. A response for a superseded selection is discarded.
    pub async fn request_debate(&self) -> RequestOutcome {
        let (paper_id, epoch, cancel) = {
            let mut state = self.lock();
            let paper_id = match state.session.require_paper() {
                Ok(paper_id) => paper_id.clone(),
                Err(e) => {
                    debug!(error = %e, "Debate request ignored");
                    return RequestOutcome::NoPaperSelected;
                }
            };
            match state.session.phase {
                phase if phase.has_transcript() => {
                    if let Some(transcript) = &state.session.transcript {
                        debug!(paper_id = %paper_id, "Debate already loaded");
                        return RequestOutcome::AlreadyLoaded(Arc::clone(transcript));
                    }
                }
                SessionPhase::PaperSelected | SessionPhase::DebateFailed => {
                    if let Err(e) = state
                        .session
                        .transition(SessionPhase::DebateRequested, "debate requested")
                    {
                        return RequestOutcome::Failed(e);
                    }
                }
                _ => {}
            }
            (paper_id, state.session.epoch, state.request_cancel.clone())
        };

        self.publish(SessionEvent::DebateRequested {
            paper_id: paper_id.clone(),
            timestamp: chrono::Utc::now(),
        });

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(paper_id = %paper_id, "Debate request superseded");
                return RequestOutcome::Superseded;
            }
            result = self.inner.debates.request_debate(&paper_id) => result,
        };

        match result {
            Ok(transcript) => self.commit_debate(epoch, transcript),
            Err(e) => self.fail_debate(epoch, paper_id, e),
        }
    }

    fn commit_debate(&self, epoch: u64, transcript: Arc<DebateTranscript>) -> RequestOutcome {
        let mut state = self.lock();
        let current = state.session.paper_id.clone();
        if state.session.epoch != epoch || current.as_ref() != Some(&transcript.paper_id) {
            drop(state);
            warn!(
                paper_id = %transcript.paper_id,
                current = ?current,
                "Discarding debate for a superseded selection"
            );
            self.publish(SessionEvent::StaleResponseDiscarded {
                paper_id: transcript.paper_id.clone(),
                current_paper_id: current,
                timestamp: chrono::Utc::now(),
            });
            return RequestOutcome::Discarded;
        }

        if state.session.phase != SessionPhase::DebateRequested {
            // A concurrent caller sharing the same request committed first.
            return match &state.session.transcript {
                Some(existing) => RequestOutcome::AlreadyLoaded(Arc::clone(existing)),
                None => RequestOutcome::Superseded,
            };
        }

        if let Err(e) = state
            .session
            .commit_transcript(Arc::clone(&transcript), "debate generated")
        {
            drop(state);
            return self.fail_debate(epoch, transcript.paper_id.clone(), e);
        }

        let store = self.inner.store.as_ref();
        if let Err(e) = store
            .set(keys::DEBATE_ID, transcript.debate_id.as_str())
            .and_then(|_| save_json(store, keys::TRANSCRIPT, transcript.as_ref()))
        {
            warn!(error = %e, "Failed to persist debate");
        }
        drop(state);

        info!(
            paper_id = %transcript.paper_id,
            debate_id = %transcript.debate_id,
            messages = transcript.message_count(),
            "Debate loaded"
        );
        self.publish(SessionEvent::DebateLoaded {
            paper_id: transcript.paper_id.clone(),
            debate_id: transcript.debate_id.clone(),
            message_count: transcript.message_count(),
            timestamp: chrono::Utc::now(),
        });
        RequestOutcome::Loaded(transcript)
    }

    fn fail_debate(&self, epoch: u64, paper_id: PaperId, e: ParliamentError) -> RequestOutcome {
        let mut state = self.lock();
        if state.session.epoch != epoch {
            let current = state.session.paper_id.clone();
            drop(state);
            debug!(paper_id = %paper_id, error = %e, "Dropping failure for a superseded selection");
            self.publish(SessionEvent::StaleResponseDiscarded {
                paper_id,
                current_paper_id: current,
                timestamp: chrono::Utc::now(),
            });
            return RequestOutcome::Discarded;
        }

        let first = state.session.phase == SessionPhase::DebateRequested;
        if first {
            if let Err(te) = state
                .session
                .transition(SessionPhase::DebateFailed, &e.to_string())
            {
                error!(error = %te, "Cannot record debate failure");
            }
            state.session.last_error = Some(e.clone());
        }
        drop(state);

        if first {
            error!(paper_id = %paper_id, error = %e, "Debate generation failed");
            self.publish(SessionEvent::DebateFailed {
                paper_id,
                error: e.to_string(),
                timestamp: chrono::Utc::now(),
            });
            self.publish(SessionEvent::notice(NoticeLevel::Error, e.user_notice()));
        }
        RequestOutcome::Failed(e)
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Reveal the loaded transcript at the configured cadence. Returns when
    /// playback completes or is cancelled.
    ///
    /// On completion the tally is released (and stored under `summary`) and
    /// the vote gate unlocks, strictly after the last reveal.
    pub async fn play(&self) -> PlaybackOutcome {
        let (mut playback, epoch, debate_id) = {
            let mut state = self.lock();
            let transcript = match (&state.session.phase, &state.session.transcript) {
                (SessionPhase::DebateLoaded, Some(transcript)) => Arc::clone(transcript),
                _ => {
                    debug!(phase = %state.session.phase, "Nothing to play");
                    return PlaybackOutcome::NotReady;
                }
            };
            if let Err(e) = state
                .session
                .transition(SessionPhase::PlaybackInProgress, "playback started")
            {
                warn!(error = %e, "Cannot start playback");
                return PlaybackOutcome::NotReady;
            }
            state.session.revealed_count = 0;
            let playback = state.scheduler.start(transcript.messages.clone());
            (playback, state.session.epoch, transcript.debate_id.clone())
        };
        let total = playback.total();

        self.publish(SessionEvent::PlaybackStarted {
            debate_id: debate_id.clone(),
            total,
            timestamp: chrono::Utc::now(),
        });

        while let Some(event) = playback.next().await {
            let mut state = self.lock();
            if state.session.epoch != epoch || playback.is_cancelled() {
                break;
            }
            match event {
                PlaybackEvent::Reveal(message) => {
                    state.session.revealed_count += 1;
                    let revealed = state.session.revealed_count;
                    drop(state);
                    self.publish(SessionEvent::MessageRevealed {
                        debate_id: debate_id.clone(),
                        message,
                        revealed,
                        total,
                        timestamp: chrono::Utc::now(),
                    });
                }
                PlaybackEvent::Completed => {
                    if let Err(e) = state
                        .session
                        .transition(SessionPhase::PlaybackComplete, "all statements revealed")
                    {
                        warn!(error = %e, "Cannot complete playback");
                        break;
                    }
                    let unlocked = state.session.gate.on_playback_complete(epoch, &debate_id);
                    let released = state.session.tally.release(&debate_id);
                    if let Some(summary) = &released {
                        if let Err(e) = save_json(self.inner.store.as_ref(), keys::SUMMARY, summary) {
                            warn!(error = %e, "Failed to persist vote summary");
                        }
                    }
                    let revealed = state.session.revealed_count;
                    drop(state);

                    info!(debate_id = %debate_id, revealed, "Playback complete");
                    self.publish(SessionEvent::PlaybackCompleted {
                        debate_id: debate_id.clone(),
                        timestamp: chrono::Utc::now(),
                    });
                    if unlocked {
                        self.publish(SessionEvent::VoteUnlocked {
                            debate_id: debate_id.clone(),
                            timestamp: chrono::Utc::now(),
                        });
                    }
                    if let Some(summary) = released {
                        self.publish(SessionEvent::TallyReleased {
                            debate_id: debate_id.clone(),
                            summary,
                            timestamp: chrono::Utc::now(),
                        });
                    }
                    return PlaybackOutcome::Completed { revealed };
                }
            }
        }

        let revealed = playback.revealed();
        {
            let mut state = self.lock();
            if state.session.epoch == epoch
                && state.session.phase == SessionPhase::PlaybackInProgress
            {
                if let Err(e) = state
                    .session
                    .transition(SessionPhase::DebateLoaded, "playback cancelled")
                {
                    warn!(error = %e, "Cannot rewind cancelled playback");
                }
            }
        }
        debug!(debate_id = %debate_id, revealed, "Playback cancelled");
        self.publish(SessionEvent::PlaybackCancelled {
            debate_id,
            revealed,
            timestamp: chrono::Utc::now(),
        });
        PlaybackOutcome::Cancelled { revealed }
    }

    /// Cancel the running playback. Returns whether one was running.
    pub fn cancel_playback(&self) -> bool {
        self.lock().scheduler.cancel()
    }

    // ========================================================================
    // Vote
    // ========================================================================

    /// Cast a vote. Rejected without side effects while the gate is locked.
    pub async fn cast_vote(&self, choice: VoteChoice) -> ParliamentResult<VoteDisposition> {
        let disposition = self.lock().session.gate.cast(choice);
        match &disposition {
            VoteDisposition::Rejected => {
                debug!(choice = %choice, "Vote rejected, gate locked");
            }
            VoteDisposition::Cast(vote) => {
                self.inner.sink.record(vote).await?;
                self.publish(SessionEvent::VoteCast {
                    debate_id: vote.debate_id.clone(),
                    choice,
                    timestamp: chrono::Utc::now(),
                });
            }
        }
        Ok(disposition)
    }

    // ========================================================================
    // Inspection and teardown
    // ========================================================================

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().session.snapshot()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().session.phase
    }

    pub fn status_line(&self) -> String {
        self.lock().session.status_line()
    }

    pub fn tally(&self) -> TallyView {
        self.lock().session.tally.view()
    }

    pub fn gate_state(&self) -> GateState {
        self.lock().session.gate.state()
    }

    pub fn transcript(&self) -> Option<Arc<DebateTranscript>> {
        self.lock().session.transcript.clone()
    }

    pub fn revealed_messages(&self) -> Vec<DebateMessage> {
        self.lock().session.revealed_messages().to_vec()
    }

    /// Cancel pending timers and requests. Call when the view goes away.
    pub fn teardown(&self) {
        let mut state = self.lock();
        state.cancel_pending();
        if let Some(paper_id) = state.session.paper_id.clone() {
            self.inner.debates.abandon(&paper_id);
        }
        debug!(session_id = %state.session.id, "Session torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockParliamentBackend;
    use crate::gate::MockVoteSink;
    use crate::model::{DebateId, SpeakerRole, VoteResult, VoteSummary};
    use crate::store::{MemorySessionStore, SessionStore};
    use std::time::Duration;

    fn config() -> ParliamentConfig {
        ParliamentConfig {
            api_base_url: "http://backend.test".to_string(),
            paper_source: "arxiv".to_string(),
            max_results: 6,
            reveal_interval_ms: 1000,
            request_timeout_secs: 5,
            store_path: None,
        }
    }

    fn transcript(paper_id: &PaperId) -> DebateTranscript {
        DebateTranscript {
            debate_id: DebateId::new(format!("d-{}", paper_id)),
            paper_id: paper_id.clone(),
            messages: vec![
                DebateMessage {
                    ordinal: 1,
                    speaker_role: SpeakerRole::Corporate,
                    content: "A".to_string(),
                    color_tag: "#DA0211".to_string(),
                },
                DebateMessage {
                    ordinal: 2,
                    speaker_role: SpeakerRole::Government,
                    content: "B".to_string(),
                    color_tag: "#2CAFFE".to_string(),
                },
            ],
            summary: VoteSummary::from_counts(1, 0, 3),
        }
    }

    fn controller(backend: MockParliamentBackend) -> (SessionController, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        (
            SessionController::new(config(), Arc::new(backend), store.clone()),
            store,
        )
    }

    #[tokio::test]
    async fn test_request_without_selection_is_silent_noop() {
        let mut backend = MockParliamentBackend::new();
        backend.expect_start_full_debate().times(0);
        let (controller, _) = controller(backend);
        let mut rx = controller.subscribe();

        assert!(matches!(
            controller.request_debate().await,
            RequestOutcome::NoPaperSelected
        ));
        assert_eq!(controller.phase(), SessionPhase::Idle);
        assert!(controller.snapshot().last_error.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_flow_releases_tally_and_unlocks_vote() {
        let mut backend = MockParliamentBackend::new();
        backend
            .expect_start_full_debate()
            .times(1)
            .returning(|id| Ok(transcript(id)));
        let (controller, store) = controller(backend);

        controller.select(PaperId::new("1")).unwrap();
        let outcome = controller.request_debate().await;
        assert!(matches!(outcome, RequestOutcome::Loaded(_)));
        assert_eq!(controller.phase(), SessionPhase::DebateLoaded);
        assert_eq!(controller.tally(), TallyView::Withheld);
        assert_eq!(store.get(keys::DEBATE_ID).unwrap().as_deref(), Some("d-1"));

        // Re-selecting the same paper must not trigger another generation.
        controller.select(PaperId::new("1")).unwrap();
        assert!(matches!(
            controller.request_debate().await,
            RequestOutcome::AlreadyLoaded(_)
        ));

        assert_eq!(
            controller.play().await,
            PlaybackOutcome::Completed { revealed: 2 }
        );
        assert_eq!(controller.phase(), SessionPhase::PlaybackComplete);
        assert_eq!(controller.gate_state(), GateState::Unlocked);
        match controller.tally() {
            TallyView::Final(summary) => {
                assert_eq!(summary.result, VoteResult::Passed);
                assert_eq!(summary.total, 4);
            }
            other => panic!("expected final tally, got {:?}", other),
        }
        assert!(store.get(keys::SUMMARY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failure_enters_failed_state_and_retry_succeeds() {
        let mut calls = 0;
        let mut backend = MockParliamentBackend::new();
        backend
            .expect_start_full_debate()
            .times(2)
            .returning(move |id| {
                calls += 1;
                if calls == 1 {
                    Err(ParliamentError::debate_generation(id.as_str(), "backend returned 500"))
                } else {
                    Ok(transcript(id))
                }
            });
        let (controller, _) = controller(backend);
        controller.select(PaperId::new("4")).unwrap();

        match controller.request_debate().await {
            RequestOutcome::Failed(e) => assert_eq!(e.code(), "DEBATE_GENERATION"),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(controller.phase(), SessionPhase::DebateFailed);
        assert!(controller.snapshot().last_error.is_some());

        assert!(matches!(
            controller.request_debate().await,
            RequestOutcome::Loaded(_)
        ));
        assert_eq!(controller.phase(), SessionPhase::DebateLoaded);
    }

    #[tokio::test]
    async fn test_vote_rejected_while_locked() {
        let mut backend = MockParliamentBackend::new();
        backend
            .expect_start_full_debate()
            .returning(|id| Ok(transcript(id)));
        let mut sink = MockVoteSink::new();
        sink.expect_record().times(0);

        let controller = SessionController::with_parts(
            config(),
            Arc::new(backend),
            MemorySessionStore::new().shared(),
            EventBus::new().shared(),
            Arc::new(sink),
        );
        assert_eq!(
            controller.cast_vote(VoteChoice::For).await.unwrap(),
            VoteDisposition::Rejected
        );

        controller.select(PaperId::new("1")).unwrap();
        controller.request_debate().await;
        assert_eq!(
            controller.cast_vote(VoteChoice::For).await.unwrap(),
            VoteDisposition::Rejected
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_vote_cast_after_completion_reaches_sink() {
        let mut backend = MockParliamentBackend::new();
        backend
            .expect_start_full_debate()
            .returning(|id| Ok(transcript(id)));
        let mut sink = MockVoteSink::new();
        sink.expect_record()
            .withf(|vote| vote.choice == VoteChoice::Against)
            .times(1)
            .returning(|_| Ok(()));

        let controller = SessionController::with_parts(
            config(),
            Arc::new(backend),
            MemorySessionStore::new().shared(),
            EventBus::new().shared(),
            Arc::new(sink),
        );
        controller.select(PaperId::new("1")).unwrap();
        controller.request_debate().await;
        controller.play().await;

        match controller.cast_vote(VoteChoice::Against).await.unwrap() {
            VoteDisposition::Cast(vote) => assert_eq!(vote.debate_id, DebateId::new("d-1")),
            VoteDisposition::Rejected => panic!("vote should be accepted"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_playback_returns_to_loaded() {
        let mut backend = MockParliamentBackend::new();
        backend
            .expect_start_full_debate()
            .returning(|id| Ok(transcript(id)));
        let (controller, _) = controller(backend);
        controller.select(PaperId::new("1")).unwrap();
        controller.request_debate().await;

        let player = tokio::spawn({
            let controller = controller.clone();
            async move { controller.play().await }
        });
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(controller.cancel_playback());

        assert_eq!(
            player.await.unwrap(),
            PlaybackOutcome::Cancelled { revealed: 1 }
        );
        assert_eq!(controller.phase(), SessionPhase::DebateLoaded);
        assert_eq!(controller.gate_state(), GateState::Locked);
        assert_eq!(controller.tally(), TallyView::Withheld);
    }

    #[tokio::test]
    async fn test_play_without_transcript_is_not_ready() {
        let (controller, _) = controller(MockParliamentBackend::new());
        assert_eq!(controller.play().await, PlaybackOutcome::NotReady);
    }

    #[tokio::test]
    async fn test_restore_uses_cached_transcript() {
        let store = Arc::new(MemorySessionStore::new());
        let paper_id = PaperId::new("8");
        store.set(keys::PAPER_ID, "8").unwrap();
        save_json(store.as_ref(), keys::TRANSCRIPT, &transcript(&paper_id)).unwrap();

        let mut backend = MockParliamentBackend::new();
        backend.expect_start_full_debate().times(0);
        let controller = SessionController::new(config(), Arc::new(backend), store.clone());

        let snapshot = controller.restore().unwrap().unwrap();
        assert_eq!(snapshot.phase, SessionPhase::DebateLoaded);
        assert_eq!(snapshot.paper_id, Some(paper_id));
        assert!(matches!(
            controller.request_debate().await,
            RequestOutcome::AlreadyLoaded(_)
        ));
    }
}
