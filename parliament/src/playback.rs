//! Playback — paced reveal of an already-received transcript.
//!
//! The backend returns the whole debate at once; the view reveals it one
//! statement at a time to keep the pacing of a live debate. Pacing is modeled
//! as a lazy, finite, cancellable sequence rather than a polling timer:
//!
//! ```text
//! start(messages) ──▶ Reveal(1) ─interval─▶ Reveal(2) ─ … ─▶ Reveal(N) ▶ Completed
//!                          │                    │
//!                          └──── cancel() ──────┴──▶ (no further events, never Completed)
//! ```
//!
//! [`RevealSchedule`] is the pure timeline; [`Playback`] walks it on the tokio
//! clock; [`PlaybackScheduler`] owns the running playback and cancels it on
//! restart or drop.

use std::time::Duration;

use futures::Stream;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::model::DebateMessage;

/// One step of a playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// A statement becomes visible.
    Reveal(DebateMessage),
    /// Every statement is visible. Emitted exactly once, right after the
    /// last reveal.
    Completed,
}

/// Nominal reveal timeline for a message sequence.
#[derive(Debug, Clone)]
pub struct RevealSchedule {
    messages: Vec<DebateMessage>,
    interval: Duration,
}

impl RevealSchedule {
    /// Messages are put in ordinal order.
    pub fn new(mut messages: Vec<DebateMessage>, interval: Duration) -> Self {
        messages.sort_by_key(|m| m.ordinal);
        Self { messages, interval }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn messages(&self) -> &[DebateMessage] {
        &self.messages
    }

    /// Offset from start at which message `index` is revealed.
    pub fn offset_of(&self, index: usize) -> Duration {
        self.interval
            .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Offset of the completion signal (same instant as the last reveal).
    pub fn completion_offset(&self) -> Duration {
        match self.messages.len() {
            0 => Duration::ZERO,
            n => self.offset_of(n - 1),
        }
    }

    /// Every event with its offset from start.
    pub fn timeline(&self) -> impl Iterator<Item = (Duration, PlaybackEvent)> + '_ {
        self.messages
            .iter()
            .enumerate()
            .map(|(i, m)| (self.offset_of(i), PlaybackEvent::Reveal(m.clone())))
            .chain(std::iter::once((
                self.completion_offset(),
                PlaybackEvent::Completed,
            )))
    }
}

/// Cancels a playback from elsewhere.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    generation: u64,
    cancel: CancellationToken,
}

impl PlaybackHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// A running reveal sequence. Nothing happens until [`Playback::next`] is
/// polled.
#[derive(Debug)]
pub struct Playback {
    generation: u64,
    schedule: RevealSchedule,
    next_index: usize,
    next_deadline: Option<Instant>,
    cancel: CancellationToken,
    completed: bool,
}

impl Playback {
    fn new(generation: u64, schedule: RevealSchedule, cancel: CancellationToken) -> Self {
        Self {
            generation,
            schedule,
            next_index: 0,
            next_deadline: None,
            cancel,
            completed: false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn total(&self) -> usize {
        self.schedule.len()
    }

    pub fn revealed(&self) -> usize {
        self.next_index
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn handle(&self) -> PlaybackHandle {
        PlaybackHandle {
            generation: self.generation,
            cancel: self.cancel.clone(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for and return the next event. `None` once completed or
    /// cancelled.
    pub async fn next(&mut self) -> Option<PlaybackEvent> {
        if self.completed || self.cancel.is_cancelled() {
            return None;
        }

        if self.next_index >= self.schedule.len() {
            self.completed = true;
            debug!(
                generation = self.generation,
                revealed = self.next_index,
                "Playback completed"
            );
            return Some(PlaybackEvent::Completed);
        }

        if let Some(deadline) = self.next_deadline {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(generation = self.generation, revealed = self.next_index, "Playback cancelled");
                    return None;
                }
                _ = tokio::time::sleep_until(deadline) => {}
            }
        }

        let message = self.schedule.messages[self.next_index].clone();
        self.next_index += 1;
        self.next_deadline = Some(Instant::now() + self.schedule.interval);
        Some(PlaybackEvent::Reveal(message))
    }

    /// Turn the playback into a `Stream` of events.
    pub fn into_stream(self) -> impl Stream<Item = PlaybackEvent> {
        futures::stream::unfold(self, |mut playback| async move {
            playback.next().await.map(|event| (event, playback))
        })
    }
}

/// Owns the active playback. Starting a new one cancels the previous one;
/// dropping the scheduler cancels whatever is running.
#[derive(Debug)]
pub struct PlaybackScheduler {
    interval: Duration,
    generation: u64,
    active: Option<PlaybackHandle>,
}

impl PlaybackScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            active: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start revealing `messages`, cancelling any previous playback first.
    pub fn start(&mut self, messages: Vec<DebateMessage>) -> Playback {
        if self.cancel() {
            debug!(generation = self.generation, "Cancelled previous playback before restart");
        }
        self.generation += 1;
        let playback = Playback::new(
            self.generation,
            RevealSchedule::new(messages, self.interval),
            CancellationToken::new(),
        );
        self.active = Some(playback.handle());
        playback
    }

    /// Cancel the active playback. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(handle) if !handle.is_cancelled() => {
                handle.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn active_generation(&self) -> Option<u64> {
        self.active.as_ref().map(PlaybackHandle::generation)
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
