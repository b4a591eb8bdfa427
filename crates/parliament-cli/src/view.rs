//! Terminal rendering of session events.

use parliament::{NoticeLevel, Paper, SeatAllocation, SessionEvent, VoteResult};

/// One line per event, or `None` for events the terminal view skips.
pub fn format_event(event: &SessionEvent) -> Option<String> {
    let line = match event {
        SessionEvent::PaperSelected { paper_id, .. } => format!("Selected paper {}", paper_id),
        SessionEvent::DebateRequested { paper_id, .. } => {
            format!("Generating debate for paper {}...", paper_id)
        }
        SessionEvent::DebateLoaded {
            debate_id,
            message_count,
            ..
        } => format!("Debate {} ready: {} statements", debate_id, message_count),
        SessionEvent::DebateFailed { error, .. } => format!("Debate failed: {}", error),
        SessionEvent::StaleResponseDiscarded { .. } => return None,
        SessionEvent::PlaybackStarted { debate_id, .. } => {
            format!("──── Debate {} ────", debate_id)
        }
        SessionEvent::MessageRevealed {
            message,
            revealed,
            total,
            ..
        } => format!(
            "[{}/{}] {}: {}",
            revealed,
            total,
            message.speaker_role.profile().label,
            message.content
        ),
        SessionEvent::PlaybackCompleted { .. } => "──── End of debate ────".to_string(),
        SessionEvent::PlaybackCancelled { revealed, .. } => {
            format!("Playback stopped after {} statements", revealed)
        }
        SessionEvent::VoteUnlocked { .. } => "Voting is open.".to_string(),
        SessionEvent::TallyReleased { summary, .. } => format!(
            "Result: {}  (for {} | against {} | abstain {} | total {})",
            result_label(summary.result),
            summary.votes_for,
            summary.against,
            summary.abstain,
            summary.total
        ),
        SessionEvent::VoteCast { choice, .. } => format!("Your vote ({}) was recorded.", choice),
        SessionEvent::Notice { level, message, .. } => {
            let tag = match level {
                NoticeLevel::Info => "info",
                NoticeLevel::Warning => "warning",
                NoticeLevel::Error => "error",
            };
            format!("[{}] {}", tag, message)
        }
    };
    Some(line)
}

fn result_label(result: VoteResult) -> &'static str {
    match result {
        VoteResult::Passed => "PASSED",
        VoteResult::Rejected => "REJECTED",
        VoteResult::Tied => "TIED",
    }
}

pub fn format_paper(index: usize, paper: &Paper) -> String {
    format!("{:>3}. [{}] {}", index + 1, paper.id, paper.title)
}

pub fn format_seat(seat: &SeatAllocation) -> String {
    format!("{:>4} seats  {}  {}", seat.seats, seat.color, seat.label)
}

/// Prints events as text or JSON lines.
pub struct EventPrinter {
    json: bool,
}

impl EventPrinter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn print(&self, event: &SessionEvent) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!(error = %e, "Cannot serialize event"),
            }
        } else if let Some(line) = format_event(event) {
            println!("{}", line);
        }
    }
}
