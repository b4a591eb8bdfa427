//! Domain records — papers, debate messages, vote summaries, transcripts.
//!
//! These are the validated shapes the rest of the crate works with. Wire
//! payloads are converted into them at the backend boundary
//! (see [`crate::backend::wire`]).

use serde::{Deserialize, Serialize};

use crate::error::{ParliamentError, ParliamentResult};

/// Identifier of a policy paper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperId(String);

impl PaperId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaperId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaperId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PaperId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a generated debate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebateId(String);

impl DebateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DebateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DebateId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A policy paper that can be debated. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub id: PaperId,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ============================================================================
// Speaker roles
// ============================================================================

/// Category of debate participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerRole {
    Corporate,
    Government,
    Academic,
    CivilRights,
}

/// Display attributes for a speaker role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleProfile {
    /// Full label shown next to a statement.
    pub label: &'static str,
    /// Compact label used on the seat chart.
    pub short_label: &'static str,
    /// One-line stance of the bloc.
    pub stance: &'static str,
    /// Icon name (Font Awesome solid set).
    pub icon: &'static str,
    /// Statement bubble color when the backend sends none.
    pub accent_color: &'static str,
    /// Seat color on the parliament chart.
    pub seat_color: &'static str,
    /// Seats held by the bloc.
    pub seats: u32,
}

const CORPORATE: RoleProfile = RoleProfile {
    label: "Corporations",
    short_label: "Corporations",
    stance: "Prioritize innovation and minimal regulations",
    icon: "building",
    accent_color: "#DA0211",
    seat_color: "#CC0099",
    seats: 45,
};

const GOVERNMENT: RoleProfile = RoleProfile {
    label: "Government",
    short_label: "Government",
    stance: "Seek a balance between innovation and public safety",
    icon: "gavel",
    accent_color: "#2CAFFE",
    seat_color: "#EE0011",
    seats: 45,
};

const ACADEMIC: RoleProfile = RoleProfile {
    label: "Academics",
    short_label: "Academics",
    stance: "Focus on long-term risks, ethical implications, and AI safety",
    icon: "university",
    accent_color: "#FDA003",
    seat_color: "#448833",
    seats: 45,
};

const CIVIL_RIGHTS: RoleProfile = RoleProfile {
    label: "Civil Rights Advocates",
    short_label: "CRA",
    stance: "Champion fairness, transparency, and social impact",
    icon: "users",
    accent_color: "#000099",
    seat_color: "#FFA500",
    seats: 45,
};

impl SpeakerRole {
    pub const ALL: [SpeakerRole; 4] = [
        Self::Corporate,
        Self::Government,
        Self::Academic,
        Self::CivilRights,
    ];

    pub fn profile(self) -> &'static RoleProfile {
        match self {
            Self::Corporate => &CORPORATE,
            Self::Government => &GOVERNMENT,
            Self::Academic => &ACADEMIC,
            Self::CivilRights => &CIVIL_RIGHTS,
        }
    }

    /// Parse a role name as sent by the backend.
    ///
    /// Accepts the snake_case tags as well as the display names older
    /// backends emitted ("Corporations", "Civil Rights Advocates", ...).
    pub fn from_wire(name: &str) -> Option<Self> {
        let normalized = name
            .trim()
            .to_ascii_lowercase()
            .replace(|c: char| c == ' ' || c == '-', "_");
        match normalized.as_str() {
            "corporate" | "corporation" | "corporations" => Some(Self::Corporate),
            "government" => Some(Self::Government),
            "academic" | "academics" => Some(Self::Academic),
            "civil_rights" | "civil_rights_advocates" | "cra" => Some(Self::CivilRights),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Corporate => write!(f, "corporate"),
            Self::Government => write!(f, "government"),
            Self::Academic => write!(f, "academic"),
            Self::CivilRights => write!(f, "civil_rights"),
        }
    }
}

/// One bloc on the seat-distribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatAllocation {
    pub role: SpeakerRole,
    pub label: String,
    pub seats: u32,
    pub color: String,
}

/// Seat distribution of the parliament, one entry per role in table order.
pub fn seat_distribution() -> Vec<SeatAllocation> {
    SpeakerRole::ALL
        .iter()
        .map(|role| {
            let profile = role.profile();
            SeatAllocation {
                role: *role,
                label: format!("{} ({})", profile.label, profile.stance),
                seats: profile.seats,
                color: profile.seat_color.to_string(),
            }
        })
        .collect()
}

// ============================================================================
// Debate transcript
// ============================================================================

/// A single statement in a debate, revealed at position `ordinal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateMessage {
    /// 1-based reveal position.
    pub ordinal: u32,
    pub speaker_role: SpeakerRole,
    pub content: String,
    pub color_tag: String,
}

/// Outcome of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteResult {
    Passed,
    Rejected,
    Tied,
}

impl VoteResult {
    /// Majority of cast for/against votes decides; abstentions never do.
    pub fn from_counts(votes_for: u32, against: u32) -> Self {
        match votes_for.cmp(&against) {
            std::cmp::Ordering::Greater => Self::Passed,
            std::cmp::Ordering::Less => Self::Rejected,
            std::cmp::Ordering::Equal => Self::Tied,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "passed" | "pass" => Some(Self::Passed),
            "rejected" | "reject" | "failed" => Some(Self::Rejected),
            "tied" | "tie" => Some(Self::Tied),
            _ => None,
        }
    }
}

impl std::fmt::Display for VoteResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Rejected => write!(f, "rejected"),
            Self::Tied => write!(f, "tied"),
        }
    }
}

/// Aggregate vote tally. Invariant: `total == for + against + abstain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSummary {
    #[serde(rename = "for")]
    pub votes_for: u32,
    pub against: u32,
    pub abstain: u32,
    pub total: u32,
    pub result: VoteResult,
}

impl VoteSummary {
    /// Build a summary whose total and result are derived from the counts.
    /// The total saturates at `u32::MAX`, so `validate` rejects an
    /// overflowing summary.
    pub fn from_counts(votes_for: u32, against: u32, abstain: u32) -> Self {
        Self {
            votes_for,
            against,
            abstain,
            total: votes_for.saturating_add(against).saturating_add(abstain),
            result: VoteResult::from_counts(votes_for, against),
        }
    }

    /// Sum of the three counts, `None` on overflow.
    pub fn counted(&self) -> Option<u32> {
        self.votes_for
            .checked_add(self.against)
            .and_then(|n| n.checked_add(self.abstain))
    }

    pub fn derived_result(&self) -> VoteResult {
        VoteResult::from_counts(self.votes_for, self.against)
    }

    /// Check `total == for + against + abstain`.
    pub fn validate(&self) -> ParliamentResult<()> {
        match self.counted() {
            Some(sum) if sum == self.total => Ok(()),
            Some(sum) => Err(ParliamentError::malformed(
                "vote summary",
                format!(
                    "total {} does not match for+against+abstain = {}",
                    self.total, sum
                ),
            )),
            None => Err(ParliamentError::malformed(
                "vote summary",
                "vote counts overflow",
            )),
        }
    }
}

/// The complete debate generated for one paper. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateTranscript {
    pub debate_id: DebateId,
    pub paper_id: PaperId,
    pub messages: Vec<DebateMessage>,
    pub summary: VoteSummary,
}

impl DebateTranscript {
    /// Check ordinals are strictly increasing and the summary is consistent.
    pub fn validate(&self) -> ParliamentResult<()> {
        for pair in self.messages.windows(2) {
            if pair[1].ordinal <= pair[0].ordinal {
                return Err(ParliamentError::malformed(
                    "debate",
                    format!(
                        "message ordinals not strictly increasing ({} then {})",
                        pair[0].ordinal, pair[1].ordinal
                    ),
                ));
            }
        }
        self.summary.validate()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}
