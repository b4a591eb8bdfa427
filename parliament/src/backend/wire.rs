//! Wire records for the backend REST contract and their validation into
//! domain types.
//!
//! The backend is loosely typed: ids arrive as numbers or strings, the import
//! endpoint omits `summary`, and vote summaries may use either the short
//! (`for`) or the long (`for_votes`) field names. Everything is normalized
//! here so the rest of the crate only sees validated records.

use serde::Deserialize;
use tracing::warn;

use crate::error::{ParliamentError, ParliamentResult};
use crate::model::{
    DebateId, DebateMessage, DebateTranscript, Paper, PaperId, SpeakerRole, VoteResult,
    VoteSummary,
};

/// An identifier as sent by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl WireId {
    fn into_string(self, what: &str) -> ParliamentResult<String> {
        let id = match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        };
        if id.is_empty() {
            return Err(ParliamentError::malformed(what, "empty identifier"));
        }
        Ok(id)
    }
}

/// `Paper` record from `POST /papers/{source}/import` or `GET /papers/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperRecord {
    pub id: WireId,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl PaperRecord {
    pub fn into_paper(self, fallback_source: &str) -> ParliamentResult<Paper> {
        let id = self.id.into_string("paper")?;
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ParliamentError::malformed(
                "paper",
                format!("paper {} has an empty title", id),
            ));
        }
        Ok(Paper {
            id: PaperId::new(id),
            title,
            summary: self.summary.unwrap_or_default(),
            source: self
                .source
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| fallback_source.to_string()),
            url: self.url.filter(|u| !u.is_empty()),
        })
    }
}

/// Decode the import endpoint's body: a JSON array of paper records.
pub fn decode_paper_list(body: &str, source: &str) -> ParliamentResult<Vec<Paper>> {
    let records: Vec<PaperRecord> = serde_json::from_str(body)
        .map_err(|e| ParliamentError::malformed("paper list", e.to_string()))?;
    records
        .into_iter()
        .map(|record| record.into_paper(source))
        .collect()
}

/// Decode a single paper body from `GET /papers/{id}`.
pub fn decode_paper(body: &str) -> ParliamentResult<Paper> {
    let record: PaperRecord = serde_json::from_str(body)
        .map_err(|e| ParliamentError::malformed("paper", e.to_string()))?;
    record.into_paper("")
}

/// One statement in the `responses` array.
#[derive(Debug, Clone, Deserialize)]
pub struct MpResponseRecord {
    pub mp_role: String,
    pub content: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Vote summary as sent by the backend. Missing counts default to 0.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoteSummaryRecord {
    #[serde(rename = "for", alias = "for_votes", default)]
    pub votes_for: u32,
    #[serde(alias = "against_votes", default)]
    pub against: u32,
    #[serde(alias = "abstain_votes", default)]
    pub abstain: u32,
    #[serde(alias = "total_votes", default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub result: Option<String>,
}

impl VoteSummaryRecord {
    /// Convert without enforcing the total invariant; a missing total is
    /// derived from the counts and a missing or unknown result is derived
    /// from the majority rule. Counts whose sum overflows are malformed.
    pub fn into_summary(self) -> ParliamentResult<VoteSummary> {
        let derived = VoteSummary::from_counts(self.votes_for, self.against, self.abstain);
        if derived.counted().is_none() {
            return Err(ParliamentError::malformed(
                "vote summary",
                format!(
                    "vote counts overflow: for {} against {} abstain {}",
                    self.votes_for, self.against, self.abstain
                ),
            ));
        }
        let result = match self.result.as_deref() {
            None => derived.result,
            Some(raw) => VoteResult::parse(raw).unwrap_or_else(|| {
                warn!(result = raw, "Unknown vote result from backend, deriving it");
                derived.result
            }),
        };
        Ok(VoteSummary {
            total: self.total.unwrap_or(derived.total),
            result,
            ..derived
        })
    }
}

/// Body of `POST /debates/{paperId}/start-full-debate`.
#[derive(Debug, Clone, Deserialize)]
pub struct DebateRecord {
    pub debate_id: WireId,
    #[serde(default)]
    pub responses: Vec<MpResponseRecord>,
    #[serde(default)]
    pub summary: Option<VoteSummaryRecord>,
}

impl DebateRecord {
    /// Validate into a transcript for `paper_id`. Ordinals follow the order
    /// of the `responses` array, starting at 1.
    pub fn into_transcript(self, paper_id: &PaperId) -> ParliamentResult<DebateTranscript> {
        let debate_id = DebateId::new(self.debate_id.into_string("debate")?);

        let mut messages = Vec::with_capacity(self.responses.len());
        for (index, response) in self.responses.into_iter().enumerate() {
            let role = SpeakerRole::from_wire(&response.mp_role).ok_or_else(|| {
                ParliamentError::malformed(
                    "debate",
                    format!("unknown mp_role '{}'", response.mp_role),
                )
            })?;
            let color_tag = response
                .color
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| role.profile().accent_color.to_string());
            messages.push(DebateMessage {
                ordinal: index as u32 + 1,
                speaker_role: role,
                content: response.content,
                color_tag,
            });
        }

        let transcript = DebateTranscript {
            debate_id,
            paper_id: paper_id.clone(),
            messages,
            summary: self.summary.unwrap_or_default().into_summary()?,
        };
        transcript.validate()?;
        Ok(transcript)
    }
}

/// Decode the debate endpoint's body.
pub fn decode_debate(body: &str, paper_id: &PaperId) -> ParliamentResult<DebateTranscript> {
    let record: DebateRecord = serde_json::from_str(body)
        .map_err(|e| ParliamentError::malformed("debate", e.to_string()))?;
    record.into_transcript(paper_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_records_without_summary() {
        let body = r#"[
            {"id": 7, "title": "AI Act compliance", "status": "pending"},
            {"id": "8", "title": " Model cards ", "summary": "Short", "source": "arxiv"}
        ]"#;
        let papers = decode_paper_list(body, "arxiv").unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].id.as_str(), "7");
        assert_eq!(papers[0].summary, "");
        assert_eq!(papers[0].source, "arxiv");
        assert_eq!(papers[1].title, "Model cards");
    }

    #[test]
    fn test_paper_list_must_be_array() {
        let err = decode_paper_list(r#"{"detail": "boom"}"#, "arxiv").unwrap_err();
        assert_eq!(err.code(), "MALFORMED_RESPONSE");
    }

    #[test]
    fn test_empty_title_rejected() {
        let err = decode_paper(r#"{"id": 1, "title": "  "}"#).unwrap_err();
        assert!(err.to_string().contains("empty title"));
    }

    #[test]
    fn test_decode_full_debate() {
        let body = r##"{
            "debate_id": 12,
            "responses": [
                {"mp_role": "corporate", "content": "A", "color": "#DA0211"},
                {"mp_role": "government", "content": "B"}
            ],
            "summary": {"for": 1, "against": 0, "abstain": 3, "total": 4, "result": "passed"}
        }"##;
        let transcript = decode_debate(body, &PaperId::new("p-1")).unwrap();
        assert_eq!(transcript.debate_id.as_str(), "12");
        assert_eq!(transcript.paper_id.as_str(), "p-1");
        assert_eq!(transcript.messages[0].ordinal, 1);
        assert_eq!(transcript.messages[1].ordinal, 2);
        assert_eq!(transcript.messages[1].color_tag, "#2CAFFE");
        assert_eq!(transcript.summary.total, 4);
        assert_eq!(transcript.summary.result, VoteResult::Passed);
    }

    #[test]
    fn test_long_summary_field_names() {
        let body = r#"{
            "debate_id": "d-9",
            "responses": [],
            "summary": {"for_votes": 2, "against_votes": 2, "abstain_votes": 0, "total_votes": 4}
        }"#;
        let transcript = decode_debate(body, &PaperId::new("p")).unwrap();
        assert_eq!(transcript.summary.votes_for, 2);
        assert_eq!(transcript.summary.result, VoteResult::Tied);
    }

    #[test]
    fn test_missing_counts_default_to_zero() {
        let body = r#"{"debate_id": 1, "responses": [], "summary": {"for": 3}}"#;
        let transcript = decode_debate(body, &PaperId::new("p")).unwrap();
        assert_eq!(transcript.summary.against, 0);
        assert_eq!(transcript.summary.abstain, 0);
        assert_eq!(transcript.summary.total, 3);
    }

    #[test]
    fn test_inconsistent_total_rejected() {
        let body = r#"{"debate_id": 1, "responses": [],
            "summary": {"for": 1, "against": 1, "abstain": 1, "total": 5}}"#;
        let err = decode_debate(body, &PaperId::new("p")).unwrap_err();
        assert!(err.to_string().contains("total 5"));
    }

    #[test]
    fn test_overflowing_counts_rejected() {
        let body = r#"{"debate_id": 1, "responses": [],
            "summary": {"for": 4294967295, "against": 1, "abstain": 0}}"#;
        let err = decode_debate(body, &PaperId::new("p")).unwrap_err();
        assert_eq!(err.code(), "MALFORMED_RESPONSE");
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn test_unknown_role_rejected() {
        let body = r#"{"debate_id": 1, "responses": [{"mp_role": "pirate", "content": "arr"}]}"#;
        let err = decode_debate(body, &PaperId::new("p")).unwrap_err();
        assert!(err.to_string().contains("pirate"));
    }
}
