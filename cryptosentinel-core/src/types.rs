//! Core domain types for cryptosentinel
//!
//! These types describe the payloads exchanged with the remote analysis service.
//! The analysis payload is validated once when it is deserialized at the HTTP
//! boundary; everything downstream works with the typed fields only.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Session token** | Opaque unique id correlating this client with server-side state |
//! | **Analysis** | The multi-metric report the service returns for a token address |
//! | **Metric report** | One 0-10 rated dimension of an analysis (code activity, sentiment, ...) |
//! | **Decision** | The user's yes/no answer to the buy prompt |

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============================================
// Session Token
// ============================================

/// Opaque identifier sent with every request of a session.
///
/// Generated once per client session and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a fresh random (UUID v4) token
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================
// Analysis Payload
// ============================================

/// Full response of the analyze endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    /// The analysis itself
    pub result: AnalysisResult,
    /// Whether the service offers a buy decision for this token
    #[serde(default)]
    pub has_trading_prompt: bool,
}

/// Multi-metric analysis of a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// GitHub activity of the project (0-10)
    pub code_activity: MetricReport,
    /// Smart contract risk assessment (0-10)
    pub smart_contract_risk: MetricReport,
    /// Market performance of the token (0-10)
    pub token_performance: MetricReport,
    /// Social media sentiment (0-10)
    pub social_sentiment: MetricReport,
    /// Risk/reward ratio (0-5)
    pub risk_reward_ratio: f64,
    /// Overall confidence of the analysis (0-100)
    pub confidence_score: f64,
    /// Free-form recommendation text
    pub final_recommendation: String,
    /// When the analysis was produced
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// A single rated dimension of an analysis.
///
/// `error` is set when the service could only partially gather data for this
/// metric. The rating and comment are still meaningful in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    pub rating: f64,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Parse a service timestamp.
///
/// Accepts RFC 3339 and naive ISO-8601 date-times (`T` or space separated),
/// the latter interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    raw.replacen(' ', "T", 1)
        .parse::<NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc())
}

mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {:?}", raw)))
    }
}

// ============================================
// Decisions
// ============================================

/// The user's answer to the buy prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Yes,
    No,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Yes => "yes",
            Decision::No => "no",
        }
    }

    /// Outcome shown when the service succeeds without a message
    pub fn fallback_outcome(&self) -> &'static str {
        match self {
            Decision::Yes => "Trade request submitted.",
            Decision::No => "No action taken.",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Ok(Decision::Yes),
            "no" | "n" => Ok(Decision::No),
            other => Err(format!("invalid decision {:?} (expected yes or no)", other)),
        }
    }
}

// ============================================
// Wire Requests / Replies
// ============================================

/// Body of `POST /api/analyze`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeRequest {
    pub query: String,
    pub session_id: SessionToken,
}

/// Body of `POST /api/trading-decision`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradingDecisionRequest {
    pub decision: Decision,
    pub session_id: SessionToken,
}

/// Body of `POST /api/reset`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetRequest {
    pub session_id: SessionToken,
}

/// Body of `POST /api/followup`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowupRequest {
    pub question: String,
    pub session_id: SessionToken,
}

/// Reply of the trading-decision and reset endpoints.
///
/// The decision endpoint answers under `result`, reset under `message`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DecisionReply {
    #[serde(default, alias = "result")]
    pub message: Option<String>,
}

/// Reply of the follow-up endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FollowupReply {
    pub result: String,
}

/// A follow-up question and what came back for it
#[derive(Debug, Clone, PartialEq)]
pub struct FollowupEntry {
    pub question: String,
    pub answer: FollowupAnswer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FollowupAnswer {
    Pending,
    Answered(String),
    Failed(String),
}
