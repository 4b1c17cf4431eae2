//! Shared fixtures for unit tests.

use std::sync::Mutex;

use crate::client::SentinelService;
use crate::error::{Error, Result};
use crate::types::{
    AnalysisPayload, AnalyzeRequest, DecisionReply, FollowupReply, FollowupRequest, ResetRequest,
    TradingDecisionRequest,
};

pub(crate) const SAMPLE_PAYLOAD: &str = r#"{
    "result": {
        "code_activity": {"rating": 9, "comment": "Very active", "error": null},
        "smart_contract_risk": {"rating": 3.5, "comment": "Owner can mint"},
        "token_performance": {"rating": 6, "comment": "Steady volume"},
        "social_sentiment": {"rating": 2, "comment": "Quiet", "error": "rate limited"},
        "risk_reward_ratio": 2.5,
        "confidence_score": 40,
        "final_recommendation": "Hold",
        "timestamp": "2025-01-15T10:30:00Z"
    },
    "has_trading_prompt": true
}"#;

pub(crate) fn sample_payload() -> AnalysisPayload {
    serde_json::from_str(SAMPLE_PAYLOAD).expect("sample payload is valid")
}

/// Call recorded by [`MockService`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Analyze(AnalyzeRequest),
    TradingDecision(TradingDecisionRequest),
    Reset(ResetRequest),
    Followup(FollowupRequest),
}

/// Scripted service double. `None` replies fail with a service error.
pub(crate) struct MockService {
    pub analysis: Option<AnalysisPayload>,
    pub decision: Option<DecisionReply>,
    pub followup: Option<String>,
    pub calls: Mutex<Vec<Call>>,
}

impl MockService {
    pub fn new(analysis: Option<AnalysisPayload>, decision: Option<DecisionReply>) -> Self {
        Self {
            analysis,
            decision,
            followup: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl SentinelService for MockService {
    fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisPayload> {
        self.record(Call::Analyze(request.clone()));
        self.analysis
            .clone()
            .ok_or_else(|| Error::Service("HTTP request failed: connection refused".to_string()))
    }

    fn trading_decision(&self, request: &TradingDecisionRequest) -> Result<DecisionReply> {
        self.record(Call::TradingDecision(request.clone()));
        self.decision
            .clone()
            .ok_or_else(|| Error::Service("API error (500 Internal Server Error)".to_string()))
    }

    fn reset(&self, request: &ResetRequest) -> Result<DecisionReply> {
        self.record(Call::Reset(request.clone()));
        self.decision
            .clone()
            .ok_or_else(|| Error::Service("API error (500 Internal Server Error)".to_string()))
    }

    fn followup(&self, request: &FollowupRequest) -> Result<FollowupReply> {
        self.record(Call::Followup(request.clone()));
        self.followup
            .clone()
            .map(|result| FollowupReply { result })
            .ok_or_else(|| Error::Service("API error (400 Bad Request)".to_string()))
    }

    fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
