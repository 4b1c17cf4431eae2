//! Session state machine
//!
//! A [`Session`] owns the workflow phase, the session token and the payloads
//! received from the service. It is the only stateful component; rendering is
//! done from it through [`crate::presenter`].
//!
//! ```text
//!   Input ──submit──▶ Loading ──ok──▶ Summary ──decide──▶ ProcessingDecision ──▶ Result
//!     ▲                  │                                   (ok or failed)
//!     │               failed
//!     │                  ▼
//!     └──submit── AnalysisFailed
//! ```
//!
//! Every remote call is split into a `begin_*` step, which validates the
//! transition, flips the phase to its busy state and hands back the request to
//! send, and a `finish_*` step, which consumes the tagged [`Outcome`] of that
//! call. Callers that can block use the one-shot helpers ([`Session::submit`],
//! [`Session::decide`], [`Session::ask_followup`]); the TUI runs the call on a
//! worker thread between the two steps.
//!
//! Decision failures never propagate: they become [`NETWORK_ERROR_MESSAGE`] and
//! the session still reaches [`Phase::Result`].

use std::fmt;

use crate::client::SentinelService;
use crate::error::{Error, Result};
use crate::types::{
    AnalysisPayload, AnalyzeRequest, Decision, DecisionReply, FollowupAnswer, FollowupEntry,
    FollowupReply, FollowupRequest, ResetRequest, SessionToken, TradingDecisionRequest,
};

/// Outcome stored when the decision or reset call fails.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to reach the trading service. Please check your connection or switch networks and try again.";

/// Workflow phase. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for a token address
    #[default]
    Input,
    /// Analysis request in flight
    Loading,
    /// Analysis received and displayed
    Summary,
    /// Decision request in flight
    ProcessingDecision,
    /// Decision outcome displayed
    Result,
    /// Analysis request failed; a new address may be submitted
    AnalysisFailed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Input => "input",
            Phase::Loading => "loading",
            Phase::Summary => "summary",
            Phase::ProcessingDecision => "processingDecision",
            Phase::Result => "result",
            Phase::AnalysisFailed => "analysisFailed",
        }
    }

    /// True while a request is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Loading | Phase::ProcessingDecision)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a remote call as seen by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Failed(String),
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

/// The call a decision maps to.
///
/// A "yes" goes to the trading endpoint; a "no" only resets server state.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionCall {
    Trade(TradingDecisionRequest),
    Reset(ResetRequest),
}

impl DecisionCall {
    /// Issue the call against a service
    pub fn dispatch(&self, service: &dyn SentinelService) -> Result<DecisionReply> {
        match self {
            DecisionCall::Trade(request) => service.trading_decision(request),
            DecisionCall::Reset(request) => service.reset(request),
        }
    }
}

/// One client session: token, phase and received payloads.
#[derive(Debug)]
pub struct Session {
    token: SessionToken,
    phase: Phase,
    address: Option<String>,
    analysis: Option<AnalysisPayload>,
    analysis_error: Option<String>,
    decision: Option<Decision>,
    decision_outcome: Option<String>,
    followups: Vec<FollowupEntry>,
    followup_in_flight: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Start a new session with a freshly generated token
    pub fn new() -> Self {
        Self::with_token(SessionToken::generate())
    }

    pub fn with_token(token: SessionToken) -> Self {
        tracing::info!(session = %token, "Session started");
        Self {
            token,
            phase: Phase::Input,
            address: None,
            analysis: None,
            analysis_error: None,
            decision: None,
            decision_outcome: None,
            followups: Vec::new(),
            followup_in_flight: false,
        }
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Address of the current analysis cycle (trimmed)
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn analysis(&self) -> Option<&AnalysisPayload> {
        self.analysis.as_ref()
    }

    /// Why the last analysis failed (only in [`Phase::AnalysisFailed`])
    pub fn analysis_error(&self) -> Option<&str> {
        self.analysis_error.as_deref()
    }

    /// Decision of the current cycle, once one was made
    pub fn decision(&self) -> Option<Decision> {
        self.decision
    }

    pub fn decision_outcome(&self) -> Option<&str> {
        self.decision_outcome.as_deref()
    }

    pub fn followups(&self) -> &[FollowupEntry] {
        &self.followups
    }

    /// True while any request is in flight
    pub fn is_busy(&self) -> bool {
        self.phase.is_busy() || self.followup_in_flight
    }

    /// Whether the buy prompt should be offered right now
    pub fn can_decide(&self) -> bool {
        self.phase == Phase::Summary
            && !self.followup_in_flight
            && self
                .analysis
                .as_ref()
                .is_some_and(|analysis| analysis.has_trading_prompt)
    }

    // ========== Analysis ==========

    /// Validate a submission and move to [`Phase::Loading`].
    ///
    /// Returns the request to send to the analyze endpoint.
    pub fn begin_analysis(&mut self, address: &str) -> Result<AnalyzeRequest> {
        let address = address.trim();
        if address.is_empty() {
            return Err(Error::EmptyAddress);
        }
        match self.phase {
            Phase::Input | Phase::AnalysisFailed => {}
            Phase::Loading => return Err(Error::Busy("analysis")),
            phase => {
                return Err(Error::InvalidTransition {
                    phase,
                    action: "submit an address",
                })
            }
        }

        self.address = Some(address.to_string());
        self.analysis = None;
        self.analysis_error = None;
        self.decision = None;
        self.decision_outcome = None;
        self.followups.clear();
        self.transition(Phase::Loading);

        Ok(AnalyzeRequest {
            query: address.to_string(),
            session_id: self.token.clone(),
        })
    }

    /// Apply the outcome of the analyze call.
    pub fn finish_analysis(&mut self, outcome: Outcome<AnalysisPayload>) -> Result<()> {
        self.expect_phase(Phase::Loading, "complete an analysis")?;

        match outcome {
            Outcome::Ok(payload) => {
                tracing::info!(
                    session = %self.token,
                    has_trading_prompt = payload.has_trading_prompt,
                    "Analysis received"
                );
                self.analysis = Some(payload);
                self.transition(Phase::Summary);
            }
            Outcome::Failed(reason) => {
                tracing::warn!(session = %self.token, error = %reason, "Analysis failed");
                self.analysis_error = Some(reason);
                self.transition(Phase::AnalysisFailed);
            }
        }
        Ok(())
    }

    /// Submit an address and block on the analyze call.
    pub fn submit(&mut self, address: &str, service: &dyn SentinelService) -> Result<()> {
        let request = self.begin_analysis(address)?;
        let outcome = Outcome::from(service.analyze(&request));
        self.finish_analysis(outcome)
    }

    // ========== Decision ==========

    /// Validate a decision and move to [`Phase::ProcessingDecision`].
    ///
    /// Returns the call to issue for this choice.
    pub fn begin_decision(&mut self, decision: Decision) -> Result<DecisionCall> {
        match self.phase {
            Phase::ProcessingDecision => return Err(Error::Busy("decision")),
            Phase::Summary => {}
            phase => {
                return Err(Error::InvalidTransition {
                    phase,
                    action: "make a decision",
                })
            }
        }
        if self.followup_in_flight {
            return Err(Error::Busy("follow-up"));
        }
        if !self.can_decide() {
            return Err(Error::DecisionUnavailable);
        }

        self.decision = Some(decision);
        self.transition(Phase::ProcessingDecision);

        let session_id = self.token.clone();
        Ok(match decision {
            Decision::Yes => DecisionCall::Trade(TradingDecisionRequest {
                decision,
                session_id,
            }),
            Decision::No => DecisionCall::Reset(ResetRequest { session_id }),
        })
    }

    /// Apply the outcome of the decision call. Always ends in [`Phase::Result`].
    pub fn finish_decision(&mut self, outcome: Outcome<DecisionReply>) -> Result<()> {
        self.expect_phase(Phase::ProcessingDecision, "complete a decision")?;

        let message = match outcome {
            Outcome::Ok(reply) => reply
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| {
                    self.decision
                        .unwrap_or(Decision::No)
                        .fallback_outcome()
                        .to_string()
                }),
            Outcome::Failed(reason) => {
                tracing::warn!(session = %self.token, error = %reason, "Decision request failed");
                NETWORK_ERROR_MESSAGE.to_string()
            }
        };

        self.decision_outcome = Some(message);
        self.transition(Phase::Result);
        Ok(())
    }

    /// Make a decision and block on the resulting call.
    pub fn decide(&mut self, decision: Decision, service: &dyn SentinelService) -> Result<()> {
        let call = self.begin_decision(decision)?;
        let outcome = Outcome::from(call.dispatch(service));
        self.finish_decision(outcome)
    }

    // ========== Follow-up ==========

    /// Queue a follow-up question. The phase stays [`Phase::Summary`].
    pub fn begin_followup(&mut self, question: &str) -> Result<FollowupRequest> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }
        if self.followup_in_flight {
            return Err(Error::Busy("follow-up"));
        }
        self.expect_phase(Phase::Summary, "ask a follow-up question")?;

        self.followups.push(FollowupEntry {
            question: question.to_string(),
            answer: FollowupAnswer::Pending,
        });
        self.followup_in_flight = true;
        tracing::debug!(session = %self.token, "Follow-up question sent");

        Ok(FollowupRequest {
            question: question.to_string(),
            session_id: self.token.clone(),
        })
    }

    /// Record the answer (or failure) for the pending follow-up.
    pub fn finish_followup(&mut self, outcome: Outcome<FollowupReply>) -> Result<()> {
        if !self.followup_in_flight {
            return Err(Error::InvalidTransition {
                phase: self.phase,
                action: "complete a follow-up",
            });
        }
        self.followup_in_flight = false;

        let answer = match outcome {
            Outcome::Ok(reply) => FollowupAnswer::Answered(reply.result),
            Outcome::Failed(reason) => {
                tracing::warn!(session = %self.token, error = %reason, "Follow-up failed");
                FollowupAnswer::Failed(reason)
            }
        };
        if let Some(entry) = self.followups.last_mut() {
            entry.answer = answer;
        }
        Ok(())
    }

    /// Ask a follow-up question and block on the answer.
    pub fn ask_followup(&mut self, question: &str, service: &dyn SentinelService) -> Result<()> {
        let request = self.begin_followup(question)?;
        let outcome = Outcome::from(service.followup(&request));
        self.finish_followup(outcome)
    }

    // ========== Internals ==========

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }

    fn transition(&mut self, to: Phase) {
        tracing::info!(session = %self.token, from = %self.phase, to = %to, "Phase transition");
        self.phase = to;
    }
}
