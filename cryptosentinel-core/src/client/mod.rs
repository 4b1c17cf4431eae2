//! Remote analysis service client
//!
//! The client side of the CryptoSentinel service API:
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | Analyze a token address | `POST /api/analyze` |
//! | Act on a buy decision | `POST /api/trading-decision` |
//! | Decline and clear server state | `POST /api/reset` |
//! | Ask about the current analysis | `POST /api/followup` |
//! | Liveness | `GET /api/health` |
//!
//! [`SentinelService`] is the seam the session state machine talks to;
//! [`HttpSentinelClient`] is the production implementation.
//!
//! ## Configuration
//!
//! ```toml
//! [service]
//! base_url = "http://localhost:8000"
//! ```

mod http;

pub use http::HttpSentinelClient;

use crate::error::Result;
use crate::types::{
    AnalysisPayload, AnalyzeRequest, DecisionReply, FollowupReply, FollowupRequest, ResetRequest,
    TradingDecisionRequest,
};

/// Blocking interface to the analysis/trading service.
///
/// Implementations must be shareable across threads: the TUI issues calls
/// from worker threads so the render loop keeps running.
pub trait SentinelService: Send + Sync {
    /// Analyze a token address
    fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisPayload>;

    /// Forward a buy decision
    fn trading_decision(&self, request: &TradingDecisionRequest) -> Result<DecisionReply>;

    /// Clear server-side state for the session (declined trade)
    fn reset(&self, request: &ResetRequest) -> Result<DecisionReply>;

    /// Ask a follow-up question about the current analysis
    fn followup(&self, request: &FollowupRequest) -> Result<FollowupReply>;

    /// Check whether the service is reachable and healthy
    fn health_check(&self) -> Result<bool>;
}
