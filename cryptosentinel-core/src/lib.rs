//! # cryptosentinel-core
//!
//! Core library for CryptoSentinel - a client for an AI-powered token analysis
//! service.
//!
//! This library provides:
//! - Domain and wire types for analyses and trading decisions
//! - The session state machine that drives the input → analysis → decision flow
//! - The metric presenter that turns an analysis into a renderable view model
//! - An HTTP client for the analysis service
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Two layers, strictly separated:
//! - **Session** ([`session`]): the only stateful component; owns the phase,
//!   the session token and every payload received from the service
//! - **Presenter** ([`presenter`]): pure transform from an analysis payload to
//!   per-metric fill fractions, severities and error notes
//!
//! ## Example
//!
//! ```rust,no_run
//! use cryptosentinel_core::{present, Config, Decision, HttpSentinelClient, Session};
//!
//! let config = Config::load().expect("failed to load config");
//! let client = HttpSentinelClient::new(&config.service).expect("failed to create client");
//!
//! let mut session = Session::new();
//! session.submit("0x1234567890abcdef1234567890abcdef12345678", &client)
//!     .expect("submission rejected");
//!
//! if let Some(analysis) = session.analysis() {
//!     let view = present(analysis);
//!     for metric in &view.metrics {
//!         println!("{}: {} ({})", metric.label(), metric.score_text(), metric.severity);
//!     }
//!     if view.offers_decision {
//!         session.decide(Decision::No, &client).expect("decision rejected");
//!     }
//! }
//! ```

// Re-export commonly used items at the crate root
pub use client::{HttpSentinelClient, SentinelService};
pub use config::Config;
pub use error::{Error, Result};
pub use presenter::{present, MetricKind, MetricView, Scale, Severity, SummaryView};
pub use session::{Outcome, Phase, Session, NETWORK_ERROR_MESSAGE};
pub use types::*;

// Public modules
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod presenter;
pub mod session;
pub mod types;

#[cfg(test)]
mod test_support;
