//! Error types for cryptosentinel-core

use thiserror::Error;

use crate::session::Phase;

/// Main error type for the cryptosentinel-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote analysis/trading service error
    #[error("service error: {0}")]
    Service(String),

    /// Submitted address was empty after trimming
    #[error("token address must not be empty")]
    EmptyAddress,

    /// Follow-up question was empty after trimming
    #[error("follow-up question must not be empty")]
    EmptyQuestion,

    /// A request of the same kind is already in flight
    #[error("a {0} request is already in flight")]
    Busy(&'static str),

    /// Operation is not allowed from the current phase
    #[error("cannot {action} while in {phase} phase")]
    InvalidTransition { phase: Phase, action: &'static str },

    /// The analysis did not offer a trading prompt
    #[error("no trading decision is offered for this analysis")]
    DecisionUnavailable,
}

/// Result type alias for cryptosentinel-core
pub type Result<T> = std::result::Result<T, Error>;
