//! Engine faults.
//!
//! Input, key and transport failures only; config loading reports through
//! `anyhow`. A rejected order is not a fault: see
//! [`crate::validate::OrderRejection`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("invalid token id '{0}'")]
    InvalidTokenId(String),

    #[error("secure random source unavailable: {0}")]
    RandomSource(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("order book request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("order book request returned {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
