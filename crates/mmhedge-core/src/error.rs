//! Error types for mmhedge-core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Price not representable as an exchange decimal.
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Invalid market snapshot: {0}")]
    InvalidSnapshot(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
