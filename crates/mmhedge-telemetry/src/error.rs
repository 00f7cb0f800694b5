//! Telemetry failures.

use std::string::FromUtf8Error;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// `init_logging` ran after a global subscriber was already set.
    #[error("tracing subscriber already installed: {0}")]
    SubscriberInstalled(String),

    /// The registry could not be rendered in the text exposition format.
    #[error("metrics exposition failed: {0}")]
    Exposition(#[from] prometheus::Error),

    #[error("metrics exposition is not UTF-8: {0}")]
    ExpositionEncoding(#[from] FromUtf8Error),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
