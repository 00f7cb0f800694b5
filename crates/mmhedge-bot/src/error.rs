//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine error: {0}")]
    Engine(#[from] mmhedge_engine::EngineError),

    #[error("Order conversion error: {0}")]
    Core(#[from] mmhedge_core::CoreError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] mmhedge_telemetry::TelemetryError),

    #[error("Malformed session event at line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
