//! Prometheus metrics and structured logging for the mmhedge market maker.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Per-market Prometheus gauges, counters and histograms for quoting ticks

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
