//! Engine error types.

use mmhedge_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Degenerate market depth: no resting bids or asks")]
    DegenerateMarketDepth,

    #[error("Zero order volume: previous tick placed no order")]
    ZeroOrderVolume,

    #[error("Zero wealth base: cannot compute a return from zero prior wealth")]
    ZeroWealthBase,

    #[error("Non-positive order book risk coefficient: {coefficient}")]
    NonPositiveRiskCoefficient { coefficient: f64 },

    #[error("Zero variance in trade return history")]
    ZeroVarianceEstimate,

    #[error("Inventory risk estimate is not a positive finite number: {value}")]
    InvalidInventoryRisk { value: f64 },

    #[error("No outstanding quotes to settle")]
    NoOutstandingQuotes,

    #[error("Non-finite result: {what}")]
    NonFiniteResult { what: &'static str },

    #[error("Invalid fill report: {0}")]
    InvalidFillReport(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(#[from] CoreError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid opening state: {0}")]
    InvalidOpeningState(String),
}

impl EngineError {
    /// Construction-time errors; an engine cannot exist after one of these.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::InvalidOpeningState(_))
    }

    /// Stable short name, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DegenerateMarketDepth => "degenerate_market_depth",
            Self::ZeroOrderVolume => "zero_order_volume",
            Self::ZeroWealthBase => "zero_wealth_base",
            Self::NonPositiveRiskCoefficient { .. } => "non_positive_risk_coefficient",
            Self::ZeroVarianceEstimate => "zero_variance_estimate",
            Self::InvalidInventoryRisk { .. } => "invalid_inventory_risk",
            Self::NoOutstandingQuotes => "no_outstanding_quotes",
            Self::NonFiniteResult { .. } => "non_finite_result",
            Self::InvalidFillReport(_) => "invalid_fill_report",
            Self::InvalidSnapshot(_) => "invalid_snapshot",
            Self::InvalidConfig(_) => "invalid_config",
            Self::InvalidOpeningState(_) => "invalid_opening_state",
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
