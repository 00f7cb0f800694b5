//! Inventory-risk estimator, order-book risk controller and spread.
//!
//! Both adaptive parameters run on fixed fallbacks until their history
//! exceeds `warmup_period` observations:
//! - inventory risk: `warmup_risk_level`, then
//!   `(1 + mean_return)^ticks_per_year / (risk_aversion * std^2)`
//! - order-book coefficient: unchanged, then nudged by one step per tick
//!   toward the target unfilled band

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::stats::OnlineStats;

/// Inventory risk for the current tick.
///
/// `running_mean_return` is the engine's incrementally maintained mean;
/// `returns` supplies the count and population standard deviation.
pub fn inventory_risk(
    config: &EngineConfig,
    running_mean_return: f64,
    returns: &OnlineStats,
) -> EngineResult<f64> {
    if returns.count() <= config.warmup_period {
        return Ok(config.warmup_risk_level);
    }

    let std = returns.population_std();
    if std == 0.0 {
        return Err(EngineError::ZeroVarianceEstimate);
    }

    let annualized = (1.0 + running_mean_return).powf(config.ticks_per_year());
    let value = annualized / (config.risk_aversion * std.powi(2));
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::InvalidInventoryRisk { value });
    }
    Ok(value)
}

/// One tick of the order-book risk controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoefficientStep {
    /// Too much volume left unfilled: quote wider.
    Widen,
    /// Nearly everything fills: quote tighter.
    Narrow,
    Hold,
}

impl CoefficientStep {
    /// Signed change applied to the coefficient.
    pub fn signed(&self, step: f64) -> f64 {
        match self {
            Self::Widen => step,
            Self::Narrow => -step,
            Self::Hold => 0.0,
        }
    }

    /// Coefficient after this step.
    pub fn apply(&self, coefficient: f64, step: f64) -> f64 {
        coefficient + self.signed(step)
    }
}

/// Decide the controller step from the unfilled-fraction history.
pub fn order_book_step(config: &EngineConfig, unfilled: &OnlineStats) -> CoefficientStep {
    if unfilled.count() <= config.warmup_period {
        return CoefficientStep::Hold;
    }
    let mean_unfilled = unfilled.mean();
    if mean_unfilled > config.max_unfilled_fraction {
        CoefficientStep::Widen
    } else if mean_unfilled < config.min_unfilled_fraction {
        CoefficientStep::Narrow
    } else {
        CoefficientStep::Hold
    }
}

/// `ir * vol^2 + (2 / ir) * ln(1 + ir / coefficient)`.
pub fn spread(inventory_risk: f64, volatility: f64, coefficient: f64) -> EngineResult<f64> {
    if coefficient.is_nan() || coefficient <= 0.0 {
        return Err(EngineError::NonPositiveRiskCoefficient { coefficient });
    }
    if !inventory_risk.is_finite() || inventory_risk <= 0.0 {
        return Err(EngineError::InvalidInventoryRisk {
            value: inventory_risk,
        });
    }
    let value = inventory_risk * volatility.powi(2)
        + (2.0 / inventory_risk) * (1.0 + inventory_risk / coefficient).ln();
    if !value.is_finite() {
        return Err(EngineError::NonFiniteResult { what: "spread" });
    }
    Ok(value)
}
