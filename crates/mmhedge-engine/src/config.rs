//! Quoting engine configuration.
//!
//! Fixed for the lifetime of an engine. The only adaptive parameter,
//! the order-book risk coefficient, starts from
//! `order_book_risk_coefficient` and is then owned by the engine.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Quoting engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum bid/ask distance for a two-sided limit quote to be worth placing.
    #[serde(default = "default_maker_fee")]
    pub maker_fee: f64,

    /// Number of observations required before the statistical estimators
    /// replace their warm-up fallbacks.
    #[serde(default = "default_warmup_period")]
    pub warmup_period: usize,

    /// Inventory risk used while warming up.
    #[serde(default = "default_warmup_risk_level")]
    pub warmup_risk_level: f64,

    /// Seconds between ticks. Scales funding carry and annualization.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: f64,

    /// Starting value of the order-book risk coefficient.
    #[serde(default = "default_order_book_risk_coefficient")]
    pub order_book_risk_coefficient: f64,

    /// Mean unfilled fraction below which the coefficient is decreased.
    #[serde(default = "default_min_unfilled_fraction")]
    pub min_unfilled_fraction: f64,

    /// Mean unfilled fraction above which the coefficient is increased.
    #[serde(default = "default_max_unfilled_fraction")]
    pub max_unfilled_fraction: f64,

    /// Per-tick adjustment of the order-book risk coefficient.
    #[serde(default = "default_order_book_risk_step")]
    pub order_book_risk_step: f64,

    /// Risk aversion constant in the inventory-risk denominator.
    #[serde(default = "default_risk_aversion")]
    pub risk_aversion: f64,

    /// Number of recent returns / unfilled fractions retained for inspection.
    /// Estimators always use the full history.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            maker_fee: default_maker_fee(),
            warmup_period: default_warmup_period(),
            warmup_risk_level: default_warmup_risk_level(),
            tick_interval_secs: default_tick_interval_secs(),
            order_book_risk_coefficient: default_order_book_risk_coefficient(),
            min_unfilled_fraction: default_min_unfilled_fraction(),
            max_unfilled_fraction: default_max_unfilled_fraction(),
            order_book_risk_step: default_order_book_risk_step(),
            risk_aversion: default_risk_aversion(),
            history_window: default_history_window(),
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        fn positive(name: &str, value: f64) -> EngineResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(EngineError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )))
            }
        }

        positive("tick_interval_secs", self.tick_interval_secs)?;
        if self.tick_interval_secs > SECONDS_PER_YEAR {
            return Err(EngineError::InvalidConfig(format!(
                "tick_interval_secs must not exceed one year ({SECONDS_PER_YEAR}s), got {}",
                self.tick_interval_secs
            )));
        }
        positive("warmup_risk_level", self.warmup_risk_level)?;
        positive("order_book_risk_coefficient", self.order_book_risk_coefficient)?;
        positive("order_book_risk_step", self.order_book_risk_step)?;
        positive("risk_aversion", self.risk_aversion)?;

        if !self.maker_fee.is_finite() || self.maker_fee < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "maker_fee must be non-negative, got {}",
                self.maker_fee
            )));
        }
        if !(self.min_unfilled_fraction.is_finite() && self.max_unfilled_fraction.is_finite())
            || self.min_unfilled_fraction > self.max_unfilled_fraction
        {
            return Err(EngineError::InvalidConfig(format!(
                "unfilled band is invalid: min={} max={}",
                self.min_unfilled_fraction, self.max_unfilled_fraction
            )));
        }
        if self.history_window == 0 {
            return Err(EngineError::InvalidConfig(
                "history_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Ticks in a 365-day year.
    pub fn ticks_per_year(&self) -> f64 {
        SECONDS_PER_YEAR / self.tick_interval_secs
    }

    /// Fraction of an hour covered by one tick (funding rates are hourly).
    pub fn tick_fraction_of_hour(&self) -> f64 {
        self.tick_interval_secs / SECONDS_PER_HOUR
    }
}

pub const SECONDS_PER_HOUR: f64 = 3600.0;
pub const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * SECONDS_PER_HOUR;

fn default_maker_fee() -> f64 {
    0.0002
}
fn default_warmup_period() -> usize {
    100
}
fn default_warmup_risk_level() -> f64 {
    0.1
}
fn default_tick_interval_secs() -> f64 {
    60.0
}
fn default_order_book_risk_coefficient() -> f64 {
    1.5
}
fn default_min_unfilled_fraction() -> f64 {
    0.01
}
fn default_max_unfilled_fraction() -> f64 {
    0.03
}
fn default_order_book_risk_step() -> f64 {
    0.01
}
fn default_risk_aversion() -> f64 {
    2.0
}
fn default_history_window() -> usize {
    1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.maker_fee, 0.0002);
        assert_eq!(config.warmup_period, 100);
        assert_eq!(config.warmup_risk_level, 0.1);
        assert_eq!(config.tick_interval_secs, 60.0);
        assert_eq!(config.order_book_risk_coefficient, 1.5);
        assert_eq!(config.min_unfilled_fraction, 0.01);
        assert_eq!(config.max_unfilled_fraction, 0.03);
        assert_eq!(config.order_book_risk_step, 0.01);
        assert_eq!(config.risk_aversion, 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serde_defaults() {
        let toml_str = r#"
warmup_period = 20
tick_interval_secs = 1.0
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.warmup_period, 20);
        assert_eq!(config.tick_interval_secs, 1.0);
        assert_eq!(config.maker_fee, 0.0002);
        assert_eq!(config.order_book_risk_coefficient, 1.5);
    }

    #[test]
    fn test_rejects_non_positive_tick_interval() {
        for tick in [0.0, -60.0, f64::NAN] {
            let config = EngineConfig {
                tick_interval_secs: tick,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(EngineError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_tick_interval_is_capped_at_one_year() {
        let year = EngineConfig {
            tick_interval_secs: SECONDS_PER_YEAR,
            ..Default::default()
        };
        assert!(year.validate().is_ok());

        for tick in [SECONDS_PER_YEAR + 1.0, 1e20, f64::INFINITY] {
            let config = EngineConfig {
                tick_interval_secs: tick,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(EngineError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_rejects_inverted_unfilled_band() {
        let config = EngineConfig {
            min_unfilled_fraction: 0.05,
            max_unfilled_fraction: 0.03,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_warmup_risk() {
        let config = EngineConfig {
            warmup_risk_level: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ticks_per_year() {
        let config = EngineConfig::default();
        assert_eq!(config.ticks_per_year(), 525_600.0);
        assert!((config.tick_fraction_of_hour() - 1.0 / 60.0).abs() < 1e-15);
    }
}
