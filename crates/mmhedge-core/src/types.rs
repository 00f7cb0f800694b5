//! Per-tick input types.
//!
//! The gateway supplies one `MarketSnapshot` per tick and, after its
//! orders have had a chance to fill, one `FillReport`. `OpeningState` is
//! the account state the engine is constructed from.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Market conditions and own position for a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Oracle (index) price.
    pub oracle_price: f64,
    /// Best ask price.
    pub ask_price: f64,
    /// Best bid price.
    pub bid_price: f64,
    /// Number of resting bids.
    pub num_bids: u64,
    /// Number of resting asks.
    pub num_asks: u64,
    /// Current perp position (signed).
    pub perp_position: f64,
    /// Volatility estimate.
    pub volatility: f64,
    /// Hourly funding rate applied when the book trades rich to oracle.
    pub neg_funding_rate: f64,
    /// Hourly funding rate applied when the book trades cheap to oracle.
    pub pos_funding_rate: f64,
}

impl MarketSnapshot {
    /// Total resting orders on both sides.
    pub fn total_depth(&self) -> u64 {
        self.num_bids.saturating_add(self.num_asks)
    }

    /// Reject values the engine's arithmetic cannot work with.
    ///
    /// Empty depth is not rejected here; the engine reports it as a
    /// distinct failure.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("oracle_price", self.oracle_price),
            ("ask_price", self.ask_price),
            ("bid_price", self.bid_price),
            ("perp_position", self.perp_position),
            ("volatility", self.volatility),
            ("neg_funding_rate", self.neg_funding_rate),
            ("pos_funding_rate", self.pos_funding_rate),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(CoreError::InvalidSnapshot(format!(
                "{name} is not finite: {value}"
            )));
        }
        if self.oracle_price <= 0.0 {
            return Err(CoreError::InvalidSnapshot(format!(
                "oracle_price must be positive: {}",
                self.oracle_price
            )));
        }
        if self.ask_price < 0.0 || self.bid_price < 0.0 {
            return Err(CoreError::InvalidSnapshot(format!(
                "negative book price: bid={} ask={}",
                self.bid_price, self.ask_price
            )));
        }
        if self.volatility < 0.0 {
            return Err(CoreError::InvalidSnapshot(format!(
                "volatility must be non-negative: {}",
                self.volatility
            )));
        }
        Ok(())
    }
}

/// Account state at engine construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningState {
    /// Mark value of the perp position.
    pub perp_value: f64,
    /// Signed perp position.
    pub perp_position: f64,
    /// Signed hedge-instrument position.
    pub hedge_position: f64,
    /// Free collateral.
    pub cash: f64,
    /// Oracle price at open; fixed reference for hedge valuation.
    pub oracle_price: f64,
}

/// Settlement of the previous tick's quotes, as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillReport {
    /// Requested volume left unfilled.
    pub unfilled_size: f64,
    /// New perp mark value.
    pub perp_value: f64,
    /// New cash balance.
    pub cash: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            oracle_price: 100.0,
            ask_price: 100.5,
            bid_price: 99.5,
            num_bids: 10,
            num_asks: 10,
            perp_position: 0.0,
            volatility: 0.02,
            neg_funding_rate: 0.0,
            pos_funding_rate: 0.0,
        }
    }

    #[test]
    fn test_valid_snapshot() {
        assert!(snapshot().validate().is_ok());
        assert_eq!(snapshot().total_depth(), 20);
    }

    #[test]
    fn test_empty_depth_passes_validation() {
        let snap = MarketSnapshot {
            num_bids: 0,
            num_asks: 0,
            ..snapshot()
        };
        assert!(snap.validate().is_ok());
        assert_eq!(snap.total_depth(), 0);
    }

    #[test]
    fn test_non_finite_field_rejected() {
        let snap = MarketSnapshot {
            volatility: f64::NAN,
            ..snapshot()
        };
        let err = snap.validate().unwrap_err();
        assert!(err.to_string().contains("volatility"));
    }

    #[test]
    fn test_zero_oracle_rejected() {
        let snap = MarketSnapshot {
            oracle_price: 0.0,
            ..snapshot()
        };
        assert!(matches!(snap.validate(), Err(CoreError::InvalidSnapshot(_))));
    }

    #[test]
    fn test_snapshot_deserialize() {
        let json = r#"{
            "oracle_price": 100.0, "ask_price": 100.5, "bid_price": 99.5,
            "num_bids": 10, "num_asks": 10, "perp_position": 0.0,
            "volatility": 0.02, "neg_funding_rate": 0.0, "pos_funding_rate": 0.0
        }"#;
        let snap: MarketSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap, snapshot());
    }
}
