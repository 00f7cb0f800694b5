//! Order vocabulary shared by the engine output and the gateway.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Rests at the quoted price until filled or cancelled.
    Limit,
    /// Crosses the book; the quoted price only caps slippage.
    Market,
}

impl OrderType {
    /// Limit quotes rest until the next tick cancels them; market orders
    /// must never rest.
    pub fn time_in_force(&self) -> TimeInForce {
        match self {
            Self::Limit => TimeInForce::GoodTilCancelled,
            Self::Market => TimeInForce::ImmediateOrCancel,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Limit => "limit",
            Self::Market => "market",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    #[serde(rename = "Gtc")]
    GoodTilCancelled,
    #[serde(rename = "Ioc")]
    ImmediateOrCancel,
}

/// Unique tag attached to every submitted order.
///
/// Format: `mmh_{unix_ms}_{8 hex chars}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let mut suffix = Uuid::new_v4().simple().to_string();
        suffix.truncate(8);
        Self(format!("mmh_{millis}_{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_in_force_by_order_type() {
        assert_eq!(
            OrderType::Limit.time_in_force(),
            TimeInForce::GoodTilCancelled
        );
        assert_eq!(
            OrderType::Market.time_in_force(),
            TimeInForce::ImmediateOrCancel
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(OrderSide::Sell.to_string(), "sell");
        assert_eq!(OrderType::Market.to_string(), "market");
    }

    #[test]
    fn test_client_order_ids_are_distinct() {
        let a = ClientOrderId::generate();
        let b = ClientOrderId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_client_order_id_shape() {
        let id = ClientOrderId::generate();
        let parts: Vec<&str> = id.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "mmh");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
    }
}
