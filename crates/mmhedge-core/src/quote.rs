//! Quote output types and their conversion to gateway orders.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::{Price, Size};
use crate::error::Result;
use crate::order::{ClientOrderId, OrderSide, OrderType, TimeInForce};

/// Urgency classification shared by both quotes of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    /// Nothing to do this tick; sizes are informational only.
    NoTrade,
    /// Passive quote at the computed price.
    Limit,
    /// Hedge need exceeds passive capacity; cross the book.
    Market,
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTrade => write!(f, "no_trade"),
            Self::Limit => write!(f, "limit"),
            Self::Market => write!(f, "market"),
        }
    }
}

/// Which side of the book a quote sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSide {
    Long,
    Short,
}

impl QuoteSide {
    pub fn to_order_side(&self) -> OrderSide {
        match self {
            Self::Long => OrderSide::Buy,
            Self::Short => OrderSide::Sell,
        }
    }
}

impl fmt::Display for QuoteSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// One side of the engine's per-tick output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub trade_type: TradeType,
    pub size: f64,
    pub price: f64,
    pub side: QuoteSide,
}

impl Quote {
    /// Whether the gateway should act on this quote.
    pub fn is_actionable(&self) -> bool {
        self.trade_type != TradeType::NoTrade
    }

    /// Quantize into an exchange order.
    ///
    /// Returns `Ok(None)` for `NoTrade` quotes, for non-positive sizes and
    /// for sizes that round down to zero lots. Buy prices round down to the tick, sell
    /// prices round up, so quantization never tightens the quoted spread.
    pub fn to_order_intent(&self, spec: &InstrumentSpec) -> Result<Option<OrderIntent>> {
        let order_type = match self.trade_type {
            TradeType::NoTrade => return Ok(None),
            TradeType::Limit => OrderType::Limit,
            TradeType::Market => OrderType::Market,
        };
        // a limit side pushed past zero by the hedge need has nothing to place
        if self.size <= 0.0 {
            return Ok(None);
        }

        let size = Size::from_f64(self.size)?.round_to_lot(spec.lot_size);
        if size.is_zero() {
            return Ok(None);
        }

        let raw_price = Price::from_f64(self.price)?;
        let side = self.side.to_order_side();
        let price = match side {
            OrderSide::Buy => raw_price.round_to_tick(spec.tick_size),
            OrderSide::Sell => raw_price.round_up_to_tick(spec.tick_size),
        };

        Ok(Some(OrderIntent {
            cloid: ClientOrderId::generate(),
            side,
            order_type,
            tif: order_type.time_in_force(),
            price,
            size,
        }))
    }
}

/// Intermediate values of one `update_position` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub mid_market_price: f64,
    pub optimal_perp_delta: f64,
    pub inventory_risk: f64,
    pub order_book_risk_coefficient: f64,
    pub reservation_price: f64,
    pub spread: f64,
    pub total_offer_volume: f64,
}

/// Both quotes of a tick, short side first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuotePair {
    pub short: Quote,
    pub long: Quote,
    pub pricing: PricingBreakdown,
}

impl QuotePair {
    /// `[short, long]`.
    pub fn as_array(&self) -> [Quote; 2] {
        [self.short, self.long]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quote> {
        [&self.short, &self.long].into_iter()
    }

    /// Sum of sizes over quotes the gateway will act on.
    pub fn total_order_size(&self) -> f64 {
        self.iter()
            .filter(|q| q.is_actionable())
            .map(|q| q.size)
            .sum()
    }

    /// Shared trade type of the pair.
    pub fn trade_type(&self) -> TradeType {
        self.short.trade_type
    }
}

/// Exchange constraints used when quantizing quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub tick_size: Price,
    pub lot_size: Size,
}

/// A quote converted into a concrete order for the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub cloid: ClientOrderId,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub tif: TimeInForce,
    pub price: Price,
    pub size: Size,
}
