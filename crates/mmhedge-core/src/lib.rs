//! Core domain types for the delta-hedged quoting engine.
//!
//! This crate provides the value types exchanged between the engine and
//! its host:
//! - `MarketSnapshot`, `OpeningState`, `FillReport`: per-tick inputs
//! - `Quote`, `QuotePair`: per-tick outputs (short side first, then long)
//! - `Price`, `Size`, `OrderIntent`: gateway-facing decimal order types

pub mod decimal;
pub mod error;
pub mod order;
pub mod quote;
pub mod types;

pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use order::{ClientOrderId, OrderSide, OrderType, TimeInForce};
pub use quote::{
    InstrumentSpec, OrderIntent, PricingBreakdown, Quote, QuotePair, QuoteSide, TradeType,
};
pub use types::{FillReport, MarketSnapshot, OpeningState};
