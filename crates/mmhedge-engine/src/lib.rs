//! Quoting engine for a delta-hedged perpetual market maker.
//!
//! One `QuotingEngine` per traded market, driven once per tick by the host:
//!
//! ```text
//! MarketSnapshot → QuotingEngine::update_position()
//!                   ├─ pricing: mid-market, optimal perp delta, reservation price
//!                   ├─ risk: inventory risk estimate, order-book coefficient, spread
//!                   └─ quote_engine: offer volume, sizing, trade type
//!                        ↓
//!                   QuotePair (short, long) → gateway submits
//!
//! FillReport → QuotingEngine::update_returns()
//!               ├─ wealth: revalue cash + perp + hedge
//!               └─ stats: append return and unfilled fraction
//! ```
//!
//! The engine performs no I/O. Every degenerate numeric condition is
//! reported as an `EngineError` instead of a NaN or infinity.

pub mod config;
pub mod engine;
pub mod error;
pub mod pricing;
pub mod quote_engine;
pub mod risk;
pub mod stats;
pub mod wealth;

pub use config::EngineConfig;
pub use engine::{Phase, QuotingEngine, Regime};
pub use error::{EngineError, EngineResult};
pub use risk::CoefficientStep;
pub use stats::{OnlineStats, RecentWindow};
