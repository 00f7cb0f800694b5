//! Session driver for the delta-hedged perp market maker.
//!
//! Feeds exchange events into a [`mmhedge_engine::QuotingEngine`] and routes
//! the resulting quotes to an [`ExchangeGateway`]:
//!
//! ```text
//! gateway.next_event()
//!   ├─ snapshot     → cancel_all → update_position → submit(orders)
//!   └─ fill_report  → update_returns
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod runner;

pub use config::{AppConfig, ErrorPolicy, SessionConfig};
pub use error::{AppError, AppResult};
pub use gateway::{ExchangeGateway, ReplayGateway, SessionEvent};
pub use runner::{SessionRunner, SessionSummary};
