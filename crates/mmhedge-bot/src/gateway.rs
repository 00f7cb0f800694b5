//! Exchange gateway seam and the JSON-lines replay gateway.
//!
//! The gateway owns everything exchange-facing: it yields market events and
//! accepts order instructions. The replay implementation reads a recorded
//! session and writes every submitted order as a JSON line.

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use mmhedge_core::{FillReport, MarketSnapshot, OrderIntent};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use tracing::{debug, trace};

/// One input event of a quoting session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Start of a tick: quote against this market state.
    Snapshot(MarketSnapshot),
    /// End of a tick: account state after the quotes were worked.
    FillReport(FillReport),
}

/// Source of market events and sink of orders.
#[cfg_attr(test, mockall::automock)]
pub trait ExchangeGateway {
    /// Next event, or `None` once the session is exhausted.
    fn next_event(&mut self) -> AppResult<Option<SessionEvent>>;

    /// Place orders.
    fn submit(&mut self, orders: &[OrderIntent]) -> AppResult<()>;

    /// Cancel every resting order.
    fn cancel_all(&mut self) -> AppResult<()>;
}

#[derive(Serialize)]
struct SubmittedOrder<'a> {
    submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    order: &'a OrderIntent,
}

/// Replays a recorded session from JSON lines.
///
/// Blank lines and lines starting with `#` are ignored.
#[derive(Debug)]
pub struct ReplayGateway<R, W> {
    reader: R,
    writer: W,
    line_no: usize,
    submitted: usize,
    cancels: usize,
}

impl<R: BufRead, W: Write> ReplayGateway<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            line_no: 0,
            submitted: 0,
            cancels: 0,
        }
    }

    /// Orders written so far.
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// `cancel_all` calls so far.
    pub fn cancels(&self) -> usize {
        self.cancels
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<R: BufRead, W: Write> ExchangeGateway for ReplayGateway<R, W> {
    fn next_event(&mut self) -> AppResult<Option<SessionEvent>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let event = serde_json::from_str(trimmed).map_err(|source| AppError::Decode {
                line: self.line_no,
                source,
            })?;
            trace!(line = self.line_no, "Session event decoded");
            return Ok(Some(event));
        }
    }

    fn submit(&mut self, orders: &[OrderIntent]) -> AppResult<()> {
        for order in orders {
            let record = SubmittedOrder {
                submitted_at: Utc::now(),
                order,
            };
            serde_json::to_writer(&mut self.writer, &record)?;
            self.writer.write_all(b"\n")?;
            debug!(
                cloid = %order.cloid,
                side = %order.side,
                order_type = %order.order_type,
                price = %order.price,
                size = %order.size,
                "Order submitted"
            );
        }
        self.writer.flush()?;
        self.submitted += orders.len();
        Ok(())
    }

    fn cancel_all(&mut self) -> AppResult<()> {
        self.cancels += 1;
        Ok(())
    }
}
