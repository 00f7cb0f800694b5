//! Session loop.
//!
//! Each snapshot starts a tick: resting orders are cancelled, the engine
//! prices new quotes and the actionable ones are submitted. The following
//! fill report settles the tick. Engine errors are handled per
//! [`ErrorPolicy`]; fatal errors always stop the session.

use std::time::Duration;

use mmhedge_core::{FillReport, InstrumentSpec, MarketSnapshot, OrderIntent, QuotePair};
use mmhedge_engine::{EngineError, Phase, QuotingEngine, Regime};
use mmhedge_telemetry::Metrics;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, ErrorPolicy};
use crate::error::{AppError, AppResult};
use crate::gateway::{ExchangeGateway, SessionEvent};

/// Counters of a finished (or halted) session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    /// Snapshots processed.
    pub ticks: usize,
    /// Snapshots the engine priced successfully.
    pub quoted_ticks: usize,
    /// Snapshots the engine rejected, dropped under `ErrorPolicy::Skip`.
    pub skipped_ticks: usize,
    pub fills_absorbed: usize,
    /// Fill reports dropped: no outstanding quotes or rejected by the engine.
    pub skipped_fills: usize,
    pub orders_submitted: usize,
    pub final_wealth: f64,
    pub final_regime: Regime,
}

pub struct SessionRunner<G> {
    market: String,
    engine: QuotingEngine,
    gateway: G,
    instrument: InstrumentSpec,
    on_error: ErrorPolicy,
    realtime: bool,
    summary: SessionSummary,
}

impl<G: ExchangeGateway> SessionRunner<G> {
    /// Build the engine from `config` and attach it to `gateway`.
    pub fn new(config: &AppConfig, gateway: G) -> AppResult<Self> {
        let engine = QuotingEngine::new(config.engine.clone(), config.opening)?;
        Ok(Self::with_engine(config, engine, gateway))
    }

    /// Attach an existing engine.
    pub fn with_engine(config: &AppConfig, engine: QuotingEngine, gateway: G) -> Self {
        let summary = SessionSummary {
            ticks: 0,
            quoted_ticks: 0,
            skipped_ticks: 0,
            fills_absorbed: 0,
            skipped_fills: 0,
            orders_submitted: 0,
            final_wealth: engine.current_wealth(),
            final_regime: engine.regime(),
        };
        Self {
            market: config.market.clone(),
            engine,
            gateway,
            instrument: config.instrument,
            on_error: config.session.on_error,
            realtime: config.session.realtime,
            summary,
        }
    }

    pub fn engine(&self) -> &QuotingEngine {
        &self.engine
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn into_gateway(self) -> G {
        self.gateway
    }

    /// Drain the gateway, pacing snapshots by the tick interval in realtime mode.
    pub async fn run(&mut self) -> AppResult<SessionSummary> {
        let pacing = if self.realtime {
            let secs = self.engine.tick_interval_secs();
            let interval = Duration::try_from_secs_f64(secs).map_err(|e| {
                AppError::Config(format!("tick_interval_secs {secs} is not a valid pause: {e}"))
            })?;
            Some(interval)
        } else {
            None
        };
        info!(
            market = %self.market,
            realtime = self.realtime,
            tick_interval_secs = self.engine.tick_interval_secs(),
            on_error = ?self.on_error,
            "Session started"
        );

        while let Some(event) = self.gateway.next_event()? {
            let is_snapshot = matches!(event, SessionEvent::Snapshot(_));
            self.handle_event(event)?;
            if let (Some(interval), true) = (pacing, is_snapshot) {
                tokio::time::sleep(interval).await;
            }
        }

        let summary = self.summary();
        info!(
            market = %self.market,
            ticks = summary.ticks,
            quoted_ticks = summary.quoted_ticks,
            skipped_ticks = summary.skipped_ticks,
            fills_absorbed = summary.fills_absorbed,
            orders_submitted = summary.orders_submitted,
            final_wealth = summary.final_wealth,
            final_regime = ?summary.final_regime,
            "Session finished"
        );
        Ok(summary)
    }

    /// Current counters with the engine's wealth and regime.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            final_wealth: self.engine.current_wealth(),
            final_regime: self.engine.regime(),
            ..self.summary.clone()
        }
    }

    /// Process one event.
    pub fn handle_event(&mut self, event: SessionEvent) -> AppResult<()> {
        match event {
            SessionEvent::Snapshot(snapshot) => self.on_snapshot(&snapshot),
            SessionEvent::FillReport(report) => self.on_fill_report(&report),
        }
    }

    fn on_snapshot(&mut self, snapshot: &MarketSnapshot) -> AppResult<()> {
        self.summary.ticks += 1;
        self.gateway.cancel_all()?;

        let pair = match self.engine.update_position(snapshot) {
            Ok(pair) => pair,
            Err(e) => {
                self.summary.skipped_ticks += 1;
                return self.on_engine_error(e);
            }
        };
        self.summary.quoted_ticks += 1;
        Metrics::quotes_published(&self.market, &pair);

        let orders = self.quantize(&pair)?;
        if orders.is_empty() {
            // nothing reached the book, so the next fill report has nothing to settle
            self.engine.withdraw_quotes();
            debug!(
                market = %self.market,
                trade_type = %pair.trade_type(),
                "Nothing to submit, quotes withdrawn"
            );
            return Ok(());
        }
        self.gateway.submit(&orders)?;
        self.summary.orders_submitted += orders.len();
        Ok(())
    }

    /// Quantize each side on its own, short side first.
    ///
    /// A side that fails to convert is dropped under `ErrorPolicy::Skip`;
    /// the other side is still placed.
    fn quantize(&mut self, pair: &QuotePair) -> AppResult<Vec<OrderIntent>> {
        let mut orders = Vec::with_capacity(2);
        for quote in pair.iter() {
            match quote.to_order_intent(&self.instrument) {
                Ok(Some(order)) => orders.push(order),
                Ok(None) => {}
                Err(e) => {
                    if self.on_error == ErrorPolicy::Halt {
                        self.engine.withdraw_quotes();
                        return Err(e.into());
                    }
                    warn!(
                        market = %self.market,
                        side = ?quote.side,
                        size = quote.size,
                        price = quote.price,
                        error = %e,
                        "Quote not convertible to an order, side dropped"
                    );
                }
            }
        }
        Ok(orders)
    }

    fn on_fill_report(&mut self, report: &FillReport) -> AppResult<()> {
        if self.engine.phase() != Phase::Quoted {
            warn!(market = %self.market, "Fill report without outstanding quotes, skipping");
            self.summary.skipped_fills += 1;
            return Ok(());
        }

        match self.engine.update_returns(report) {
            Ok(()) => {
                self.summary.fills_absorbed += 1;
                Metrics::settlement(
                    &self.market,
                    self.engine.current_wealth(),
                    self.engine.last_return().unwrap_or(0.0),
                    self.engine.mean_unfilled_fraction(),
                );
                Ok(())
            }
            Err(e) => {
                self.summary.skipped_fills += 1;
                self.on_engine_error(e)
            }
        }
    }

    fn on_engine_error(&mut self, error: EngineError) -> AppResult<()> {
        Metrics::engine_error(&self.market, error.kind());
        if error.is_fatal() || self.on_error == ErrorPolicy::Halt {
            return Err(AppError::Engine(error));
        }
        warn!(
            market = %self.market,
            kind = error.kind(),
            error = %error,
            "Engine rejected event, continuing"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockExchangeGateway;
    use mmhedge_core::{OpeningState, OrderSide, OrderType, Size};
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;

    const CONFIG: &str = r#"
        market = "TEST"

        [opening]
        perp_value = 0.0
        perp_position = 0.0
        hedge_position = 0.0
        cash = 10000.0
        oracle_price = 100.0
    "#;

    fn config(on_error: ErrorPolicy) -> AppConfig {
        let mut config = AppConfig::from_toml_str(CONFIG).unwrap();
        config.session.on_error = on_error;
        config
    }

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

    fn fill(cash: f64) -> SessionEvent {
        SessionEvent::FillReport(FillReport {
            unfilled_size: 2.0,
            perp_value: 0.0,
            cash,
        })
    }

    fn scripted(events: Vec<SessionEvent>) -> MockExchangeGateway {
        let mut queue = VecDeque::from(events);
        let mut gateway = MockExchangeGateway::new();
        gateway
            .expect_next_event()
            .returning(move || Ok(queue.pop_front()));
        gateway
    }

    #[test]
    fn test_quote_and_settle_cycle() {
        let mut gateway = scripted(vec![SessionEvent::Snapshot(snapshot()), fill(10_010.0)]);
        gateway.expect_cancel_all().times(1).returning(|| Ok(()));
        gateway
            .expect_submit()
            .withf(|orders: &[OrderIntent]| {
                orders.len() == 2
                    && orders[0].side == OrderSide::Sell
                    && orders[1].side == OrderSide::Buy
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut runner = SessionRunner::new(&config(ErrorPolicy::Skip), gateway).unwrap();
        let summary = tokio_test::block_on(runner.run()).unwrap();

        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.quoted_ticks, 1);
        assert_eq!(summary.fills_absorbed, 1);
        assert_eq!(summary.orders_submitted, 2);
        assert_eq!(summary.final_wealth, 10_010.0);
        assert_eq!(summary.final_regime, Regime::WarmingUp);
        assert_eq!(runner.engine().phase(), Phase::Settled);
    }

    #[test]
    fn test_fill_without_quotes_is_skipped() {
        let mut gateway = scripted(vec![fill(10_000.0)]);
        gateway.expect_cancel_all().never();
        gateway.expect_submit().never();

        let mut runner = SessionRunner::new(&config(ErrorPolicy::Halt), gateway).unwrap();
        let summary = tokio_test::block_on(runner.run()).unwrap();
        assert_eq!(summary.skipped_fills, 1);
        assert_eq!(summary.fills_absorbed, 0);
        assert_eq!(runner.engine().return_count(), 0);
    }

    #[test]
    fn test_skip_policy_continues_after_engine_error() {
        let degenerate = MarketSnapshot {
            num_bids: 0,
            num_asks: 0,
            ..snapshot()
        };
        let mut gateway = scripted(vec![
            SessionEvent::Snapshot(degenerate),
            SessionEvent::Snapshot(snapshot()),
        ]);
        gateway.expect_cancel_all().times(2).returning(|| Ok(()));
        gateway.expect_submit().times(1).returning(|_| Ok(()));

        let mut runner = SessionRunner::new(&config(ErrorPolicy::Skip), gateway).unwrap();
        let summary = tokio_test::block_on(runner.run()).unwrap();
        assert_eq!(summary.ticks, 2);
        assert_eq!(summary.skipped_ticks, 1);
        assert_eq!(summary.quoted_ticks, 1);
    }

    #[test]
    fn test_halt_policy_stops_on_engine_error() {
        let degenerate = MarketSnapshot {
            num_bids: 0,
            num_asks: 0,
            ..snapshot()
        };
        let mut gateway = scripted(vec![
            SessionEvent::Snapshot(degenerate),
            SessionEvent::Snapshot(snapshot()),
        ]);
        gateway.expect_cancel_all().times(1).returning(|| Ok(()));
        gateway.expect_submit().never();

        let mut runner = SessionRunner::new(&config(ErrorPolicy::Halt), gateway).unwrap();
        let result = tokio_test::block_on(runner.run());
        assert!(matches!(
            result,
            Err(AppError::Engine(EngineError::DegenerateMarketDepth))
        ));
        assert_eq!(runner.summary().ticks, 1);
    }

    #[test]
    fn test_no_trade_tick_submits_nothing() {
        let mut config = config(ErrorPolicy::Skip);
        config.engine.maker_fee = 10.0;
        let mut gateway = scripted(vec![SessionEvent::Snapshot(snapshot()), fill(10_000.0)]);
        gateway.expect_cancel_all().times(1).returning(|| Ok(()));
        gateway.expect_submit().never();

        let mut runner = SessionRunner::new(&config, gateway).unwrap();
        let summary = tokio_test::block_on(runner.run()).unwrap();
        assert_eq!(summary.quoted_ticks, 1);
        assert_eq!(summary.orders_submitted, 0);
        // quotes were withdrawn, so the report finds nothing outstanding
        assert_eq!(summary.skipped_fills, 1);
        assert_eq!(summary.fills_absorbed, 0);
        assert_eq!(runner.engine().phase(), Phase::Settled);
        assert_eq!(runner.engine().return_count(), 0);
    }

    fn long_hedge_config() -> AppConfig {
        let mut config = config(ErrorPolicy::Skip);
        config.opening.hedge_position = 5_000.0;
        config
    }

    /// Perp trading 1.5 below the oracle: the hedge need (≈75) exceeds half
    /// the offer volume (≈98.35), so the ask side goes negative.
    fn discounted_snapshot() -> MarketSnapshot {
        MarketSnapshot {
            ask_price: 99.0,
            bid_price: 98.0,
            ..snapshot()
        }
    }

    #[test]
    fn test_negative_limit_side_still_places_other_side() {
        let mut gateway = scripted(vec![
            SessionEvent::Snapshot(discounted_snapshot()),
            fill(10_010.0),
        ]);
        gateway.expect_cancel_all().times(1).returning(|| Ok(()));
        gateway
            .expect_submit()
            .withf(|orders: &[OrderIntent]| {
                orders.len() == 1
                    && orders[0].side == OrderSide::Buy
                    && orders[0].order_type == OrderType::Limit
                    && orders[0].size.inner() > dec!(124.17)
                    && orders[0].size.inner() <= dec!(124.175)
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut runner = SessionRunner::new(&long_hedge_config(), gateway).unwrap();
        let summary = tokio_test::block_on(runner.run()).unwrap();
        assert_eq!(summary.quoted_ticks, 1);
        assert_eq!(summary.skipped_ticks, 0);
        assert_eq!(summary.orders_submitted, 1);
        assert_eq!(summary.fills_absorbed, 1);
        assert_eq!(runner.engine().phase(), Phase::Settled);
    }

    #[test]
    fn test_fill_after_unplaced_quotes_is_not_absorbed() {
        let mut config = long_hedge_config();
        // every side rounds down to zero lots
        config.instrument.lot_size = Size::new(dec!(1000));
        let mut gateway = scripted(vec![
            SessionEvent::Snapshot(discounted_snapshot()),
            fill(10_010.0),
        ]);
        gateway.expect_cancel_all().times(1).returning(|| Ok(()));
        gateway.expect_submit().never();

        let mut runner = SessionRunner::new(&config, gateway).unwrap();
        let summary = tokio_test::block_on(runner.run()).unwrap();
        assert_eq!(summary.quoted_ticks, 1);
        assert_eq!(summary.skipped_ticks, 0);
        assert_eq!(summary.orders_submitted, 0);
        assert_eq!(summary.fills_absorbed, 0);
        assert_eq!(summary.skipped_fills, 1);
        assert_eq!(runner.engine().phase(), Phase::Settled);
        assert_eq!(runner.engine().return_count(), 0);
        assert_eq!(runner.engine().unfilled_count(), 0);
    }

    #[test]
    fn test_unconvertible_side_halts_and_withdraws_quotes() {
        let mut config = config(ErrorPolicy::Halt);
        // a price far beyond the decimal range cannot be quantized
        config.opening.oracle_price = 1e30;
        let huge = MarketSnapshot {
            oracle_price: 1e30,
            ask_price: 1e30,
            bid_price: 1e30,
            ..snapshot()
        };
        let mut gateway = scripted(vec![SessionEvent::Snapshot(huge), fill(10_000.0)]);
        gateway.expect_cancel_all().times(1).returning(|| Ok(()));
        gateway.expect_submit().never();

        let mut runner = SessionRunner::new(&config, gateway).unwrap();
        assert!(matches!(
            tokio_test::block_on(runner.run()),
            Err(AppError::Core(_))
        ));
        assert_eq!(runner.engine().phase(), Phase::Settled);
    }

    #[test]
    fn test_gateway_error_propagates() {
        let mut gateway = scripted(vec![SessionEvent::Snapshot(snapshot())]);
        gateway
            .expect_cancel_all()
            .returning(|| Err(AppError::Gateway("disconnected".to_string())));

        let mut runner = SessionRunner::new(&config(ErrorPolicy::Skip), gateway).unwrap();
        assert!(matches!(
            tokio_test::block_on(runner.run()),
            Err(AppError::Gateway(_))
        ));
    }

    #[test]
    fn test_invalid_opening_state_fails_construction() {
        let mut config = config(ErrorPolicy::Skip);
        config.opening = OpeningState {
            cash: -1.0,
            ..config.opening
        };
        let result = SessionRunner::new(&config, MockExchangeGateway::new());
        assert!(matches!(
            result,
            Err(AppError::Engine(EngineError::InvalidOpeningState(_)))
        ));
    }
}
