//! Stateful quoting engine.
//!
//! Holds strategy state across ticks and exposes the two-phase tick
//! protocol:
//! - `update_position`: market snapshot → `QuotePair` (Settled/Quoted → Quoted)
//! - `update_returns`: fill report → estimator update (Quoted → Settled)
//! - `withdraw_quotes`: nothing was placed (Quoted → Settled, no update)
//!
//! Both operations are transactional: every intermediate value is computed
//! before any field is written, so an `Err` leaves the engine untouched.

use mmhedge_core::{FillReport, MarketSnapshot, OpeningState, PricingBreakdown, QuotePair};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::pricing;
use crate::quote_engine;
use crate::risk::{self, CoefficientStep};
use crate::stats::{OnlineStats, RecentWindow};
use crate::wealth;

/// Whether the estimators have enough history to leave their fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Return history length ≤ `warmup_period`: fixed warm-up inventory risk.
    WarmingUp,
    /// Return history length > `warmup_period`: statistically estimated.
    Calibrated,
}

/// Position in the tick protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No quotes awaiting settlement.
    Settled,
    /// Quotes issued; the next fill report settles them.
    Quoted,
}

/// Quoting engine for one market.
///
/// Not `Sync`-guarded: a multi-threaded host must serialize calls.
#[derive(Debug, Clone)]
pub struct QuotingEngine {
    config: EngineConfig,

    cash: f64,
    perp_value: f64,
    perp_position: f64,
    hedge_position: f64,
    opening_oracle_price: f64,
    oracle_price: f64,

    order_book_risk_coefficient: f64,
    inventory_risk: f64,
    total_order_size: f64,
    current_wealth: f64,
    running_mean_return: f64,

    returns: OnlineStats,
    unfilled: OnlineStats,
    recent_returns: RecentWindow,
    recent_unfilled: RecentWindow,

    phase: Phase,
    regime: Regime,
}

impl QuotingEngine {
    /// Create an engine from configuration and the opening account state.
    pub fn new(config: EngineConfig, opening: OpeningState) -> EngineResult<Self> {
        config.validate()?;
        validate_opening(&opening)?;

        let current_wealth = wealth::total_wealth(
            opening.cash,
            opening.perp_value,
            opening.hedge_position,
            opening.oracle_price,
            opening.oracle_price,
        );

        info!(
            cash = opening.cash,
            perp_value = opening.perp_value,
            hedge_position = opening.hedge_position,
            oracle_price = opening.oracle_price,
            wealth = current_wealth,
            warmup_period = config.warmup_period,
            "Quoting engine initialized"
        );

        Ok(Self {
            cash: opening.cash,
            perp_value: opening.perp_value,
            perp_position: opening.perp_position,
            hedge_position: opening.hedge_position,
            opening_oracle_price: opening.oracle_price,
            oracle_price: opening.oracle_price,
            order_book_risk_coefficient: config.order_book_risk_coefficient,
            inventory_risk: config.warmup_risk_level,
            total_order_size: 0.0,
            current_wealth,
            running_mean_return: 0.0,
            returns: OnlineStats::new(),
            unfilled: OnlineStats::new(),
            recent_returns: RecentWindow::new(config.history_window),
            recent_unfilled: RecentWindow::new(config.history_window),
            phase: Phase::Settled,
            regime: Regime::WarmingUp,
            config,
        })
    }

    /// Produce the tick's short and long quotes from a market snapshot.
    pub fn update_position(&mut self, snapshot: &MarketSnapshot) -> EngineResult<QuotePair> {
        snapshot.validate()?;

        let mid_market_price = pricing::mid_market_price(snapshot)?;
        let optimal_perp_delta = pricing::optimal_perp_delta(
            snapshot,
            self.hedge_position,
            self.config.tick_fraction_of_hour(),
        );
        let inventory_risk =
            risk::inventory_risk(&self.config, self.running_mean_return, &self.returns)?;
        let reservation_price = pricing::reservation_price(
            mid_market_price,
            optimal_perp_delta,
            inventory_risk,
            snapshot.volatility,
        );

        let step = risk::order_book_step(&self.config, &self.unfilled);
        let coefficient = step.apply(
            self.order_book_risk_coefficient,
            self.config.order_book_risk_step,
        );
        let spread = risk::spread(inventory_risk, snapshot.volatility, coefficient)?;

        let bid_offer_price = reservation_price - spread / 2.0;
        let ask_offer_price = reservation_price + spread / 2.0;
        let total_offer_volume = quote_engine::total_offer_volume(
            inventory_risk,
            self.cash,
            snapshot,
            reservation_price,
        );

        let sizing = quote_engine::size_quotes(
            optimal_perp_delta,
            total_offer_volume,
            bid_offer_price,
            ask_offer_price,
            self.config.maker_fee,
        );
        let pricing = PricingBreakdown {
            mid_market_price,
            optimal_perp_delta,
            inventory_risk,
            order_book_risk_coefficient: coefficient,
            reservation_price,
            spread,
            total_offer_volume,
        };
        let pair =
            quote_engine::build_quote_pair(sizing, bid_offer_price, ask_offer_price, pricing);
        ensure_finite_quotes(&pair)?;

        // commit
        self.oracle_price = snapshot.oracle_price;
        self.perp_position = snapshot.perp_position;
        self.inventory_risk = inventory_risk;
        if step != CoefficientStep::Hold {
            debug!(
                ?step,
                from = self.order_book_risk_coefficient,
                to = coefficient,
                mean_unfilled = self.unfilled.mean(),
                "Order book risk coefficient adjusted"
            );
        }
        self.order_book_risk_coefficient = coefficient;
        self.total_order_size = pair.total_order_size();
        if self.phase == Phase::Quoted {
            debug!("Re-quoting before settlement; previous order size overwritten");
        }
        self.phase = Phase::Quoted;
        self.refresh_regime();

        debug!(
            mid = mid_market_price,
            delta = optimal_perp_delta,
            inventory_risk,
            reservation = reservation_price,
            spread,
            trade_type = %pair.trade_type(),
            bid_size = pair.long.size,
            ask_size = pair.short.size,
            total_order_size = self.total_order_size,
            "Quotes computed"
        );

        Ok(pair)
    }

    /// Absorb the settlement of the last quotes and update the estimators.
    pub fn update_returns(&mut self, report: &FillReport) -> EngineResult<()> {
        if self.phase != Phase::Quoted {
            return Err(EngineError::NoOutstandingQuotes);
        }
        validate_fill_report(report)?;
        if self.total_order_size == 0.0 {
            return Err(EngineError::ZeroOrderVolume);
        }
        if self.current_wealth == 0.0 {
            return Err(EngineError::ZeroWealthBase);
        }

        let pct_unfilled = report.unfilled_size / self.total_order_size;
        let new_wealth = wealth::total_wealth(
            report.cash,
            report.perp_value,
            self.hedge_position,
            self.oracle_price,
            self.opening_oracle_price,
        );
        let trade_return = (new_wealth - self.current_wealth) / self.current_wealth;
        if !pct_unfilled.is_finite() || !trade_return.is_finite() {
            return Err(EngineError::NonFiniteResult {
                what: "trade return",
            });
        }

        let n = self.returns.count() as f64;
        let running_mean_return = (self.running_mean_return * n + trade_return) / (n + 1.0);

        // commit
        self.cash = report.cash;
        self.perp_value = report.perp_value;
        self.unfilled.push(pct_unfilled);
        self.recent_unfilled.push(pct_unfilled);
        self.returns.push(trade_return);
        self.recent_returns.push(trade_return);
        self.running_mean_return = running_mean_return;
        self.current_wealth = new_wealth;
        self.phase = Phase::Settled;

        debug!(
            pct_unfilled,
            trade_return,
            running_mean_return,
            wealth = new_wealth,
            returns = self.returns.count(),
            "Returns updated"
        );

        Ok(())
    }

    /// Drop the outstanding quotes without settling them.
    ///
    /// For a host that placed none of the quoted orders: the following fill
    /// report is then refused with `NoOutstandingQuotes` instead of being
    /// absorbed against volume that never reached the book. Estimator
    /// histories are untouched. Returns whether quotes were outstanding.
    pub fn withdraw_quotes(&mut self) -> bool {
        if self.phase != Phase::Quoted {
            return false;
        }
        debug!(
            total_order_size = self.total_order_size,
            "Outstanding quotes withdrawn"
        );
        self.total_order_size = 0.0;
        self.phase = Phase::Settled;
        true
    }

    fn refresh_regime(&mut self) {
        let regime = self.regime();
        if regime != self.regime {
            info!(
                returns = self.returns.count(),
                warmup_period = self.config.warmup_period,
                inventory_risk = self.inventory_risk,
                "Estimators calibrated; leaving warm-up"
            );
            self.regime = regime;
        }
    }

    /// Seconds between ticks, for the host's scheduling loop.
    pub fn tick_interval_secs(&self) -> f64 {
        self.config.tick_interval_secs
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Derived from the return history length.
    pub fn regime(&self) -> Regime {
        if self.returns.count() > self.config.warmup_period {
            Regime::Calibrated
        } else {
            Regime::WarmingUp
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn perp_value(&self) -> f64 {
        self.perp_value
    }

    pub fn perp_position(&self) -> f64 {
        self.perp_position
    }

    pub fn hedge_position(&self) -> f64 {
        self.hedge_position
    }

    pub fn opening_oracle_price(&self) -> f64 {
        self.opening_oracle_price
    }

    pub fn oracle_price(&self) -> f64 {
        self.oracle_price
    }

    pub fn current_wealth(&self) -> f64 {
        self.current_wealth
    }

    /// Inventory risk used by the most recent quote.
    pub fn inventory_risk(&self) -> f64 {
        self.inventory_risk
    }

    pub fn order_book_risk_coefficient(&self) -> f64 {
        self.order_book_risk_coefficient
    }

    pub fn total_order_size(&self) -> f64 {
        self.total_order_size
    }

    pub fn running_mean_return(&self) -> f64 {
        self.running_mean_return
    }

    /// Number of returns recorded over the engine's lifetime.
    pub fn return_count(&self) -> usize {
        self.returns.count()
    }

    /// Number of unfilled fractions recorded over the engine's lifetime.
    pub fn unfilled_count(&self) -> usize {
        self.unfilled.count()
    }

    pub fn mean_unfilled_fraction(&self) -> f64 {
        self.unfilled.mean()
    }

    /// Population standard deviation of all recorded returns.
    pub fn return_std(&self) -> f64 {
        self.returns.population_std()
    }

    /// Return recorded by the latest successful `update_returns`.
    pub fn last_return(&self) -> Option<f64> {
        self.recent_returns.last()
    }

    /// Most recent returns, oldest first, at most `history_window` long.
    pub fn recent_returns(&self) -> Vec<f64> {
        self.recent_returns.to_vec()
    }

    /// Most recent unfilled fractions, oldest first.
    pub fn recent_unfilled_fractions(&self) -> Vec<f64> {
        self.recent_unfilled.to_vec()
    }
}

fn validate_opening(opening: &OpeningState) -> EngineResult<()> {
    let fields = [
        ("perp_value", opening.perp_value),
        ("perp_position", opening.perp_position),
        ("hedge_position", opening.hedge_position),
        ("cash", opening.cash),
        ("oracle_price", opening.oracle_price),
    ];
    if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
        return Err(EngineError::InvalidOpeningState(format!(
            "{name} is not finite: {value}"
        )));
    }
    if opening.cash < 0.0 {
        return Err(EngineError::InvalidOpeningState(format!(
            "cash must be non-negative, got {}",
            opening.cash
        )));
    }
    if opening.oracle_price <= 0.0 {
        return Err(EngineError::InvalidOpeningState(format!(
            "oracle_price must be positive, got {}",
            opening.oracle_price
        )));
    }
    Ok(())
}

fn validate_fill_report(report: &FillReport) -> EngineResult<()> {
    let fields = [
        ("unfilled_size", report.unfilled_size),
        ("perp_value", report.perp_value),
        ("cash", report.cash),
    ];
    if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
        return Err(EngineError::InvalidFillReport(format!(
            "{name} is not finite: {value}"
        )));
    }
    if report.unfilled_size < 0.0 {
        return Err(EngineError::InvalidFillReport(format!(
            "unfilled_size must be non-negative, got {}",
            report.unfilled_size
        )));
    }
    Ok(())
}

fn ensure_finite_quotes(pair: &QuotePair) -> EngineResult<()> {
    for quote in pair.iter() {
        if !quote.price.is_finite() {
            return Err(EngineError::NonFiniteResult {
                what: "quote price",
            });
        }
        if !quote.size.is_finite() {
            return Err(EngineError::NonFiniteResult { what: "quote size" });
        }
    }
    Ok(())
}
