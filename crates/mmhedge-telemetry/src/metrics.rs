//! Prometheus metrics for the quoting loop.
//!
//! Every collector is labelled by `market` so several sessions can share one
//! process-wide registry.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a programming error surfaced on first use.

use mmhedge_core::{QuotePair, TradeType};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, Encoder,
    GaugeVec, HistogramVec, TextEncoder,
};

use crate::error::TelemetryResult;

/// Reservation price of the latest quoting tick.
pub static RESERVATION_PRICE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "mmhedge_reservation_price",
        "Reservation price of the latest quoting tick",
        &["market"]
    )
    .unwrap()
});

/// Quoted spread in price units.
pub static SPREAD: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "mmhedge_spread",
        "Quoted spread of the latest tick in price units",
        &["market"]
    )
    .unwrap()
});

pub static INVENTORY_RISK: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "mmhedge_inventory_risk",
        "Inventory risk parameter used for the latest tick",
        &["market"]
    )
    .unwrap()
});

pub static ORDER_BOOK_RISK_COEFFICIENT: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "mmhedge_order_book_risk_coefficient",
        "Order-book risk coefficient used for the latest tick",
        &["market"]
    )
    .unwrap()
});

/// Sum of actionable quote sizes.
pub static TOTAL_ORDER_SIZE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "mmhedge_total_order_size",
        "Total actionable order size of the latest tick",
        &["market"]
    )
    .unwrap()
});

pub static CURRENT_WEALTH: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "mmhedge_current_wealth",
        "Marked-to-market wealth after the latest settlement",
        &["market"]
    )
    .unwrap()
});

pub static MEAN_UNFILLED_FRACTION: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "mmhedge_mean_unfilled_fraction",
        "Mean fraction of quoted volume left unfilled",
        &["market"]
    )
    .unwrap()
});

/// Quoting ticks by trade type.
/// Labels: market, trade_type (no_trade/limit/market)
pub static TICKS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mmhedge_ticks_total",
        "Total quoting ticks by trade type",
        &["market", "trade_type"]
    )
    .unwrap()
});

/// Engine errors by kind.
pub static ENGINE_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mmhedge_engine_errors_total",
        "Total engine errors by kind",
        &["market", "kind"]
    )
    .unwrap()
});

/// Per-tick wealth return.
pub static TICK_RETURN: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "mmhedge_tick_return",
        "Per-tick wealth return",
        &["market"],
        vec![-0.01, -0.005, -0.001, -0.0005, -0.0001, 0.0, 0.0001, 0.0005, 0.001, 0.005, 0.01]
    )
    .unwrap()
});

fn trade_type_label(trade_type: TradeType) -> &'static str {
    match trade_type {
        TradeType::NoTrade => "no_trade",
        TradeType::Limit => "limit",
        TradeType::Market => "market",
    }
}

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record the pricing of a successful quoting tick.
    pub fn quotes_published(market: &str, pair: &QuotePair) {
        let pricing = &pair.pricing;
        RESERVATION_PRICE
            .with_label_values(&[market])
            .set(pricing.reservation_price);
        SPREAD.with_label_values(&[market]).set(pricing.spread);
        INVENTORY_RISK
            .with_label_values(&[market])
            .set(pricing.inventory_risk);
        ORDER_BOOK_RISK_COEFFICIENT
            .with_label_values(&[market])
            .set(pricing.order_book_risk_coefficient);
        TOTAL_ORDER_SIZE
            .with_label_values(&[market])
            .set(pair.total_order_size());
        TICKS_TOTAL
            .with_label_values(&[market, trade_type_label(pair.trade_type())])
            .inc();
    }

    /// Record the outcome of absorbing a fill report.
    pub fn settlement(market: &str, wealth: f64, tick_return: f64, mean_unfilled: f64) {
        CURRENT_WEALTH.with_label_values(&[market]).set(wealth);
        TICK_RETURN
            .with_label_values(&[market])
            .observe(tick_return);
        MEAN_UNFILLED_FRACTION
            .with_label_values(&[market])
            .set(mean_unfilled);
    }

    /// Record an engine error by its kind label.
    pub fn engine_error(market: &str, kind: &str) {
        ENGINE_ERRORS_TOTAL
            .with_label_values(&[market, kind])
            .inc();
    }

    /// Render the default registry in the text exposition format.
    pub fn gather_text() -> TelemetryResult<String> {
        let families = prometheus::gather();
        let mut buf = Vec::new();
        TextEncoder::new().encode(&families, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmhedge_core::{PricingBreakdown, Quote, QuoteSide};

    fn pair(trade_type: TradeType) -> QuotePair {
        QuotePair {
            short: Quote {
                trade_type,
                size: 6.0,
                price: 101.0,
                side: QuoteSide::Short,
            },
            long: Quote {
                trade_type,
                size: 4.0,
                price: 99.0,
                side: QuoteSide::Long,
            },
            pricing: PricingBreakdown {
                mid_market_price: 100.0,
                optimal_perp_delta: 0.0,
                inventory_risk: 0.1,
                order_book_risk_coefficient: 1.5,
                reservation_price: 100.0,
                spread: 2.0,
                total_offer_volume: 10.0,
            },
        }
    }

    #[test]
    fn test_quotes_published_sets_gauges() {
        let market = "test-quotes";
        Metrics::quotes_published(market, &pair(TradeType::Limit));
        assert_eq!(RESERVATION_PRICE.with_label_values(&[market]).get(), 100.0);
        assert_eq!(SPREAD.with_label_values(&[market]).get(), 2.0);
        assert_eq!(TOTAL_ORDER_SIZE.with_label_values(&[market]).get(), 10.0);
        assert_eq!(
            TICKS_TOTAL.with_label_values(&[market, "limit"]).get(),
            1.0
        );
    }

    #[test]
    fn test_no_trade_tick_counts_zero_size() {
        let market = "test-no-trade";
        Metrics::quotes_published(market, &pair(TradeType::NoTrade));
        assert_eq!(TOTAL_ORDER_SIZE.with_label_values(&[market]).get(), 0.0);
        assert_eq!(
            TICKS_TOTAL.with_label_values(&[market, "no_trade"]).get(),
            1.0
        );
    }

    #[test]
    fn test_settlement_and_errors() {
        let market = "test-settle";
        Metrics::settlement(market, 10_010.0, 0.001, 0.02);
        Metrics::engine_error(market, "zero_order_volume");
        Metrics::engine_error(market, "zero_order_volume");
        assert_eq!(CURRENT_WEALTH.with_label_values(&[market]).get(), 10_010.0);
        assert_eq!(TICK_RETURN.with_label_values(&[market]).get_sample_count(), 1);
        assert_eq!(
            ENGINE_ERRORS_TOTAL
                .with_label_values(&[market, "zero_order_volume"])
                .get(),
            2.0
        );
    }

    #[test]
    fn test_gather_text_contains_metrics() {
        Metrics::quotes_published("test-gather", &pair(TradeType::Market));
        let text = Metrics::gather_text().unwrap();
        assert!(text.contains("mmhedge_reservation_price"));
        assert!(text.contains("market=\"test-gather\""));
    }
}
