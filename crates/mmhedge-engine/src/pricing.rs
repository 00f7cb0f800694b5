//! Mid-market price, optimal perp delta and reservation price.

use mmhedge_core::MarketSnapshot;

use crate::error::{EngineError, EngineResult};

/// Depth-weighted mid: `(nb * bid + na * ask) / (nb + na)`.
///
/// Evaluated as `bid + na * (ask - bid) / (nb + na)`, which is exact when
/// `bid == ask`.
pub fn mid_market_price(snapshot: &MarketSnapshot) -> EngineResult<f64> {
    let total = snapshot.total_depth();
    if total == 0 {
        return Err(EngineError::DegenerateMarketDepth);
    }
    let ask_weight = snapshot.num_asks as f64 / total as f64;
    Ok(snapshot.bid_price + (snapshot.ask_price - snapshot.bid_price) * ask_weight)
}

/// Target hedge adjustment from the book/oracle basis plus one tick of funding carry.
///
/// `x = 1 - (ask + bid) / (2 * oracle)`. A book trading rich to oracle
/// (`x < 0`) subtracts the negative funding rate, a cheap book (`x > 0`)
/// adds the positive one. Funding rates are hourly.
pub fn optimal_perp_delta(
    snapshot: &MarketSnapshot,
    hedge_position: f64,
    tick_fraction_of_hour: f64,
) -> f64 {
    let basis = 1.0 - (snapshot.ask_price + snapshot.bid_price) / (2.0 * snapshot.oracle_price);
    if basis < 0.0 {
        hedge_position * (basis - snapshot.neg_funding_rate * tick_fraction_of_hour)
    } else if basis > 0.0 {
        hedge_position * (basis + snapshot.pos_funding_rate * tick_fraction_of_hour)
    } else {
        0.0
    }
}

/// `mid - delta * inventory_risk * volatility`.
pub fn reservation_price(
    mid_market_price: f64,
    optimal_perp_delta: f64,
    inventory_risk: f64,
    volatility: f64,
) -> f64 {
    mid_market_price - optimal_perp_delta * inventory_risk * volatility
}
