//! Wealth valuation.
//!
//! `wealth = cash + perp_value + hedge_value`.
//!
//! The hedge leg is valued asymmetrically: a long hedge counts at its full
//! mark value, while a flat or short hedge counts only its P&L since the
//! engine opened. The two branches are not the same measure; see DESIGN.md.

/// Value of the hedge leg.
pub fn hedge_value(hedge_position: f64, oracle_price: f64, opening_oracle_price: f64) -> f64 {
    if hedge_position > 0.0 {
        oracle_price * hedge_position
    } else {
        -hedge_position * (oracle_price - opening_oracle_price)
    }
}

/// Total wealth of the strategy.
pub fn total_wealth(
    cash: f64,
    perp_value: f64,
    hedge_position: f64,
    oracle_price: f64,
    opening_oracle_price: f64,
) -> f64 {
    cash + perp_value + hedge_value(hedge_position, oracle_price, opening_oracle_price)
}
