//! Order sizing and quote construction.
//!
//! Given the reservation price, spread and optimal perp delta, decide how
//! much to offer on each side and how urgently:
//! - `Market` when the hedge need exceeds what can be offered passively
//! - `Limit` on both sides when the spread clears the maker fee
//! - `Limit` on the imbalance-reducing side only when it does not
//! - `NoTrade` otherwise

use mmhedge_core::{MarketSnapshot, PricingBreakdown, Quote, QuotePair, QuoteSide, TradeType};

/// Offer capacity: `inventory_risk * min(cash, na * reservation, nb * reservation)`.
pub fn total_offer_volume(
    inventory_risk: f64,
    cash: f64,
    snapshot: &MarketSnapshot,
    reservation_price: f64,
) -> f64 {
    let ask_notional = snapshot.num_asks as f64 * reservation_price;
    let bid_notional = snapshot.num_bids as f64 * reservation_price;
    inventory_risk * cash.min(ask_notional).min(bid_notional)
}

/// Trade type and per-side sizes for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteSizing {
    pub trade_type: TradeType,
    pub bid_size: f64,
    pub ask_size: f64,
}

/// Split the offer volume around the hedge delta and classify the tick.
pub fn size_quotes(
    optimal_perp_delta: f64,
    total_offer_volume: f64,
    bid_offer_price: f64,
    ask_offer_price: f64,
    maker_fee: f64,
) -> QuoteSizing {
    let delta = optimal_perp_delta;
    let half = total_offer_volume / 2.0;
    let mut sizing = QuoteSizing {
        trade_type: TradeType::NoTrade,
        bid_size: half + delta,
        ask_size: half - delta,
    };

    if delta.abs() > total_offer_volume {
        sizing.trade_type = TradeType::Market;
        if delta > 0.0 {
            sizing.bid_size = delta.abs();
            sizing.ask_size = 0.0;
        } else {
            sizing.ask_size = delta.abs();
            sizing.bid_size = 0.0;
        }
    } else if ask_offer_price - bid_offer_price > maker_fee {
        sizing.trade_type = TradeType::Limit;
    } else if delta.abs() > 0.0 {
        // quote only the side that reduces the imbalance
        sizing.trade_type = TradeType::Limit;
        if delta > 0.0 {
            sizing.ask_size = 0.0;
        } else {
            sizing.bid_size = 0.0;
        }
    }

    sizing
}

/// Assemble the short and long quotes of a tick.
pub fn build_quote_pair(
    sizing: QuoteSizing,
    bid_offer_price: f64,
    ask_offer_price: f64,
    pricing: PricingBreakdown,
) -> QuotePair {
    QuotePair {
        short: Quote {
            trade_type: sizing.trade_type,
            size: sizing.ask_size,
            price: ask_offer_price,
            side: QuoteSide::Short,
        },
        long: Quote {
            trade_type: sizing.trade_type,
            size: sizing.bid_size,
            price: bid_offer_price,
            side: QuoteSide::Long,
        },
        pricing,
    }
}
