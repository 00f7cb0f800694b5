//! Exact decimal quantities for the gateway boundary.
//!
//! The engine itself works in `f64` (it needs `ln`, `powf` and variance).
//! Quotes are converted to `Price` / `Size` only when they become orders,
//! so tick and lot snapping happens in exact decimal arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Shared constructors, conversions and formatting of the quantity newtypes.
macro_rules! decimal_quantity {
    ($name:ident, $invalid:ident) => {
        impl $name {
            pub const ZERO: Self = Self(Decimal::ZERO);

            #[inline]
            pub fn new(value: Decimal) -> Self {
                Self(value)
            }

            /// Convert an engine-side float. NaN, infinities and negative
            /// values are rejected.
            pub fn from_f64(value: f64) -> Result<Self> {
                if !value.is_finite() || value < 0.0 {
                    return Err(CoreError::$invalid(value.to_string()));
                }
                Decimal::from_f64_retain(value)
                    .map(Self)
                    .ok_or_else(|| CoreError::$invalid(format!("{value} exceeds decimal range")))
            }

            #[inline]
            pub fn inner(&self) -> Decimal {
                self.0
            }

            #[inline]
            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }

            /// Snap onto a multiple of `step`; a zero step leaves the value as is.
            fn snap(&self, step: Decimal, strategy: RoundingStrategy) -> Self {
                if step.is_zero() {
                    return *self;
                }
                let steps = (self.0 / step).round_dp_with_strategy(0, strategy);
                Self((steps * step).normalize())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = rust_decimal::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl From<Decimal> for $name {
            fn from(value: Decimal) -> Self {
                Self(value)
            }
        }
    };
}

/// Order price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

decimal_quantity!(Price, InvalidPrice);

impl Price {
    /// Bid side: largest tick multiple not above the price.
    #[inline]
    pub fn round_to_tick(&self, tick_size: Price) -> Self {
        self.snap(tick_size.0, RoundingStrategy::ToNegativeInfinity)
    }

    /// Ask side: smallest tick multiple not below the price.
    #[inline]
    pub fn round_up_to_tick(&self, tick_size: Price) -> Self {
        self.snap(tick_size.0, RoundingStrategy::ToPositiveInfinity)
    }
}

/// Order quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(pub Decimal);

decimal_quantity!(Size, InvalidSize);

impl Size {
    /// Whole lots only, rounding down.
    #[inline]
    pub fn round_to_lot(&self, lot_size: Size) -> Self {
        self.snap(lot_size.0, RoundingStrategy::ToNegativeInfinity)
    }
}
