//! Order-book snapshot normalization and market-fill simulation
//!
//! Raw CLOB levels arrive as decimal strings in the 0..1 price domain. They
//! are normalized onto a tenth-of-a-cent grid (asks round up, bids round down)
//! and sorted best-first, then walked to estimate what a market order fills.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::decimal_input::DecimalInput;
use crate::models::Side;

/// Highest representable cents-domain price
pub const MAX_PRICE_CENTS: Decimal = Decimal::from_parts(999, 0, 0, false, 1);

/// Absorbs representation jitter before ceil/floor (1e-8)
const PRICE_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 8);

/// Tenths of a cent per dollar
const PRICE_GRID: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Order book snapshot as returned by the CLOB `/book` endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOrderBook {
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub asset_id: String,
    #[serde(default)]
    pub bids: Vec<RawLevel>,
    #[serde(default)]
    pub asks: Vec<RawLevel>,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLevel {
    pub price: String,
    pub size: String,
}

impl RawLevel {
    pub fn new(price: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            price: price.into(),
            size: size.into(),
        }
    }
}

/// Which side of the book a level list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    Ask,
    Bid,
}

/// A level after normalization. `price_cents > 0` and `size > 0` always hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedLevel {
    pub price_cents: Decimal,
    pub price_dollars: Decimal,
    pub size: Decimal,
}

/// Round a 0..1 price onto the cents grid for the given side, capped at 99.9.
pub fn price_to_cents(price: Decimal, side: BookSide) -> Decimal {
    // Anything at or above a dollar lands on the cap anyway
    let scaled = price.min(Decimal::ONE) * PRICE_GRID;
    let tenths = match side {
        BookSide::Ask => (scaled - PRICE_EPSILON).ceil(),
        BookSide::Bid => (scaled + PRICE_EPSILON).floor(),
    };
    (tenths / Decimal::TEN).min(MAX_PRICE_CENTS).normalize()
}

/// Parse, round, filter and sort one side of a raw book.
pub fn normalize_levels(levels: &[RawLevel], side: BookSide) -> Vec<NormalizedLevel> {
    let mut normalized: Vec<NormalizedLevel> = levels
        .iter()
        .filter_map(|level| {
            let price = DecimalInput::parse(&level.price).positive()?;
            let size = DecimalInput::parse(&level.size).positive()?;

            let price_cents = price_to_cents(price, side);
            let size = size
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
                .normalize();
            if price_cents <= Decimal::ZERO || size <= Decimal::ZERO {
                return None;
            }

            Some(NormalizedLevel {
                price_cents,
                price_dollars: price_cents / Decimal::ONE_HUNDRED,
                size,
            })
        })
        .collect();

    match side {
        BookSide::Ask => normalized.sort_by(|a, b| a.price_dollars.cmp(&b.price_dollars)),
        BookSide::Bid => normalized.sort_by(|a, b| b.price_dollars.cmp(&a.price_dollars)),
    }
    normalized
}

/// Both sides of a book, normalized
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizedBook {
    pub asks: Vec<NormalizedLevel>,
    pub bids: Vec<NormalizedLevel>,
}

impl NormalizedBook {
    pub fn from_raw(book: &RawOrderBook) -> Self {
        Self {
            asks: normalize_levels(&book.asks, BookSide::Ask),
            bids: normalize_levels(&book.bids, BookSide::Bid),
        }
    }

    pub fn best_ask_cents(&self) -> Option<Decimal> {
        self.asks.first().map(|l| l.price_cents)
    }

    pub fn best_bid_cents(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price_cents)
    }

    /// Price a market order would reference: best ask for buys, best bid for sells
    pub fn reference_price_cents(&self, side: Side) -> Option<Decimal> {
        match side {
            Side::Buy => self.best_ask_cents(),
            Side::Sell => self.best_bid_cents(),
        }
    }

    pub fn simulate(&self, side: Side, value: Decimal) -> FillEstimate {
        simulate_market_fill(side, value, &self.asks, &self.bids)
    }
}

/// Outcome of walking the book for a market order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillEstimate {
    /// Volume-weighted average fill price, `None` if nothing filled
    pub avg_price_cents: Option<Decimal>,
    /// Price of the last level touched; the worst price the order reaches
    pub limit_price_cents: Option<Decimal>,
    pub filled_shares: Decimal,
    pub total_cost: Decimal,
}

impl FillEstimate {
    pub fn empty() -> Self {
        Self {
            avg_price_cents: None,
            limit_price_cents: None,
            filled_shares: Decimal::ZERO,
            total_cost: Decimal::ZERO,
        }
    }
}

fn round4(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Estimate the fill of a market order.
///
/// A buy spends `value` dollars walking the asks; a sell offers `value`
/// shares walking the bids. Levels must already be normalized (best first).
pub fn simulate_market_fill(
    side: Side,
    value: Decimal,
    asks: &[NormalizedLevel],
    bids: &[NormalizedLevel],
) -> FillEstimate {
    let levels = match side {
        Side::Buy => asks,
        Side::Sell => bids,
    };
    if levels.is_empty() || value <= Decimal::ZERO {
        return FillEstimate::empty();
    }

    let mut remaining = value;
    let mut filled_shares = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    let mut limit_price_cents = None;

    for level in levels {
        if remaining <= Decimal::ZERO {
            break;
        }

        let available = match side {
            Side::Sell => remaining,
            // A budget too large to divide covers the whole level
            Side::Buy if level.price_dollars > Decimal::ZERO => remaining
                .checked_div(level.price_dollars)
                .unwrap_or(level.size),
            Side::Buy => Decimal::ZERO,
        };
        let fill = round4(level.size.min(available));
        if fill <= Decimal::ZERO {
            break;
        }

        let Some(cost) = fill.checked_mul(level.price_dollars) else {
            break;
        };
        let (Some(shares), Some(spent)) = (
            filled_shares.checked_add(fill),
            total_cost.checked_add(cost),
        ) else {
            break;
        };
        filled_shares = round4(shares);
        total_cost = round4(spent);
        remaining = match side {
            Side::Sell => round4(remaining - fill),
            Side::Buy => round4(remaining - cost),
        };
        limit_price_cents = Some(level.price_cents);
    }

    if filled_shares <= Decimal::ZERO {
        return FillEstimate::empty();
    }

    let avg = (total_cost / filled_shares * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        .normalize();

    FillEstimate {
        avg_price_cents: Some(avg),
        limit_price_cents,
        filled_shares: filled_shares.normalize(),
        total_cost: total_cost.normalize(),
    }
}
