//! Maker / taker amount calculation
//!
//! The maker amount is what the order creator gives up, the taker amount is
//! what they receive:
//!   BUY:  makerAmount = USD,    takerAmount = shares
//!   SELL: makerAmount = shares, takerAmount = USD
//!
//! Everything past the initial decimal -> micro-unit conversion is integer
//! math so the result is bit-exact with what the exchange settles.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::decimal_input::DecimalInput;
use crate::micro::{from_micro, micro_scale, to_micro, to_micro_input};
use crate::models::{OrderKind, Side};

/// User-facing order inputs, already parsed
#[derive(Debug, Clone, Copy)]
pub struct AmountInput {
    pub kind: OrderKind,
    pub side: Side,
    /// Market orders: USD to spend (buy) or shares to sell (sell)
    pub amount: DecimalInput,
    /// Limit orders: cents-domain price (0-100)
    pub limit_price: DecimalInput,
    /// Limit orders: share count
    pub limit_shares: DecimalInput,
    /// Market orders: reference price in cents, 100 when absent
    pub market_price_cents: DecimalInput,
}

impl AmountInput {
    pub fn market(side: Side, amount: impl Into<DecimalInput>) -> Self {
        Self {
            kind: OrderKind::Market,
            side,
            amount: amount.into(),
            limit_price: DecimalInput::INVALID,
            limit_shares: DecimalInput::INVALID,
            market_price_cents: DecimalInput::INVALID,
        }
    }

    pub fn limit(
        side: Side,
        limit_price: impl Into<DecimalInput>,
        limit_shares: impl Into<DecimalInput>,
    ) -> Self {
        Self {
            kind: OrderKind::Limit,
            side,
            amount: DecimalInput::INVALID,
            limit_price: limit_price.into(),
            limit_shares: limit_shares.into(),
            market_price_cents: DecimalInput::INVALID,
        }
    }

    pub fn with_market_price_cents(mut self, cents: impl Into<DecimalInput>) -> Self {
        self.market_price_cents = cents.into();
        self
    }
}

/// The two integer legs of an order, in micro-units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderAmounts {
    pub maker_amount: U256,
    pub taker_amount: U256,
}

fn cents_to_fraction(cents: Decimal) -> Decimal {
    cents / Decimal::ONE_HUNDRED
}

/// Compute maker/taker amounts for any order kind.
pub fn calculate_order_amounts(input: &AmountInput) -> OrderAmounts {
    let amounts = match input.kind {
        OrderKind::Limit => limit_amounts(input.side, input.limit_price, input.limit_shares),
        OrderKind::Market => market_amounts(input.side, input.amount, input.market_price_cents),
    };

    debug!(
        "ORDER CALC: {:?} {:?} maker={} ({}) taker={} ({})",
        input.kind,
        input.side,
        amounts.maker_amount,
        from_micro(amounts.maker_amount, Some(6)),
        amounts.taker_amount,
        from_micro(amounts.taker_amount, Some(6)),
    );

    amounts
}

/// Limit order: price * shares, both scaled to micro-units, divided back down.
pub fn limit_amounts(
    side: Side,
    limit_price: DecimalInput,
    limit_shares: DecimalInput,
) -> OrderAmounts {
    let price_micro = limit_price
        .value()
        .map(|cents| to_micro(cents_to_fraction(cents)))
        .unwrap_or(U256::ZERO);
    let shares_micro = to_micro_input(limit_shares);
    let notional = price_micro * shares_micro / micro_scale();

    match side {
        Side::Buy => OrderAmounts {
            maker_amount: notional,
            taker_amount: shares_micro,
        },
        Side::Sell => OrderAmounts {
            maker_amount: shares_micro,
            taker_amount: notional,
        },
    }
}

/// Market order: the amount is the maker leg, the taker leg is priced off the
/// reference price. A zero reference price is treated as 1:1.
pub fn market_amounts(
    side: Side,
    amount: DecimalInput,
    market_price_cents: DecimalInput,
) -> OrderAmounts {
    let maker_amount = to_micro_input(amount);
    let fraction = market_price_cents
        .positive()
        .map(cents_to_fraction)
        .unwrap_or(Decimal::ONE);
    let price_micro = to_micro(fraction);

    let taker_amount = if price_micro.is_zero() {
        maker_amount
    } else {
        match side {
            Side::Buy => maker_amount * micro_scale() / price_micro,
            Side::Sell => price_micro * maker_amount / micro_scale(),
        }
    };

    OrderAmounts {
        maker_amount,
        taker_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    #[test]
    fn test_market_buy_regression() {
        let input = AmountInput::market(Side::Buy, "12.34").with_market_price_cents("40");
        let amounts = calculate_order_amounts(&input);
        assert_eq!(amounts.maker_amount, u(12_340_000));
        assert_eq!(amounts.taker_amount, u(30_850_000));
    }

    #[test]
    fn test_market_sell_prices_usd_received() {
        // 10 shares at 55c -> $5.50
        let input = AmountInput::market(Side::Sell, "10").with_market_price_cents("55");
        let amounts = calculate_order_amounts(&input);
        assert_eq!(amounts.maker_amount, u(10_000_000));
        assert_eq!(amounts.taker_amount, u(5_500_000));
    }

    #[test]
    fn test_market_price_defaults_to_one_dollar() {
        for price in [DecimalInput::INVALID, DecimalInput::parse("0"), DecimalInput::parse("-3")] {
            let input = AmountInput::market(Side::Buy, "7.5").with_market_price_cents(price);
            let amounts = calculate_order_amounts(&input);
            assert_eq!(amounts.maker_amount, u(7_500_000));
            assert_eq!(amounts.taker_amount, u(7_500_000));
        }
    }

    #[test]
    fn test_market_price_below_one_micro_is_one_to_one() {
        // 0.00001 cents -> 1e-7 dollars -> rounds to zero micro-units
        let input = AmountInput::market(Side::Buy, "3").with_market_price_cents("0.00001");
        let amounts = calculate_order_amounts(&input);
        assert_eq!(amounts.taker_amount, amounts.maker_amount);
    }

    #[test]
    fn test_limit_sell_regression() {
        let amounts = calculate_order_amounts(&AmountInput::limit(Side::Sell, "55.5", "10"));
        assert_eq!(amounts.maker_amount, u(10_000_000));
        assert_eq!(amounts.taker_amount, u(5_550_000));
    }

    #[test]
    fn test_limit_buy_regression() {
        let amounts = calculate_order_amounts(&AmountInput::limit(Side::Buy, "1.3", "10"));
        assert_eq!(amounts.maker_amount, u(130_000));
        assert_eq!(amounts.taker_amount, u(10_000_000));
    }

    #[test]
    fn test_limit_notional_truncates() {
        // 33.3c * 3.333333 shares = 1.1099998... USD -> truncated micro-units
        let amounts = calculate_order_amounts(&AmountInput::limit(Side::Buy, "33.3", "3.333333"));
        assert_eq!(amounts.taker_amount, u(3_333_333));
        assert_eq!(amounts.maker_amount, u(1_109_999));
    }

    #[test]
    fn test_amounts_serialize_both_legs() {
        let amounts = calculate_order_amounts(&AmountInput::limit(Side::Buy, "1.3", "10"));
        let json = serde_json::to_value(amounts).unwrap();
        assert_eq!(json["maker_amount"], serde_json::to_value(u(130_000)).unwrap());
        assert_eq!(json["taker_amount"], serde_json::to_value(u(10_000_000)).unwrap());
    }

    #[test]
    fn test_invalid_inputs_are_zero() {
        let amounts = calculate_order_amounts(&AmountInput::limit(Side::Buy, "abc", "10"));
        assert_eq!(amounts.maker_amount, U256::ZERO);
        assert_eq!(amounts.taker_amount, u(10_000_000));

        let amounts = calculate_order_amounts(&AmountInput::market(Side::Sell, "-4"));
        assert_eq!(amounts, OrderAmounts { maker_amount: U256::ZERO, taker_amount: U256::ZERO });
    }
}
