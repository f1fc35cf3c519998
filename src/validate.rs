//! Pre-signature order validation.
//!
//! An ordered gate chain: the first failing gate wins, so the precedence of
//! rejections is deterministic. Pure and synchronous.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::decimal_input::DecimalInput;
use crate::models::{OrderKind, Side};

/// Minimum share count of a limit order
pub const MIN_LIMIT_SHARES: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Minimum USD amount of a market buy
pub const MARKET_MIN_BUY_USD: Decimal = Decimal::ONE;

/// Why an order may not be submitted. Every variant has exactly one
/// user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderRejection {
    #[error("Please wait while your account data loads.")]
    IsLoading,
    #[error("Connect your wallet to trade.")]
    NotConnected,
    #[error("Sign in to place an order.")]
    MissingUser,
    #[error("Select a market before trading.")]
    MissingMarket,
    #[error("Select an outcome before trading.")]
    MissingOutcome,
    #[error("Enter an amount greater than zero.")]
    InvalidAmount,
    #[error("Market buys are below the minimum order amount.")]
    MarketMinAmount,
    #[error("Enter a valid limit price.")]
    InvalidLimitPrice,
    #[error("Enter a valid number of shares.")]
    InvalidLimitShares,
    #[error("Limit orders are below the minimum share count.")]
    LimitSharesTooLow,
    #[error("Choose an expiration time in the future.")]
    InvalidLimitExpiration,
    #[error("Insufficient balance for this order.")]
    InsufficientBalance,
    #[error("You don't have enough shares to sell.")]
    InsufficientShares,
}

impl OrderRejection {
    pub const ALL: [OrderRejection; 13] = [
        OrderRejection::IsLoading,
        OrderRejection::NotConnected,
        OrderRejection::MissingUser,
        OrderRejection::MissingMarket,
        OrderRejection::MissingOutcome,
        OrderRejection::InvalidAmount,
        OrderRejection::MarketMinAmount,
        OrderRejection::InvalidLimitPrice,
        OrderRejection::InvalidLimitShares,
        OrderRejection::LimitSharesTooLow,
        OrderRejection::InvalidLimitExpiration,
        OrderRejection::InsufficientBalance,
        OrderRejection::InsufficientShares,
    ];

    /// Stable machine tag, e.g. `"INSUFFICIENT_BALANCE"`
    pub fn code(self) -> &'static str {
        match self {
            OrderRejection::IsLoading => "IS_LOADING",
            OrderRejection::NotConnected => "NOT_CONNECTED",
            OrderRejection::MissingUser => "MISSING_USER",
            OrderRejection::MissingMarket => "MISSING_MARKET",
            OrderRejection::MissingOutcome => "MISSING_OUTCOME",
            OrderRejection::InvalidAmount => "INVALID_AMOUNT",
            OrderRejection::MarketMinAmount => "MARKET_MIN_AMOUNT",
            OrderRejection::InvalidLimitPrice => "INVALID_LIMIT_PRICE",
            OrderRejection::InvalidLimitShares => "INVALID_LIMIT_SHARES",
            OrderRejection::LimitSharesTooLow => "LIMIT_SHARES_TOO_LOW",
            OrderRejection::InvalidLimitExpiration => "INVALID_LIMIT_EXPIRATION",
            OrderRejection::InsufficientBalance => "INSUFFICIENT_BALANCE",
            OrderRejection::InsufficientShares => "INSUFFICIENT_SHARES",
        }
    }
}

/// Session and account state, passed in explicitly
#[derive(Debug, Clone, Copy)]
pub struct AccountContext {
    pub is_loading: bool,
    pub is_connected: bool,
    pub has_user: bool,
    pub has_market: bool,
    pub has_outcome: bool,
    /// Spendable USD
    pub available_balance: DecimalInput,
    /// Shares of the selected outcome
    pub available_shares: DecimalInput,
    /// Current unix time in seconds
    pub now_secs: i64,
}

impl AccountContext {
    /// A connected, signed-in user with a market and outcome selected
    pub fn ready(available_balance: Decimal, available_shares: Decimal, now_secs: i64) -> Self {
        Self {
            is_loading: false,
            is_connected: true,
            has_user: true,
            has_market: true,
            has_outcome: true,
            available_balance: available_balance.into(),
            available_shares: available_shares.into(),
            now_secs,
        }
    }
}

/// The order as the user has entered it so far
#[derive(Debug, Clone, Copy)]
pub struct OrderDraft {
    pub kind: OrderKind,
    pub side: Side,
    pub amount: DecimalInput,
    pub limit_price: DecimalInput,
    pub limit_shares: DecimalInput,
    pub custom_expiration: bool,
    pub expiration_timestamp: Option<f64>,
}

impl OrderDraft {
    pub fn market(side: Side, amount: impl Into<DecimalInput>) -> Self {
        Self {
            kind: OrderKind::Market,
            side,
            amount: amount.into(),
            limit_price: DecimalInput::INVALID,
            limit_shares: DecimalInput::INVALID,
            custom_expiration: false,
            expiration_timestamp: None,
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
            custom_expiration: false,
            expiration_timestamp: None,
        }
    }

    pub fn with_expiration(mut self, timestamp: f64) -> Self {
        self.custom_expiration = true;
        self.expiration_timestamp = Some(timestamp);
        self
    }
}

/// Platform minimums
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub min_limit_shares: Decimal,
    pub market_min_buy_usd: Decimal,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_limit_shares: MIN_LIMIT_SHARES,
            market_min_buy_usd: MARKET_MIN_BUY_USD,
        }
    }
}

fn expiration_is_valid(timestamp: Option<f64>, now_secs: i64) -> bool {
    match timestamp {
        Some(ts) => ts.is_finite() && ts > 0.0 && ts > now_secs as f64,
        None => false,
    }
}

/// Run the gate chain. `Ok(())` means the order may go to signing.
pub fn validate_order(
    ctx: &AccountContext,
    draft: &OrderDraft,
    rules: &ValidationRules,
) -> Result<(), OrderRejection> {
    if ctx.is_loading {
        return Err(OrderRejection::IsLoading);
    }
    if !ctx.is_connected {
        return Err(OrderRejection::NotConnected);
    }
    if !ctx.has_user {
        return Err(OrderRejection::MissingUser);
    }
    if !ctx.has_market {
        return Err(OrderRejection::MissingMarket);
    }
    if !ctx.has_outcome {
        return Err(OrderRejection::MissingOutcome);
    }

    // Unparseable or negative balances count as nothing available
    let balance = ctx.available_balance.non_negative();
    let shares = ctx.available_shares.non_negative();

    match draft.kind {
        OrderKind::Limit => {
            let price = draft
                .limit_price
                .positive()
                .ok_or(OrderRejection::InvalidLimitPrice)?;
            let limit_shares = draft
                .limit_shares
                .positive()
                .ok_or(OrderRejection::InvalidLimitShares)?;
            if limit_shares < rules.min_limit_shares {
                return Err(OrderRejection::LimitSharesTooLow);
            }
            if draft.custom_expiration
                && !expiration_is_valid(draft.expiration_timestamp, ctx.now_secs)
            {
                return Err(OrderRejection::InvalidLimitExpiration);
            }
            match draft.side {
                Side::Buy => {
                    let cost = (price / Decimal::ONE_HUNDRED).checked_mul(limit_shares);
                    match cost {
                        Some(cost) if cost <= balance => Ok(()),
                        _ => Err(OrderRejection::InsufficientBalance),
                    }
                }
                Side::Sell if limit_shares > shares => Err(OrderRejection::InsufficientShares),
                Side::Sell => Ok(()),
            }
        }
        OrderKind::Market => {
            let amount = draft.amount.or_zero();
            if amount <= Decimal::ZERO {
                return Err(OrderRejection::InvalidAmount);
            }
            match draft.side {
                Side::Buy if amount < rules.market_min_buy_usd => {
                    Err(OrderRejection::MarketMinAmount)
                }
                Side::Buy if amount > balance => Err(OrderRejection::InsufficientBalance),
                Side::Sell if amount > shares => Err(OrderRejection::InsufficientShares),
                _ => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    const NOW: i64 = 1_700_000_000;

    fn ctx() -> AccountContext {
        AccountContext::ready(dec!(100), dec!(50), NOW)
    }

    fn check(ctx: &AccountContext, draft: &OrderDraft) -> Result<(), OrderRejection> {
        validate_order(ctx, draft, &ValidationRules::default())
    }

    #[test]
    fn test_loading_wins_over_disconnected() {
        let mut c = ctx();
        c.is_loading = true;
        c.is_connected = false;
        assert_eq!(check(&c, &OrderDraft::market(Side::Buy, "5")), Err(OrderRejection::IsLoading));
    }

    #[test]
    fn test_session_gates_in_order() {
        let draft = OrderDraft::market(Side::Buy, "5");

        let mut c = ctx();
        c.is_connected = false;
        c.has_user = false;
        assert_eq!(check(&c, &draft), Err(OrderRejection::NotConnected));

        let mut c = ctx();
        c.has_user = false;
        c.has_market = false;
        assert_eq!(check(&c, &draft), Err(OrderRejection::MissingUser));

        let mut c = ctx();
        c.has_market = false;
        c.has_outcome = false;
        assert_eq!(check(&c, &draft), Err(OrderRejection::MissingMarket));

        let mut c = ctx();
        c.has_outcome = false;
        assert_eq!(check(&c, &draft), Err(OrderRejection::MissingOutcome));
    }

    #[test]
    fn test_limit_price_and_shares() {
        let c = ctx();
        assert_eq!(
            check(&c, &OrderDraft::limit(Side::Buy, "", "10")),
            Err(OrderRejection::InvalidLimitPrice)
        );
        assert_eq!(
            check(&c, &OrderDraft::limit(Side::Buy, "0", "10")),
            Err(OrderRejection::InvalidLimitPrice)
        );
        assert_eq!(
            check(&c, &OrderDraft::limit(Side::Buy, "40", "x")),
            Err(OrderRejection::InvalidLimitShares)
        );
        assert_eq!(
            check(&c, &OrderDraft::limit(Side::Buy, "40", "-1")),
            Err(OrderRejection::InvalidLimitShares)
        );
        assert_eq!(
            check(&c, &OrderDraft::limit(Side::Buy, "40", "4.99")),
            Err(OrderRejection::LimitSharesTooLow)
        );
        assert_eq!(check(&c, &OrderDraft::limit(Side::Buy, "40", "5")), Ok(()));
    }

    #[test]
    fn test_limit_buy_insufficient_balance() {
        // 0.8 * 200 = 160 > 100
        assert_eq!(
            check(&ctx(), &OrderDraft::limit(Side::Buy, "80", "200")),
            Err(OrderRejection::InsufficientBalance)
        );
        // 0.5 * 200 = 100, exactly affordable
        assert_eq!(check(&ctx(), &OrderDraft::limit(Side::Buy, "50", "200")), Ok(()));
    }

    #[test]
    fn test_limit_sell_inventory() {
        assert_eq!(check(&ctx(), &OrderDraft::limit(Side::Sell, "60", "50")), Ok(()));
        assert_eq!(
            check(&ctx(), &OrderDraft::limit(Side::Sell, "60", "50.01")),
            Err(OrderRejection::InsufficientShares)
        );

        let mut c = ctx();
        c.available_shares = DecimalInput::INVALID;
        assert_eq!(
            check(&c, &OrderDraft::limit(Side::Sell, "60", "5")),
            Err(OrderRejection::InsufficientShares)
        );
        c.available_shares = DecimalInput::parse("-20");
        assert_eq!(
            check(&c, &OrderDraft::limit(Side::Sell, "60", "5")),
            Err(OrderRejection::InsufficientShares)
        );
    }

    #[test]
    fn test_expiration_must_be_strictly_future() {
        let draft = OrderDraft::limit(Side::Buy, "40", "10");
        assert_eq!(
            check(&ctx(), &draft.with_expiration(NOW as f64)),
            Err(OrderRejection::InvalidLimitExpiration)
        );
        assert_eq!(check(&ctx(), &draft.with_expiration((NOW + 1) as f64)), Ok(()));
        assert_eq!(
            check(&ctx(), &draft.with_expiration(f64::NAN)),
            Err(OrderRejection::InvalidLimitExpiration)
        );

        let mut missing = draft;
        missing.custom_expiration = true;
        assert_eq!(check(&ctx(), &missing), Err(OrderRejection::InvalidLimitExpiration));

        // Ignored unless enabled
        let mut disabled = draft.with_expiration(0.0);
        disabled.custom_expiration = false;
        assert_eq!(check(&ctx(), &disabled), Ok(()));
    }

    #[test]
    fn test_expiration_checked_before_balance() {
        let draft = OrderDraft::limit(Side::Buy, "80", "200").with_expiration(1.0);
        assert_eq!(check(&ctx(), &draft), Err(OrderRejection::InvalidLimitExpiration));
    }

    #[test]
    fn test_market_gates() {
        let c = ctx();
        assert_eq!(
            check(&c, &OrderDraft::market(Side::Buy, "0")),
            Err(OrderRejection::InvalidAmount)
        );
        assert_eq!(
            check(&c, &OrderDraft::market(Side::Buy, "junk")),
            Err(OrderRejection::InvalidAmount)
        );
        assert_eq!(
            check(&c, &OrderDraft::market(Side::Buy, "0.99")),
            Err(OrderRejection::MarketMinAmount)
        );
        assert_eq!(
            check(&c, &OrderDraft::market(Side::Buy, "100.01")),
            Err(OrderRejection::InsufficientBalance)
        );
        assert_eq!(check(&c, &OrderDraft::market(Side::Buy, "100")), Ok(()));
        // no $1 minimum on sells
        assert_eq!(check(&c, &OrderDraft::market(Side::Sell, "0.5")), Ok(()));
        assert_eq!(
            check(&c, &OrderDraft::market(Side::Sell, "51")),
            Err(OrderRejection::InsufficientShares)
        );
    }

    #[test]
    fn test_every_rejection_has_its_own_message_and_code() {
        let messages: HashSet<String> = OrderRejection::ALL.iter().map(|r| r.to_string()).collect();
        let codes: HashSet<&str> = OrderRejection::ALL.iter().map(|r| r.code()).collect();
        assert_eq!(messages.len(), OrderRejection::ALL.len());
        assert_eq!(codes.len(), OrderRejection::ALL.len());
        assert_eq!(
            serde_json::to_value(OrderRejection::LimitSharesTooLow).unwrap(),
            "LIMIT_SHARES_TOO_LOW"
        );
    }
}
