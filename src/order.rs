//! CTF exchange order record and payload builder

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::amounts::{calculate_order_amounts, AmountInput};
use crate::error::{EngineError, Result};
use crate::micro::from_micro;
use crate::models::{Outcome, Side};
use crate::salt::SaltSource;

/// Fee rate applied when the caller does not supply one
pub const DEFAULT_FEE_RATE_BPS: u64 = 200;

/// Fully populated order, ready for typed-data hashing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub salt: U256,
    /// Holder of the funds (EOA or proxy wallet)
    pub maker: Address,
    /// EOA producing the signature
    pub signer: Address,
    /// Always zero: anyone may fill
    pub taker: Address,
    pub token_id: U256,
    pub maker_amount: U256,
    pub taker_amount: U256,
    /// Unix seconds, 0 = never expires
    pub expiration: U256,
    pub nonce: U256,
    pub fee_rate_bps: U256,
    pub side: Side,
    pub signature_type: u8,
}

/// Transport form of [`Order`]: integers become decimal strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub salt: String,
    pub maker: String,
    pub signer: String,
    pub taker: String,
    pub token_id: String,
    pub maker_amount: String,
    pub taker_amount: String,
    pub expiration: String,
    pub nonce: String,
    pub fee_rate_bps: String,
    pub side: u8,
    pub signature_type: u8,
}

impl Order {
    pub fn to_payload(&self) -> OrderPayload {
        OrderPayload {
            salt: self.salt.to_string(),
            maker: self.maker.to_checksum(None),
            signer: self.signer.to_checksum(None),
            taker: self.taker.to_checksum(None),
            token_id: self.token_id.to_string(),
            maker_amount: self.maker_amount.to_string(),
            taker_amount: self.taker_amount.to_string(),
            expiration: self.expiration.to_string(),
            nonce: self.nonce.to_string(),
            fee_rate_bps: self.fee_rate_bps.to_string(),
            side: self.side.as_u8(),
            signature_type: self.signature_type,
        }
    }
}

/// Everything needed to build one order
#[derive(Debug, Clone)]
pub struct OrderParams {
    pub signer: Address,
    pub outcome: Outcome,
    /// Proxy wallet holding the funds; the signer when absent
    pub maker: Option<Address>,
    pub signature_type: Option<u8>,
    pub fee_rate_bps: Option<f64>,
    pub expiration_timestamp: Option<f64>,
    pub nonce: Option<U256>,
    pub amounts: AmountInput,
}

impl OrderParams {
    pub fn new(signer: Address, outcome: Outcome, amounts: AmountInput) -> Self {
        Self {
            signer,
            outcome,
            maker: None,
            signature_type: None,
            fee_rate_bps: None,
            expiration_timestamp: None,
            nonce: None,
            amounts,
        }
    }
}

/// Negative clamps to 0, NaN/infinite falls back to `default`, fractions truncate.
pub fn coerce_fee_rate_bps(value: Option<f64>, default: u64) -> u64 {
    match value {
        None => default,
        Some(v) if !v.is_finite() => default,
        Some(v) if v < 0.0 => 0,
        Some(v) => v.trunc() as u64,
    }
}

/// Same rules as the fee rate, with 0 (no expiration) as the fallback.
pub fn coerce_expiration(value: Option<f64>) -> u64 {
    coerce_fee_rate_bps(value, 0)
}

pub fn parse_token_id(token_id: &str) -> Result<U256> {
    U256::from_str_radix(token_id.trim(), 10)
        .map_err(|_| EngineError::InvalidTokenId(token_id.to_string()))
}

pub fn parse_address(address: &str) -> Result<Address> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|_| EngineError::InvalidAddress(address.to_string()))
}

/// Builds orders with a shared salt source and default fee rate
pub struct OrderBuilder<S: SaltSource> {
    salts: S,
    default_fee_rate_bps: u64,
    default_signature_type: u8,
}

impl<S: SaltSource> OrderBuilder<S> {
    pub fn new(salts: S) -> Self {
        Self {
            salts,
            default_fee_rate_bps: DEFAULT_FEE_RATE_BPS,
            default_signature_type: 0,
        }
    }

    pub fn with_defaults(mut self, fee_rate_bps: u64, signature_type: u8) -> Self {
        self.default_fee_rate_bps = fee_rate_bps;
        self.default_signature_type = signature_type;
        self
    }

    /// Assemble a fresh order. Only an unparseable token id fails.
    pub fn build(&mut self, params: &OrderParams) -> Result<Order> {
        let token_id = parse_token_id(&params.outcome.token_id)?;
        let amounts = calculate_order_amounts(&params.amounts);

        let fee_rate_bps = coerce_fee_rate_bps(params.fee_rate_bps, self.default_fee_rate_bps);
        let expiration = coerce_expiration(params.expiration_timestamp);

        let order = Order {
            salt: self.salts.next_salt(),
            maker: params.maker.unwrap_or(params.signer),
            signer: params.signer,
            taker: Address::ZERO,
            token_id,
            maker_amount: amounts.maker_amount,
            taker_amount: amounts.taker_amount,
            expiration: U256::from(expiration),
            nonce: params.nonce.unwrap_or(U256::ZERO),
            fee_rate_bps: U256::from(fee_rate_bps),
            side: params.amounts.side,
            signature_type: params.signature_type.unwrap_or(self.default_signature_type),
        };

        info!(
            "Built {} order: maker={} pays {} for {} (fee {}bps, expires {})",
            order.side.as_str(),
            order.maker,
            from_micro(order.maker_amount, Some(6)),
            from_micro(order.taker_amount, Some(6)),
            fee_rate_bps,
            expiration,
        );

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::salt::FixedSalt;

    const SIGNER: &str = "0x1111111111111111111111111111111111111111";
    const PROXY: &str = "0x2222222222222222222222222222222222222222";

    fn params() -> OrderParams {
        OrderParams::new(
            parse_address(SIGNER).unwrap(),
            Outcome::new(
                "71321045679252212594626385532706912750332728571942532289631379312455583992563",
            ),
            AmountInput::limit(Side::Buy, "1.3", "10"),
        )
    }

    fn builder() -> OrderBuilder<FixedSalt> {
        OrderBuilder::new(FixedSalt::new(U256::from(777u32)))
    }

    #[test]
    fn test_fee_rate_coercion() {
        assert_eq!(coerce_fee_rate_bps(None, 200), 200);
        assert_eq!(coerce_fee_rate_bps(Some(-10.0), 200), 0);
        assert_eq!(coerce_fee_rate_bps(Some(f64::NAN), 200), 200);
        assert_eq!(coerce_fee_rate_bps(Some(f64::INFINITY), 200), 200);
        assert_eq!(coerce_fee_rate_bps(Some(150.9), 200), 150);
    }

    #[test]
    fn test_expiration_coercion() {
        assert_eq!(coerce_expiration(None), 0);
        assert_eq!(coerce_expiration(Some(-5.0)), 0);
        assert_eq!(coerce_expiration(Some(f64::NAN)), 0);
        assert_eq!(coerce_expiration(Some(1_700_000_000.7)), 1_700_000_000);
    }

    #[test]
    fn test_defaults() {
        let order = builder().build(&params()).unwrap();
        assert_eq!(order.salt, U256::from(777u32));
        assert_eq!(order.maker, order.signer);
        assert_eq!(order.taker, Address::ZERO);
        assert_eq!(order.nonce, U256::ZERO);
        assert_eq!(order.fee_rate_bps, U256::from(200u32));
        assert_eq!(order.expiration, U256::ZERO);
        assert_eq!(order.signature_type, 0);
        assert_eq!(order.maker_amount, U256::from(130_000u32));
        assert_eq!(order.taker_amount, U256::from(10_000_000u32));
    }

    #[test]
    fn test_proxy_maker_and_overrides() {
        let mut p = params();
        p.maker = Some(parse_address(PROXY).unwrap());
        p.signature_type = Some(1);
        p.fee_rate_bps = Some(150.9);
        p.expiration_timestamp = Some(1_900_000_000.0);
        let order = builder().build(&p).unwrap();
        assert_eq!(order.maker, parse_address(PROXY).unwrap());
        assert_eq!(order.signer, parse_address(SIGNER).unwrap());
        assert_eq!(order.signature_type, 1);
        assert_eq!(order.fee_rate_bps, U256::from(150u32));
        assert_eq!(order.expiration, U256::from(1_900_000_000u64));
    }

    #[test]
    fn test_bad_token_id() {
        let mut p = params();
        p.outcome = Outcome::new("0xnot-decimal");
        assert!(matches!(builder().build(&p), Err(EngineError::InvalidTokenId(_))));
    }

    #[test]
    fn test_payload_serializes_integers_as_strings() {
        let payload = builder().build(&params()).unwrap().to_payload();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["salt"], "777");
        assert_eq!(json["makerAmount"], "130000");
        assert_eq!(json["takerAmount"], "10000000");
        assert_eq!(json["feeRateBps"], "200");
        assert_eq!(json["taker"], "0x0000000000000000000000000000000000000000");
        assert_eq!(json["side"], 0);
        assert_eq!(json["signatureType"], 0);
        assert!(json["tokenId"].as_str().unwrap().starts_with("713210456792"));
    }
}
