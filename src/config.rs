use anyhow::{anyhow, Context, Result};
use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::models::SignatureType;
use crate::order::{parse_address, DEFAULT_FEE_RATE_BPS};
use crate::validate::{ValidationRules, MARKET_MIN_BUY_USD, MIN_LIMIT_SHARES};

/// CTF Exchange contract address on Polygon
pub const CTF_EXCHANGE: &str = "0x4bFb41d5B3570DeFd03C39a9A4D8dE6Bd8B8982E";

/// Polygon chain ID
pub const POLYGON_CHAIN_ID: u64 = 137;

/// Bounds on the order-book request timeout (ms)
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 5_000;
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 20_000;

/// Engine configuration loaded from YAML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub order: OrderConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderConfig {
    /// Fee rate in basis points when the caller gives none
    #[serde(default = "default_fee_rate_bps")]
    pub fee_rate_bps: u64,
    /// 0 = EOA, 1 = proxy, 2 = Gnosis Safe
    #[serde(default)]
    pub signature_type: u8,
}

fn default_fee_rate_bps() -> u64 { DEFAULT_FEE_RATE_BPS }

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            fee_rate_bps: DEFAULT_FEE_RATE_BPS,
            signature_type: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Smallest limit order, in shares
    #[serde(default = "default_min_limit_shares")]
    pub min_limit_shares: Decimal,
    /// Smallest market buy, in USD
    #[serde(default = "default_market_min_buy_usd")]
    pub market_min_buy_usd: Decimal,
}

fn default_min_limit_shares() -> Decimal { MIN_LIMIT_SHARES }
fn default_market_min_buy_usd() -> Decimal { MARKET_MIN_BUY_USD }

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_limit_shares: MIN_LIMIT_SHARES,
            market_min_buy_usd: MARKET_MIN_BUY_USD,
        }
    }
}

impl LimitsConfig {
    pub fn rules(&self) -> ValidationRules {
        ValidationRules {
            min_limit_shares: self.min_limit_shares,
            market_min_buy_usd: self.market_min_buy_usd,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Exchange contract used as the EIP-712 verifying contract
    #[serde(default = "default_verifying_contract")]
    pub verifying_contract: String,
    #[serde(default = "default_clob_url")]
    pub clob_url: String,
    /// Order book request timeout (ms), clamped to 5-20s
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_chain_id() -> u64 { POLYGON_CHAIN_ID }
fn default_verifying_contract() -> String { CTF_EXCHANGE.to_string() }
fn default_clob_url() -> String { "https://clob.polymarket.com".to_string() }
fn default_request_timeout_ms() -> u64 { 10_000 }

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            chain_id: POLYGON_CHAIN_ID,
            verifying_contract: CTF_EXCHANGE.to_string(),
            clob_url: default_clob_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ExchangeConfig {
    pub fn verifying_contract(&self) -> Result<Address> {
        parse_address(&self.verifying_contract)
            .map_err(|e| anyhow!("exchange.verifying_contract: {}", e))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.request_timeout_ms
                .clamp(MIN_REQUEST_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level / EnvFilter directive
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of text
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(contents)
            .with_context(|| "Failed to parse YAML configuration")?;
        config.check()?;
        Ok(config)
    }

    /// Load configuration from YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&contents)
    }

    /// Load with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env();
        config.check()?;
        Ok(config)
    }

    /// Apply `ORDER_ENGINE_*` / `POLYMARKET_CLOB_URL` overrides. Unparseable
    /// values are ignored with a warning.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("ORDER_ENGINE_FEE_RATE_BPS") {
            match val.parse() {
                Ok(v) => self.order.fee_rate_bps = v,
                Err(_) => warn!("Ignoring ORDER_ENGINE_FEE_RATE_BPS={}", val),
            }
        }
        if let Ok(val) = std::env::var("ORDER_ENGINE_SIGNATURE_TYPE") {
            match val.parse() {
                Ok(v) => self.order.signature_type = v,
                Err(_) => warn!("Ignoring ORDER_ENGINE_SIGNATURE_TYPE={}", val),
            }
        }
        if let Ok(val) = std::env::var("ORDER_ENGINE_CHAIN_ID") {
            match val.parse() {
                Ok(v) => self.exchange.chain_id = v,
                Err(_) => warn!("Ignoring ORDER_ENGINE_CHAIN_ID={}", val),
            }
        }
        if let Ok(val) = std::env::var("ORDER_ENGINE_VERIFYING_CONTRACT") {
            self.exchange.verifying_contract = val;
        }
        if let Ok(val) = std::env::var("POLYMARKET_CLOB_URL") {
            self.exchange.clob_url = val;
        }
    }

    fn check(&self) -> Result<()> {
        SignatureType::try_from(self.order.signature_type)
            .map_err(|e| anyhow!("order.signature_type: {}", e))?;
        if self.limits.min_limit_shares.is_sign_negative()
            || self.limits.market_min_buy_usd.is_sign_negative()
        {
            return Err(anyhow!("limits must not be negative"));
        }
        self.exchange.verifying_contract()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_match_platform_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.order.fee_rate_bps, 200);
        assert_eq!(config.order.signature_type, 0);
        assert_eq!(config.limits.rules(), ValidationRules::default());
        assert_eq!(config.exchange.chain_id, 137);
        assert!(config.exchange.verifying_contract().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = EngineConfig::from_yaml(
            "order:\n  fee_rate_bps: 0\nlimits:\n  min_limit_shares: \"10\"\n",
        )
        .unwrap();
        assert_eq!(config.order.fee_rate_bps, 0);
        assert_eq!(config.limits.min_limit_shares, dec!(10));
        assert_eq!(config.limits.market_min_buy_usd, dec!(1));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(EngineConfig::from_yaml("order:\n  signature_type: 7\n").is_err());
        assert!(EngineConfig::from_yaml("exchange:\n  verifying_contract: nope\n").is_err());
    }

    #[test]
    fn test_timeout_is_bounded() {
        let mut exchange = ExchangeConfig::default();
        exchange.request_timeout_ms = 100;
        assert_eq!(exchange.request_timeout(), Duration::from_secs(5));
        exchange.request_timeout_ms = 60_000;
        assert_eq!(exchange.request_timeout(), Duration::from_secs(20));
    }
}
