//! order-calc: inspect order amounts, book fills and order payloads
//!
//! Examples:
//!   order-calc amounts --side buy --amount 12.34 --market-price-cents 40
//!   order-calc fill --side buy --value 25 --book book.json
//!   order-calc build --private-key $KEY --token-id 1234 --side sell \
//!       --order-type limit --limit-price 55.5 --limit-shares 10 --shares 20

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use clob_order_engine::book::{NormalizedBook, NormalizedLevel, RawOrderBook};
use clob_order_engine::clob::ClobClient;
use clob_order_engine::config::EngineConfig;
use clob_order_engine::micro::from_micro;
use clob_order_engine::order::{parse_address, OrderBuilder, OrderParams};
use clob_order_engine::salt::OsSaltSource;
use clob_order_engine::signer::LocalSigner;
use clob_order_engine::validate::{validate_order, AccountContext, OrderDraft};
use clob_order_engine::{
    calculate_order_amounts, AmountInput, DecimalInput, OrderKind, Outcome, Side,
};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tabled::{Table, Tabled};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "order-calc")]
#[command(about = "Compute, simulate and build CLOB orders")]
struct Cli {
    /// Path to engine config YAML (defaults to $ORDER_ENGINE_CONFIG or config/engine.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print maker/taker amounts for an order
    Amounts(OrderArgs),

    /// Normalize an order book and simulate a market order against it
    Fill {
        #[arg(long)]
        side: Side,

        /// USD budget (buy) or shares (sell)
        #[arg(long)]
        value: String,

        /// Order book JSON file in CLOB /book format
        #[arg(long, conflicts_with = "token_id")]
        book: Option<PathBuf>,

        /// Fetch the book from the CLOB instead
        #[arg(long)]
        token_id: Option<String>,
    },

    /// Validate and build an order payload, signing it if a key is given
    Build {
        #[command(flatten)]
        order: OrderArgs,

        #[arg(long)]
        token_id: String,

        /// Hex private key; when absent the payload is printed unsigned
        #[arg(long, env = "ORDER_ENGINE_PRIVATE_KEY", hide_env_values = true)]
        private_key: Option<String>,

        /// Signer address (required without --private-key)
        #[arg(long)]
        signer: Option<String>,

        /// Proxy wallet holding the funds
        #[arg(long)]
        maker: Option<String>,

        #[arg(long)]
        fee_rate_bps: Option<f64>,

        /// Unix seconds; enables the custom expiration check
        #[arg(long)]
        expiration: Option<f64>,

        /// Available USD balance
        #[arg(long, default_value = "0")]
        balance: String,

        /// Available shares of the outcome
        #[arg(long, default_value = "0")]
        shares: String,
    },
}

#[derive(Args, Clone)]
struct OrderArgs {
    #[arg(long, default_value = "market")]
    order_type: OrderKind,

    #[arg(long)]
    side: Side,

    /// Market orders: USD (buy) or shares (sell)
    #[arg(long, default_value = "")]
    amount: String,

    /// Limit orders: price in cents (0-100)
    #[arg(long, default_value = "")]
    limit_price: String,

    /// Limit orders: number of shares
    #[arg(long, default_value = "")]
    limit_shares: String,

    /// Market orders: reference price in cents
    #[arg(long)]
    market_price_cents: Option<String>,
}

impl OrderArgs {
    fn amount_input(&self) -> AmountInput {
        if self.order_type == OrderKind::Market && self.market_price_cents.is_none() {
            warn!("No --market-price-cents given; taker amount assumes a price of 100c");
        }
        AmountInput {
            kind: self.order_type,
            side: self.side,
            amount: DecimalInput::parse(&self.amount),
            limit_price: DecimalInput::parse(&self.limit_price),
            limit_shares: DecimalInput::parse(&self.limit_shares),
            market_price_cents: self
                .market_price_cents
                .as_deref()
                .map(DecimalInput::parse)
                .unwrap_or(DecimalInput::INVALID),
        }
    }

    fn draft(&self, expiration: Option<f64>) -> OrderDraft {
        let input = self.amount_input();
        OrderDraft {
            kind: input.kind,
            side: input.side,
            amount: input.amount,
            limit_price: input.limit_price,
            limit_shares: input.limit_shares,
            custom_expiration: expiration.is_some(),
            expiration_timestamp: expiration,
        }
    }
}

#[derive(Tabled)]
struct LevelRow {
    side: &'static str,
    #[tabled(rename = "price (c)")]
    price_cents: String,
    size: String,
}

fn level_rows(side: &'static str, levels: &[NormalizedLevel]) -> Vec<LevelRow> {
    levels
        .iter()
        .map(|l| LevelRow {
            side,
            price_cents: l.price_cents.to_string(),
            size: l.size.to_string(),
        })
        .collect()
}

fn load_config(path: Option<PathBuf>) -> Result<EngineConfig> {
    let path = path.unwrap_or_else(|| {
        PathBuf::from(
            std::env::var("ORDER_ENGINE_CONFIG")
                .unwrap_or_else(|_| "config/engine.yaml".to_string()),
        )
    });

    if path.exists() {
        EngineConfig::load_with_env(&path).context("Failed to load configuration")
    } else {
        let mut config = EngineConfig::default();
        config.apply_env();
        Ok(config)
    }
}

fn init_logging(config: &EngineConfig) {
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&log_filter))
        .with_writer(std::io::stderr)
        .with_target(false);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    init_logging(&config);

    match cli.command {
        Commands::Amounts(args) => {
            let amounts = calculate_order_amounts(&args.amount_input());
            println!(
                "makerAmount: {} ({})",
                amounts.maker_amount,
                from_micro(amounts.maker_amount, None)
            );
            println!(
                "takerAmount: {} ({})",
                amounts.taker_amount,
                from_micro(amounts.taker_amount, None)
            );
        }
        Commands::Fill { side, value, book, token_id } => {
            let value = DecimalInput::parse(&value).non_negative();
            let book = match (book, token_id) {
                (Some(path), _) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read book file: {}", path.display()))?;
                    let raw: RawOrderBook =
                        serde_json::from_str(&text).context("Failed to parse order book")?;
                    NormalizedBook::from_raw(&raw)
                }
                (None, Some(token_id)) => {
                    let client = ClobClient::from_config(&config.exchange)?;
                    client.get_normalized_book(&token_id).await?
                }
                (None, None) => return Err(anyhow!("either --book or --token-id is required")),
            };

            let mut rows = level_rows("ask", &book.asks);
            rows.extend(level_rows("bid", &book.bids));
            println!("{}", Table::new(rows));

            let fill = book.simulate(side, value);
            let show = |v: Option<Decimal>| v.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
            println!("filled shares: {}", fill.filled_shares);
            println!("total cost:    ${}", fill.total_cost);
            println!("avg price:     {}c", show(fill.avg_price_cents));
            println!("worst price:   {}c", show(fill.limit_price_cents));
        }
        Commands::Build {
            order,
            token_id,
            private_key,
            signer,
            maker,
            fee_rate_bps,
            expiration,
            balance,
            shares,
        } => {
            let ctx = AccountContext {
                available_balance: DecimalInput::parse(&balance),
                available_shares: DecimalInput::parse(&shares),
                ..AccountContext::ready(
                    Decimal::ZERO,
                    Decimal::ZERO,
                    chrono::Utc::now().timestamp(),
                )
            };
            let rules = config.limits.rules();
            if let Err(rejection) = validate_order(&ctx, &order.draft(expiration), &rules) {
                return Err(anyhow!("{}: {}", rejection.code(), rejection));
            }

            let key = private_key.as_deref().map(LocalSigner::from_hex).transpose()?;
            let signer_address = match (&key, signer) {
                (Some(key), _) => key.address(),
                (None, Some(address)) => parse_address(&address)?,
                (None, None) => return Err(anyhow!("--private-key or --signer is required")),
            };

            let mut params =
                OrderParams::new(signer_address, Outcome::new(token_id), order.amount_input());
            params.maker = maker.as_deref().map(parse_address).transpose()?;
            params.fee_rate_bps = fee_rate_bps;
            params.expiration_timestamp = expiration;

            let mut builder = OrderBuilder::new(OsSaltSource::new()?)
                .with_defaults(config.order.fee_rate_bps, config.order.signature_type);
            let built = builder.build(&params)?;

            let json = match key {
                Some(key) => {
                    let signed = key.sign_order(
                        &built,
                        config.exchange.chain_id,
                        config.exchange.verifying_contract()?,
                    )?;
                    serde_json::to_string_pretty(&signed)?
                }
                None => {
                    info!("No private key given; printing unsigned payload");
                    serde_json::to_string_pretty(&built.to_payload())?
                }
            };
            println!("{}", json);
        }
    }

    Ok(())
}
