//! Order construction, pricing and validation for CTF-exchange CLOB orders.
//!
//! Turns user input (dollar amounts, cents-domain limit prices, share counts)
//! into exact micro-unit order fields, estimates market fills against an order
//! book snapshot, and gates submission with a deterministic validator.

pub mod amounts;
pub mod book;
pub mod clob;
pub mod config;
pub mod decimal_input;
pub mod eip712;
pub mod error;
pub mod micro;
pub mod models;
pub mod order;
pub mod salt;
pub mod signer;
pub mod validate;

pub use amounts::{calculate_order_amounts, AmountInput, OrderAmounts};
pub use book::{
    normalize_levels, simulate_market_fill, BookSide, FillEstimate, NormalizedBook,
    NormalizedLevel, RawLevel, RawOrderBook,
};
pub use decimal_input::DecimalInput;
pub use error::{EngineError, Result};
pub use micro::{from_micro, to_cents, to_micro};
pub use models::{OrderKind, Outcome, Side, SignatureType};
pub use order::{Order, OrderBuilder, OrderParams, OrderPayload};
pub use salt::{FixedSalt, OsSaltSource, SaltSource};
pub use signer::{LocalSigner, SignedOrder};
pub use validate::{validate_order, AccountContext, OrderDraft, OrderRejection, ValidationRules};
