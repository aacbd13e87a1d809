//! Core types shared by the ledger spammer.
//!
//! - [`AccountId`]: identifier assigned by the ledger on account creation
//! - [`Money`]: two-digit fixed-point amount with a [`Currency`]
//! - [`encode_amount`]: the canonical amount codec (truncate toward zero)
//! - [`TransferOutcome`]: classification of a transfer attempt

mod identifiers;
mod money;
mod outcome;

pub use identifiers::AccountId;
pub use money::{
    encode_amount, parse_decimal, truncate_amount, AmountError, Currency, Money, AMOUNT_SCALE,
};
pub use outcome::TransferOutcome;

/// Re-exported so callers can build [`Money`] without a direct dependency.
pub use rust_decimal::Decimal;
