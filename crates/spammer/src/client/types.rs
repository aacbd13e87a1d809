//! Types for ledger RPC communication.

use ledger_types::{AccountId, AmountError, Currency, Decimal, Money, TransferOutcome};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Status reported for an applied transfer.
pub const SUCCESS_STATUS: &str = "Success";

/// Application error code asking the caller to come back later.
pub const RETRY_AFTER_CODE: &str = "RetryAfter";

/// Monetary amount as sent to the ledger.
#[derive(Debug, Serialize)]
pub struct ApiMonetaryAmount {
    /// Fixed two-digit string, truncated toward zero.
    pub amount: String,
    pub currency: Currency,
}

impl From<&Money> for ApiMonetaryAmount {
    fn from(money: &Money) -> Self {
        Self {
            amount: money.to_wire_string(),
            currency: money.currency(),
        }
    }
}

/// Request to create an account.
#[derive(Debug, Serialize)]
pub struct CreateAccountRequest {
    pub balance: ApiMonetaryAmount,
}

/// Response from account creation.
#[derive(Debug, Deserialize)]
pub struct CreateAccountResponse {
    pub account: Option<AccountId>,
    pub errors: Option<ApiErrors>,
}

/// Request to transfer money between accounts.
#[derive(Debug, Serialize)]
pub struct TransferMoneyRequest {
    pub source: AccountId,
    pub destination: AccountId,
    pub amount: ApiMonetaryAmount,
}

/// Response from a transfer.
#[derive(Debug, Default, Deserialize)]
pub struct TransferMoneyResponse {
    pub status: Option<String>,
    pub errors: Option<ApiErrors>,
}

impl TransferMoneyResponse {
    /// Classify the response.
    ///
    /// Only an explicit `RetryAfter` application code is retryable. Every
    /// other application error, including ones that may well be transient,
    /// is fatal.
    pub fn outcome(&self) -> TransferOutcome {
        if self.status.as_deref() == Some(SUCCESS_STATUS) {
            return TransferOutcome::Success;
        }
        match self.application_code() {
            Some(RETRY_AFTER_CODE) => TransferOutcome::RetryableFailure,
            _ => TransferOutcome::FatalFailure,
        }
    }

    /// The application error code, if any.
    pub fn application_code(&self) -> Option<&str> {
        self.errors
            .as_ref()
            .and_then(|errors| errors.application.as_ref())
            .and_then(|application| application.code.as_deref())
    }
}

/// Errors block of a ledger response.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrors {
    pub application: Option<ApiApplicationError>,
    #[serde(default)]
    pub validation: Vec<ApiValidationError>,
}

/// Application-level error.
#[derive(Debug, Default, Deserialize)]
pub struct ApiApplicationError {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Request validation error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiValidationError {
    pub param_name: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Response from the balance endpoint.
#[derive(Debug, Deserialize)]
pub struct GetBalanceResponse {
    pub balance: Option<ApiBalance>,
    pub errors: Option<ApiErrors>,
}

/// Monetary amount as returned by the ledger.
#[derive(Debug, Deserialize)]
pub struct ApiBalance {
    pub amount: WireDecimal,
    pub currency: Currency,
}

impl ApiBalance {
    /// Convert to [`Money`], truncating any excess precision.
    pub fn to_money(&self) -> Result<Money, AmountError> {
        Ok(Money::new(self.amount.to_decimal()?, self.currency))
    }
}

/// A decimal sent either as a JSON string or as a JSON number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireDecimal {
    Text(String),
    Number(serde_json::Number),
}

impl WireDecimal {
    pub fn to_decimal(&self) -> Result<Decimal, AmountError> {
        match self {
            WireDecimal::Text(text) => ledger_types::parse_decimal(text),
            WireDecimal::Number(number) => {
                let text = number.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| ledger_types::parse_decimal(&text))
                    .map_err(|_| AmountError::NotANumber(text))
            }
        }
    }
}
