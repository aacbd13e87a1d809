//! HTTP client for the ledger REST API.

use super::types::{
    ApiMonetaryAmount, CreateAccountRequest, CreateAccountResponse, GetBalanceResponse,
    TransferMoneyRequest, TransferMoneyResponse,
};
use super::{ClientError, LedgerClient};
use async_trait::async_trait;
use ledger_types::{AccountId, Money, TransferOutcome};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::trace;

/// Default base URL of a locally running ledger.
pub const DEFAULT_BASE_URL: &str = "http://localhost:18080/bank/api";

/// Ledger client speaking JSON over HTTP.
///
/// Cheap to share: the underlying `reqwest::Client` pools connections and is
/// safe for concurrent use, so every call is an independent round trip.
#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLedgerClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read the body and decode it.
    ///
    /// The HTTP status is not checked: the ledger delivers
    /// application errors with 200 and `RetryAfter` with 503, and both must
    /// be classified from the body.
    async fn read_json<T: DeserializeOwned>(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<(T, String), ClientError> {
        let status = response.status();
        let body = response.text().await?;
        trace!(operation, %status, body = %body, "Ledger response");

        match serde_json::from_str(&body) {
            Ok(parsed) => Ok((parsed, body)),
            Err(source) => Err(ClientError::Decode {
                operation,
                body,
                source,
            }),
        }
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn create_account(&self, balance: &Money) -> Result<AccountId, ClientError> {
        const OPERATION: &str = "create account";

        let request = CreateAccountRequest {
            balance: ApiMonetaryAmount::from(balance),
        };
        let response = self
            .client
            .post(self.url("/account/create"))
            .json(&request)
            .send()
            .await?;

        let (parsed, body): (CreateAccountResponse, _) =
            Self::read_json(OPERATION, response).await?;
        match parsed.account {
            Some(account) => Ok(account),
            None if parsed.errors.is_some() => Err(ClientError::Rejected {
                operation: OPERATION,
                body,
            }),
            None => Err(ClientError::MissingField {
                operation: OPERATION,
                field: "account",
                body,
            }),
        }
    }

    async fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: &Money,
    ) -> Result<TransferOutcome, ClientError> {
        let request = TransferMoneyRequest {
            source,
            destination,
            amount: ApiMonetaryAmount::from(amount),
        };
        let response = self
            .client
            .post(self.url("/transfer"))
            .json(&request)
            .send()
            .await?;

        let (parsed, body): (TransferMoneyResponse, _) =
            Self::read_json("transfer", response).await?;
        let outcome = parsed.outcome();
        if outcome.is_fatal() {
            return Err(ClientError::Rejected {
                operation: "transfer",
                body,
            });
        }
        Ok(outcome)
    }

    async fn get_balance(&self, account: AccountId) -> Result<Money, ClientError> {
        const OPERATION: &str = "get balance";

        let response = self
            .client
            .get(self.url(&format!("/account/{}/balance", account)))
            .send()
            .await?;

        let (parsed, body): (GetBalanceResponse, _) = Self::read_json(OPERATION, response).await?;
        match parsed.balance {
            Some(balance) => Ok(balance.to_money()?),
            None if parsed.errors.is_some() => Err(ClientError::Rejected {
                operation: OPERATION,
                body,
            }),
            None => Err(ClientError::MissingField {
                operation: OPERATION,
                field: "balance",
                body,
            }),
        }
    }
}
