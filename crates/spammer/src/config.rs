//! Configuration for spammer runs.

use crate::client::DEFAULT_BASE_URL;
use crate::workloads::AmountRange;
use ledger_types::{AccountId, Currency, Money};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration for a transfer run.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpammerConfig {
    /// Ledger API base URL.
    pub base_url: String,

    /// Number of accounts in the pool.
    pub account_count: usize,

    /// Id of the first pool account; the pool is contiguous.
    pub first_account: AccountId,

    /// Number of parallel transfer workers.
    pub worker_count: usize,

    /// Balance every pool account starts with, in whole units.
    pub initial_balance: u64,

    /// Range transfer amounts are drawn from, in whole units.
    pub amount_range: AmountRange,

    /// Currency of balances and transfers.
    pub currency: Currency,

    /// Seed for reproducible workloads. Entropy when absent.
    pub seed: Option<u64>,

    /// Per-request timeout.
    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,

    /// Concurrent requests used for provisioning and verification.
    pub provision_parallelism: usize,
}

impl SpammerConfig {
    /// Create a configuration for the ledger at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            account_count: 50,
            first_account: AccountId(1_000_000_001),
            worker_count: 10,
            initial_balance: 1_000_000,
            amount_range: AmountRange::default(),
            currency: Currency::default(),
            seed: None,
            request_timeout: Duration::from_secs(10),
            provision_parallelism: 10,
        }
    }

    /// Load a configuration from a TOML file. Missing keys keep their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the number of pool accounts.
    pub fn with_account_count(mut self, count: usize) -> Self {
        self.account_count = count;
        self
    }

    /// Set the first pool account.
    pub fn with_first_account(mut self, account: AccountId) -> Self {
        self.first_account = account;
        self
    }

    /// Set the number of workers.
    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    /// Set the initial balance per account.
    pub fn with_initial_balance(mut self, balance: u64) -> Self {
        self.initial_balance = balance;
        self
    }

    /// Set the transfer amount range.
    pub fn with_amount_range(mut self, range: AmountRange) -> Self {
        self.amount_range = range;
        self
    }

    /// Set the currency.
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set provisioning and verification parallelism.
    pub fn with_provision_parallelism(mut self, parallelism: usize) -> Self {
        self.provision_parallelism = parallelism;
        self
    }

    /// Initial balance as money.
    pub fn initial_money(&self) -> Result<Money, ConfigError> {
        i64::try_from(self.initial_balance)
            .map(|units| Money::from_units(units, self.currency))
            .map_err(|_| {
                ConfigError::Invalid(format!(
                    "initial_balance {} is too large",
                    self.initial_balance
                ))
            })
    }

    /// Seed of worker `index`'s transfer policy.
    pub fn worker_seed(&self, index: usize) -> Option<u64> {
        self.seed
            .map(|seed| seed.wrapping_add(1).wrapping_add(index as u64))
    }

    /// Check that the configuration can drive a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::Invalid(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if !self.amount_range.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "amount_range {} must satisfy 1 <= min <= max",
                self.amount_range
            )));
        }
        if self.provision_parallelism == 0 {
            return Err(ConfigError::Invalid(
                "provision_parallelism must be at least 1".to_string(),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url is empty".to_string()));
        }
        let last_offset = (self.account_count as u64).saturating_sub(1);
        if self.first_account.offset(last_offset).is_none() {
            return Err(ConfigError::Invalid(format!(
                "{} accounts starting at {} overflow the id space",
                self.account_count, self.first_account
            )));
        }
        self.initial_money()?;
        Ok(())
    }
}

impl Default for SpammerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

/// Errors loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SpammerConfig::default();
        assert_eq!(config.base_url, "http://localhost:18080/bank/api");
        assert_eq!(config.account_count, 50);
        assert_eq!(config.worker_count, 10);
        assert_eq!(config.first_account, AccountId(1_000_000_001));
        assert_eq!(config.amount_range, AmountRange::new(10, 30));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(
            config.initial_money().unwrap(),
            Money::from_units(1_000_000, Currency::Usd)
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
base_url = "http://ledger:8080/bank/api"
account_count = 4
worker_count = 2
currency = "EUR"
seed = 7
request_timeout = "1500ms"

[amount_range]
min = 1
max = 5
"#
        )
        .unwrap();

        let config = SpammerConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.base_url, "http://ledger:8080/bank/api");
        assert_eq!(config.account_count, 4);
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.currency, Currency::Eur);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        assert_eq!(config.amount_range, AmountRange::new(1, 5));
        // Untouched keys keep their defaults.
        assert_eq!(config.initial_balance, 1_000_000);
        assert_eq!(config.first_account, AccountId(1_000_000_001));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let base = SpammerConfig::default();
        for config in [
            base.clone().with_worker_count(0),
            base.clone().with_amount_range(AmountRange::new(0, 5)),
            base.clone().with_amount_range(AmountRange::new(30, 10)),
            base.clone().with_provision_parallelism(0),
            base.clone().with_first_account(AccountId(u64::MAX)),
            base.clone().with_initial_balance(u64::MAX),
        ] {
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn test_file_errors() {
        let err = SpammerConfig::from_toml_file("/nonexistent/spammer.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let err = SpammerConfig::from_toml_str("worker_count = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = SpammerConfig::from_toml_str("workers = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = SpammerConfig::from_toml_str("worker_count = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_worker_seeds() {
        let config = SpammerConfig::default().with_seed(100);
        assert_eq!(config.worker_seed(0), Some(101));
        assert_eq!(config.worker_seed(3), Some(104));
        assert_eq!(SpammerConfig::default().worker_seed(0), None);
    }
}
