//! Ledger Transfer Spammer CLI
//!
//! Provisions funded accounts on a ledger service and runs the concurrent
//! transfer scenario against it, verifying every balance afterwards.

use clap::{Args, Parser, Subcommand};
use ledger_spammer::client::{HttpLedgerClient, InMemoryLedger, LedgerClient};
use ledger_spammer::config::SpammerConfig;
use ledger_spammer::provision::{account_range, provision_accounts};
use ledger_spammer::runner::Spammer;
use ledger_spammer::workloads::AmountRange;
use ledger_types::{AccountId, Currency, Money};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ledger-spammer")]
#[command(about = "Concurrent transfer spammer and balance checker for a ledger service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create funded accounts and print their ids
    Provision {
        /// Ledger API base URL
        #[arg(short, long, default_value = ledger_spammer::client::DEFAULT_BASE_URL)]
        endpoint: String,

        /// Number of accounts to create
        #[arg(long, default_value = "50")]
        accounts: usize,

        /// Initial balance per account, in whole units
        #[arg(long, default_value = "1000000")]
        balance: i64,

        /// Currency of the accounts (USD, EUR, RUB)
        #[arg(long, default_value = "USD")]
        currency: Currency,

        /// Concurrent account creation tasks
        #[arg(long, default_value = "10")]
        parallelism: usize,

        /// Per-request timeout (e.g. "500ms", "10s")
        #[arg(long, default_value = "10s")]
        timeout: humantime::Duration,
    },

    /// Run the transfer scenario and verify balances
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ledger API base URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Number of pool accounts
    #[arg(long)]
    accounts: Option<usize>,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Initial balance per account, in whole units
    #[arg(long)]
    balance: Option<u64>,

    /// Smallest transfer amount
    #[arg(long)]
    min_amount: Option<u32>,

    /// Largest transfer amount
    #[arg(long)]
    max_amount: Option<u32>,

    /// Id of the first pool account
    #[arg(long)]
    first_account: Option<AccountId>,

    /// Currency of balances and transfers (USD, EUR, RUB)
    #[arg(long)]
    currency: Option<Currency>,

    /// Seed for a reproducible workload
    #[arg(long)]
    seed: Option<u64>,

    /// Per-request timeout (e.g. "500ms", "10s")
    #[arg(long)]
    timeout: Option<humantime::Duration>,

    /// Create the account pool before running instead of using an existing one
    #[arg(long)]
    provision: bool,

    /// Run against an in-process ledger instead of the HTTP endpoint
    #[arg(long)]
    dry_run: bool,
}

impl RunArgs {
    fn into_config(self) -> Result<(SpammerConfig, bool, bool), Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => SpammerConfig::from_toml_file(path)?,
            None => SpammerConfig::default(),
        };

        if let Some(endpoint) = self.endpoint {
            config.base_url = endpoint;
        }
        if let Some(accounts) = self.accounts {
            config.account_count = accounts;
        }
        if let Some(workers) = self.workers {
            config.worker_count = workers;
        }
        if let Some(balance) = self.balance {
            config.initial_balance = balance;
        }
        if let Some(min) = self.min_amount {
            config.amount_range.min = min;
        }
        if let Some(max) = self.max_amount {
            config.amount_range.max = max;
        }
        if let Some(first) = self.first_account {
            config.first_account = first;
        }
        if let Some(currency) = self.currency {
            config.currency = currency;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout = *timeout;
        }

        config.validate()?;
        Ok((config, self.provision, self.dry_run))
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

async fn run<C>(
    config: SpammerConfig,
    client: Arc<C>,
    provision: bool,
) -> Result<(), Box<dyn std::error::Error>>
where
    C: LedgerClient + 'static,
{
    let spammer = Spammer::new(config, client)?;

    let accounts = if provision {
        spammer.provision().await?
    } else {
        spammer.accounts()?
    };

    println!(
        "Running {} workers over {} accounts...",
        spammer.config().worker_count,
        accounts.len()
    );
    let report = spammer.run_on(&accounts).await?;
    report.print();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Provision {
            endpoint,
            accounts,
            balance,
            currency,
            parallelism,
            timeout,
        } => {
            let client = Arc::new(HttpLedgerClient::new(endpoint, *timeout)?);
            let balance = Money::from_units(balance, currency);
            let created = provision_accounts(client, accounts, balance, parallelism).await?;
            for account in created {
                println!("{account}");
            }
        }

        Commands::Run(args) => {
            let (config, provision, dry_run) = args.into_config()?;

            if dry_run {
                info!("Dry run against an in-process ledger");
                let ledger = if provision {
                    InMemoryLedger::new(config.currency)
                } else {
                    InMemoryLedger::with_accounts(
                        account_range(config.first_account, config.account_count)?,
                        config.initial_money()?,
                    )
                };
                run(config, Arc::new(ledger), provision).await?;
            } else {
                let client = HttpLedgerClient::new(&config.base_url, config.request_timeout)?;
                info!(endpoint = client.base_url(), "Targeting ledger");
                run(config, Arc::new(client), provision).await?;
            }
        }
    }

    Ok(())
}
