use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use uuid::Uuid;

use crate::api::{self, ServerOptions};
use crate::application::WalletService;
use crate::domain::{Wallet, format_cents, parse_cents};
use crate::logging::init_logging;
use crate::storage::{LedgerStore, MemoryStore, SqliteStore};

/// Wallet Ledger - monetary wallets over HTTP
#[derive(Parser)]
#[command(name = "wallet-ledger")]
#[command(about = "A minimal ledger of monetary wallets served over HTTP")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, global = true, env = "WALLET_DATABASE", default_value = "wallet.db")]
    pub database: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "WALLET_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Run the HTTP server
    Serve(ServeArgs),

    /// Wallet management commands
    #[command(subcommand)]
    Wallet(WalletCommands),
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "WALLET_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Storage driver
    #[arg(long, env = "WALLET_STORAGE", value_enum, default_value_t = StorageKind::Sqlite)]
    pub storage: StorageKind,

    /// Give up on a SQLite call that has not staged its write after this many
    /// milliseconds (ignored by the memory driver)
    #[arg(long, env = "WALLET_STORE_TIMEOUT_MS")]
    pub store_timeout_ms: Option<u64>,

    /// Abort a request after this many seconds
    #[arg(long, env = "WALLET_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Time allowed for in-flight requests to finish on shutdown
    #[arg(long, env = "WALLET_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    /// Durable SQLite database at --database
    Sqlite,
    /// Process memory; everything is lost on exit
    Memory,
}

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Create a new wallet
    Create {
        /// Currency code (e.g., "USD")
        currency: String,
    },

    /// Show a wallet
    Show {
        /// Wallet ID
        id: String,
    },

    /// Deposit into a wallet
    Deposit {
        /// Wallet ID
        id: String,

        /// Amount (e.g., "50.00" or "50")
        amount: String,
    },

    /// Withdraw from a wallet
    Withdraw {
        /// Wallet ID
        id: String,

        /// Amount (e.g., "50.00" or "50")
        amount: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_logging(self.log_json);

        match self.command {
            Commands::Init => {
                WalletService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Serve(args) => {
                let sqlite = match args.storage {
                    StorageKind::Sqlite => {
                        let mut store = SqliteStore::open(&self.database).await?;
                        if let Some(ms) = args.store_timeout_ms {
                            store = store.with_timeout(Duration::from_millis(ms));
                        }
                        Some(store)
                    }
                    StorageKind::Memory => None,
                };
                let store: Arc<dyn LedgerStore> = match &sqlite {
                    Some(store) => Arc::new(store.clone()),
                    None => Arc::new(MemoryStore::new()),
                };
                info!(storage = ?args.storage, database = %self.database, "store ready");

                let options = ServerOptions {
                    listen: args.listen,
                    request_timeout: Duration::from_secs(args.request_timeout_secs),
                    shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
                };
                let served = api::serve(WalletService::new(store), &options).await;

                // In-flight requests have drained (or timed out); release the database.
                if let Some(store) = sqlite {
                    store.close().await;
                    info!("database closed");
                }
                served?;
            }

            Commands::Wallet(wallet_cmd) => {
                let service = WalletService::init(&self.database).await?;
                run_wallet_command(&service, wallet_cmd).await?;
            }
        }

        Ok(())
    }
}

async fn run_wallet_command(service: &WalletService, cmd: WalletCommands) -> Result<()> {
    match cmd {
        WalletCommands::Create { currency } => {
            let wallet = service.create_wallet(&currency.trim().to_uppercase()).await?;
            print_wallet(&wallet);
        }

        WalletCommands::Show { id } => {
            let wallet = service.get_wallet(parse_id(&id)?).await?;
            print_wallet(&wallet);
        }

        WalletCommands::Deposit { id, amount } => {
            let id = parse_id(&id)?;
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
            service.deposit(id, amount_cents).await?;
            print_wallet(&service.get_wallet(id).await?);
        }

        WalletCommands::Withdraw { id, amount } => {
            let id = parse_id(&id)?;
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
            service.withdraw(id, amount_cents).await?;
            print_wallet(&service.get_wallet(id).await?);
        }
    }

    Ok(())
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("Invalid wallet ID: {}", id))
}

fn print_wallet(wallet: &Wallet) {
    println!("Wallet:   {}", wallet.id);
    println!("Balance:  {} {}", format_cents(wallet.balance), wallet.currency);
    println!("Created:  {}", wallet.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Updated:  {}", wallet.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
}
