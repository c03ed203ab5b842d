mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Cents, Currency, Wallet, WalletId};

/// SQL migration for the wallets table
pub const MIGRATION_001_WALLETS: &str = include_str!("migrations/001_wallets.sql");

/// Failure kinds a storage driver may report. Raw driver errors never
/// escape a driver except as the source of `Storage`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Wallet not found: {0}")]
    NotFound(WalletId),

    #[error("Wallet id collision: {0}")]
    DuplicateKey(WalletId),

    #[error("Insufficient funds in wallet {0}")]
    InsufficientFunds(WalletId),

    #[error("Balance of wallet {0} would overflow")]
    BalanceOverflow(WalletId),

    #[error("Storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

/// Durable keyed storage for wallets.
///
/// Implementations own the atomicity of balance mutations: `adjust_balance`
/// must apply the floor check and the write as one indivisible step against
/// the latest committed balance. Operations on different wallets must not
/// block each other beyond what the backing engine requires.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a new wallet with a zero balance and a fresh id.
    async fn create(&self, currency: Currency) -> Result<Wallet, StoreError>;

    /// Point lookup by id.
    async fn read(&self, id: WalletId) -> Result<Wallet, StoreError>;

    /// Apply `balance += delta` and refresh `updated_at`.
    ///
    /// When `delta < 0` the update is rejected with `InsufficientFunds`
    /// unless `balance + delta >= floor`. Every error leaves the row as it was.
    async fn adjust_balance(
        &self,
        id: WalletId,
        delta: Cents,
        floor: Cents,
    ) -> Result<(), StoreError>;
}
