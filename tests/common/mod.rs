// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tempfile::TempDir;
use wallet_ledger::application::WalletService;
use wallet_ledger::domain::{Cents, Wallet};
use wallet_ledger::storage::{MemoryStore, SqliteStore};

/// Helper to create a test service with a temporary SQLite database
pub async fn test_service() -> Result<(WalletService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = db_path(&temp_dir);
    let service = WalletService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Path of the database file used by `test_service`
pub fn db_path(temp_dir: &TempDir) -> std::path::PathBuf {
    temp_dir.path().join("test.db")
}

/// Open a second service on the same database whose store calls give up
/// after `timeout`
pub async fn timed_service(temp_dir: &TempDir, timeout: Duration) -> Result<WalletService> {
    let store = SqliteStore::open(db_path(temp_dir).to_str().unwrap())
        .await?
        .with_timeout(timeout);
    Ok(WalletService::new(Arc::new(store)))
}

/// Helper to create a test service over the in-memory store
pub fn memory_service() -> WalletService {
    WalletService::new(Arc::new(MemoryStore::new()))
}

/// Create a USD wallet and fund it with `balance` cents
pub async fn funded_wallet(service: &WalletService, balance: Cents) -> Result<Wallet> {
    let wallet = service.create_wallet("USD").await?;
    if balance > 0 {
        service.deposit(wallet.id, balance).await?;
    }
    Ok(service.get_wallet(wallet.id).await?)
}
