use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tokio::time::Instant;
use uuid::Uuid;

use crate::domain::{Cents, Currency, Wallet, WalletId};

use super::{LedgerStore, MIGRATION_001_WALLETS, StoreError};

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed wallet store.
///
/// Each mutation runs in its own spawned task, so a caller that stops
/// waiting cannot interrupt a transaction between its update and its commit.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    timeout: Option<Duration>,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            timeout: None,
        }
    }

    /// Give up on a store call that has not staged its write within `timeout`.
    /// An expired call is rolled back and reported as a storage failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Connect to a SQLite database at the given URL.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_WALLETS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Initialize a database file at the given path.
    pub async fn open(database_path: &str) -> Result<Self> {
        Self::init(&format!("sqlite:{}", database_path)).await
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn deadline(&self) -> Option<Instant> {
        self.timeout.map(|limit| Instant::now() + limit)
    }

    async fn create_in_tx(&self, wallet: Wallet) -> Result<Wallet, StoreError> {
        let deadline = self.deadline();
        let mut tx = with_deadline(deadline, self.pool.begin())
            .await?
            .context("Failed to begin transaction")?;

        let staged = with_deadline(
            deadline,
            sqlx::query(
                r#"
                INSERT INTO wallets (id, balance, currency, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(wallet.id.to_string())
            .bind(wallet.balance)
            .bind(wallet.currency.as_str())
            .bind(wallet.created_at.to_rfc3339())
            .bind(wallet.updated_at.to_rfc3339())
            .execute(&mut *tx),
        )
        .await;

        let outcome = match staged {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                Err(StoreError::DuplicateKey(wallet.id))
            }
            Ok(Err(e)) => Err(anyhow::Error::new(e).context("Failed to save wallet").into()),
            Err(timed_out) => Err(timed_out),
        };

        finish(tx, outcome).await?;
        Ok(wallet)
    }

    async fn adjust_in_tx(
        &self,
        id: WalletId,
        delta: Cents,
        floor: Cents,
    ) -> Result<(), StoreError> {
        let deadline = self.deadline();
        let mut tx = with_deadline(deadline, self.pool.begin())
            .await?
            .context("Failed to begin transaction")?;

        // Only the staging step races the deadline; `finish` always runs.
        let outcome = with_deadline(deadline, stage_adjustment(&mut tx, id, delta, floor))
            .await
            .and_then(|staged| staged);

        finish(tx, outcome).await
    }

    fn row_to_wallet(row: &SqliteRow) -> Result<Wallet> {
        let id_str: String = row.get("id");
        let currency_str: String = row.get("currency");
        let created_at_str: String = row.get("created_at");
        let updated_at_str: String = row.get("updated_at");

        Ok(Wallet {
            id: Uuid::parse_str(&id_str).context("Invalid wallet ID")?,
            balance: row.get("balance"),
            currency: Currency::parse(&currency_str).context("Invalid stored currency")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                .context("Invalid updated_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn create(&self, currency: Currency) -> Result<Wallet, StoreError> {
        let store = self.clone();
        tokio::spawn(async move { store.create_in_tx(Wallet::new(currency)).await })
            .await
            .context("Wallet insert task failed")?
    }

    async fn read(&self, id: WalletId) -> Result<Wallet, StoreError> {
        let deadline = self.deadline();
        let row = with_deadline(
            deadline,
            sqlx::query(
                r#"
                SELECT id, balance, currency, created_at, updated_at
                FROM wallets
                WHERE id = ?
                "#,
            )
            .bind(id.to_string())
            .fetch_optional(&self.pool),
        )
        .await?
        .context("Failed to fetch wallet")?;

        match row {
            Some(row) => Ok(Self::row_to_wallet(&row)?),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn adjust_balance(
        &self,
        id: WalletId,
        delta: Cents,
        floor: Cents,
    ) -> Result<(), StoreError> {
        let store = self.clone();
        tokio::spawn(async move { store.adjust_in_tx(id, delta, floor).await })
            .await
            .context("Balance update task failed")?
    }
}

/// Await `fut` until `deadline`, reporting expiry as a storage failure.
async fn with_deadline<T>(
    deadline: Option<Instant>,
    fut: impl Future<Output = T>,
) -> Result<T, StoreError> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| StoreError::Storage(anyhow!("store operation timed out"))),
        None => Ok(fut.await),
    }
}

/// Apply the conditional update inside `tx`. Nothing is committed here.
async fn stage_adjustment(
    tx: &mut Transaction<'_, Sqlite>,
    id: WalletId,
    delta: Cents,
    floor: Cents,
) -> Result<(), StoreError> {
    // Deposits are never floored; withdrawals must keep balance >= floor.
    let floor = if delta < 0 { floor } else { Cents::MIN };
    // Upper bound on the current balance so `balance + delta` stays an integer.
    let ceiling = Cents::MAX - delta.max(0);
    let now = Utc::now().to_rfc3339();

    let updated = sqlx::query(
        r#"
        UPDATE wallets
        SET balance = balance + ?, updated_at = ?
        WHERE id = ? AND balance + ? >= ? AND balance <= ?
        "#,
    )
    .bind(delta)
    .bind(&now)
    .bind(id.to_string())
    .bind(delta)
    .bind(floor)
    .bind(ceiling)
    .execute(&mut **tx)
    .await
    .context("Failed to update wallet balance")?
    .rows_affected();

    if updated > 0 {
        return Ok(());
    }

    let exists = sqlx::query("SELECT 1 FROM wallets WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to check wallet existence")?
        .is_some();

    Err(match (exists, delta < 0) {
        (false, _) => StoreError::NotFound(id),
        (true, true) => StoreError::InsufficientFunds(id),
        (true, false) => StoreError::BalanceOverflow(id),
    })
}

/// Commit on success, roll back otherwise. The commit is never raced
/// against a deadline: once staged work succeeds it is made durable.
async fn finish(
    tx: Transaction<'_, Sqlite>,
    outcome: Result<(), StoreError>,
) -> Result<(), StoreError> {
    match outcome {
        Ok(()) => {
            tx.commit().await.context("Failed to commit transaction")?;
            Ok(())
        }
        Err(e) => {
            tx.rollback().await.context("Failed to roll back transaction")?;
            Err(e)
        }
    }
}
