use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{Cents, Currency, Wallet, WalletId};
use crate::storage::{LedgerStore, SqliteStore};

use super::AppError;

/// Lowest balance a withdrawal may leave behind.
const BALANCE_FLOOR: Cents = 0;

/// Application service providing the wallet operations.
/// This is the primary interface for any client (HTTP, tests, tooling).
///
/// The service holds no wallet state of its own: every call goes to the
/// store, which is the single point of synchronisation. Deadlines belong to
/// the store too, since only the store knows where its commit point is.
#[derive(Clone)]
pub struct WalletService {
    store: Arc<dyn LedgerStore>,
}

impl WalletService {
    /// Create a new wallet service over the given store.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Open (and migrate) a SQLite database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let store = SqliteStore::open(database_path)
            .await
            .map_err(AppError::Storage)?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Create a new wallet with a zero balance.
    pub async fn create_wallet(&self, currency: &str) -> Result<Wallet, AppError> {
        let currency = Currency::parse(currency)?;

        let wallet = self.store.create(currency).await?;

        info!(wallet_id = %wallet.id, currency = %wallet.currency, "wallet created");
        Ok(wallet)
    }

    /// Get a wallet by ID.
    pub async fn get_wallet(&self, id: WalletId) -> Result<Wallet, AppError> {
        Ok(self.store.read(id).await?)
    }

    /// Add `amount` to the wallet's balance.
    pub async fn deposit(&self, id: WalletId, amount: Cents) -> Result<(), AppError> {
        validate_amount(amount)?;

        self.store
            .adjust_balance(id, amount, BALANCE_FLOOR)
            .await
            .map_err(|e| AppError::from_store(e, amount))?;

        debug!(wallet_id = %id, amount, "deposit applied");
        Ok(())
    }

    /// Take `amount` from the wallet's balance if it can cover it.
    pub async fn withdraw(&self, id: WalletId, amount: Cents) -> Result<(), AppError> {
        validate_amount(amount)?;

        // Early rejection only; the store re-checks against the committed balance.
        let wallet = self.get_wallet(id).await?;
        if !wallet.can_cover(amount) {
            debug!(wallet_id = %id, amount, balance = wallet.balance, "withdrawal rejected");
            return Err(AppError::InsufficientFunds {
                wallet_id: id,
                required: amount,
            });
        }

        self.store
            .adjust_balance(id, -amount, BALANCE_FLOOR)
            .await
            .map_err(|e| AppError::from_store(e, amount))?;

        debug!(wallet_id = %id, amount, "withdrawal applied");
        Ok(())
    }
}

fn validate_amount(amount: Cents) -> Result<(), AppError> {
    if amount <= 0 {
        return Err(AppError::InvalidAmount("Amount must be positive".to_string()));
    }
    Ok(())
}
