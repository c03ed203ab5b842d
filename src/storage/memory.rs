use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, RwLock};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{Cents, Currency, Wallet, WalletId};

use super::{LedgerStore, StoreError};

/// In-process wallet store for tests and ephemeral runs.
///
/// The outer map lock is only held to find or insert a wallet; balance
/// updates take the wallet's own mutex, so distinct wallets never contend.
#[derive(Default, Clone)]
pub struct MemoryStore {
    wallets: Arc<RwLock<HashMap<WalletId, Arc<Mutex<Wallet>>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: WalletId) -> Result<Arc<Mutex<Wallet>>, StoreError> {
        let wallets = self
            .wallets
            .read()
            .map_err(|_| anyhow!("wallet index lock poisoned"))?;
        wallets.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    fn insert(&self, wallet: &Wallet) -> Result<(), StoreError> {
        let mut wallets = self
            .wallets
            .write()
            .map_err(|_| anyhow!("wallet index lock poisoned"))?;
        match wallets.entry(wallet.id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey(wallet.id)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(wallet.clone())));
                Ok(())
            }
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn create(&self, currency: Currency) -> Result<Wallet, StoreError> {
        let wallet = Wallet::new(currency);
        self.insert(&wallet)?;
        Ok(wallet)
    }

    async fn read(&self, id: WalletId) -> Result<Wallet, StoreError> {
        let slot = self.slot(id)?;
        let wallet = slot
            .lock()
            .map_err(|_| anyhow!("wallet {} lock poisoned", id))?;
        Ok(wallet.clone())
    }

    async fn adjust_balance(
        &self,
        id: WalletId,
        delta: Cents,
        floor: Cents,
    ) -> Result<(), StoreError> {
        let slot = self.slot(id)?;
        let mut wallet = slot
            .lock()
            .map_err(|_| anyhow!("wallet {} lock poisoned", id))?;

        let balance = wallet
            .balance
            .checked_add(delta)
            .ok_or(StoreError::BalanceOverflow(id))?;
        if delta < 0 && balance < floor {
            return Err(StoreError::InsufficientFunds(id));
        }

        wallet.balance = balance;
        wallet.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> Currency {
        Currency::parse("USD").unwrap()
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let store = MemoryStore::new();
        let wallet = store.create(usd()).await.unwrap();
        let read = store.read(wallet.id).await.unwrap();
        assert_eq!(wallet, read);
        assert_eq!(read.balance, 0);
    }

    #[tokio::test]
    async fn test_read_unknown_wallet() {
        let store = MemoryStore::new();
        let id = uuid::Uuid::new_v4();
        assert!(matches!(
            store.read(id).await,
            Err(StoreError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let store = MemoryStore::new();
        let wallet = store.create(usd()).await.unwrap();
        assert!(matches!(store.insert(&wallet), Err(StoreError::DuplicateKey(_))));
    }

    #[tokio::test]
    async fn test_adjust_respects_floor() {
        let store = MemoryStore::new();
        let wallet = store.create(usd()).await.unwrap();

        store.adjust_balance(wallet.id, 100, 0).await.unwrap();
        store.adjust_balance(wallet.id, -40, 0).await.unwrap();
        let err = store.adjust_balance(wallet.id, -61, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientFunds(_)));

        let after = store.read(wallet.id).await.unwrap();
        assert_eq!(after.balance, 60);
        assert!(after.updated_at >= wallet.updated_at);
    }

    #[tokio::test]
    async fn test_adjust_overflow_leaves_balance() {
        let store = MemoryStore::new();
        let wallet = store.create(usd()).await.unwrap();
        store.adjust_balance(wallet.id, Cents::MAX, 0).await.unwrap();

        let err = store.adjust_balance(wallet.id, 1, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::BalanceOverflow(_)));
        assert_eq!(store.read(wallet.id).await.unwrap().balance, Cents::MAX);
    }

    #[tokio::test]
    async fn test_adjust_unknown_wallet() {
        let store = MemoryStore::new();
        let err = store
            .adjust_balance(uuid::Uuid::new_v4(), 10, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
