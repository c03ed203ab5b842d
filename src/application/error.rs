use thiserror::Error;

use crate::domain::{Cents, InvalidCurrency, WalletId};
use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid currency: {0}")]
    InvalidCurrency(#[from] InvalidCurrency),

    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    #[error("Insufficient funds in wallet {wallet_id}: required {required}")]
    InsufficientFunds { wallet_id: WalletId, required: Cents },

    #[error("Wallet id collision: {0}")]
    DuplicateWalletId(WalletId),

    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),
}

impl AppError {
    /// Whether a caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::DuplicateWalletId(_) | AppError::Storage(_) => true,
            AppError::InvalidAmount(_)
            | AppError::InvalidCurrency(_)
            | AppError::WalletNotFound(_)
            | AppError::InsufficientFunds { .. } => false,
        }
    }

    /// Translate a store failure for an operation that asked for `amount`.
    pub(crate) fn from_store(err: StoreError, amount: Cents) -> Self {
        match err {
            StoreError::NotFound(id) => AppError::WalletNotFound(id),
            StoreError::DuplicateKey(id) => AppError::DuplicateWalletId(id),
            StoreError::InsufficientFunds(wallet_id) => AppError::InsufficientFunds {
                wallet_id,
                required: amount,
            },
            StoreError::BalanceOverflow(id) => {
                AppError::InvalidAmount(format!("deposit would overflow balance of wallet {}", id))
            }
            StoreError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::from_store(err, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_retryable_kinds() {
        assert!(AppError::Storage(anyhow::anyhow!("disk I/O error")).is_retryable());
        assert!(AppError::DuplicateWalletId(Uuid::new_v4()).is_retryable());
        assert!(!AppError::WalletNotFound(Uuid::new_v4()).is_retryable());
        assert!(!AppError::InvalidAmount("zero".into()).is_retryable());
    }

    #[test]
    fn test_store_errors_keep_their_kind() {
        let id = Uuid::new_v4();
        assert!(matches!(
            AppError::from_store(StoreError::InsufficientFunds(id), 500),
            AppError::InsufficientFunds { wallet_id, required: 500 } if wallet_id == id
        ));
        assert!(matches!(
            AppError::from(StoreError::NotFound(id)),
            AppError::WalletNotFound(missing) if missing == id
        ));
        assert!(matches!(
            AppError::from(StoreError::BalanceOverflow(id)),
            AppError::InvalidAmount(_)
        ));
    }
}
