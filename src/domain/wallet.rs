use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, Currency};

pub type WalletId = Uuid;

/// A balance-holding account with a fixed currency.
///
/// Balances only ever change through signed deltas applied by the store;
/// a `Wallet` value is a snapshot and is never written back as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub balance: Cents,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// A fresh wallet with a random v4 id and a zero balance.
    pub fn new(currency: Currency) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            balance: 0,
            currency,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn can_cover(&self, amount: Cents) -> bool {
        self.balance >= amount
    }
}
