use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Credit,
    Debit,
}

/// Per-user balance. One wallet per user; the balance always equals the sum
/// of credit entries minus debit entries and never goes negative.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: Money,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Append-only history row. `seq` is the wallet-local position assigned at
/// commit; `balance_after` is the running balance checkpoint the
/// consistency tests verify.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletEntry {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub kind: EntryKind,
    pub amount: Money,
    pub balance_after: Money,
    pub payment_id: Option<Uuid>,
    pub description: String,
    pub seq: u64,
    pub created_at: DateTime<Utc>,
}
