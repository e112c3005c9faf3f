use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

/// One member's owed share of a group expense. The splits of a transaction
/// always sum exactly to the transaction amount.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExpenseSplit {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub user_id: Uuid,
    pub amount: Money,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
