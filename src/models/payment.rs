use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

/// A mobile-money provider and its fee/limit schedule. Policy is data here,
/// not constants: each operation reads the provider row it runs against.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentProvider {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    /// Percent taken on each operation, e.g. 1.5 for 1.5%.
    pub fee_percentage: Decimal,
    pub fee_fixed: Money,
    pub min_amount: Money,
    pub max_amount: Money,
    pub is_active: bool,
}

/// A mobile-money account a user registered for deposits and withdrawals.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider_id: Uuid,
    pub phone_number: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Deposit,
    Withdrawal,
    Transfer,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// A wallet-affecting operation and its lifecycle. `reference` is generated
/// once at creation and never changes; the gateway callback addresses the
/// payment by it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub kind: PaymentKind,
    pub status: PaymentStatus,
    pub user_id: Uuid,
    /// Transfer destination.
    pub counterparty: Option<Uuid>,
    pub method_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub amount: Money,
    pub fee: Money,
    pub total_amount: Money,
    pub reference: String,
    pub provider_reference: Option<String>,
    pub error: Option<String>,
    pub initiated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn is_finalized(&self) -> bool {
        self.status != PaymentStatus::Pending
    }

    /// Unique tracking reference, stamped at creation.
    pub fn generate_reference(now: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "PAY-{}-{}",
            now.timestamp_millis(),
            suffix[..8].to_uppercase()
        )
    }
}
