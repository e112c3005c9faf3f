use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::owner::OwnerId;
use crate::money::Money;
use crate::recurrence::RecurrenceRule;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        };
        write!(f, "{}", s)
    }
}

/// One monetary movement. Append-only with soft delete: a deleted row keeps
/// existing for retrieval by id but vanishes from every query and
/// aggregation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner: OwnerId,
    pub created_by: Uuid,
    pub category_id: Option<Uuid>,
    pub amount: Money,
    pub kind: TransactionKind,
    pub description: String,
    pub date: NaiveDate,
    pub is_recurring: bool,
    pub recurrence_rule: Option<RecurrenceRule>,
    /// Set on materialized occurrences: the rule-bearing transaction they
    /// were expanded from.
    pub recurrence_source: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Positive for income, negative for expense.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.amount.amount(),
            TransactionKind::Expense => -self.amount.amount(),
        }
    }
}

/// Creation input for `TransactionLedger::record`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewTransaction {
    pub owner: OwnerId,
    pub created_by: Uuid,
    pub category_id: Option<Uuid>,
    pub amount: Money,
    pub kind: TransactionKind,
    pub description: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub recurrence_rule: Option<RecurrenceRule>,
}

/// Partial amendment; absent fields keep their current value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransactionPatch {
    #[serde(default)]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    DateAsc,
    DateDesc,
    AmountAsc,
    AmountDesc,
}

/// Query filter the transport layer hands through verbatim. Result slicing
/// and pagination stay on the transport side.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    #[serde(default)]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub category: Option<Uuid>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub min_amount: Option<Decimal>,
    #[serde(default)]
    pub max_amount: Option<Decimal>,
    /// Case-insensitive description substring match.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub order: Option<SortOrder>,
}
