use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::transaction::TransactionKind;
use crate::money::Money;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
    Both,
}

impl CategoryKind {
    /// Whether a transaction of `kind` may be filed under this category.
    pub fn accepts(&self, kind: TransactionKind) -> bool {
        match self {
            CategoryKind::Both => true,
            CategoryKind::Income => kind == TransactionKind::Income,
            CategoryKind::Expense => kind == TransactionKind::Expense,
        }
    }
}

/// A transaction category. `owner: None` marks a shared system template,
/// read-only for everyone; owned categories are private to their user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub owner: Option<Uuid>,
    pub name: String,
    pub kind: CategoryKind,
    pub description: String,
    pub budget: Option<Money>,
    /// Percent of budget spent at which an alert fires (1-100).
    pub budget_alert_threshold: u8,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn is_system(&self) -> bool {
        self.owner.is_none()
    }

    pub fn visible_to(&self, user_id: Uuid) -> bool {
        match self.owner {
            None => true,
            Some(owner) => owner == user_id,
        }
    }
}
