use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{Category, CategoryKind, OwnerId, TransactionKind};
use crate::money::Money;
use crate::recurrence::days_in_month;
use crate::storage::Storage;

/// Derived view, recomputed per call and never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryBudgetStatus {
    pub category_id: Uuid,
    pub category_name: String,
    pub budget: Option<Money>,
    pub spent: Money,
    pub remaining: Option<Money>,
    /// Spent as a percent of budget, 2 dp; 0 when no budget is set.
    pub percentage: Decimal,
    pub is_over_budget: bool,
    pub is_alert: bool,
    pub alert_threshold: u8,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BudgetAlerts {
    pub over_budget: Vec<CategoryBudgetStatus>,
    pub alert: Vec<CategoryBudgetStatus>,
    pub healthy: Vec<CategoryBudgetStatus>,
}

/// Per-category monthly budget math over the transaction ledger.
pub struct BudgetTracker<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> BudgetTracker<S> {
    pub fn new(storage: Arc<S>) -> Self {
        BudgetTracker { storage }
    }

    /// Creates a private category for the user. System templates are seeded
    /// separately and stay read-only.
    pub async fn create_category(
        &self,
        user_id: Uuid,
        name: String,
        kind: CategoryKind,
        description: String,
    ) -> Result<Category, LedgerError> {
        if name.trim().is_empty() {
            return Err(LedgerError::validation("name", "name cannot be empty"));
        }
        if name.len() > 100 {
            return Err(LedgerError::validation(
                "name",
                "name cannot exceed 100 characters",
            ));
        }
        let category = self
            .storage
            .insert_category(Category {
                id: Uuid::new_v4(),
                owner: Some(user_id),
                name,
                kind,
                description,
                budget: None,
                budget_alert_threshold: 80,
                created_at: Utc::now(),
            })
            .await?;
        info!(category_id = %category.id, "category created");
        Ok(category)
    }

    /// Defines (or clears) the monthly budget on one of the user's own
    /// categories. System templates cannot carry budgets.
    pub async fn set_budget(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        budget: Option<Money>,
        alert_threshold: u8,
    ) -> Result<Category, LedgerError> {
        let mut category = self
            .storage
            .get_category(category_id)
            .await?
            .ok_or(LedgerError::NotFound("category"))?;
        if category.owner != Some(user_id) {
            return Err(LedgerError::NotFound("category"));
        }
        if let Some(budget) = &budget {
            if !budget.is_positive() {
                return Err(LedgerError::validation(
                    "budget",
                    "budget must be greater than 0",
                ));
            }
        }
        if !(1..=100).contains(&alert_threshold) {
            return Err(LedgerError::validation(
                "budget_alert_threshold",
                "threshold must be between 1 and 100",
            ));
        }
        category.budget = budget;
        category.budget_alert_threshold = alert_threshold;
        let category = self.storage.update_category(category).await?;
        info!(category_id = %category.id, "budget updated");
        Ok(category)
    }

    /// Every category visible to the user: system templates plus their own.
    pub async fn categories(&self, user_id: Uuid) -> Result<Vec<Category>, LedgerError> {
        self.storage.categories_visible_to(user_id).await
    }

    /// Budget status of one category for a (year, month) window, computed
    /// from the user's non-deleted expense transactions dated within it.
    pub async fn status(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<CategoryBudgetStatus, LedgerError> {
        let category = self
            .storage
            .get_category(category_id)
            .await?
            .ok_or(LedgerError::NotFound("category"))?;
        if !category.visible_to(user_id) {
            return Err(LedgerError::NotFound("category"));
        }
        let (first, last) = month_window(year, month)?;

        let currency = category
            .budget
            .map(|b| b.currency())
            .unwrap_or_default();
        let mut spent = Money::zero(currency);
        let mut seeded = category.budget.is_some();
        for tx in self
            .storage
            .transactions_for_owner(OwnerId::User(user_id))
            .await?
        {
            if tx.is_deleted()
                || tx.kind != TransactionKind::Expense
                || tx.category_id != Some(category_id)
                || tx.date < first
                || tx.date > last
            {
                continue;
            }
            if !seeded {
                spent = Money::zero(tx.amount.currency());
                seeded = true;
            }
            spent = spent.try_add(&tx.amount)?;
        }

        let (percentage, remaining, is_over, is_alert) = match category.budget {
            Some(budget) if budget.is_positive() => {
                let mut pct = spent.amount() / budget.amount() * Decimal::from(100);
                pct = pct.round_dp(2);
                pct.rescale(2);
                let remaining = budget.try_sub(&spent)?;
                let over = spent.try_cmp(&budget)? == std::cmp::Ordering::Greater;
                let alert = pct >= Decimal::from(category.budget_alert_threshold);
                (pct, Some(remaining), over, alert)
            }
            _ => {
                let mut zero = Decimal::ZERO;
                zero.rescale(2);
                (zero, None, false, false)
            }
        };

        Ok(CategoryBudgetStatus {
            category_id,
            category_name: category.name,
            budget: category.budget,
            spent,
            remaining,
            percentage,
            is_over_budget: is_over,
            is_alert,
            alert_threshold: category.budget_alert_threshold,
        })
    }

    /// Statuses for every budgeted category visible to the user.
    pub async fn overview(
        &self,
        user_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<Vec<CategoryBudgetStatus>, LedgerError> {
        let mut statuses = Vec::new();
        for category in self.storage.categories_visible_to(user_id).await? {
            if category.budget.is_none() {
                continue;
            }
            statuses.push(self.status(user_id, category.id, year, month).await?);
        }
        Ok(statuses)
    }

    /// Partitions budgeted categories into over-budget / alert / healthy,
    /// each sorted by descending percentage.
    pub async fn alerts(
        &self,
        user_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<BudgetAlerts, LedgerError> {
        let mut alerts = BudgetAlerts::default();
        for status in self.overview(user_id, year, month).await? {
            if status.is_over_budget {
                alerts.over_budget.push(status);
            } else if status.is_alert {
                alerts.alert.push(status);
            } else {
                alerts.healthy.push(status);
            }
        }
        for bucket in [
            &mut alerts.over_budget,
            &mut alerts.alert,
            &mut alerts.healthy,
        ] {
            bucket.sort_by(|a, b| b.percentage.cmp(&a.percentage));
        }
        Ok(alerts)
    }
}

pub(crate) fn month_window(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), LedgerError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| LedgerError::validation("month", "invalid year/month"))?;
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
        .ok_or_else(|| LedgerError::validation("month", "invalid year/month"))?;
    Ok((first, last))
}
