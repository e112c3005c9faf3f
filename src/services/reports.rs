use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::CONFIG;
use crate::error::LedgerError;
use crate::models::{OwnerId, Transaction, TransactionKind};
use crate::money::{Currency, Money};
use crate::recurrence::shift_month;
use crate::services::budgets::{month_window, BudgetAlerts, BudgetTracker};
use crate::storage::Storage;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category_id: Option<Uuid>,
    pub category_name: String,
    pub total: Money,
    pub count: usize,
    /// Share of the period total, percent with 2 dp.
    pub percentage: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dashboard {
    pub total_income: Money,
    pub total_expense: Money,
    pub total_balance: Money,
    pub monthly_income: Money,
    pub monthly_expense: Money,
    pub recent_transactions: Vec<Transaction>,
    pub expense_by_category: Vec<CategoryBreakdown>,
    pub income_by_category: Vec<CategoryBreakdown>,
    pub budget_alerts: BudgetAlerts,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub income: Money,
    pub expense: Money,
    pub balance: Money,
    pub transaction_count: usize,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartPeriod {
    Monthly,
    Weekly,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub income: Vec<Money>,
    pub expense: Vec<Money>,
}

/// Read-only projections over the personal ledger, recomputed per call, so
/// they are never stale. Renderers (Excel/PDF, charts) live outside.
pub struct Reporter<S: Storage> {
    storage: Arc<S>,
    budgets: BudgetTracker<S>,
}

impl<S: Storage> Reporter<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Reporter {
            budgets: BudgetTracker::new(storage.clone()),
            storage,
        }
    }

    pub async fn dashboard(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<Dashboard, LedgerError> {
        let rows = self.personal_rows(user_id).await?;
        let currency = currency_of(&rows);

        let total_income = sum_where(&rows, currency, |tx| tx.kind == TransactionKind::Income)?;
        let total_expense =
            sum_where(&rows, currency, |tx| tx.kind == TransactionKind::Expense)?;
        let total_balance = total_income.try_sub(&total_expense)?;

        let (first, last) = month_window(today.year(), today.month())?;
        let monthly_income = sum_where(&rows, currency, |tx| {
            tx.kind == TransactionKind::Income && tx.date >= first && tx.date <= last
        })?;
        let monthly_expense = sum_where(&rows, currency, |tx| {
            tx.kind == TransactionKind::Expense && tx.date >= first && tx.date <= last
        })?;

        let mut recent = rows.clone();
        recent.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
        recent.truncate(CONFIG.recent_transactions_limit);

        let expense_by_category = self
            .breakdown(&rows, TransactionKind::Expense, total_expense, currency)
            .await?;
        let income_by_category = self
            .breakdown(&rows, TransactionKind::Income, total_income, currency)
            .await?;

        let budget_alerts = self
            .budgets
            .alerts(user_id, today.year(), today.month())
            .await?;

        Ok(Dashboard {
            total_income,
            total_expense,
            total_balance,
            monthly_income,
            monthly_expense,
            recent_transactions: recent,
            expense_by_category,
            income_by_category,
            budget_alerts,
        })
    }

    /// The last N calendar months, most recent first. Steps back by true
    /// month arithmetic, so month-end boundaries never double count.
    pub async fn monthly_summary(
        &self,
        user_id: Uuid,
        months: usize,
        today: NaiveDate,
    ) -> Result<Vec<MonthSummary>, LedgerError> {
        let months = months.clamp(1, 24);
        let rows = self.personal_rows(user_id).await?;
        let currency = currency_of(&rows);

        let mut summaries = Vec::with_capacity(months);
        for i in 0..months {
            let (year, month) = shift_month(today.year(), today.month(), -(i as i32));
            let (first, last) = month_window(year, month)?;
            let in_window = |tx: &Transaction| tx.date >= first && tx.date <= last;
            let income = sum_where(&rows, currency, |tx| {
                tx.kind == TransactionKind::Income && in_window(tx)
            })?;
            let expense = sum_where(&rows, currency, |tx| {
                tx.kind == TransactionKind::Expense && in_window(tx)
            })?;
            summaries.push(MonthSummary {
                year,
                month,
                balance: income.try_sub(&expense)?,
                income,
                expense,
                transaction_count: rows.iter().filter(|tx| in_window(tx)).count(),
            });
        }
        Ok(summaries)
    }

    /// Aligned labels + income/expense arrays for the trailing periods,
    /// oldest first, zero-filled where nothing happened.
    pub async fn chart_series(
        &self,
        user_id: Uuid,
        period: ChartPeriod,
        count: usize,
        today: NaiveDate,
    ) -> Result<ChartSeries, LedgerError> {
        let count = count.clamp(1, 12);
        let rows = self.personal_rows(user_id).await?;
        let currency = currency_of(&rows);

        let mut series = ChartSeries {
            labels: Vec::with_capacity(count),
            income: Vec::with_capacity(count),
            expense: Vec::with_capacity(count),
        };

        for i in (0..count).rev() {
            let (label, first, last) = match period {
                ChartPeriod::Monthly => {
                    let (year, month) = shift_month(today.year(), today.month(), -(i as i32));
                    let (first, last) = month_window(year, month)?;
                    (
                        format!("{} {}", MONTH_NAMES[month as usize - 1], year),
                        first,
                        last,
                    )
                }
                ChartPeriod::Weekly => {
                    let monday = today
                        - Duration::days(today.weekday().num_days_from_monday() as i64);
                    let first = monday - Duration::weeks(i as i64);
                    let last = first + Duration::days(6);
                    (format!("W{}", first.iso_week().week()), first, last)
                }
            };
            series.labels.push(label);
            series.income.push(sum_where(&rows, currency, |tx| {
                tx.kind == TransactionKind::Income && tx.date >= first && tx.date <= last
            })?);
            series.expense.push(sum_where(&rows, currency, |tx| {
                tx.kind == TransactionKind::Expense && tx.date >= first && tx.date <= last
            })?);
        }
        Ok(series)
    }

    async fn personal_rows(&self, user_id: Uuid) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self
            .storage
            .transactions_for_owner(OwnerId::User(user_id))
            .await?
            .into_iter()
            .filter(|tx| !tx.is_deleted())
            .collect())
    }

    async fn breakdown(
        &self,
        rows: &[Transaction],
        kind: TransactionKind,
        period_total: Money,
        currency: Currency,
    ) -> Result<Vec<CategoryBreakdown>, LedgerError> {
        let mut buckets: HashMap<Option<Uuid>, (Money, usize)> = HashMap::new();
        for tx in rows.iter().filter(|tx| tx.kind == kind) {
            let bucket = buckets
                .entry(tx.category_id)
                .or_insert((Money::zero(currency), 0));
            bucket.0 = bucket.0.try_add(&tx.amount)?;
            bucket.1 += 1;
        }

        let mut breakdown = Vec::with_capacity(buckets.len());
        for (category_id, (total, count)) in buckets {
            let category_name = match category_id {
                Some(id) => self
                    .storage
                    .get_category(id)
                    .await?
                    .map(|c| c.name)
                    .unwrap_or_else(|| "Unknown".to_string()),
                None => "Uncategorized".to_string(),
            };
            let mut percentage = if period_total.is_positive() {
                total.amount() / period_total.amount() * Decimal::from(100)
            } else {
                Decimal::ZERO
            };
            percentage = percentage.round_dp(2);
            percentage.rescale(2);
            breakdown.push(CategoryBreakdown {
                category_id,
                category_name,
                total,
                count,
                percentage,
            });
        }
        breakdown.sort_by(|a, b| b.total.amount().cmp(&a.total.amount()));
        breakdown.truncate(10);
        Ok(breakdown)
    }
}

fn currency_of(rows: &[Transaction]) -> Currency {
    rows.first()
        .map(|tx| tx.amount.currency())
        .unwrap_or_default()
}

fn sum_where<F>(
    rows: &[Transaction],
    currency: Currency,
    pred: F,
) -> Result<Money, LedgerError>
where
    F: Fn(&Transaction) -> bool,
{
    let mut total = Money::zero(currency);
    for tx in rows.iter().filter(|tx| pred(tx)) {
        total = total.try_add(&tx.amount)?;
    }
    Ok(total)
}
