use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::CONFIG;
use crate::error::LedgerError;
use crate::models::{
    NewTransaction, OwnerId, SortOrder, Transaction, TransactionFilter, TransactionKind,
    TransactionPatch,
};
use crate::recurrence;
use crate::storage::Storage;

/// Append-only (soft-delete) store of monetary movements, and the
/// materialization point for recurring rules.
pub struct TransactionLedger<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> TransactionLedger<S> {
    pub fn new(storage: Arc<S>) -> Self {
        TransactionLedger { storage }
    }

    /// Records a movement dated no further than the configured allowance
    /// past `today`. Group-owned transactions must come from an active
    /// member and be denominated in the group currency.
    pub async fn record(
        &self,
        new: NewTransaction,
        today: NaiveDate,
    ) -> Result<Transaction, LedgerError> {
        if !new.amount.is_positive() {
            return Err(LedgerError::validation(
                "amount",
                "amount must be greater than 0",
            ));
        }
        let latest = today + Duration::days(CONFIG.future_dating_allowance_days);
        if new.date > latest {
            return Err(LedgerError::validation(
                "date",
                format!("date cannot be after {}", latest),
            ));
        }
        self.check_category(new.category_id, new.created_by, new.kind)
            .await?;
        if let OwnerId::Group(group_id) = new.owner {
            let group = self
                .storage
                .get_group(group_id)
                .await?
                .ok_or(LedgerError::NotFound("group"))?;
            let member = self
                .storage
                .get_membership(group_id, new.created_by)
                .await?;
            if !member.map(|m| m.is_active()).unwrap_or(false) {
                return Err(LedgerError::NotFound("group"));
            }
            if new.amount.currency() != group.currency {
                return Err(LedgerError::CurrencyMismatch {
                    left: new.amount.currency(),
                    right: group.currency,
                });
            }
        }
        if let Some(rule) = &new.recurrence_rule {
            rule.validate()?;
        }

        let transaction = Transaction {
            id: Uuid::new_v4(),
            owner: new.owner,
            created_by: new.created_by,
            category_id: new.category_id,
            amount: new.amount,
            kind: new.kind,
            description: new.description,
            date: new.date,
            is_recurring: new.recurrence_rule.is_some(),
            recurrence_rule: new.recurrence_rule,
            recurrence_source: None,
            deleted_at: None,
            created_at: Utc::now(),
        };
        let transaction = self.storage.insert_transaction(transaction).await?;
        info!(
            transaction_id = %transaction.id,
            kind = %transaction.kind,
            amount = %transaction.amount,
            "transaction recorded"
        );
        Ok(transaction)
    }

    /// Applies a partial amendment. A soft-deleted transaction cannot be
    /// amended back to life.
    pub async fn amend(
        &self,
        id: Uuid,
        owner: OwnerId,
        patch: TransactionPatch,
        today: NaiveDate,
    ) -> Result<Transaction, LedgerError> {
        let mut tx = self.owned(id, owner).await?;
        if tx.is_deleted() {
            return Err(LedgerError::NotFound("transaction"));
        }

        if let Some(amount) = patch.amount {
            if !amount.is_positive() {
                return Err(LedgerError::validation(
                    "amount",
                    "amount must be greater than 0",
                ));
            }
            tx.amount = amount;
        }
        if let Some(kind) = patch.kind {
            tx.kind = kind;
        }
        if let Some(category_id) = patch.category_id {
            tx.category_id = category_id;
        }
        if let Some(description) = patch.description {
            tx.description = description;
        }
        if let Some(date) = patch.date {
            let latest = today + Duration::days(CONFIG.future_dating_allowance_days);
            if date > latest {
                return Err(LedgerError::validation(
                    "date",
                    format!("date cannot be after {}", latest),
                ));
            }
            tx.date = date;
        }
        self.check_category(tx.category_id, tx.created_by, tx.kind)
            .await?;

        let tx = self.storage.update_transaction(tx).await?;
        info!(transaction_id = %tx.id, "transaction amended");
        Ok(tx)
    }

    /// Idempotent. The row stays retrievable by id but disappears from
    /// every query and aggregation.
    pub async fn soft_delete(&self, id: Uuid, owner: OwnerId) -> Result<(), LedgerError> {
        let mut tx = self.owned(id, owner).await?;
        if tx.is_deleted() {
            return Ok(());
        }
        tx.deleted_at = Some(Utc::now());
        self.storage.update_transaction(tx).await?;
        info!(transaction_id = %id, "transaction soft-deleted");
        Ok(())
    }

    /// Fetches by id, soft-deleted rows included.
    pub async fn get(&self, id: Uuid, owner: OwnerId) -> Result<Transaction, LedgerError> {
        self.owned(id, owner).await
    }

    /// Filtered, ordered listing of live transactions. Finite and
    /// restartable; slicing is the caller's concern.
    pub async fn query(
        &self,
        owner: OwnerId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let mut rows: Vec<Transaction> = self
            .storage
            .transactions_for_owner(owner)
            .await?
            .into_iter()
            .filter(|tx| !tx.is_deleted())
            .filter(|tx| filter.kind.map(|k| tx.kind == k).unwrap_or(true))
            .filter(|tx| {
                filter
                    .category
                    .map(|c| tx.category_id == Some(c))
                    .unwrap_or(true)
            })
            .filter(|tx| filter.date_from.map(|d| tx.date >= d).unwrap_or(true))
            .filter(|tx| filter.date_to.map(|d| tx.date <= d).unwrap_or(true))
            .filter(|tx| {
                filter
                    .min_amount
                    .map(|m| tx.amount.amount() >= m)
                    .unwrap_or(true)
            })
            .filter(|tx| {
                filter
                    .max_amount
                    .map(|m| tx.amount.amount() <= m)
                    .unwrap_or(true)
            })
            .filter(|tx| match &filter.search {
                Some(needle) => tx
                    .description
                    .to_lowercase()
                    .contains(&needle.to_lowercase()),
                None => true,
            })
            .collect();

        match filter.order.unwrap_or(SortOrder::DateDesc) {
            SortOrder::DateAsc => {
                rows.sort_by(|a, b| (a.date, a.created_at).cmp(&(b.date, b.created_at)))
            }
            SortOrder::DateDesc => {
                rows.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)))
            }
            SortOrder::AmountAsc => rows.sort_by(|a, b| a.amount.amount().cmp(&b.amount.amount())),
            SortOrder::AmountDesc => rows.sort_by(|a, b| b.amount.amount().cmp(&a.amount.amount())),
        }
        Ok(rows)
    }

    /// Turns every occurrence of a recurring transaction due by `as_of`
    /// into a concrete row. Idempotent per (source, occurrence date):
    /// re-running for the same day never duplicates. The source row's
    /// anchor date is never touched.
    pub async fn materialize_due(
        &self,
        source_id: Uuid,
        as_of: NaiveDate,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let source = self
            .storage
            .get_transaction(source_id)
            .await?
            .ok_or(LedgerError::NotFound("transaction"))?;
        if source.is_deleted() {
            return Err(LedgerError::NotFound("transaction"));
        }
        let rule = source
            .recurrence_rule
            .as_ref()
            .ok_or_else(|| {
                LedgerError::validation("transaction", "transaction is not recurring")
            })?
            .clone();

        let mut created = Vec::new();
        for occurrence in recurrence::expand(&rule, source.date, as_of) {
            if !self.storage.claim_occurrence(source.id, occurrence).await? {
                continue;
            }
            let materialized = Transaction {
                id: Uuid::new_v4(),
                owner: source.owner,
                created_by: source.created_by,
                category_id: source.category_id,
                amount: source.amount,
                kind: source.kind,
                description: source.description.clone(),
                date: occurrence,
                is_recurring: false,
                recurrence_rule: None,
                recurrence_source: Some(source.id),
                deleted_at: None,
                created_at: Utc::now(),
            };
            let materialized = self.storage.insert_transaction(materialized).await?;
            info!(
                source_id = %source.id,
                occurrence = %occurrence,
                transaction_id = %materialized.id,
                "recurring transaction materialized"
            );
            created.push(materialized);
        }
        Ok(created)
    }

    /// Scheduler entry point: sweeps every live recurring transaction.
    /// Sources are independent, so they materialize concurrently; one bad
    /// source never blocks the rest of the sweep.
    pub async fn materialize_all_due(
        &self,
        as_of: NaiveDate,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let sources = self.storage.recurring_sources().await?;
        let results = futures::future::join_all(
            sources
                .iter()
                .map(|source| self.materialize_due(source.id, as_of)),
        )
        .await;

        let mut created = Vec::new();
        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(mut rows) => created.append(&mut rows),
                Err(err) => {
                    warn!(source_id = %source.id, error = %err, "materialization failed")
                }
            }
        }
        Ok(created)
    }

    async fn owned(&self, id: Uuid, owner: OwnerId) -> Result<Transaction, LedgerError> {
        let tx = self
            .storage
            .get_transaction(id)
            .await?
            .ok_or(LedgerError::NotFound("transaction"))?;
        if tx.owner != owner {
            return Err(LedgerError::NotFound("transaction"));
        }
        Ok(tx)
    }

    async fn check_category(
        &self,
        category_id: Option<Uuid>,
        user_id: Uuid,
        kind: TransactionKind,
    ) -> Result<(), LedgerError> {
        let Some(category_id) = category_id else {
            return Ok(());
        };
        let category = self
            .storage
            .get_category(category_id)
            .await?
            .ok_or(LedgerError::NotFound("category"))?;
        if !category.visible_to(user_id) {
            return Err(LedgerError::NotFound("category"));
        }
        if !category.kind.accepts(kind) {
            return Err(LedgerError::validation(
                "category",
                format!("category is not compatible with {} transactions", kind),
            ));
        }
        Ok(())
    }
}
