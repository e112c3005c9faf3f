use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{ExpenseSplit, Group, Transaction, TransactionKind};
use crate::money::Money;
use crate::services::groups::in_join_order;
use crate::storage::Storage;
use crate::sync::AggregateLocks;

/// Derives per-member owed shares of group expenses and tracks their
/// settlement. A transaction's split-set is a unit of mutual exclusion:
/// replacement is atomic and concurrent re-splits serialize.
pub struct SplitCoordinator<S: Storage> {
    storage: Arc<S>,
    locks: AggregateLocks,
}

impl<S: Storage> SplitCoordinator<S> {
    pub fn new(storage: Arc<S>) -> Self {
        SplitCoordinator {
            storage,
            locks: AggregateLocks::new(),
        }
    }

    /// Splits the amount evenly across active members in minor units. The
    /// remainder goes one unit at a time to the first members in join
    /// order, so the shares always total the transaction amount exactly.
    pub async fn split_equal(
        &self,
        transaction_id: Uuid,
        acting_user: Uuid,
    ) -> Result<Vec<ExpenseSplit>, LedgerError> {
        let (tx, group) = self.splittable(transaction_id, acting_user).await?;
        let members = in_join_order(self.storage.memberships_for_group(group.id).await?);
        if members.is_empty() {
            return Err(LedgerError::validation(
                "group",
                "group has no active members",
            ));
        }

        let total_minor = tx.amount.to_minor_units();
        let count = members.len() as i64;
        let base = total_minor / count;
        let remainder = (total_minor % count) as usize;

        let now = Utc::now();
        let splits: Vec<ExpenseSplit> = members
            .iter()
            .enumerate()
            .map(|(i, member)| {
                let minor = base + if i < remainder { 1 } else { 0 };
                ExpenseSplit {
                    id: Uuid::new_v4(),
                    transaction_id: tx.id,
                    user_id: member.user_id,
                    amount: Money::from_minor_units(minor, tx.amount.currency()),
                    is_paid: false,
                    paid_at: None,
                    created_at: now,
                }
            })
            .collect();

        self.replace(tx.id, splits).await
    }

    /// Splits by caller-supplied shares, which must cover active members
    /// only and sum exactly to the transaction amount.
    pub async fn split_custom(
        &self,
        transaction_id: Uuid,
        acting_user: Uuid,
        shares: Vec<(Uuid, Money)>,
    ) -> Result<Vec<ExpenseSplit>, LedgerError> {
        let (tx, group) = self.splittable(transaction_id, acting_user).await?;
        if shares.is_empty() {
            return Err(LedgerError::validation("shares", "shares cannot be empty"));
        }

        let mut seen = HashSet::new();
        let mut total = Money::zero(tx.amount.currency());
        for (user_id, amount) in &shares {
            if !seen.insert(*user_id) {
                return Err(LedgerError::validation(
                    "shares",
                    "duplicate user in shares",
                ));
            }
            if !amount.is_positive() {
                return Err(LedgerError::validation(
                    "shares",
                    "share amounts must be greater than 0",
                ));
            }
            let member = self.storage.get_membership(group.id, *user_id).await?;
            if !member.map(|m| m.is_active()).unwrap_or(false) {
                return Err(LedgerError::validation(
                    "shares",
                    format!("user {} is not an active group member", user_id),
                ));
            }
            total = total.try_add(amount)?;
        }
        if total != tx.amount {
            return Err(LedgerError::SplitAmountMismatch {
                expected: tx.amount,
                actual: total,
            });
        }

        let now = Utc::now();
        let splits: Vec<ExpenseSplit> = shares
            .into_iter()
            .map(|(user_id, amount)| ExpenseSplit {
                id: Uuid::new_v4(),
                transaction_id: tx.id,
                user_id,
                amount,
                is_paid: false,
                paid_at: None,
                created_at: now,
            })
            .collect();

        self.replace(tx.id, splits).await
    }

    /// Idempotent: an already-paid split keeps its original paid_at.
    pub async fn mark_paid(
        &self,
        split_id: Uuid,
        acting_user: Uuid,
    ) -> Result<ExpenseSplit, LedgerError> {
        let mut split = self
            .storage
            .get_split(split_id)
            .await?
            .ok_or(LedgerError::NotFound("split"))?;
        if !self.may_settle(&split, acting_user).await? {
            return Err(LedgerError::NotFound("split"));
        }
        if split.is_paid {
            return Ok(split);
        }
        split.is_paid = true;
        split.paid_at = Some(Utc::now());
        let split = self.storage.update_split(split).await?;
        info!(split_id = %split.id, user_id = %split.user_id, "split marked paid");
        Ok(split)
    }

    pub async fn splits_for(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<ExpenseSplit>, LedgerError> {
        self.storage.splits_for_transaction(transaction_id).await
    }

    async fn replace(
        &self,
        transaction_id: Uuid,
        splits: Vec<ExpenseSplit>,
    ) -> Result<Vec<ExpenseSplit>, LedgerError> {
        let _guard = self.locks.acquire(transaction_id).await?;
        let splits = self.storage.replace_splits(transaction_id, splits).await?;
        info!(
            transaction_id = %transaction_id,
            count = splits.len(),
            "splits replaced"
        );
        Ok(splits)
    }

    /// The transaction must be a live group-owned expense, and the acting
    /// user an active member of its group.
    async fn splittable(
        &self,
        transaction_id: Uuid,
        acting_user: Uuid,
    ) -> Result<(Transaction, Group), LedgerError> {
        let tx = self
            .storage
            .get_transaction(transaction_id)
            .await?
            .filter(|tx| !tx.is_deleted())
            .ok_or(LedgerError::NotFound("transaction"))?;
        let group_id = tx
            .owner
            .group_id()
            .ok_or_else(|| {
                LedgerError::validation(
                    "transaction",
                    "only group transactions can be split",
                )
            })?;
        if tx.kind != TransactionKind::Expense {
            return Err(LedgerError::validation(
                "transaction",
                "only expenses can be split",
            ));
        }
        let group = self
            .storage
            .get_group(group_id)
            .await?
            .ok_or(LedgerError::NotFound("transaction"))?;
        let member = self.storage.get_membership(group_id, acting_user).await?;
        if !member.map(|m| m.is_active()).unwrap_or(false) {
            return Err(LedgerError::NotFound("transaction"));
        }
        Ok((tx, group))
    }

    /// A member may settle their own share; group admins may settle any.
    async fn may_settle(
        &self,
        split: &ExpenseSplit,
        acting_user: Uuid,
    ) -> Result<bool, LedgerError> {
        if split.user_id == acting_user {
            return Ok(true);
        }
        let Some(tx) = self.storage.get_transaction(split.transaction_id).await? else {
            return Ok(false);
        };
        let Some(group_id) = tx.owner.group_id() else {
            return Ok(false);
        };
        Ok(self
            .storage
            .get_membership(group_id, acting_user)
            .await?
            .map(|m| m.is_active() && m.is_admin())
            .unwrap_or(false))
    }
}
