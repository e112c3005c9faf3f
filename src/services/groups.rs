use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{
    Group, GroupMembership, MemberRole, MemberStatus, OwnerId, TransactionKind,
};
use crate::money::{Currency, Money};
use crate::storage::Storage;

/// Read projection of a group's ledger; never stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupBalance {
    pub income: Money,
    pub expense: Money,
    pub balance: Money,
}

/// Group and membership lifecycle. The owner is enrolled as an active admin
/// at creation; invitations sit pending until accepted and only active
/// members count anywhere else in the system.
pub struct GroupRegistry<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> GroupRegistry<S> {
    pub fn new(storage: Arc<S>) -> Self {
        GroupRegistry { storage }
    }

    pub async fn create_group(
        &self,
        owner: Uuid,
        name: String,
        description: String,
        currency: Currency,
    ) -> Result<Group, LedgerError> {
        if name.trim().is_empty() {
            return Err(LedgerError::validation("name", "name cannot be empty"));
        }
        if name.len() > 200 {
            return Err(LedgerError::validation(
                "name",
                "name cannot exceed 200 characters",
            ));
        }

        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4(),
            owner,
            name,
            description,
            currency,
            is_active: true,
            created_at: now,
        };
        let owner_membership = GroupMembership {
            id: Uuid::new_v4(),
            group_id: group.id,
            user_id: owner,
            role: MemberRole::Admin,
            status: MemberStatus::Active,
            invited_by: None,
            joined_at: Some(now),
            created_at: now,
        };
        let group = self.storage.insert_group(group, owner_membership).await?;
        info!(group_id = %group.id, owner = %owner, "group created");
        Ok(group)
    }

    pub async fn get_group(&self, id: Uuid) -> Result<Group, LedgerError> {
        self.storage
            .get_group(id)
            .await?
            .ok_or(LedgerError::NotFound("group"))
    }

    /// Creates a pending membership. Only an active admin may invite.
    pub async fn invite(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        invited_by: Uuid,
    ) -> Result<GroupMembership, LedgerError> {
        let group = self.get_group(group_id).await?;
        if !group.is_active {
            return Err(LedgerError::NotFound("group"));
        }
        let inviter = self
            .storage
            .get_membership(group_id, invited_by)
            .await?
            .filter(|m| m.is_active())
            .ok_or(LedgerError::NotFound("group"))?;
        if !inviter.is_admin() {
            return Err(LedgerError::validation(
                "role",
                "only admins can invite members",
            ));
        }

        let membership = GroupMembership {
            id: Uuid::new_v4(),
            group_id,
            user_id,
            role: MemberRole::Member,
            status: MemberStatus::Pending,
            invited_by: Some(invited_by),
            joined_at: None,
            created_at: Utc::now(),
        };
        let membership = self.storage.insert_membership(membership).await?;
        info!(group_id = %group_id, user_id = %user_id, "member invited");
        Ok(membership)
    }

    /// Pending (or previously left) membership becomes active; accepting an
    /// already-active membership is a no-op.
    pub async fn accept(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<GroupMembership, LedgerError> {
        let mut membership = self
            .storage
            .get_membership(group_id, user_id)
            .await?
            .ok_or(LedgerError::NotFound("membership"))?;
        if membership.is_active() {
            return Ok(membership);
        }
        membership.status = MemberStatus::Active;
        membership.joined_at = Some(Utc::now());
        let membership = self.storage.update_membership(membership).await?;
        info!(group_id = %group_id, user_id = %user_id, "member joined");
        Ok(membership)
    }

    pub async fn leave(&self, group_id: Uuid, user_id: Uuid) -> Result<(), LedgerError> {
        let group = self.get_group(group_id).await?;
        if group.owner == user_id {
            return Err(LedgerError::validation(
                "user",
                "the group owner cannot leave",
            ));
        }
        let mut membership = self
            .storage
            .get_membership(group_id, user_id)
            .await?
            .ok_or(LedgerError::NotFound("membership"))?;
        membership.status = MemberStatus::Left;
        self.storage.update_membership(membership).await?;
        info!(group_id = %group_id, user_id = %user_id, "member left");
        Ok(())
    }

    /// Active members in stable join order: the remainder-distribution
    /// order for equal splits.
    pub async fn active_members(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<GroupMembership>, LedgerError> {
        let members = self.storage.memberships_for_group(group_id).await?;
        Ok(in_join_order(members))
    }

    pub async fn is_active_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, LedgerError> {
        Ok(self
            .storage
            .get_membership(group_id, user_id)
            .await?
            .map(|m| m.is_active())
            .unwrap_or(false))
    }

    /// income − expense over the group's live transactions.
    pub async fn group_balance(&self, group_id: Uuid) -> Result<GroupBalance, LedgerError> {
        let group = self.get_group(group_id).await?;
        let mut income = Money::zero(group.currency);
        let mut expense = Money::zero(group.currency);
        for tx in self
            .storage
            .transactions_for_owner(OwnerId::Group(group_id))
            .await?
        {
            if tx.is_deleted() {
                continue;
            }
            match tx.kind {
                TransactionKind::Income => income = income.try_add(&tx.amount)?,
                TransactionKind::Expense => expense = expense.try_add(&tx.amount)?,
            }
        }
        let balance = income.try_sub(&expense)?;
        Ok(GroupBalance {
            income,
            expense,
            balance,
        })
    }
}

/// Active memberships sorted by (joined_at, id), the declared stable order.
pub(crate) fn in_join_order(members: Vec<GroupMembership>) -> Vec<GroupMembership> {
    let mut active: Vec<GroupMembership> =
        members.into_iter().filter(|m| m.is_active()).collect();
    active.sort_by_key(|m| (m.joined_at.unwrap_or(m.created_at), m.id));
    active
}
