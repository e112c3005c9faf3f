use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Currency;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Member,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Pending,
    Active,
    Left,
}

/// A shared-finance group. The owner is enrolled as an active admin member
/// at creation and stays one for the group's lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub owner: Uuid,
    pub name: String,
    pub description: String,
    pub currency: Currency,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// One membership row per (group, user). Invitations sit Pending until
/// accepted; only Active members count for splits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupMembership {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub invited_by: Option<Uuid>,
    pub joined_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl GroupMembership {
    pub fn is_admin(&self) -> bool {
        self.role == MemberRole::Admin
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}
