use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::owner::OwnerId;
use crate::money::Money;
use crate::recurrence::RecurrenceRule;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Payment,
    Bill,
    General,
}

/// A dated nudge. Shares the recurrence machinery with transactions but
/// never materializes a ledger row; rolling a recurring reminder forward
/// creates the next reminder instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub owner: OwnerId,
    pub created_by: Uuid,
    pub title: String,
    pub description: String,
    pub kind: ReminderKind,
    pub due_at: DateTime<Utc>,
    pub amount: Option<Money>,
    pub is_recurring: bool,
    pub recurrence_rule: Option<RecurrenceRule>,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub notification_sent: bool,
    pub notification_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewReminder {
    pub owner: OwnerId,
    pub created_by: Uuid,
    pub title: String,
    pub description: String,
    pub kind: ReminderKind,
    pub due_at: DateTime<Utc>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub recurrence_rule: Option<RecurrenceRule>,
}
