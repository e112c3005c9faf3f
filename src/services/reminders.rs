use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::CONFIG;
use crate::error::LedgerError;
use crate::models::{NewReminder, OwnerId, Reminder};
use crate::recurrence;
use crate::storage::Storage;

/// Payment/bill/general reminders. Shares the recurrence machinery with the
/// transaction ledger but never writes a ledger row: a recurring reminder
/// rolls forward into a fresh reminder instead.
pub struct ReminderBook<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> ReminderBook<S> {
    pub fn new(storage: Arc<S>) -> Self {
        ReminderBook { storage }
    }

    pub async fn create(&self, new: NewReminder) -> Result<Reminder, LedgerError> {
        if new.title.trim().is_empty() {
            return Err(LedgerError::validation("title", "title cannot be empty"));
        }
        if new.title.len() > 200 {
            return Err(LedgerError::validation(
                "title",
                "title cannot exceed 200 characters",
            ));
        }
        if let Some(amount) = &new.amount {
            if !amount.is_positive() {
                return Err(LedgerError::validation(
                    "amount",
                    "amount must be greater than 0",
                ));
            }
        }
        if let Some(rule) = &new.recurrence_rule {
            rule.validate()?;
        }

        let reminder = Reminder {
            id: Uuid::new_v4(),
            owner: new.owner,
            created_by: new.created_by,
            title: new.title,
            description: new.description,
            kind: new.kind,
            due_at: new.due_at,
            amount: new.amount,
            is_recurring: new.recurrence_rule.is_some(),
            recurrence_rule: new.recurrence_rule,
            is_completed: false,
            completed_at: None,
            notification_sent: false,
            notification_sent_at: None,
            created_at: Utc::now(),
        };
        let reminder = self.storage.insert_reminder(reminder).await?;
        info!(reminder_id = %reminder.id, due_at = %reminder.due_at, "reminder created");
        Ok(reminder)
    }

    pub async fn get(&self, id: Uuid, owner: OwnerId) -> Result<Reminder, LedgerError> {
        self.owned(id, owner).await
    }

    /// Idempotent: completing a completed reminder keeps its original
    /// completed_at.
    pub async fn complete(&self, id: Uuid, owner: OwnerId) -> Result<Reminder, LedgerError> {
        let mut reminder = self.owned(id, owner).await?;
        if reminder.is_completed {
            return Ok(reminder);
        }
        reminder.is_completed = true;
        reminder.completed_at = Some(Utc::now());
        let reminder = self.storage.update_reminder(reminder).await?;
        info!(reminder_id = %reminder.id, "reminder completed");
        Ok(reminder)
    }

    /// Reminders whose notification should go out: incomplete, not yet
    /// notified, due within the configured look-ahead window.
    pub async fn due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, LedgerError> {
        let horizon = now + Duration::minutes(CONFIG.reminder_lookahead_mins);
        self.storage.due_reminders(now, horizon).await
    }

    /// Notification bookkeeping; delivery itself is an external concern.
    pub async fn mark_notified(&self, id: Uuid) -> Result<Reminder, LedgerError> {
        let mut reminder = self
            .storage
            .get_reminder(id)
            .await?
            .ok_or(LedgerError::NotFound("reminder"))?;
        if reminder.notification_sent {
            return Ok(reminder);
        }
        reminder.notification_sent = true;
        reminder.notification_sent_at = Some(Utc::now());
        self.storage.update_reminder(reminder.clone()).await?;
        Ok(reminder)
    }

    /// Creates the next occurrence of a recurring reminder as a fresh row,
    /// preserving the time of day. None once the rule is exhausted.
    pub async fn roll_recurring(
        &self,
        id: Uuid,
        owner: OwnerId,
    ) -> Result<Option<Reminder>, LedgerError> {
        let reminder = self.owned(id, owner).await?;
        let rule = reminder
            .recurrence_rule
            .as_ref()
            .ok_or_else(|| LedgerError::validation("reminder", "reminder is not recurring"))?;

        let Some(next_date) = recurrence::next_occurrence(rule, reminder.due_at.date_naive())
        else {
            return Ok(None);
        };
        let next_due = NaiveDateTime::new(next_date, reminder.due_at.time()).and_utc();

        let next = Reminder {
            id: Uuid::new_v4(),
            due_at: next_due,
            is_completed: false,
            completed_at: None,
            notification_sent: false,
            notification_sent_at: None,
            created_at: Utc::now(),
            ..reminder
        };
        let next = self.storage.insert_reminder(next).await?;
        info!(reminder_id = %next.id, due_at = %next.due_at, "recurring reminder rolled");
        Ok(Some(next))
    }

    /// Incomplete reminders due within the next `days`, soonest first.
    pub async fn upcoming(
        &self,
        owner: OwnerId,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reminder>, LedgerError> {
        let horizon = now + Duration::days(days);
        Ok(self
            .storage
            .reminders_for_owner(owner)
            .await?
            .into_iter()
            .filter(|r| !r.is_completed && r.due_at >= now && r.due_at <= horizon)
            .collect())
    }

    async fn owned(&self, id: Uuid, owner: OwnerId) -> Result<Reminder, LedgerError> {
        let reminder = self
            .storage
            .get_reminder(id)
            .await?
            .ok_or(LedgerError::NotFound("reminder"))?;
        if reminder.owner != owner {
            return Err(LedgerError::NotFound("reminder"));
        }
        Ok(reminder)
    }
}
