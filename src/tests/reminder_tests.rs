use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::models::{NewReminder, OwnerId, ReminderKind, TransactionFilter};
use crate::recurrence::{Frequency, RecurrenceRule};
use crate::tests::{create_test_core, xaf};
use crate::LedgerError;

fn new_reminder(owner: Uuid, title: &str) -> NewReminder {
    NewReminder {
        owner: OwnerId::User(owner),
        created_by: owner,
        title: title.to_string(),
        description: String::new(),
        kind: ReminderKind::Bill,
        due_at: Utc::now() + Duration::days(3),
        amount: Some(xaf(2500)),
        recurrence_rule: None,
    }
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> chrono::DateTime<Utc> {
    NaiveDateTime::new(
        NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        NaiveTime::from_hms_opt(h, min, 0).unwrap(),
    )
    .and_utc()
}

#[tokio::test]
async fn create_validates_input() {
    let core = create_test_core();
    let user = Uuid::new_v4();

    let mut blank = new_reminder(user, "  ");
    blank.title = "   ".to_string();
    assert!(matches!(
        core.reminders.create(blank).await.unwrap_err(),
        LedgerError::Validation { .. }
    ));

    let mut free = new_reminder(user, "Electricity");
    free.amount = Some(xaf(0));
    assert!(matches!(
        core.reminders.create(free).await.unwrap_err(),
        LedgerError::Validation { .. }
    ));

    let mut bad_rule = new_reminder(user, "Rent");
    bad_rule.recurrence_rule = Some(RecurrenceRule {
        frequency: Frequency::Monthly,
        interval: 0,
        day_of_month: None,
        end_date: None,
    });
    assert!(matches!(
        core.reminders.create(bad_rule).await.unwrap_err(),
        LedgerError::Validation { .. }
    ));

    let created = core.reminders.create(new_reminder(user, "Water bill")).await.unwrap();
    assert!(!created.is_recurring);
    assert!(!created.is_completed);
}

#[tokio::test]
async fn completion_is_idempotent_and_owner_scoped() {
    let core = create_test_core();
    let user = Uuid::new_v4();
    let owner = OwnerId::User(user);
    let reminder = core.reminders.create(new_reminder(user, "Rent")).await.unwrap();

    let done = core.reminders.complete(reminder.id, owner).await.unwrap();
    let first = done.completed_at.unwrap();
    let again = core.reminders.complete(reminder.id, owner).await.unwrap();
    assert_eq!(again.completed_at, Some(first));

    let stranger = OwnerId::User(Uuid::new_v4());
    assert_eq!(
        core.reminders.complete(reminder.id, stranger).await.unwrap_err(),
        LedgerError::NotFound("reminder")
    );
}

#[tokio::test]
async fn due_window_and_notification_bookkeeping() {
    let core = create_test_core();
    let user = Uuid::new_v4();
    let now = Utc::now();

    let mut soon = new_reminder(user, "Pay electricity");
    soon.due_at = now + Duration::minutes(30);
    let soon = core.reminders.create(soon).await.unwrap();

    let mut far = new_reminder(user, "Renew insurance");
    far.due_at = now + Duration::days(10);
    core.reminders.create(far).await.unwrap();

    let due = core.reminders.due(now).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, soon.id);

    let notified = core.reminders.mark_notified(soon.id).await.unwrap();
    assert!(notified.notification_sent);
    assert!(core.reminders.due(now).await.unwrap().is_empty());
}

#[tokio::test]
async fn rolling_preserves_time_of_day_and_clamps_dates() {
    let core = create_test_core();
    let user = Uuid::new_v4();
    let owner = OwnerId::User(user);

    let mut rent = new_reminder(user, "Rent");
    rent.due_at = at(2025, 4, 30, 9, 30);
    rent.recurrence_rule = Some(RecurrenceRule {
        frequency: Frequency::Monthly,
        interval: 1,
        day_of_month: Some(31),
        end_date: None,
    });
    let rent = core.reminders.create(rent).await.unwrap();
    assert!(rent.is_recurring);

    let next = core
        .reminders
        .roll_recurring(rent.id, owner)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(next.due_at, at(2025, 5, 31, 9, 30));
    assert!(!next.is_completed);
    assert!(!next.notification_sent);
    assert_ne!(next.id, rent.id);

    // Rolling never writes to the transaction ledger.
    let txs = core
        .transactions
        .query(owner, &TransactionFilter::default())
        .await
        .unwrap();
    assert!(txs.is_empty());
}

#[tokio::test]
async fn exhausted_rules_stop_rolling() {
    let core = create_test_core();
    let user = Uuid::new_v4();
    let owner = OwnerId::User(user);

    let mut last = new_reminder(user, "Final installment");
    last.due_at = at(2025, 3, 15, 8, 0);
    last.recurrence_rule = Some(RecurrenceRule {
        frequency: Frequency::Monthly,
        interval: 1,
        day_of_month: Some(15),
        end_date: Some(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()),
    });
    let last = core.reminders.create(last).await.unwrap();

    assert!(core
        .reminders
        .roll_recurring(last.id, owner)
        .await
        .unwrap()
        .is_none());

    let plain = core.reminders.create(new_reminder(user, "One-off")).await.unwrap();
    assert!(matches!(
        core.reminders.roll_recurring(plain.id, owner).await.unwrap_err(),
        LedgerError::Validation { .. }
    ));
}

#[tokio::test]
async fn upcoming_lists_incomplete_reminders_soonest_first() {
    let core = create_test_core();
    let user = Uuid::new_v4();
    let owner = OwnerId::User(user);
    let now = Utc::now();

    let mut a = new_reminder(user, "In five days");
    a.due_at = now + Duration::days(5);
    let a = core.reminders.create(a).await.unwrap();

    let mut b = new_reminder(user, "Tomorrow");
    b.due_at = now + Duration::days(1);
    let b = core.reminders.create(b).await.unwrap();

    let mut done = new_reminder(user, "Already handled");
    done.due_at = now + Duration::days(2);
    let done = core.reminders.create(done).await.unwrap();
    core.reminders.complete(done.id, owner).await.unwrap();

    let mut distant = new_reminder(user, "Next month");
    distant.due_at = now + Duration::days(30);
    core.reminders.create(distant).await.unwrap();

    let upcoming = core.reminders.upcoming(owner, 7, now).await.unwrap();
    let ids: Vec<Uuid> = upcoming.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![b.id, a.id]);
}
