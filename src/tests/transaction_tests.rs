use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{
    CategoryKind, NewTransaction, OwnerId, SortOrder, TransactionFilter, TransactionKind,
};
use crate::recurrence::{Frequency, RecurrenceRule};
use crate::tests::{active_group, create_test_core, seed_category, xaf};
use crate::LedgerError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_tx(owner: OwnerId, user: Uuid, kind: TransactionKind, units: i64, on: NaiveDate) -> NewTransaction {
    NewTransaction {
        owner,
        created_by: user,
        category_id: None,
        amount: xaf(units),
        kind,
        description: String::new(),
        date: on,
        recurrence_rule: None,
    }
}

#[tokio::test]
async fn records_income_and_expense_with_signed_amounts() {
    let core = create_test_core();
    let user = Uuid::new_v4();
    let owner = OwnerId::User(user);
    let today = Utc::now().date_naive();

    let income = core
        .transactions
        .record(new_tx(owner, user, TransactionKind::Income, 2000, today), today)
        .await
        .unwrap();
    let expense = core
        .transactions
        .record(new_tx(owner, user, TransactionKind::Expense, 500, today), today)
        .await
        .unwrap();

    assert_eq!(income.signed_amount(), xaf(2000).amount());
    assert_eq!(expense.signed_amount(), -xaf(500).amount());
}

#[tokio::test]
async fn rejects_non_positive_amount() {
    let core = create_test_core();
    let user = Uuid::new_v4();
    let today = Utc::now().date_naive();

    let err = core
        .transactions
        .record(
            new_tx(OwnerId::User(user), user, TransactionKind::Expense, 0, today),
            today,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation { .. }));
}

#[tokio::test]
async fn rejects_incompatible_category_kind() {
    let core = create_test_core();
    let user = Uuid::new_v4();
    let today = Utc::now().date_naive();
    let salary = seed_category(&core, None, "Salary", CategoryKind::Income, None, 80).await;
    let misc = seed_category(&core, None, "Misc", CategoryKind::Both, None, 80).await;

    let mut bad = new_tx(OwnerId::User(user), user, TransactionKind::Expense, 100, today);
    bad.category_id = Some(salary.id);
    let err = core.transactions.record(bad, today).await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation { .. }));

    // A "both" category takes either kind.
    let mut ok = new_tx(OwnerId::User(user), user, TransactionKind::Expense, 100, today);
    ok.category_id = Some(misc.id);
    assert!(core.transactions.record(ok, today).await.is_ok());
}

#[tokio::test]
async fn unknown_or_foreign_category_reads_as_not_found() {
    let core = create_test_core();
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();
    let today = Utc::now().date_naive();
    let private =
        seed_category(&core, Some(other), "Private", CategoryKind::Expense, None, 80).await;

    let mut tx = new_tx(OwnerId::User(user), user, TransactionKind::Expense, 100, today);
    tx.category_id = Some(Uuid::new_v4());
    assert_eq!(
        core.transactions.record(tx, today).await.unwrap_err(),
        LedgerError::NotFound("category")
    );

    let mut tx = new_tx(OwnerId::User(user), user, TransactionKind::Expense, 100, today);
    tx.category_id = Some(private.id);
    assert_eq!(
        core.transactions.record(tx, today).await.unwrap_err(),
        LedgerError::NotFound("category")
    );
}

#[tokio::test]
async fn rejects_dates_beyond_future_allowance() {
    let core = create_test_core();
    let user = Uuid::new_v4();
    let today = Utc::now().date_naive();

    let too_far = today + Duration::days(30);
    let err = core
        .transactions
        .record(
            new_tx(OwnerId::User(user), user, TransactionKind::Expense, 100, too_far),
            today,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation { .. }));

    // Within the allowance is fine.
    let near = today + Duration::days(3);
    assert!(core
        .transactions
        .record(
            new_tx(OwnerId::User(user), user, TransactionKind::Expense, 100, near),
            today,
        )
        .await
        .is_ok());
}

#[tokio::test]
async fn group_transactions_require_active_membership() {
    let core = create_test_core();
    let owner = Uuid::new_v4();
    let outsider = Uuid::new_v4();
    let group = active_group(&core, owner, &[]).await;
    let today = Utc::now().date_naive();

    let err = core
        .transactions
        .record(
            new_tx(
                OwnerId::Group(group.id),
                outsider,
                TransactionKind::Expense,
                100,
                today,
            ),
            today,
        )
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NotFound("group"));

    assert!(core
        .transactions
        .record(
            new_tx(
                OwnerId::Group(group.id),
                owner,
                TransactionKind::Expense,
                100,
                today,
            ),
            today,
        )
        .await
        .is_ok());
}

#[tokio::test]
async fn amend_and_ownership_checks() {
    let core = create_test_core();
    let user = Uuid::new_v4();
    let owner = OwnerId::User(user);
    let today = Utc::now().date_naive();

    let tx = core
        .transactions
        .record(new_tx(owner, user, TransactionKind::Expense, 300, today), today)
        .await
        .unwrap();

    let amended = core
        .transactions
        .amend(
            tx.id,
            owner,
            crate::models::TransactionPatch {
                amount: Some(xaf(450)),
                description: Some("groceries".to_string()),
                ..Default::default()
            },
            today,
        )
        .await
        .unwrap();
    assert_eq!(amended.amount, xaf(450));
    assert_eq!(amended.description, "groceries");

    // A stranger sees not-found, not forbidden.
    let stranger = OwnerId::User(Uuid::new_v4());
    assert_eq!(
        core.transactions.get(tx.id, stranger).await.unwrap_err(),
        LedgerError::NotFound("transaction")
    );
}

#[tokio::test]
async fn soft_delete_hides_from_queries_but_not_from_get() {
    let core = create_test_core();
    let user = Uuid::new_v4();
    let owner = OwnerId::User(user);
    let today = Utc::now().date_naive();

    let tx = core
        .transactions
        .record(new_tx(owner, user, TransactionKind::Expense, 300, today), today)
        .await
        .unwrap();

    core.transactions.soft_delete(tx.id, owner).await.unwrap();
    // Idempotent.
    core.transactions.soft_delete(tx.id, owner).await.unwrap();

    let listed = core
        .transactions
        .query(owner, &TransactionFilter::default())
        .await
        .unwrap();
    assert!(listed.is_empty());

    let fetched = core.transactions.get(tx.id, owner).await.unwrap();
    assert!(fetched.is_deleted());

    // And the deleted row cannot be amended back to life.
    let err = core
        .transactions
        .amend(tx.id, owner, Default::default(), today)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NotFound("transaction"));
}

#[tokio::test]
async fn query_filters_and_ordering() {
    let core = create_test_core();
    let user = Uuid::new_v4();
    let owner = OwnerId::User(user);
    let today = Utc::now().date_naive();

    for (units, kind, desc, days_ago) in [
        (500, TransactionKind::Expense, "Lunch at Cafe", 1),
        (1500, TransactionKind::Expense, "taxi ride", 2),
        (9000, TransactionKind::Income, "salary", 3),
    ] {
        let mut tx = new_tx(owner, user, kind, units, today - Duration::days(days_ago));
        tx.description = desc.to_string();
        core.transactions.record(tx, today).await.unwrap();
    }

    let expenses = core
        .transactions
        .query(
            owner,
            &TransactionFilter {
                kind: Some(TransactionKind::Expense),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(expenses.len(), 2);

    let searched = core
        .transactions
        .query(
            owner,
            &TransactionFilter {
                search: Some("CAFE".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].description, "Lunch at Cafe");

    let ranged = core
        .transactions
        .query(
            owner,
            &TransactionFilter {
                min_amount: Some(xaf(1000).amount()),
                max_amount: Some(xaf(5000).amount()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(ranged.len(), 1);
    assert_eq!(ranged[0].amount, xaf(1500));

    let by_amount = core
        .transactions
        .query(
            owner,
            &TransactionFilter {
                order: Some(SortOrder::AmountDesc),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_amount[0].amount, xaf(9000));
    assert_eq!(by_amount[2].amount, xaf(500));

    let recent_window = core
        .transactions
        .query(
            owner,
            &TransactionFilter {
                date_from: Some(today - Duration::days(2)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(recent_window.len(), 2);
}

#[tokio::test]
async fn materializes_due_occurrences_exactly_once() {
    let core = create_test_core();
    let user = Uuid::new_v4();
    let owner = OwnerId::User(user);
    let today = Utc::now().date_naive();

    let mut source = new_tx(owner, user, TransactionKind::Expense, 2500, date(2025, 1, 10));
    source.description = "rent".to_string();
    source.recurrence_rule = Some(RecurrenceRule {
        frequency: Frequency::Monthly,
        interval: 1,
        day_of_month: Some(10),
        end_date: None,
    });
    let source = core.transactions.record(source, today).await.unwrap();
    assert!(source.is_recurring);

    let created = core
        .transactions
        .materialize_due(source.id, date(2025, 4, 15))
        .await
        .unwrap();
    let mut dates: Vec<NaiveDate> = created.iter().map(|tx| tx.date).collect();
    dates.sort();
    assert_eq!(
        dates,
        vec![date(2025, 2, 10), date(2025, 3, 10), date(2025, 4, 10)]
    );
    for tx in &created {
        assert_eq!(tx.recurrence_source, Some(source.id));
        assert_eq!(tx.amount, source.amount);
        assert_eq!(tx.description, source.description);
        assert!(!tx.is_recurring);
    }

    // Re-evaluating the same horizon creates nothing new.
    let again = core
        .transactions
        .materialize_due(source.id, date(2025, 4, 15))
        .await
        .unwrap();
    assert!(again.is_empty());

    // The source anchor never moves.
    let source_now = core.transactions.get(source.id, owner).await.unwrap();
    assert_eq!(source_now.date, date(2025, 1, 10));

    // Sweep over all sources picks up the next month exactly once too.
    let swept = core
        .transactions
        .materialize_all_due(date(2025, 5, 31))
        .await
        .unwrap();
    assert_eq!(swept.len(), 1);
    assert_eq!(swept[0].date, date(2025, 5, 10));
}
