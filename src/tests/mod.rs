mod money_tests;
mod recurrence_tests;
mod reminder_tests;
mod transaction_tests;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Category, CategoryKind, Group, PaymentMethod, PaymentProvider};
use crate::money::{Currency, Money};
use crate::storage::Storage;
use crate::{FinanceCore, InMemoryStorage};

pub fn create_test_core() -> FinanceCore<InMemoryStorage> {
    FinanceCore::new(InMemoryStorage::new())
}

pub fn xaf(units: i64) -> Money {
    Money::from_minor_units(units * 100, Currency::Xaf)
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub async fn seed_category(
    core: &FinanceCore<InMemoryStorage>,
    owner: Option<Uuid>,
    name: &str,
    kind: CategoryKind,
    budget: Option<Money>,
    threshold: u8,
) -> Category {
    core.storage()
        .insert_category(Category {
            id: Uuid::new_v4(),
            owner,
            name: name.to_string(),
            kind,
            description: String::new(),
            budget,
            budget_alert_threshold: threshold,
            created_at: Utc::now(),
        })
        .await
        .unwrap()
}

/// Provider charging 1.5% + 100, accepting 100..=1,000,000: the sandbox
/// fee schedule.
pub async fn seed_provider(core: &FinanceCore<InMemoryStorage>) -> PaymentProvider {
    core.wallet
        .register_provider(PaymentProvider {
            id: Uuid::new_v4(),
            name: "orange_money".to_string(),
            display_name: "Orange Money".to_string(),
            fee_percentage: dec("1.5"),
            fee_fixed: xaf(100),
            min_amount: xaf(100),
            max_amount: xaf(1_000_000),
            is_active: true,
        })
        .await
        .unwrap()
}

pub async fn seed_method(
    core: &FinanceCore<InMemoryStorage>,
    user: Uuid,
    provider: &PaymentProvider,
) -> PaymentMethod {
    core.wallet
        .register_method(user, provider.id, "+237650000001".to_string(), true)
        .await
        .unwrap()
}

/// A group whose members have all accepted their invitations.
pub async fn active_group(
    core: &FinanceCore<InMemoryStorage>,
    owner: Uuid,
    members: &[Uuid],
) -> Group {
    let group = core
        .groups
        .create_group(owner, "Flatmates".to_string(), String::new(), Currency::Xaf)
        .await
        .unwrap();
    for member in members {
        core.groups.invite(group.id, *member, owner).await.unwrap();
        core.groups.accept(group.id, *member).await.unwrap();
    }
    group
}
