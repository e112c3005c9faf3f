use chrono::Utc;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{Category, CategoryKind};
use crate::storage::Storage;

/// The shared read-only category templates every account starts from.
pub fn default_categories() -> Vec<Category> {
    let defaults: [(&str, CategoryKind, &str); 15] = [
        (
            "Food & Groceries",
            CategoryKind::Expense,
            "Groceries, restaurants and deliveries",
        ),
        (
            "Transport",
            CategoryKind::Expense,
            "Fuel, public transport, taxi, vehicle upkeep",
        ),
        (
            "Housing",
            CategoryKind::Expense,
            "Rent, charges, maintenance, home insurance",
        ),
        (
            "Bills & Utilities",
            CategoryKind::Expense,
            "Electricity, water, internet, phone, subscriptions",
        ),
        (
            "Entertainment",
            CategoryKind::Expense,
            "Cinema, outings, games, streaming",
        ),
        (
            "Shopping",
            CategoryKind::Expense,
            "Clothing, electronics, miscellaneous purchases",
        ),
        (
            "Health",
            CategoryKind::Expense,
            "Doctor, pharmacy, insurance, optics",
        ),
        (
            "Education",
            CategoryKind::Expense,
            "Training, books, online courses, tuition",
        ),
        (
            "Travel",
            CategoryKind::Expense,
            "Tickets, hotels, holidays, tourist activities",
        ),
        (
            "Other Expenses",
            CategoryKind::Expense,
            "Uncategorized spending",
        ),
        (
            "Salary",
            CategoryKind::Income,
            "Monthly salary and bonuses",
        ),
        (
            "Freelance",
            CategoryKind::Income,
            "Freelance and consulting income",
        ),
        (
            "Investments",
            CategoryKind::Income,
            "Dividends, interest and investment gains",
        ),
        ("Gifts Received", CategoryKind::Income, "Gifts and donations"),
        (
            "Other Income",
            CategoryKind::Income,
            "Miscellaneous income sources",
        ),
    ];

    let now = Utc::now();
    defaults
        .into_iter()
        .map(|(name, kind, description)| Category {
            id: Uuid::new_v4(),
            owner: None,
            name: name.to_string(),
            kind,
            description: description.to_string(),
            budget: None,
            budget_alert_threshold: 80,
            created_at: now,
        })
        .collect()
}

/// Installs any missing system categories; returns how many were created.
pub async fn install_defaults<S: Storage>(storage: &S) -> Result<usize, LedgerError> {
    let mut created = 0;
    for category in default_categories() {
        match storage.insert_category(category).await {
            Ok(_) => created += 1,
            Err(LedgerError::Validation { .. }) => {} // already present
            Err(err) => return Err(err),
        }
    }
    Ok(created)
}
