use chrono::Utc;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use kobo::config::CONFIG;
use kobo::models::PaymentProvider;
use kobo::money::{Currency, Money};
use kobo::{catalog, FinanceCore, InMemoryStorage, LedgerError};

/// Scheduler daemon: the explicit loop that turns due recurrence rules into
/// concrete transactions, rolls due reminders forward, and surfaces budget
/// alerts. All the date math stays in the pure recurrence engine; this loop
/// only decides when to ask.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(CONFIG.log_level.as_str())
        .init();

    let core = FinanceCore::new(InMemoryStorage::new());

    let seeded = catalog::install_defaults(core.storage().as_ref()).await?;
    info!(categories = seeded, "system categories installed");
    seed_providers(&core).await?;

    let mut ticker = tokio::time::interval(Duration::from_secs(CONFIG.scheduler_interval_secs));
    info!(
        interval_secs = CONFIG.scheduler_interval_secs,
        "scheduler running"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = tick(&core).await {
                    warn!(error = %err, "scheduler tick failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }
    Ok(())
}

async fn tick(core: &FinanceCore<InMemoryStorage>) -> Result<(), LedgerError> {
    let now = Utc::now();
    let today = now.date_naive();

    let materialized = core.transactions.materialize_all_due(today).await?;
    if !materialized.is_empty() {
        info!(count = materialized.len(), "recurring transactions materialized");
    }

    for reminder in core.reminders.due(now).await? {
        info!(
            reminder_id = %reminder.id,
            title = %reminder.title,
            due_at = %reminder.due_at,
            "reminder due"
        );
        core.reminders.mark_notified(reminder.id).await?;
        if reminder.is_recurring {
            core.reminders
                .roll_recurring(reminder.id, reminder.owner)
                .await?;
        }
    }
    Ok(())
}

/// The providers the product ships with; fees and limits mirror the
/// sandbox defaults.
async fn seed_providers(core: &FinanceCore<InMemoryStorage>) -> Result<(), LedgerError> {
    let providers = [
        ("orange_money", "Orange Money", Decimal::new(15, 1), 100),
        ("mtn_momo", "MTN Mobile Money", Decimal::new(10, 1), 50),
    ];
    for (name, display_name, fee_percentage, fee_fixed) in providers {
        core.wallet
            .register_provider(PaymentProvider {
                id: Uuid::new_v4(),
                name: name.to_string(),
                display_name: display_name.to_string(),
                fee_percentage,
                fee_fixed: Money::from_minor_units(fee_fixed * 100, Currency::Xaf),
                min_amount: Money::from_minor_units(100_00, Currency::Xaf),
                max_amount: Money::from_minor_units(1_000_000_00, Currency::Xaf),
                is_active: true,
            })
            .await?;
    }
    Ok(())
}
