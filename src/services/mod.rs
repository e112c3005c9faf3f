pub mod budgets;
pub mod groups;
pub mod reminders;
pub mod reports;
pub mod splits;
pub mod transactions;
pub mod wallet;

pub use budgets::{BudgetAlerts, BudgetTracker, CategoryBudgetStatus};
pub use groups::{GroupBalance, GroupRegistry};
pub use reminders::ReminderBook;
pub use reports::{ChartPeriod, ChartSeries, Dashboard, MonthSummary, Reporter};
pub use splits::SplitCoordinator;
pub use transactions::TransactionLedger;
pub use wallet::WalletLedger;

use std::sync::Arc;

use crate::storage::Storage;

/// The whole core wired over one shared storage backend. Services are
/// stateless beyond their aggregate locks; everything recomputes from the
/// ledger.
pub struct FinanceCore<S: Storage> {
    pub transactions: TransactionLedger<S>,
    pub groups: GroupRegistry<S>,
    pub splits: SplitCoordinator<S>,
    pub wallet: WalletLedger<S>,
    pub budgets: BudgetTracker<S>,
    pub reports: Reporter<S>,
    pub reminders: ReminderBook<S>,
    storage: Arc<S>,
}

impl<S: Storage> FinanceCore<S> {
    pub fn new(storage: S) -> Self {
        let storage = Arc::new(storage);
        FinanceCore {
            transactions: TransactionLedger::new(storage.clone()),
            groups: GroupRegistry::new(storage.clone()),
            splits: SplitCoordinator::new(storage.clone()),
            wallet: WalletLedger::new(storage.clone()),
            budgets: BudgetTracker::new(storage.clone()),
            reports: Reporter::new(storage.clone()),
            reminders: ReminderBook::new(storage.clone()),
            storage,
        }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}
