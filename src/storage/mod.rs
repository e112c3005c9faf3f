use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{
    Category, ExpenseSplit, Group, GroupMembership, Payment, PaymentMethod,
    PaymentProvider, Reminder, Transaction, Wallet, WalletEntry,
};
use crate::models::OwnerId;
use crate::money::{Currency, Money};

/// One wallet mutation inside an atomic batch: the balance the wallet moves
/// to and the entry recording the move. Storage assigns the entry's `seq`.
#[derive(Clone, Debug)]
pub struct WalletCommit {
    pub wallet_id: Uuid,
    pub new_balance: Money,
    pub entry: WalletEntry,
}

/// Persistence seam. Every method is atomic with respect to the others;
/// batch methods (group + owner membership, split replacement, wallet
/// commits) apply all-or-nothing.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn insert_category(&self, category: Category) -> Result<Category, LedgerError>;
    async fn update_category(&self, category: Category) -> Result<Category, LedgerError>;
    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, LedgerError>;
    async fn categories_visible_to(&self, user_id: Uuid) -> Result<Vec<Category>, LedgerError>;

    async fn insert_transaction(&self, tx: Transaction) -> Result<Transaction, LedgerError>;
    async fn update_transaction(&self, tx: Transaction) -> Result<Transaction, LedgerError>;
    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>, LedgerError>;
    async fn transactions_for_owner(&self, owner: OwnerId)
        -> Result<Vec<Transaction>, LedgerError>;
    /// Live rule-bearing transactions (not occurrences, not deleted).
    async fn recurring_sources(&self) -> Result<Vec<Transaction>, LedgerError>;
    /// Atomically claims (source, date); false when already materialized.
    async fn claim_occurrence(&self, source_id: Uuid, on: NaiveDate)
        -> Result<bool, LedgerError>;

    async fn insert_group(
        &self,
        group: Group,
        owner_membership: GroupMembership,
    ) -> Result<Group, LedgerError>;
    async fn get_group(&self, id: Uuid) -> Result<Option<Group>, LedgerError>;
    async fn insert_membership(
        &self,
        membership: GroupMembership,
    ) -> Result<GroupMembership, LedgerError>;
    async fn update_membership(
        &self,
        membership: GroupMembership,
    ) -> Result<GroupMembership, LedgerError>;
    async fn get_membership(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMembership>, LedgerError>;
    async fn memberships_for_group(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<GroupMembership>, LedgerError>;

    /// Swaps a transaction's whole split-set in one step; readers see the
    /// old set or the new one, never a mix.
    async fn replace_splits(
        &self,
        transaction_id: Uuid,
        splits: Vec<ExpenseSplit>,
    ) -> Result<Vec<ExpenseSplit>, LedgerError>;
    async fn splits_for_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<ExpenseSplit>, LedgerError>;
    async fn get_split(&self, id: Uuid) -> Result<Option<ExpenseSplit>, LedgerError>;
    async fn update_split(&self, split: ExpenseSplit) -> Result<ExpenseSplit, LedgerError>;

    async fn ensure_wallet(&self, user_id: Uuid, currency: Currency)
        -> Result<Wallet, LedgerError>;
    async fn get_wallet(&self, id: Uuid) -> Result<Option<Wallet>, LedgerError>;
    /// Applies every commit in the batch or none: balances move and entries
    /// append under one critical section.
    async fn commit_wallet_ops(
        &self,
        commits: Vec<WalletCommit>,
    ) -> Result<Vec<WalletEntry>, LedgerError>;
    async fn entries_for_wallet(&self, wallet_id: Uuid)
        -> Result<Vec<WalletEntry>, LedgerError>;

    async fn insert_provider(
        &self,
        provider: PaymentProvider,
    ) -> Result<PaymentProvider, LedgerError>;
    async fn get_provider(&self, id: Uuid) -> Result<Option<PaymentProvider>, LedgerError>;
    async fn insert_payment_method(
        &self,
        method: PaymentMethod,
    ) -> Result<PaymentMethod, LedgerError>;
    async fn get_payment_method(&self, id: Uuid)
        -> Result<Option<PaymentMethod>, LedgerError>;

    async fn insert_payment(&self, payment: Payment) -> Result<Payment, LedgerError>;
    async fn update_payment(&self, payment: Payment) -> Result<Payment, LedgerError>;
    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, LedgerError>;
    async fn get_payment_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Payment>, LedgerError>;
    async fn payments_for_user(&self, user_id: Uuid) -> Result<Vec<Payment>, LedgerError>;

    async fn insert_reminder(&self, reminder: Reminder) -> Result<Reminder, LedgerError>;
    async fn update_reminder(&self, reminder: Reminder) -> Result<Reminder, LedgerError>;
    async fn get_reminder(&self, id: Uuid) -> Result<Option<Reminder>, LedgerError>;
    async fn reminders_for_owner(&self, owner: OwnerId)
        -> Result<Vec<Reminder>, LedgerError>;
    async fn due_reminders(
        &self,
        now: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> Result<Vec<Reminder>, LedgerError>;
}

pub mod in_memory;
