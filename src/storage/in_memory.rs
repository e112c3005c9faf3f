use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::OwnerId;
use crate::models::{
    Category, ExpenseSplit, Group, GroupMembership, Payment, PaymentMethod,
    PaymentProvider, Reminder, Transaction, Wallet, WalletEntry,
};
use crate::money::{Currency, Money};
use crate::storage::{Storage, WalletCommit};

#[derive(Default)]
pub struct InMemoryStorage {
    categories: Mutex<HashMap<Uuid, Category>>,
    transactions: Mutex<HashMap<Uuid, Transaction>>,
    occurrences: Mutex<HashSet<(Uuid, NaiveDate)>>,
    groups: Mutex<HashMap<Uuid, Group>>,
    memberships: Mutex<HashMap<Uuid, GroupMembership>>,
    splits: Mutex<HashMap<Uuid, Vec<ExpenseSplit>>>, // transaction_id -> splits
    wallets: Mutex<HashMap<Uuid, Wallet>>,
    wallet_entries: Mutex<HashMap<Uuid, Vec<WalletEntry>>>,
    providers: Mutex<HashMap<Uuid, PaymentProvider>>,
    payment_methods: Mutex<HashMap<Uuid, PaymentMethod>>,
    payments: Mutex<HashMap<Uuid, Payment>>,
    payment_refs: Mutex<HashMap<String, Uuid>>, // reference -> payment_id
    reminders: Mutex<HashMap<Uuid, Reminder>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn insert_category(&self, category: Category) -> Result<Category, LedgerError> {
        let mut categories = self.categories.lock().await;
        // For production: database unique index on (owner, name)
        if categories
            .values()
            .any(|c| c.owner == category.owner && c.name == category.name)
        {
            return Err(LedgerError::validation(
                "name",
                "category name already in use",
            ));
        }
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, category: Category) -> Result<Category, LedgerError> {
        let mut categories = self.categories.lock().await;
        if !categories.contains_key(&category.id) {
            return Err(LedgerError::NotFound("category"));
        }
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, LedgerError> {
        Ok(self.categories.lock().await.get(&id).cloned())
    }

    async fn categories_visible_to(&self, user_id: Uuid) -> Result<Vec<Category>, LedgerError> {
        let mut out: Vec<Category> = self
            .categories
            .lock()
            .await
            .values()
            .filter(|c| c.visible_to(user_id))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn insert_transaction(&self, tx: Transaction) -> Result<Transaction, LedgerError> {
        self.transactions.lock().await.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn update_transaction(&self, tx: Transaction) -> Result<Transaction, LedgerError> {
        let mut transactions = self.transactions.lock().await;
        if !transactions.contains_key(&tx.id) {
            return Err(LedgerError::NotFound("transaction"));
        }
        transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>, LedgerError> {
        Ok(self.transactions.lock().await.get(&id).cloned())
    }

    async fn transactions_for_owner(
        &self,
        owner: OwnerId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        // For production: database query with an (owner, date) index
        Ok(self
            .transactions
            .lock()
            .await
            .values()
            .filter(|tx| tx.owner == owner)
            .cloned()
            .collect())
    }

    async fn recurring_sources(&self) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self
            .transactions
            .lock()
            .await
            .values()
            .filter(|tx| {
                tx.is_recurring
                    && tx.recurrence_rule.is_some()
                    && tx.recurrence_source.is_none()
                    && !tx.is_deleted()
            })
            .cloned()
            .collect())
    }

    async fn claim_occurrence(
        &self,
        source_id: Uuid,
        on: NaiveDate,
    ) -> Result<bool, LedgerError> {
        Ok(self.occurrences.lock().await.insert((source_id, on)))
    }

    async fn insert_group(
        &self,
        group: Group,
        owner_membership: GroupMembership,
    ) -> Result<Group, LedgerError> {
        let mut groups = self.groups.lock().await;
        let mut memberships = self.memberships.lock().await;
        groups.insert(group.id, group.clone());
        memberships.insert(owner_membership.id, owner_membership);
        Ok(group)
    }

    async fn get_group(&self, id: Uuid) -> Result<Option<Group>, LedgerError> {
        Ok(self.groups.lock().await.get(&id).cloned())
    }

    async fn insert_membership(
        &self,
        membership: GroupMembership,
    ) -> Result<GroupMembership, LedgerError> {
        let mut memberships = self.memberships.lock().await;
        // For production: database unique index on (group, user)
        if memberships
            .values()
            .any(|m| m.group_id == membership.group_id && m.user_id == membership.user_id)
        {
            return Err(LedgerError::validation(
                "user",
                "already a member of this group",
            ));
        }
        memberships.insert(membership.id, membership.clone());
        Ok(membership)
    }

    async fn update_membership(
        &self,
        membership: GroupMembership,
    ) -> Result<GroupMembership, LedgerError> {
        let mut memberships = self.memberships.lock().await;
        if !memberships.contains_key(&membership.id) {
            return Err(LedgerError::NotFound("membership"));
        }
        memberships.insert(membership.id, membership.clone());
        Ok(membership)
    }

    async fn get_membership(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMembership>, LedgerError> {
        Ok(self
            .memberships
            .lock()
            .await
            .values()
            .find(|m| m.group_id == group_id && m.user_id == user_id)
            .cloned())
    }

    async fn memberships_for_group(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<GroupMembership>, LedgerError> {
        Ok(self
            .memberships
            .lock()
            .await
            .values()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn replace_splits(
        &self,
        transaction_id: Uuid,
        splits: Vec<ExpenseSplit>,
    ) -> Result<Vec<ExpenseSplit>, LedgerError> {
        let mut all = self.splits.lock().await;
        all.insert(transaction_id, splits.clone());
        Ok(splits)
    }

    async fn splits_for_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<ExpenseSplit>, LedgerError> {
        Ok(self
            .splits
            .lock()
            .await
            .get(&transaction_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_split(&self, id: Uuid) -> Result<Option<ExpenseSplit>, LedgerError> {
        Ok(self
            .splits
            .lock()
            .await
            .values()
            .flatten()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn update_split(&self, split: ExpenseSplit) -> Result<ExpenseSplit, LedgerError> {
        let mut all = self.splits.lock().await;
        let splits = all
            .get_mut(&split.transaction_id)
            .ok_or(LedgerError::NotFound("split"))?;
        let slot = splits
            .iter_mut()
            .find(|s| s.id == split.id)
            .ok_or(LedgerError::NotFound("split"))?;
        *slot = split.clone();
        Ok(split)
    }

    async fn ensure_wallet(
        &self,
        user_id: Uuid,
        currency: Currency,
    ) -> Result<Wallet, LedgerError> {
        let mut wallets = self.wallets.lock().await;
        if let Some(existing) = wallets.values().find(|w| w.user_id == user_id) {
            return Ok(existing.clone());
        }
        let wallet = Wallet {
            id: Uuid::new_v4(),
            user_id,
            balance: Money::zero(currency),
            is_active: true,
            created_at: Utc::now(),
        };
        wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    async fn get_wallet(&self, id: Uuid) -> Result<Option<Wallet>, LedgerError> {
        Ok(self.wallets.lock().await.get(&id).cloned())
    }

    async fn commit_wallet_ops(
        &self,
        commits: Vec<WalletCommit>,
    ) -> Result<Vec<WalletEntry>, LedgerError> {
        // Both tables stay locked across the batch so no reader can observe
        // a balance without its entry or vice versa.
        let mut wallets = self.wallets.lock().await;
        let mut entries = self.wallet_entries.lock().await;

        for commit in &commits {
            if !wallets.contains_key(&commit.wallet_id) {
                return Err(LedgerError::NotFound("wallet"));
            }
        }

        let mut committed = Vec::with_capacity(commits.len());
        for commit in commits {
            let wallet = wallets
                .get_mut(&commit.wallet_id)
                .ok_or(LedgerError::NotFound("wallet"))?;
            wallet.balance = commit.new_balance;
            let history = entries.entry(commit.wallet_id).or_default();
            let mut entry = commit.entry;
            entry.seq = history.len() as u64 + 1;
            history.push(entry.clone());
            committed.push(entry);
        }
        Ok(committed)
    }

    async fn entries_for_wallet(
        &self,
        wallet_id: Uuid,
    ) -> Result<Vec<WalletEntry>, LedgerError> {
        Ok(self
            .wallet_entries
            .lock()
            .await
            .get(&wallet_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_provider(
        &self,
        provider: PaymentProvider,
    ) -> Result<PaymentProvider, LedgerError> {
        self.providers
            .lock()
            .await
            .insert(provider.id, provider.clone());
        Ok(provider)
    }

    async fn get_provider(&self, id: Uuid) -> Result<Option<PaymentProvider>, LedgerError> {
        Ok(self.providers.lock().await.get(&id).cloned())
    }

    async fn insert_payment_method(
        &self,
        method: PaymentMethod,
    ) -> Result<PaymentMethod, LedgerError> {
        self.payment_methods
            .lock()
            .await
            .insert(method.id, method.clone());
        Ok(method)
    }

    async fn get_payment_method(
        &self,
        id: Uuid,
    ) -> Result<Option<PaymentMethod>, LedgerError> {
        Ok(self.payment_methods.lock().await.get(&id).cloned())
    }

    async fn insert_payment(&self, payment: Payment) -> Result<Payment, LedgerError> {
        let mut refs = self.payment_refs.lock().await;
        if refs.contains_key(&payment.reference) {
            return Err(LedgerError::Storage(
                "duplicate payment reference".to_string(),
            ));
        }
        refs.insert(payment.reference.clone(), payment.id);
        self.payments.lock().await.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn update_payment(&self, payment: Payment) -> Result<Payment, LedgerError> {
        let mut payments = self.payments.lock().await;
        if !payments.contains_key(&payment.id) {
            return Err(LedgerError::NotFound("payment"));
        }
        payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, LedgerError> {
        Ok(self.payments.lock().await.get(&id).cloned())
    }

    async fn get_payment_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Payment>, LedgerError> {
        let id = self.payment_refs.lock().await.get(reference).copied();
        Ok(match id {
            Some(id) => self.payments.lock().await.get(&id).cloned(),
            None => None,
        })
    }

    async fn payments_for_user(&self, user_id: Uuid) -> Result<Vec<Payment>, LedgerError> {
        let mut out: Vec<Payment> = self
            .payments
            .lock()
            .await
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.initiated_at.cmp(&a.initiated_at));
        Ok(out)
    }

    async fn insert_reminder(&self, reminder: Reminder) -> Result<Reminder, LedgerError> {
        self.reminders
            .lock()
            .await
            .insert(reminder.id, reminder.clone());
        Ok(reminder)
    }

    async fn update_reminder(&self, reminder: Reminder) -> Result<Reminder, LedgerError> {
        let mut reminders = self.reminders.lock().await;
        if !reminders.contains_key(&reminder.id) {
            return Err(LedgerError::NotFound("reminder"));
        }
        reminders.insert(reminder.id, reminder.clone());
        Ok(reminder)
    }

    async fn get_reminder(&self, id: Uuid) -> Result<Option<Reminder>, LedgerError> {
        Ok(self.reminders.lock().await.get(&id).cloned())
    }

    async fn reminders_for_owner(
        &self,
        owner: OwnerId,
    ) -> Result<Vec<Reminder>, LedgerError> {
        let mut out: Vec<Reminder> = self
            .reminders
            .lock()
            .await
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.due_at.cmp(&b.due_at));
        Ok(out)
    }

    async fn due_reminders(
        &self,
        now: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> Result<Vec<Reminder>, LedgerError> {
        let mut out: Vec<Reminder> = self
            .reminders
            .lock()
            .await
            .values()
            .filter(|r| {
                !r.is_completed
                    && !r.notification_sent
                    && r.due_at >= now
                    && r.due_at <= horizon
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| a.due_at.cmp(&b.due_at));
        Ok(out)
    }
}
