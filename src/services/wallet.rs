use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{
    EntryKind, Payment, PaymentKind, PaymentMethod, PaymentProvider, PaymentStatus,
    Wallet, WalletEntry,
};
use crate::money::Money;
use crate::storage::{Storage, WalletCommit};
use crate::sync::AggregateLocks;

/// Mobile-money-backed wallet: a per-user balance plus a strictly ordered
/// append-only entry history. Every balance move commits together with its
/// entry; each wallet is a unit of mutual exclusion.
pub struct WalletLedger<S: Storage> {
    storage: Arc<S>,
    locks: AggregateLocks,
}

impl<S: Storage> WalletLedger<S> {
    pub fn new(storage: Arc<S>) -> Self {
        WalletLedger {
            storage,
            locks: AggregateLocks::new(),
        }
    }

    pub async fn register_provider(
        &self,
        provider: PaymentProvider,
    ) -> Result<PaymentProvider, LedgerError> {
        if provider.fee_percentage.is_sign_negative() {
            return Err(LedgerError::validation(
                "fee_percentage",
                "fee percentage cannot be negative",
            ));
        }
        if provider.min_amount.try_cmp(&provider.max_amount)? == std::cmp::Ordering::Greater {
            return Err(LedgerError::validation(
                "min_amount",
                "min_amount cannot exceed max_amount",
            ));
        }
        self.storage.insert_provider(provider).await
    }

    pub async fn register_method(
        &self,
        user_id: Uuid,
        provider_id: Uuid,
        phone_number: String,
        is_default: bool,
    ) -> Result<PaymentMethod, LedgerError> {
        let provider = self
            .storage
            .get_provider(provider_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(LedgerError::NotFound("provider"))?;
        let digits = phone_number.strip_prefix('+').unwrap_or(&phone_number);
        if !(9..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(LedgerError::validation(
                "phone_number",
                "expected an international number with 9 to 15 digits",
            ));
        }
        let method = PaymentMethod {
            id: Uuid::new_v4(),
            user_id,
            provider_id: provider.id,
            phone_number,
            is_default,
            created_at: Utc::now(),
        };
        self.storage.insert_payment_method(method).await
    }

    /// The user's wallet, created empty on first touch.
    pub async fn wallet_for(&self, user_id: Uuid) -> Result<Wallet, LedgerError> {
        self.storage
            .ensure_wallet(user_id, Default::default())
            .await
    }

    /// Initiates a deposit: fee and limits come from the method's provider;
    /// the returned payment is pending and no entry exists until the
    /// gateway confirms through `on_payment_result`.
    pub async fn deposit(
        &self,
        user_id: Uuid,
        method_id: Uuid,
        amount: Money,
    ) -> Result<Payment, LedgerError> {
        let provider = self.method_provider(user_id, method_id).await?;
        self.check_amount(&provider, &amount)?;
        let fee = fee_for(&provider, &amount);
        let total = amount.try_add(&fee)?;

        let wallet = self
            .storage
            .ensure_wallet(user_id, amount.currency())
            .await?;
        if wallet.balance.currency() != amount.currency() {
            return Err(LedgerError::CurrencyMismatch {
                left: amount.currency(),
                right: wallet.balance.currency(),
            });
        }

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            kind: PaymentKind::Deposit,
            status: PaymentStatus::Pending,
            user_id,
            counterparty: None,
            method_id: Some(method_id),
            provider_id: Some(provider.id),
            amount,
            fee,
            total_amount: total,
            reference: Payment::generate_reference(now),
            provider_reference: None,
            error: None,
            initiated_at: now,
            completed_at: None,
        };
        let payment = self.storage.insert_payment(payment).await?;
        info!(
            reference = %payment.reference,
            amount = %payment.amount,
            fee = %payment.fee,
            "deposit initiated"
        );
        Ok(payment)
    }

    /// Initiates a withdrawal: the wallet is debited amount + fee in one
    /// atomic step (balance check, balance update, entry append) and the
    /// payment pends until the gateway confirms. A gateway failure later
    /// refunds through a compensating credit.
    pub async fn withdraw(
        &self,
        user_id: Uuid,
        method_id: Uuid,
        amount: Money,
    ) -> Result<Payment, LedgerError> {
        let provider = self.method_provider(user_id, method_id).await?;
        self.check_amount(&provider, &amount)?;
        let fee = fee_for(&provider, &amount);
        let charged = amount.try_add(&fee)?;
        let net = amount.try_sub(&fee)?;

        let wallet = self
            .storage
            .ensure_wallet(user_id, amount.currency())
            .await?;
        let _guard = self.locks.acquire(wallet.id).await?;
        let wallet = self
            .storage
            .get_wallet(wallet.id)
            .await?
            .ok_or(LedgerError::NotFound("wallet"))?;
        if wallet.balance.try_cmp(&charged)? == std::cmp::Ordering::Less {
            return Err(LedgerError::InsufficientFunds {
                required: charged,
                available: wallet.balance,
            });
        }

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            kind: PaymentKind::Withdrawal,
            status: PaymentStatus::Pending,
            user_id,
            counterparty: None,
            method_id: Some(method_id),
            provider_id: Some(provider.id),
            amount,
            fee,
            total_amount: net,
            reference: Payment::generate_reference(now),
            provider_reference: None,
            error: None,
            initiated_at: now,
            completed_at: None,
        };
        let payment = self.storage.insert_payment(payment).await?;

        let new_balance = wallet.balance.try_sub(&charged)?;
        self.storage
            .commit_wallet_ops(vec![WalletCommit {
                wallet_id: wallet.id,
                new_balance,
                entry: WalletEntry {
                    id: Uuid::new_v4(),
                    wallet_id: wallet.id,
                    kind: EntryKind::Debit,
                    amount: charged,
                    balance_after: new_balance,
                    payment_id: Some(payment.id),
                    description: format!("Withdrawal {}", payment.reference),
                    seq: 0,
                    created_at: now,
                },
            }])
            .await?;
        info!(
            reference = %payment.reference,
            amount = %payment.amount,
            fee = %payment.fee,
            "withdrawal initiated"
        );
        Ok(payment)
    }

    /// Internal wallet-to-wallet movement: one debit on the source, one
    /// credit on the destination, both applied or neither. Completes
    /// immediately; no provider fee on the internal path.
    pub async fn transfer(
        &self,
        from_user: Uuid,
        to_user: Uuid,
        amount: Money,
    ) -> Result<(Payment, Payment), LedgerError> {
        if from_user == to_user {
            return Err(LedgerError::validation(
                "recipient",
                "cannot transfer to self",
            ));
        }
        if !amount.is_positive() {
            return Err(LedgerError::validation(
                "amount",
                "amount must be greater than 0",
            ));
        }

        let from_wallet = self
            .storage
            .ensure_wallet(from_user, amount.currency())
            .await?;
        let to_wallet = self
            .storage
            .ensure_wallet(to_user, amount.currency())
            .await?;
        let (_g1, _g2) = self.locks.acquire_pair(from_wallet.id, to_wallet.id).await?;
        let from_wallet = self
            .storage
            .get_wallet(from_wallet.id)
            .await?
            .ok_or(LedgerError::NotFound("wallet"))?;
        let to_wallet = self
            .storage
            .get_wallet(to_wallet.id)
            .await?
            .ok_or(LedgerError::NotFound("wallet"))?;
        if from_wallet.balance.try_cmp(&amount)? == std::cmp::Ordering::Less {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: from_wallet.balance,
            });
        }

        let now = Utc::now();
        let zero_fee = Money::zero(amount.currency());
        let outgoing = Payment {
            id: Uuid::new_v4(),
            kind: PaymentKind::Transfer,
            status: PaymentStatus::Completed,
            user_id: from_user,
            counterparty: Some(to_user),
            method_id: None,
            provider_id: None,
            amount,
            fee: zero_fee,
            total_amount: amount,
            reference: Payment::generate_reference(now),
            provider_reference: None,
            error: None,
            initiated_at: now,
            completed_at: Some(now),
        };
        let incoming = Payment {
            id: Uuid::new_v4(),
            user_id: to_user,
            counterparty: Some(from_user),
            reference: Payment::generate_reference(now),
            ..outgoing.clone()
        };
        let outgoing = self.storage.insert_payment(outgoing).await?;
        let incoming = self.storage.insert_payment(incoming).await?;

        let source_balance = from_wallet.balance.try_sub(&amount)?;
        let dest_balance = to_wallet.balance.try_add(&amount)?;
        self.storage
            .commit_wallet_ops(vec![
                WalletCommit {
                    wallet_id: from_wallet.id,
                    new_balance: source_balance,
                    entry: WalletEntry {
                        id: Uuid::new_v4(),
                        wallet_id: from_wallet.id,
                        kind: EntryKind::Debit,
                        amount,
                        balance_after: source_balance,
                        payment_id: Some(outgoing.id),
                        description: format!("Transfer {}", outgoing.reference),
                        seq: 0,
                        created_at: now,
                    },
                },
                WalletCommit {
                    wallet_id: to_wallet.id,
                    new_balance: dest_balance,
                    entry: WalletEntry {
                        id: Uuid::new_v4(),
                        wallet_id: to_wallet.id,
                        kind: EntryKind::Credit,
                        amount,
                        balance_after: dest_balance,
                        payment_id: Some(incoming.id),
                        description: format!("Transfer {}", incoming.reference),
                        seq: 0,
                        created_at: now,
                    },
                },
            ])
            .await?;
        info!(
            reference = %outgoing.reference,
            from = %from_user,
            to = %to_user,
            amount = %amount,
            "transfer completed"
        );
        Ok((outgoing, incoming))
    }

    /// Gateway callback. Idempotent per payment: finalizing an
    /// already-finalized payment changes nothing. May arrive after the
    /// wallet has moved on; entry order is commit order, not callback
    /// order.
    pub async fn on_payment_result(
        &self,
        reference: &str,
        success: bool,
        provider_reference: Option<String>,
    ) -> Result<Payment, LedgerError> {
        let mut payment = self
            .storage
            .get_payment_by_reference(reference)
            .await?
            .ok_or(LedgerError::NotFound("payment"))?;
        if payment.is_finalized() {
            return Ok(payment);
        }
        if provider_reference.is_some() {
            payment.provider_reference = provider_reference;
        }
        let now = Utc::now();

        match (payment.kind, success) {
            (PaymentKind::Deposit, true) => {
                let credited = payment.amount;
                self.apply_credit(
                    payment.user_id,
                    credited,
                    Some(payment.id),
                    format!("Deposit {}", payment.reference),
                )
                .await?;
                payment.status = PaymentStatus::Completed;
                payment.completed_at = Some(now);
            }
            (PaymentKind::Withdrawal, true) => {
                payment.status = PaymentStatus::Completed;
                payment.completed_at = Some(now);
            }
            (PaymentKind::Deposit, false) => {
                payment.status = PaymentStatus::Failed;
                payment.error = Some("provider reported failure".to_string());
            }
            (PaymentKind::Withdrawal, false) => {
                let refund = payment.amount.try_add(&payment.fee)?;
                self.apply_credit(
                    payment.user_id,
                    refund,
                    Some(payment.id),
                    format!("Refund: withdrawal {} failed", payment.reference),
                )
                .await?;
                payment.status = PaymentStatus::Failed;
                payment.error = Some("provider reported failure".to_string());
            }
            (PaymentKind::Transfer, _) => {
                // Internal transfers finalize at creation; nothing pends.
            }
        }

        let payment = self.storage.update_payment(payment).await?;
        if payment.status == PaymentStatus::Failed {
            warn!(reference = %payment.reference, "payment failed");
        } else {
            info!(reference = %payment.reference, status = ?payment.status, "payment finalized");
        }
        Ok(payment)
    }

    pub async fn entries(&self, user_id: Uuid) -> Result<Vec<WalletEntry>, LedgerError> {
        let wallet = self.wallet_for(user_id).await?;
        self.storage.entries_for_wallet(wallet.id).await
    }

    pub async fn payments(&self, user_id: Uuid) -> Result<Vec<Payment>, LedgerError> {
        self.storage.payments_for_user(user_id).await
    }

    async fn apply_credit(
        &self,
        user_id: Uuid,
        amount: Money,
        payment_id: Option<Uuid>,
        description: String,
    ) -> Result<(), LedgerError> {
        let wallet = self
            .storage
            .ensure_wallet(user_id, amount.currency())
            .await?;
        let _guard = self.locks.acquire(wallet.id).await?;
        let wallet = self
            .storage
            .get_wallet(wallet.id)
            .await?
            .ok_or(LedgerError::NotFound("wallet"))?;
        let new_balance = wallet.balance.try_add(&amount)?;
        self.storage
            .commit_wallet_ops(vec![WalletCommit {
                wallet_id: wallet.id,
                new_balance,
                entry: WalletEntry {
                    id: Uuid::new_v4(),
                    wallet_id: wallet.id,
                    kind: EntryKind::Credit,
                    amount,
                    balance_after: new_balance,
                    payment_id,
                    description,
                    seq: 0,
                    created_at: Utc::now(),
                },
            }])
            .await?;
        Ok(())
    }

    async fn method_provider(
        &self,
        user_id: Uuid,
        method_id: Uuid,
    ) -> Result<PaymentProvider, LedgerError> {
        let method = self
            .storage
            .get_payment_method(method_id)
            .await?
            .filter(|m| m.user_id == user_id)
            .ok_or(LedgerError::NotFound("payment method"))?;
        self.storage
            .get_provider(method.provider_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(LedgerError::NotFound("provider"))
    }

    fn check_amount(
        &self,
        provider: &PaymentProvider,
        amount: &Money,
    ) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::validation(
                "amount",
                "amount must be greater than 0",
            ));
        }
        if amount.try_cmp(&provider.min_amount)? == std::cmp::Ordering::Less
            || amount.try_cmp(&provider.max_amount)? == std::cmp::Ordering::Greater
        {
            return Err(LedgerError::AmountOutOfRange {
                min: provider.min_amount,
                max: provider.max_amount,
            });
        }
        Ok(())
    }
}

/// fee = amount × fee_percentage / 100 + fee_fixed, rounded half-up to the
/// minor unit.
fn fee_for(provider: &PaymentProvider, amount: &Money) -> Money {
    let raw = amount.amount() * provider.fee_percentage / rust_decimal::Decimal::from(100)
        + provider.fee_fixed.amount();
    Money::from_decimal_half_up(raw, amount.currency())
}
