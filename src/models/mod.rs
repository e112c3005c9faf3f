pub mod category;
pub mod group;
pub mod owner;
pub mod payment;
pub mod reminder;
pub mod split;
pub mod transaction;
pub mod wallet;

pub use category::{Category, CategoryKind};
pub use group::{Group, GroupMembership, MemberRole, MemberStatus};
pub use owner::OwnerId;
pub use payment::{Payment, PaymentKind, PaymentMethod, PaymentProvider, PaymentStatus};
pub use reminder::{NewReminder, Reminder, ReminderKind};
pub use split::ExpenseSplit;
pub use transaction::{
    NewTransaction, SortOrder, Transaction, TransactionFilter, TransactionKind,
    TransactionPatch,
};
pub use wallet::{EntryKind, Wallet, WalletEntry};
