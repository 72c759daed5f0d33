//! Transactions and the write path that keeps account balances consistent
//! with them.
//!
//! All transaction writes go through [service]: it owns both the
//! transaction row and the linked account's balance, and persists the two
//! together in a single SQLite transaction. Nothing else in the crate
//! mutates balances.

mod core;
mod endpoints;
mod service;

pub use self::core::{
    Transaction, TransactionType, create_transaction_table, get_transaction, list_transactions,
    sanitize_description,
};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
    list_transactions_endpoint, update_transaction_endpoint,
};
pub use service::{
    NewTransaction, Patch, TransactionChanges, create_transaction, delete_transaction,
    update_transaction,
};
