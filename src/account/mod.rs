//! Accounts: places money is held, each with a balance derived from the
//! transactions linked to it.

mod core;
mod endpoints;

pub use self::core::{
    Account, AccountType, Currency, NewAccount, apply_balance_delta, create_account,
    create_account_table, delete_account, get_account, list_accounts, map_row_to_account,
    update_account,
};
pub use endpoints::{
    create_account_endpoint, delete_account_endpoint, get_account_endpoint,
    list_accounts_endpoint, update_account_endpoint,
};
