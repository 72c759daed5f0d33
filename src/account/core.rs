//! Defines the core data model and database queries for accounts.
//!
//! An account's balance is owned by the transaction write path: nothing in
//! this module lets a client set a balance directly, and [apply_balance_delta]
//! is only called from code that also persists the matching transaction
//! change in the same SQLite transaction.

use std::str::FromStr;

use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::AccountId,
    money::decimal_from_row,
    user::UserId,
};

/// The kind of account holding the money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Physical cash.
    Cash,
    /// A bank account.
    Bank,
    /// A mobile money wallet, e.g. M-Pesa.
    MobileMoney,
    /// A credit card.
    CreditCard,
    /// Anything else.
    Other,
}

impl AccountType {
    /// The string stored in the database for this account type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Cash => "cash",
            AccountType::Bank => "bank",
            AccountType::MobileMoney => "mobile_money",
            AccountType::CreditCard => "credit_card",
            AccountType::Other => "other",
        }
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(AccountType::Cash),
            "bank" => Ok(AccountType::Bank),
            "mobile_money" => Ok(AccountType::MobileMoney),
            "credit_card" => Ok(AccountType::CreditCard),
            "other" => Ok(AccountType::Other),
            other => Err(format!("unknown account type \"{other}\"")),
        }
    }
}

/// The fixed set of currencies an account can be denominated in.
///
/// Currency is metadata only: amounts are summed as stored and never
/// converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Currency {
    KES,
    USD,
    EUR,
    GBP,
    CNY,
    JPY,
    CAD,
    AUD,
    INR,
    ZAR,
    UGX,
    TZS,
}

impl Currency {
    /// The ISO style code stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::KES => "KES",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::CNY => "CNY",
            Currency::JPY => "JPY",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::INR => "INR",
            Currency::ZAR => "ZAR",
            Currency::UGX => "UGX",
            Currency::TZS => "TZS",
        }
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KES" => Ok(Currency::KES),
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "CNY" => Ok(Currency::CNY),
            "JPY" => Ok(Currency::JPY),
            "CAD" => Ok(Currency::CAD),
            "AUD" => Ok(Currency::AUD),
            "INR" => Ok(Currency::INR),
            "ZAR" => Ok(Currency::ZAR),
            "UGX" => Ok(Currency::UGX),
            "TZS" => Ok(Currency::TZS),
            other => Err(format!("unknown currency \"{other}\"")),
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::KES
    }
}

/// A place where money is held, e.g. a bank account or a wallet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The ID of the user that owns this account.
    #[serde(skip_serializing)]
    pub user_id: UserId,
    /// The display name. Unique per user, ignoring case.
    pub name: String,
    /// What kind of account this is.
    pub account_type: AccountType,
    /// The currency the account is denominated in.
    pub currency: Currency,
    /// The current balance: the sum of the effects of all transactions
    /// linked to this account.
    pub balance: Decimal,
    /// When the account was created.
    pub created_at: OffsetDateTime,
    /// When the account was last modified.
    pub updated_at: OffsetDateTime,
}

/// The fields a client supplies to create or replace an account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    /// The display name. Unique per user, ignoring case.
    pub name: String,
    /// What kind of account this is.
    pub account_type: AccountType,
    /// The currency the account is denominated in. Defaults to [Currency::KES].
    #[serde(default)]
    pub currency: Currency,
}

/// Create the account table.
///
/// The name column uses NOCASE collation so the per-user uniqueness
/// constraint is case-insensitive.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                name TEXT NOT NULL COLLATE NOCASE,
                account_type TEXT NOT NULL,
                currency TEXT NOT NULL,
                balance TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, name)
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to an [Account].
pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let account_type: String = row.get(3)?;
    let currency: String = row.get(4)?;

    Ok(Account {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        name: row.get(2)?,
        account_type: account_type.parse().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                account_type.clone().into(),
            )
        })?,
        currency: currency.parse().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                currency.clone().into(),
            )
        })?,
        balance: decimal_from_row(row, 5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

const ACCOUNT_COLUMNS: &str =
    "id, user_id, name, account_type, currency, balance, created_at, updated_at";

/// Create a new account with a zero balance.
///
/// # Errors
/// Returns a:
/// - [Error::DuplicateAccountName] if the user already has an account with
///   this name (ignoring case),
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_account(
    connection: &Connection,
    user_id: UserId,
    new_account: NewAccount,
) -> Result<Account, Error> {
    let now = OffsetDateTime::now_utc();
    let balance = {
        let mut zero = Decimal::ZERO;
        zero.rescale(2);
        zero
    };

    connection
        .execute(
            "INSERT INTO account (user_id, name, account_type, currency, balance, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id.as_i64(),
                new_account.name,
                new_account.account_type.as_str(),
                new_account.currency.as_str(),
                balance.to_string(),
                now,
                now
            ],
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateAccountName(new_account.name.clone()),
            error => error.into(),
        })?;

    Ok(Account {
        id: connection.last_insert_rowid(),
        user_id,
        name: new_account.name,
        account_type: new_account.account_type,
        currency: new_account.currency,
        balance,
        created_at: now,
        updated_at: now,
    })
}

/// Retrieve an account owned by `user_id`.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `id` does not refer to an account owned by this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_account(
    connection: &Connection,
    user_id: UserId,
    id: AccountId,
) -> Result<Account, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row(params![id, user_id.as_i64()], map_row_to_account)
        .map_err(|error| error.into())
}

/// Retrieve all accounts owned by `user_id`, most recently created first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_accounts(connection: &Connection, user_id: UserId) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        ))?
        .query_map(params![user_id.as_i64()], map_row_to_account)?
        .map(|row| row.map_err(|error| error.into()))
        .collect()
}

/// Replace the client-editable fields of an account (name, type, currency).
///
/// The balance is deliberately not editable: it is a pure function of the
/// transactions linked to the account.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `id` does not refer to an account owned by this user,
/// - [Error::DuplicateAccountName] if the new name collides with another
///   account owned by this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_account(
    connection: &Connection,
    user_id: UserId,
    id: AccountId,
    changes: NewAccount,
) -> Result<Account, Error> {
    let rows_updated = connection
        .execute(
            "UPDATE account SET name = ?1, account_type = ?2, currency = ?3, updated_at = ?4
             WHERE id = ?5 AND user_id = ?6",
            params![
                changes.name,
                changes.account_type.as_str(),
                changes.currency.as_str(),
                OffsetDateTime::now_utc(),
                id,
                user_id.as_i64()
            ],
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateAccountName(changes.name.clone()),
            error => error.into(),
        })?;

    if rows_updated == 0 {
        return Err(Error::NotFound);
    }

    get_account(connection, user_id, id)
}

/// Delete an account owned by `user_id`.
///
/// The account's transactions are removed by the ON DELETE CASCADE foreign
/// key; since they only ever affected this account's balance, no other
/// account needs adjusting.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `id` does not refer to an account owned by this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_account(connection: &Connection, user_id: UserId, id: AccountId) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM account WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Apply `delta` to an account's balance.
///
/// Callers must persist the matching transaction change within the same
/// SQLite transaction, otherwise the balance invariant breaks.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `account_id` does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn apply_balance_delta(
    connection: &Connection,
    account_id: AccountId,
    delta: Decimal,
) -> Result<(), Error> {
    let mut balance = connection
        .prepare("SELECT balance FROM account WHERE id = ?1")?
        .query_row(params![account_id], |row| decimal_from_row(row, 0))
        .map_err(Error::from)?
        + delta;
    balance.rescale(2);

    connection.execute(
        "UPDATE account SET balance = ?1, updated_at = ?2 WHERE id = ?3",
        params![balance.to_string(), OffsetDateTime::now_utc(), account_id],
    )?;

    Ok(())
}
