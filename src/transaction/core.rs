//! Defines the core data model and database queries for transactions.

use std::str::FromStr;

use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    account::Currency,
    database_id::{AccountId, CategoryId, TransactionId},
    money::decimal_from_row,
    user::UserId,
};

/// Whether a transaction brings money in or takes money out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The string stored in the database for this transaction type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// The signed contribution a transaction of this type makes to its
    /// linked account's balance.
    ///
    /// `amount` is always a positive magnitude; the sign comes from the
    /// type alone and is computed fresh at every call, never cached.
    pub fn effect(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionType::Income => amount,
            TransactionType::Expense => -amount,
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type \"{other}\"")),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The ID of the user that owns this transaction.
    #[serde(skip_serializing)]
    pub user_id: UserId,
    /// The account the money moved through. A transaction without an
    /// account is recorded for reporting but affects no balance.
    pub account_id: Option<AccountId>,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// Whether money came in or went out.
    pub transaction_type: TransactionType,
    /// The amount of money, always a positive magnitude.
    pub amount: Decimal,
    /// The currency of the amount. Inherited from the account at creation
    /// time when not given explicitly, and never re-derived afterwards.
    pub currency: Option<Currency>,
    /// A text description of what the transaction was for, with any markup
    /// stripped.
    pub description: String,
    /// The calendar date the money moved.
    pub date: Date,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
}

/// Create the transaction table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                account_id INTEGER REFERENCES account(id) ON DELETE CASCADE,
                category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
                transaction_type TEXT NOT NULL,
                amount TEXT NOT NULL,
                currency TEXT,
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    // Composite index used by the dashboard queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date)",
        (),
    )?;

    Ok(())
}

pub(crate) const TRANSACTION_COLUMNS: &str = "id, user_id, account_id, category_id, \
     transaction_type, amount, currency, description, date, created_at";

/// Map a database row to a [Transaction].
pub(crate) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let transaction_type: String = row.get(4)?;
    let currency: Option<String> = row.get(6)?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        account_id: row.get(2)?,
        category_id: row.get(3)?,
        transaction_type: transaction_type.parse().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                transaction_type.clone().into(),
            )
        })?,
        amount: decimal_from_row(row, 5)?,
        currency: currency
            .map(|code| {
                code.parse::<Currency>().map_err(|_| {
                    rusqlite::Error::FromSqlConversionFailure(
                        6,
                        rusqlite::types::Type::Text,
                        code.clone().into(),
                    )
                })
            })
            .transpose()?,
        description: row.get(7)?,
        date: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Retrieve a transaction owned by `user_id`.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    connection: &Connection,
    user_id: UserId,
    id: TransactionId,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row(params![id, user_id.as_i64()], map_transaction_row)
        .map_err(|error| error.into())
}

/// Retrieve all transactions owned by `user_id`, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    connection: &Connection,
    user_id: UserId,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1 ORDER BY date DESC, id DESC"
        ))?
        .query_map(params![user_id.as_i64()], map_transaction_row)?
        .map(|row| row.map_err(|error| error.into()))
        .collect()
}

/// Strip markup from a transaction description.
///
/// Everything between an opening `<` and the matching `>` is dropped, as is
/// any unmatched angle bracket, so stored descriptions never carry tags
/// into whatever renders them later.
pub fn sanitize_description(description: &str) -> String {
    let mut sanitized = String::with_capacity(description.len());
    let mut in_tag = false;

    for character in description.chars() {
        match character {
            '<' => in_tag = true,
            '>' => in_tag = false,
            character if !in_tag => sanitized.push(character),
            _ => {}
        }
    }

    sanitized.trim().to_string()
}

#[cfg(test)]
mod effect_tests {
    use rust_decimal::Decimal;

    use super::TransactionType;

    #[test]
    fn income_is_positive() {
        let amount = "12.34".parse::<Decimal>().unwrap();

        assert_eq!(TransactionType::Income.effect(amount), amount);
    }

    #[test]
    fn expense_is_negative() {
        let amount = "12.34".parse::<Decimal>().unwrap();

        assert_eq!(TransactionType::Expense.effect(amount), -amount);
    }
}

#[cfg(test)]
mod sanitize_tests {
    use super::sanitize_description;

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(sanitize_description("Weekly shop"), "Weekly shop");
    }

    #[test]
    fn tags_are_stripped() {
        assert_eq!(
            sanitize_description("<script>alert(1)</script>Weekly shop"),
            "alert(1)Weekly shop"
        );
    }

    #[test]
    fn nested_markup_is_stripped() {
        assert_eq!(
            sanitize_description("Rent <b>March</b> payment"),
            "Rent March payment"
        );
    }

    #[test]
    fn unmatched_brackets_are_dropped() {
        assert_eq!(sanitize_description("1 < 2 but fine"), "1");
        assert_eq!(sanitize_description("a > b"), "a  b");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(sanitize_description("  spaced out  "), "spaced out");
    }
}
