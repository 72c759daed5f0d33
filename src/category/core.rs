//! Defines the core data model and database queries for categories.

use std::collections::HashMap;
use std::str::FromStr;

use rusqlite::{Connection, Row, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    account::apply_balance_delta,
    database_id::{AccountId, CategoryId},
    money::decimal_from_row,
    transaction::TransactionType,
    user::UserId,
};

/// Whether a category groups income or expenses.
///
/// The kind drives report grouping only; the sign of a transaction's
/// balance effect comes from the transaction's own type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Money coming in, e.g. "Salary".
    Income,
    /// Money going out, e.g. "Groceries".
    Expense,
}

impl CategoryKind {
    /// The string stored in the database for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
        }
    }
}

impl FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(CategoryKind::Income),
            "expense" => Ok(CategoryKind::Expense),
            other => Err(format!("unknown category kind \"{other}\"")),
        }
    }
}

/// A user-defined category that describes the type of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The ID of the user that owns this category.
    #[serde(skip_serializing)]
    pub user_id: UserId,
    /// The display name, e.g. "Groceries".
    pub name: String,
    /// Whether this category groups income or expenses.
    pub kind: CategoryKind,
    /// When the category was created.
    pub created_at: OffsetDateTime,
}

/// The fields a client supplies to create or replace a category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    /// The display name, e.g. "Groceries".
    pub name: String,
    /// Whether this category groups income or expenses.
    pub kind: CategoryKind,
}

/// Create the category table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
    let kind: String = row.get(3)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        name: row.get(2)?,
        kind: kind.parse().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                kind.clone().into(),
            )
        })?,
        created_at: row.get(4)?,
    })
}

/// Create a new category.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_category(
    connection: &Connection,
    user_id: UserId,
    new_category: NewCategory,
) -> Result<Category, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO category (user_id, name, kind, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            user_id.as_i64(),
            new_category.name,
            new_category.kind.as_str(),
            created_at
        ],
    )?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        user_id,
        name: new_category.name,
        kind: new_category.kind,
        created_at,
    })
}

/// Retrieve a category owned by `user_id`.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `id` does not refer to a category owned by this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_category(
    connection: &Connection,
    user_id: UserId,
    id: CategoryId,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind, created_at FROM category
             WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row(params![id, user_id.as_i64()], map_row_to_category)
        .map_err(|error| error.into())
}

/// Retrieve all categories owned by `user_id`, ordered by name.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_categories(connection: &Connection, user_id: UserId) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind, created_at FROM category
             WHERE user_id = ?1 ORDER BY name ASC, id ASC",
        )?
        .query_map(params![user_id.as_i64()], map_row_to_category)?
        .map(|row| row.map_err(|error| error.into()))
        .collect()
}

/// Replace a category's name and kind.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `id` does not refer to a category owned by this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_category(
    connection: &Connection,
    user_id: UserId,
    id: CategoryId,
    changes: NewCategory,
) -> Result<Category, Error> {
    let rows_updated = connection.execute(
        "UPDATE category SET name = ?1, kind = ?2 WHERE id = ?3 AND user_id = ?4",
        params![changes.name, changes.kind.as_str(), id, user_id.as_i64()],
    )?;

    if rows_updated == 0 {
        return Err(Error::NotFound);
    }

    get_category(connection, user_id, id)
}

/// Delete a category along with its transactions, reversing the effect of
/// those transactions on any linked account balances.
///
/// Removing the rows without the reversal would silently corrupt balances,
/// so the whole thing runs as a single SQLite transaction.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `id` does not refer to a category owned by this user,
/// - [Error::Conflict] if the database stayed locked past the busy timeout,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_category(
    connection: &mut Connection,
    user_id: UserId,
    id: CategoryId,
) -> Result<(), Error> {
    let db_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    get_category(&db_transaction, user_id, id)?;

    let mut deltas: HashMap<AccountId, Decimal> = HashMap::new();
    {
        let mut statement = db_transaction.prepare(
            "SELECT account_id, transaction_type, amount FROM \"transaction\"
             WHERE category_id = ?1 AND account_id IS NOT NULL",
        )?;
        let rows = statement.query_map(params![id], |row| {
            let account_id: AccountId = row.get(0)?;
            let transaction_type: String = row.get(1)?;
            let amount = decimal_from_row(row, 2)?;
            Ok((account_id, transaction_type, amount))
        })?;

        for row in rows {
            let (account_id, raw_type, amount) = row?;
            let transaction_type = raw_type.parse::<TransactionType>().map_err(|_| {
                Error::SqlError(rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    raw_type.clone().into(),
                ))
            })?;
            *deltas.entry(account_id).or_insert(Decimal::ZERO) +=
                transaction_type.effect(amount);
        }
    }

    for (account_id, delta) in deltas {
        apply_balance_delta(&db_transaction, account_id, -delta)?;
    }

    db_transaction.execute("DELETE FROM \"transaction\" WHERE category_id = ?1", params![id])?;
    db_transaction.execute("DELETE FROM category WHERE id = ?1", params![id])?;

    db_transaction.commit()?;

    Ok(())
}
