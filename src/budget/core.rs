//! Defines the core data model, month bucketing, and database queries for
//! budgets.
//!
//! A budget is keyed by (user, category, calendar month). Months travel on
//! the wire as "YYYY-MM" strings and are stored as the first day of the
//! month, so the uniqueness constraint can be a plain column comparison.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};

use crate::{
    Error,
    category::get_category,
    database_id::{BudgetId, CategoryId},
    money::{decimal_from_row, validate_amount},
    user::UserId,
};

/// Parse a "YYYY-MM" month string into the first day of that month.
///
/// # Errors
/// Returns [Error::InvalidMonth] if `value` is not a valid year-month pair.
pub fn parse_month(value: &str) -> Result<Date, Error> {
    let (year, month) = sscanf::sscanf!(value, "{i32}-{u8}")
        .ok_or_else(|| Error::InvalidMonth(value.to_string()))?;

    let month = Month::try_from(month).map_err(|_| Error::InvalidMonth(value.to_string()))?;

    Date::from_calendar_date(year, month, 1).map_err(|_| Error::InvalidMonth(value.to_string()))
}

/// Format a date as the "YYYY-MM" month string used on the wire.
pub fn format_month(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

/// Normalize a date to the first day of its month, the granularity key for
/// budgets and monthly reports.
pub fn first_of_month(date: Date) -> Date {
    date.replace_day(1)
        .expect("day 1 is valid for every month")
}

/// Serde helpers for the "YYYY-MM" wire format.
pub(crate) mod month_format {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    use super::{format_month, parse_month};

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_month(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        parse_month(&value).map_err(serde::de::Error::custom)
    }
}

/// A spending limit for a category in a calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The ID of the user that owns this budget.
    #[serde(skip_serializing)]
    pub user_id: UserId,
    /// The category the limit applies to.
    pub category_id: CategoryId,
    /// The calendar month the limit applies to.
    #[serde(with = "month_format")]
    pub month: Date,
    /// The limit amount.
    pub amount: Decimal,
    /// When the budget was created.
    pub created_at: OffsetDateTime,
}

/// The fields a client supplies to create or replace a budget.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBudget {
    /// The category the limit applies to.
    pub category_id: CategoryId,
    /// The calendar month, as "YYYY-MM" on the wire.
    #[serde(with = "month_format")]
    pub month: Date,
    /// The limit amount.
    pub amount: Decimal,
}

/// Create the budget table.
///
/// The unique index is the authoritative guard against duplicate budgets;
/// the application level check exists to produce a friendlier error before
/// the insert is attempted.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
                month TEXT NOT NULL,
                amount TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, category_id, month)
                )",
        (),
    )?;

    Ok(())
}

fn map_row_to_budget(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        category_id: row.get(2)?,
        month: row.get(3)?,
        amount: decimal_from_row(row, 4)?,
        created_at: row.get(5)?,
    })
}

const BUDGET_COLUMNS: &str = "id, user_id, category_id, month, amount, created_at";

/// Check for an existing budget with the same key, excluding the budget
/// being updated (if any). Runs inside the caller's SQLite transaction so
/// the check and the subsequent write cannot be split by a concurrent
/// writer.
fn check_no_duplicate(
    connection: &Connection,
    user_id: UserId,
    category_id: CategoryId,
    month: Date,
    exclude: Option<BudgetId>,
) -> Result<(), Error> {
    let existing: Option<BudgetId> = connection
        .prepare(
            "SELECT id FROM budget
             WHERE user_id = ?1 AND category_id = ?2 AND month = ?3 AND id != ?4",
        )?
        .query_row(
            params![user_id.as_i64(), category_id, month, exclude.unwrap_or(-1)],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(_) => Err(Error::DuplicateBudget),
        None => Ok(()),
    }
}

fn map_unique_violation(error: rusqlite::Error) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Error::DuplicateBudget,
        error => error.into(),
    }
}

/// Create a budget for a (category, month) pair.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidAmount] if the amount is not positive with at most two
///   decimal places,
/// - [Error::InvalidCategory] if the category does not exist or is not
///   owned by this user,
/// - [Error::DuplicateBudget] if a budget for the same category and month
///   already exists, regardless of its amount,
/// - [Error::Conflict] if the database stayed locked past the busy timeout,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_budget(
    connection: &mut Connection,
    user_id: UserId,
    new_budget: NewBudget,
) -> Result<Budget, Error> {
    let amount = validate_amount(new_budget.amount)?;
    let month = first_of_month(new_budget.month);

    let db_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    get_category(&db_transaction, user_id, new_budget.category_id).map_err(|error| match error {
        Error::NotFound => Error::InvalidCategory(Some(new_budget.category_id)),
        error => error,
    })?;

    check_no_duplicate(&db_transaction, user_id, new_budget.category_id, month, None)?;

    let created_at = OffsetDateTime::now_utc();
    db_transaction
        .execute(
            "INSERT INTO budget (user_id, category_id, month, amount, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id.as_i64(),
                new_budget.category_id,
                month,
                amount.to_string(),
                created_at
            ],
        )
        .map_err(map_unique_violation)?;

    let budget = Budget {
        id: db_transaction.last_insert_rowid(),
        user_id,
        category_id: new_budget.category_id,
        month,
        amount,
        created_at,
    };

    db_transaction.commit()?;

    Ok(budget)
}

/// Retrieve a budget owned by `user_id`.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `id` does not refer to a budget owned by this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_budget(connection: &Connection, user_id: UserId, id: BudgetId) -> Result<Budget, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row(params![id, user_id.as_i64()], map_row_to_budget)
        .map_err(|error| error.into())
}

/// Retrieve all budgets owned by `user_id`, newest month first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_budgets(connection: &Connection, user_id: UserId) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE user_id = ?1
             ORDER BY month DESC, category_id ASC"
        ))?
        .query_map(params![user_id.as_i64()], map_row_to_budget)?
        .map(|row| row.map_err(|error| error.into()))
        .collect()
}

/// Replace a budget's category, month, and amount.
///
/// # Errors
/// As for [create_budget], plus [Error::NotFound] if `id` does not refer to
/// a budget owned by this user. The duplicate check excludes the budget
/// being updated, so re-saving a budget with its own month is not a
/// conflict.
pub fn update_budget(
    connection: &mut Connection,
    user_id: UserId,
    id: BudgetId,
    changes: NewBudget,
) -> Result<Budget, Error> {
    let amount = validate_amount(changes.amount)?;
    let month = first_of_month(changes.month);

    let db_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    get_budget(&db_transaction, user_id, id)?;

    get_category(&db_transaction, user_id, changes.category_id).map_err(|error| match error {
        Error::NotFound => Error::InvalidCategory(Some(changes.category_id)),
        error => error,
    })?;

    check_no_duplicate(&db_transaction, user_id, changes.category_id, month, Some(id))?;

    db_transaction
        .execute(
            "UPDATE budget SET category_id = ?1, month = ?2, amount = ?3 WHERE id = ?4",
            params![changes.category_id, month, amount.to_string(), id],
        )
        .map_err(map_unique_violation)?;

    let budget = get_budget(&db_transaction, user_id, id)?;

    db_transaction.commit()?;

    Ok(budget)
}

/// Delete a budget owned by `user_id`.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `id` does not refer to a budget owned by this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_budget(connection: &Connection, user_id: UserId, id: BudgetId) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// The budget amount per category for a given month, used by the category
/// summary report.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn budget_amounts_for_month(
    connection: &Connection,
    user_id: UserId,
    month: Date,
) -> Result<HashMap<CategoryId, Decimal>, Error> {
    let month = first_of_month(month);

    connection
        .prepare("SELECT category_id, amount FROM budget WHERE user_id = ?1 AND month = ?2")?
        .query_map(params![user_id.as_i64(), month], |row| {
            Ok((row.get::<_, CategoryId>(0)?, decimal_from_row(row, 1)?))
        })?
        .map(|row| row.map_err(|error| error.into()))
        .collect()
}

#[cfg(test)]
mod month_tests {
    use time::macros::date;

    use crate::Error;

    use super::{first_of_month, format_month, parse_month};

    #[test]
    fn parses_a_month_string() {
        assert_eq!(parse_month("2024-03").unwrap(), date!(2024 - 03 - 01));
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "2024", "March 2024", "2024-13", "2024-00"] {
            assert_eq!(
                parse_month(bad),
                Err(Error::InvalidMonth(bad.to_string())),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(format_month(date!(2024 - 03 - 01)), "2024-03");
        assert_eq!(format_month(date!(2024 - 12 - 31)), "2024-12");
    }

    #[test]
    fn round_trips() {
        let date = date!(2021 - 07 - 01);

        assert_eq!(parse_month(&format_month(date)).unwrap(), date);
    }

    #[test]
    fn first_of_month_normalizes() {
        assert_eq!(first_of_month(date!(2024 - 03 - 15)), date!(2024 - 03 - 01));
        assert_eq!(first_of_month(date!(2024 - 03 - 01)), date!(2024 - 03 - 01));
    }
}
