//! Database initialisation for the application's SQLite store.

use std::time::Duration;

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{Error, account, budget, category, goal, transaction, user};

/// How long SQLite waits on a locked database before giving up. Once the
/// wait expires the failed statement surfaces as the retryable
/// [Error::Conflict].
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize the database by configuring the connection and creating the
/// tables for the domain models.
///
/// The tables are created within a single exclusive transaction so that the
/// schema is either fully present or not at all. Initialisation is
/// idempotent and safe to run on an existing database.
///
/// # Errors
/// Returns an error if the database could not be configured or a table
/// could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.busy_timeout(BUSY_TIMEOUT)?;
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let schema_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    user::create_user_table(&schema_transaction)?;
    account::create_account_table(&schema_transaction)?;
    category::create_category_table(&schema_transaction)?;
    transaction::create_transaction_table(&schema_transaction)?;
    budget::create_budget_table(&schema_transaction)?;
    goal::create_goal_table(&schema_transaction)?;

    schema_transaction.commit()?;

    Ok(())
}
