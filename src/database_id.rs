//! Type aliases for database row identifiers.
//!
//! Using distinct aliases makes function signatures self-documenting and
//! makes it harder to mix up, say, an account ID and a category ID when
//! reading call sites.

/// The integer row ID used by the application database.
pub type DatabaseId = i64;

/// The ID of a row in the account table.
pub type AccountId = DatabaseId;

/// The ID of a row in the category table.
pub type CategoryId = DatabaseId;

/// The ID of a row in the transaction table.
pub type TransactionId = DatabaseId;

/// The ID of a row in the budget table.
pub type BudgetId = DatabaseId;

/// The ID of a row in the goal table.
pub type GoalId = DatabaseId;
