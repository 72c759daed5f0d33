//! User accounts: the user table, queries, and the registration endpoint.

use std::fmt::Display;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AppState, Error, PasswordHash, ValidatedPassword};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// All other entities (accounts, categories, transactions, budgets, goals)
/// are owned by exactly one user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The email address the user logs in with. Unique.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

/// Check that `email` looks like an email address.
///
/// This is deliberately loose: the address is only ever used as a log-in
/// identifier, so "has a local part and a domain" is all we require.
///
/// # Errors
/// Returns [Error::InvalidEmail] if `email` is not plausibly an email address.
pub fn validate_email(email: &str) -> Result<&str, Error> {
    let email = email.trim();

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(Error::InvalidEmail(email.to_string())),
    }
}

/// Create the user table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidEmail] if `email` is not an email address,
/// - [Error::DuplicateEmail] if `email` is already registered,
/// - or [Error::SqlError] if an unexpected SQL error occurred.
pub fn create_user(
    connection: &Connection,
    email: &str,
    password_hash: PasswordHash,
) -> Result<User, Error> {
    let email = validate_email(email)?;
    let created_at = OffsetDateTime::now_utc();

    connection
        .execute(
            "INSERT INTO user (email, password, created_at) VALUES (?1, ?2, ?3)",
            (email, password_hash.as_ref(), created_at),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateEmail,
            error => error.into(),
        })?;

    let id = UserId::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: email.to_string(),
        password_hash,
        created_at,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
/// This function will return an error if:
/// - `user_id` does not belong to a registered user,
/// - or there was an error trying to access the database.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password, created_at FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user from the database with an email equal to `email`.
///
/// # Errors
/// This function will return an error if:
/// - `email` does not belong to a registered user,
/// - or there was an error trying to access the database.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password, created_at FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], map_user_row)
        .map_err(|error| error.into())
}

fn map_user_row(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserId::new(row.get(0)?),
        email: row.get(1)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: row.get(3)?,
    })
}

/// The request body for registering a new user.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    /// The email address to register.
    pub email: String,
    /// The raw password. Checked for strength before hashing.
    pub password: String,
}

/// A user as returned to clients. Never includes the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The email address the user logs in with.
    pub email: String,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// A route handler for registering a new user.
pub async fn register_user_endpoint(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<impl IntoResponse, Error> {
    let password = ValidatedPassword::new(&form.password)?;
    let password_hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;

    let connection = state.lock_connection()?;
    let user = create_user(&connection, &form.email, password_hash)?;

    tracing::info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}
