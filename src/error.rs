//! Defines the app level error type and its conversion to JSON responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde_json::json;

use crate::database_id::{AccountId, CategoryId};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no auth cookie in the cookie jar")]
    CookieMissing,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string used to register a user is not an email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email address used to register a user is already taken.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The specified account name already exists for this user.
    #[error("the account \"{0}\" already exists")]
    DuplicateAccountName(String),

    /// A budget already exists for the same category and month.
    #[error("a budget for this category and month already exists")]
    DuplicateBudget,

    /// The account ID used in a request did not match an account owned by
    /// the requesting user.
    #[error("the account ID does not refer to a valid account")]
    InvalidAccount(Option<AccountId>),

    /// The category ID used in a request did not match a category owned by
    /// the requesting user.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// A zero, negative, or over-precise monetary amount was supplied.
    #[error("{0} is not a valid amount: amounts must be positive with at most two decimal places")]
    InvalidAmount(Decimal),

    /// A month string could not be parsed.
    #[error("\"{0}\" is not a valid month, use the format YYYY-MM")]
    InvalidMonth(String),

    /// An error occurred while getting the local timezone from a canonical
    /// timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// The requested resource was not found.
    ///
    /// The client should check that the parameters (e.g., ID) are correct
    /// and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The database was busy and the operation gave up after the bounded
    /// busy wait. The client may retry the request.
    #[error("the operation timed out waiting for the database, try again")]
    Conflict,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JsonSerializationError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.code == rusqlite::ErrorCode::DatabaseBusy
                    || sql_error.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                Error::Conflict
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = match self {
            Error::InvalidCredentials | Error::CookieMissing => StatusCode::UNAUTHORIZED,
            Error::TooWeak(_)
            | Error::InvalidEmail(_)
            | Error::InvalidAmount(_)
            | Error::InvalidMonth(_) => StatusCode::BAD_REQUEST,
            Error::DuplicateEmail
            | Error::DuplicateAccountName(_)
            | Error::DuplicateBudget
            | Error::Conflict => StatusCode::CONFLICT,
            Error::InvalidAccount(_) | Error::InvalidCategory(_) | Error::NotFound => {
                StatusCode::NOT_FOUND
            }
            Error::HashingError(_)
            | Error::InvalidTimezone(_)
            | Error::DatabaseLock
            | Error::JsonSerializationError(_)
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal errors are not intended to be shown to the client.
        if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            return (
                status_code,
                Json(json!({
                    "error": "something went wrong, check the server logs for more details"
                })),
            )
                .into_response();
        }

        (status_code, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
