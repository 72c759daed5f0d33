//! Defines the JSON endpoints for managing transactions.
//!
//! The handlers here are deliberately thin: every write is forwarded to
//! [crate::transaction::service], which owns the balance bookkeeping.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState, Error,
    database_id::TransactionId,
    transaction::{
        NewTransaction, TransactionChanges, create_transaction, delete_transaction,
        get_transaction, list_transactions, update_transaction,
    },
    user::UserId,
};

/// A route handler for recording a new transaction.
pub async fn create_transaction_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<NewTransaction>,
) -> Result<impl IntoResponse, Error> {
    let mut connection = state.lock_connection()?;
    let transaction = create_transaction(&mut connection, user_id, form)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// A route handler for listing the user's transactions, newest first.
pub async fn list_transactions_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let transactions = list_transactions(&connection, user_id)?;

    Ok(Json(transactions))
}

/// A route handler for fetching a single transaction.
pub async fn get_transaction_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let transaction = get_transaction(&connection, user_id, transaction_id)?;

    Ok(Json(transaction))
}

/// A route handler for updating a transaction with a partial field set.
pub async fn update_transaction_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
    Json(changes): Json<TransactionChanges>,
) -> Result<impl IntoResponse, Error> {
    let mut connection = state.lock_connection()?;
    let transaction = update_transaction(&mut connection, user_id, transaction_id, changes)?;

    Ok(Json(transaction))
}

/// A route handler for deleting a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<impl IntoResponse, Error> {
    let mut connection = state.lock_connection()?;
    delete_transaction(&mut connection, user_id, transaction_id)?;

    Ok(StatusCode::NO_CONTENT)
}
