//! Defines the JSON endpoints for managing accounts.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState, Error,
    account::{
        NewAccount, create_account, delete_account, get_account, list_accounts, update_account,
    },
    database_id::AccountId,
    user::UserId,
};

/// A route handler for creating a new account.
pub async fn create_account_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<NewAccount>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let account = create_account(&connection, user_id, form)?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// A route handler for listing the user's accounts.
pub async fn list_accounts_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let accounts = list_accounts(&connection, user_id)?;

    Ok(Json(accounts))
}

/// A route handler for fetching a single account.
pub async fn get_account_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let account = get_account(&connection, user_id, account_id)?;

    Ok(Json(account))
}

/// A route handler for replacing an account's editable fields.
pub async fn update_account_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
    Json(form): Json<NewAccount>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let account = update_account(&connection, user_id, account_id, form)?;

    Ok(Json(account))
}

/// A route handler for deleting an account and its transactions.
pub async fn delete_account_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    delete_account(&connection, user_id, account_id)?;

    Ok(StatusCode::NO_CONTENT)
}
