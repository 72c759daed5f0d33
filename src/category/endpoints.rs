//! Defines the JSON endpoints for managing categories.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState, Error,
    category::{
        NewCategory, create_category, delete_category, get_category, list_categories,
        update_category,
    },
    database_id::CategoryId,
    user::UserId,
};

/// A route handler for creating a new category.
pub async fn create_category_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<NewCategory>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let category = create_category(&connection, user_id, form)?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// A route handler for listing the user's categories.
pub async fn list_categories_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let categories = list_categories(&connection, user_id)?;

    Ok(Json(categories))
}

/// A route handler for fetching a single category.
pub async fn get_category_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(category_id): Path<CategoryId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let category = get_category(&connection, user_id, category_id)?;

    Ok(Json(category))
}

/// A route handler for replacing a category's name and kind.
pub async fn update_category_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(category_id): Path<CategoryId>,
    Json(form): Json<NewCategory>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let category = update_category(&connection, user_id, category_id, form)?;

    Ok(Json(category))
}

/// A route handler for deleting a category and its transactions.
pub async fn delete_category_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(category_id): Path<CategoryId>,
) -> Result<impl IntoResponse, Error> {
    let mut connection = state.lock_connection()?;
    delete_category(&mut connection, user_id, category_id)?;

    Ok(StatusCode::NO_CONTENT)
}
