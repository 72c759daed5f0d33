//! Defines the JSON endpoints for managing budgets.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState, Error,
    budget::{
        NewBudget, create_budget, delete_budget, get_budget, list_budgets, update_budget,
    },
    database_id::BudgetId,
    user::UserId,
};

/// A route handler for creating a new budget.
pub async fn create_budget_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<NewBudget>,
) -> Result<impl IntoResponse, Error> {
    let mut connection = state.lock_connection()?;
    let budget = create_budget(&mut connection, user_id, form)?;

    Ok((StatusCode::CREATED, Json(budget)))
}

/// A route handler for listing the user's budgets.
pub async fn list_budgets_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let budgets = list_budgets(&connection, user_id)?;

    Ok(Json(budgets))
}

/// A route handler for fetching a single budget.
pub async fn get_budget_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(budget_id): Path<BudgetId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let budget = get_budget(&connection, user_id, budget_id)?;

    Ok(Json(budget))
}

/// A route handler for replacing a budget.
pub async fn update_budget_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(budget_id): Path<BudgetId>,
    Json(form): Json<NewBudget>,
) -> Result<impl IntoResponse, Error> {
    let mut connection = state.lock_connection()?;
    let budget = update_budget(&mut connection, user_id, budget_id, form)?;

    Ok(Json(budget))
}

/// A route handler for deleting a budget.
pub async fn delete_budget_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(budget_id): Path<BudgetId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    delete_budget(&connection, user_id, budget_id)?;

    Ok(StatusCode::NO_CONTENT)
}
