//! Savings goals: a named target amount, how much has been put aside so
//! far, and the derived progress percentage.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    database_id::GoalId,
    money::{decimal_from_row, validate_amount, validate_amount_or_zero},
    user::UserId,
};

/// Something the user is saving towards, e.g. "Car".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Goal {
    /// The ID of the goal.
    pub id: GoalId,
    /// The ID of the user that owns this goal.
    #[serde(skip_serializing)]
    pub user_id: UserId,
    /// What the user is saving for.
    pub name: String,
    /// The amount to reach.
    pub target_amount: Decimal,
    /// How much has been put aside so far. Maintained by the client.
    pub current_amount: Decimal,
    /// An optional date to reach the target by.
    pub deadline: Option<Date>,
    /// When the goal was created.
    pub created_at: OffsetDateTime,
}

impl Goal {
    /// The percentage of the target reached, clamped to [0, 100].
    ///
    /// A goal with a zero target reports zero progress rather than
    /// dividing by zero.
    pub fn progress(&self) -> Decimal {
        if self.target_amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let percent = self.current_amount / self.target_amount * Decimal::ONE_HUNDRED;
        percent.min(Decimal::ONE_HUNDRED).round_dp(2)
    }
}

/// A goal as returned to clients, with the derived progress percentage.
#[derive(Debug, Serialize)]
pub struct GoalResponse {
    /// The goal itself.
    #[serde(flatten)]
    pub goal: Goal,
    /// The percentage of the target reached, in [0, 100].
    pub progress: Decimal,
}

impl From<Goal> for GoalResponse {
    fn from(goal: Goal) -> Self {
        let progress = goal.progress();
        Self { goal, progress }
    }
}

/// The fields a client supplies to create or replace a goal.
#[derive(Debug, Clone, Deserialize)]
pub struct NewGoal {
    /// What the user is saving for.
    pub name: String,
    /// The amount to reach.
    pub target_amount: Decimal,
    /// How much has been put aside so far. Defaults to zero.
    #[serde(default)]
    pub current_amount: Decimal,
    /// An optional date to reach the target by.
    pub deadline: Option<Date>,
}

/// Create the goal table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS goal (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                target_amount TEXT NOT NULL,
                current_amount TEXT NOT NULL,
                deadline TEXT,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_row_to_goal(row: &Row) -> Result<Goal, rusqlite::Error> {
    Ok(Goal {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        name: row.get(2)?,
        target_amount: decimal_from_row(row, 3)?,
        current_amount: decimal_from_row(row, 4)?,
        deadline: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const GOAL_COLUMNS: &str =
    "id, user_id, name, target_amount, current_amount, deadline, created_at";

/// Create a new goal.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidAmount] if the target is not positive or the current
///   amount is negative,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_goal(
    connection: &Connection,
    user_id: UserId,
    new_goal: NewGoal,
) -> Result<Goal, Error> {
    let target_amount = validate_amount(new_goal.target_amount)?;
    let current_amount = validate_amount_or_zero(new_goal.current_amount)?;
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO goal (user_id, name, target_amount, current_amount, deadline, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id.as_i64(),
            new_goal.name,
            target_amount.to_string(),
            current_amount.to_string(),
            new_goal.deadline,
            created_at
        ],
    )?;

    Ok(Goal {
        id: connection.last_insert_rowid(),
        user_id,
        name: new_goal.name,
        target_amount,
        current_amount,
        deadline: new_goal.deadline,
        created_at,
    })
}

/// Retrieve a goal owned by `user_id`.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `id` does not refer to a goal owned by this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_goal(connection: &Connection, user_id: UserId, id: GoalId) -> Result<Goal, Error> {
    connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goal WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row(params![id, user_id.as_i64()], map_row_to_goal)
        .map_err(|error| error.into())
}

/// Retrieve all goals owned by `user_id`, most recently created first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_goals(connection: &Connection, user_id: UserId) -> Result<Vec<Goal>, Error> {
    connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goal WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        ))?
        .query_map(params![user_id.as_i64()], map_row_to_goal)?
        .map(|row| row.map_err(|error| error.into()))
        .collect()
}

/// Replace a goal's fields.
///
/// # Errors
/// As for [create_goal], plus [Error::NotFound] if `id` does not refer to a
/// goal owned by this user.
pub fn update_goal(
    connection: &Connection,
    user_id: UserId,
    id: GoalId,
    changes: NewGoal,
) -> Result<Goal, Error> {
    let target_amount = validate_amount(changes.target_amount)?;
    let current_amount = validate_amount_or_zero(changes.current_amount)?;

    let rows_updated = connection.execute(
        "UPDATE goal SET name = ?1, target_amount = ?2, current_amount = ?3, deadline = ?4
         WHERE id = ?5 AND user_id = ?6",
        params![
            changes.name,
            target_amount.to_string(),
            current_amount.to_string(),
            changes.deadline,
            id,
            user_id.as_i64()
        ],
    )?;

    if rows_updated == 0 {
        return Err(Error::NotFound);
    }

    get_goal(connection, user_id, id)
}

/// Delete a goal owned by `user_id`.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `id` does not refer to a goal owned by this user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_goal(connection: &Connection, user_id: UserId, id: GoalId) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM goal WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// A route handler for creating a new goal.
pub async fn create_goal_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<NewGoal>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let goal = create_goal(&connection, user_id, form)?;

    Ok((StatusCode::CREATED, Json(GoalResponse::from(goal))))
}

/// A route handler for listing the user's goals with their progress.
pub async fn list_goals_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let goals: Vec<GoalResponse> = list_goals(&connection, user_id)?
        .into_iter()
        .map(GoalResponse::from)
        .collect();

    Ok(Json(goals))
}

/// A route handler for fetching a single goal with its progress.
pub async fn get_goal_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(goal_id): Path<GoalId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let goal = get_goal(&connection, user_id, goal_id)?;

    Ok(Json(GoalResponse::from(goal)))
}

/// A route handler for replacing a goal.
pub async fn update_goal_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(goal_id): Path<GoalId>,
    Json(form): Json<NewGoal>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    let goal = update_goal(&connection, user_id, goal_id, form)?;

    Ok(Json(GoalResponse::from(goal)))
}

/// A route handler for deleting a goal.
pub async fn delete_goal_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(goal_id): Path<GoalId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.lock_connection()?;
    delete_goal(&connection, user_id, goal_id)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod progress_tests {
    use rust_decimal::Decimal;
    use time::macros::datetime;

    use crate::user::UserId;

    use super::Goal;

    fn goal(target: &str, current: &str) -> Goal {
        Goal {
            id: 1,
            user_id: UserId::new(1),
            name: "Car".to_string(),
            target_amount: target.parse().unwrap(),
            current_amount: current.parse().unwrap(),
            deadline: None,
            created_at: datetime!(2024-01-01 00:00:00 UTC),
        }
    }

    #[test]
    fn progress_is_a_percentage() {
        assert_eq!(goal("200.00", "50.00").progress(), "25.00".parse().unwrap());
    }

    #[test]
    fn progress_rounds_to_two_places() {
        assert_eq!(goal("3.00", "1.00").progress(), "33.33".parse().unwrap());
    }

    #[test]
    fn progress_is_clamped_to_one_hundred() {
        assert_eq!(
            goal("100.00", "250.00").progress(),
            Decimal::ONE_HUNDRED
        );
    }

    #[test]
    fn zero_target_reports_zero_progress() {
        let mut zero_target = goal("1.00", "50.00");
        zero_target.target_amount = Decimal::ZERO;

        assert_eq!(zero_target.progress(), Decimal::ZERO);
    }
}
