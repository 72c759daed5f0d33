//! Assembles the dashboard response from the ledger.

use axum::{Extension, Json, extract::State};
use rusqlite::{Connection, params};
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    budget::budget_amounts_for_month,
    category::list_categories,
    dashboard::aggregation::{
        Dashboard, TransactionRecord, category_summaries, month_summary, monthly_history,
        period_summary,
    },
    money::decimal_from_row,
    timezone::get_local_offset,
    user::UserId,
};

/// Build the dashboard for `user_id` as of the calendar date `today`.
///
/// Reads only; calling this twice with no intervening writes yields
/// identical results.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn build_dashboard(
    connection: &Connection,
    user_id: UserId,
    today: Date,
) -> Result<Dashboard, Error> {
    let records = fetch_transaction_records(connection, user_id)?;
    let categories = list_categories(connection, user_id)?;
    let budgets = budget_amounts_for_month(connection, user_id, today)?;

    Ok(Dashboard {
        all_time_summary: period_summary(&records),
        current_month_summary: month_summary(&records, today),
        category_summary: category_summaries(&categories, &budgets, &records, today),
        monthly_history: monthly_history(&records),
    })
}

fn fetch_transaction_records(
    connection: &Connection,
    user_id: UserId,
) -> Result<Vec<TransactionRecord>, Error> {
    connection
        .prepare(
            "SELECT transaction_type, amount, category_id, date FROM \"transaction\"
             WHERE user_id = ?1",
        )?
        .query_map(params![user_id.as_i64()], |row| {
            let transaction_type: String = row.get(0)?;

            Ok(TransactionRecord {
                transaction_type: transaction_type.parse().map_err(|_| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        transaction_type.clone().into(),
                    )
                })?,
                amount: decimal_from_row(row, 1)?,
                category_id: row.get(2)?,
                date: row.get(3)?,
            })
        })?
        .map(|row| row.map_err(|error| error.into()))
        .collect()
}

/// A route handler for the dashboard: all four report views in one
/// response. "Now" is the server's local calendar date.
///
/// Never fails on an empty ledger; a brand new user gets zeros and empty
/// lists.
pub async fn get_dashboard_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Dashboard>, Error> {
    let offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezone(state.local_timezone.clone()))?;
    let today = OffsetDateTime::now_utc().to_offset(offset).date();

    let connection = state.lock_connection()?;
    let dashboard = build_dashboard(&connection, user_id, today)?;

    Ok(Json(dashboard))
}
