//! The log in and log out endpoints.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::cookie::{invalidate_auth_cookie, set_auth_cookie},
    user::{UserResponse, get_user_by_email},
};

/// The request body for logging in.
#[derive(Debug, Deserialize)]
pub struct LogInForm {
    /// The email address the user registered with.
    pub email: String,
    /// The raw password.
    pub password: String,
}

/// A route handler for logging in a user.
///
/// On success the response carries the auth cookie and the user's details.
/// A wrong email and a wrong password both produce the same error so the
/// response does not reveal which emails are registered.
pub async fn log_in_endpoint(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(form): Json<LogInForm>,
) -> Result<impl IntoResponse, Error> {
    let user = {
        let connection = state.lock_connection()?;

        get_user_by_email(&form.email, &connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            error => error,
        })?
    };

    let password_is_correct = user
        .password_hash
        .verify(&form.password)
        .map_err(|e| Error::HashingError(e.to_string()))?;

    if !password_is_correct {
        return Err(Error::InvalidCredentials);
    }

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)?;

    tracing::info!("User {} logged in", user.id);

    Ok((jar, Json(UserResponse::from(user))))
}

/// A route handler for logging out the current user.
///
/// Always succeeds: logging out without a session is a no-op.
pub async fn log_out_endpoint(jar: PrivateCookieJar) -> impl IntoResponse {
    (invalidate_auth_cookie(jar), StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod log_in_tests {
    use axum::{Router, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        AppState, PasswordHash,
        auth::{COOKIE_TOKEN, log_in_endpoint, log_out_endpoint},
        user::create_user,
    };

    const LOG_IN: &str = "/api/log_in";
    const LOG_OUT: &str = "/api/log_out";

    fn get_test_server() -> TestServer {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::new(conn, "ertsirsenrt", "Etc/UTC").unwrap();

        {
            let connection = state.lock_connection().unwrap();
            // Cost 4 keeps the test fast.
            let password_hash =
                PasswordHash::from_raw_password("averysecretandsecurepassword", 4).unwrap();
            create_user(&connection, "test@test.com", password_hash).unwrap();
        }

        let app = Router::new()
            .route(LOG_IN, post(log_in_endpoint))
            .route(LOG_OUT, post(log_out_endpoint))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn log_in_with_correct_credentials_sets_cookie() {
        let server = get_test_server();

        let response = server
            .post(LOG_IN)
            .json(&serde_json::json!({
                "email": "test@test.com",
                "password": "averysecretandsecurepassword",
            }))
            .await;

        response.assert_status_ok();
        assert!(response.maybe_cookie(COOKIE_TOKEN).is_some());
    }

    #[tokio::test]
    async fn log_in_with_wrong_password_is_unauthorized() {
        let server = get_test_server();

        let response = server
            .post(LOG_IN)
            .json(&serde_json::json!({
                "email": "test@test.com",
                "password": "hunter2",
            }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn log_in_with_unknown_email_is_unauthorized() {
        let server = get_test_server();

        let response = server
            .post(LOG_IN)
            .json(&serde_json::json!({
                "email": "nobody@test.com",
                "password": "averysecretandsecurepassword",
            }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn log_out_clears_the_cookie() {
        let server = get_test_server();
        let response = server
            .post(LOG_IN)
            .json(&serde_json::json!({
                "email": "test@test.com",
                "password": "averysecretandsecurepassword",
            }))
            .await;
        response.assert_status_ok();

        let response = server
            .post(LOG_OUT)
            .add_cookie(response.cookie(COOKIE_TOKEN))
            .await;

        response.assert_status(axum::http::StatusCode::NO_CONTENT);
        assert_eq!(response.cookie(COOKIE_TOKEN).value(), "deleted");
    }
}
