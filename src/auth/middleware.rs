//! Authentication middleware that validates cookies and extends sessions.

use std::cmp::max;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::cookie::{get_token_from_cookies, set_auth_cookie_with_expiry},
};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a valid auth cookie.
///
/// If the cookie is valid the user ID is placed into the request and the
/// request executed normally, and the session expiry is extended so active
/// users stay logged in. Otherwise a 401 JSON error response is returned.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserId>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}");
            return Error::CookieMissing.into_response();
        }
    };

    let token = match get_token_from_cookies(&jar) {
        Ok(token) => token,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(token.user_id);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    // Slide the session expiry forward, but never backwards.
    let new_expiry = max(
        token.expires_at,
        OffsetDateTime::now_utc() + state.cookie_duration,
    );
    let jar = match set_auth_cookie_with_expiry(jar, token.user_id, new_expiry) {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error extending cookie duration: {err:?}");
            return response;
        }
    };

    let (mut parts, body) = response.into_parts();
    for (key, value) in jar.into_response().headers().iter() {
        if key == SET_COOKIE {
            parts.headers.append(key, value.to_owned());
        }
    }

    Response::from_parts(parts, body)
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Extension, Json, Router,
        extract::State,
        http::StatusCode,
        middleware,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use axum_test::TestServer;
    use sha2::{Digest, Sha512};
    use time::Duration;

    use crate::{
        Error,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, auth_guard, set_auth_cookie},
        user::UserId,
    };

    use super::AuthState;

    async fn whoami(Extension(user_id): Extension<UserId>) -> Json<i64> {
        Json(user_id.as_i64())
    }

    async fn stub_log_in(
        State(state): State<AuthState>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, Error> {
        set_auth_cookie(jar, UserId::new(1), state.cookie_duration)
    }

    const LOG_IN_ROUTE: &str = "/log_in";
    const PROTECTED_ROUTE: &str = "/protected";

    fn get_test_server(cookie_duration: Duration) -> TestServer {
        let hash = Sha512::digest("nafstenoas");
        let state = AuthState {
            cookie_key: Key::from(&hash),
            cookie_duration,
        };

        let app = Router::new()
            .route(PROTECTED_ROUTE, get(whoami))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .route(LOG_IN_ROUTE, post(stub_log_in))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn get_protected_route_with_valid_cookie() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let response = server.post(LOG_IN_ROUTE).await;

        response.assert_status_ok();
        let token_cookie = response.cookie(COOKIE_TOKEN);

        let response = server.get(PROTECTED_ROUTE).add_cookie(token_cookie).await;

        response.assert_status_ok();
        response.assert_json(&1);
    }

    #[tokio::test]
    async fn auth_guard_reissues_the_cookie() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let response = server.post(LOG_IN_ROUTE).await;
        response.assert_status_ok();
        let jar = response.cookies();

        let response = server.get(PROTECTED_ROUTE).add_cookies(jar).await;

        response.assert_status_ok();
        assert!(
            response.maybe_cookie(COOKIE_TOKEN).is_some(),
            "expected token cookie to be set by auth guard"
        );
    }

    #[tokio::test]
    async fn get_protected_route_with_no_auth_cookie_is_unauthorized() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server.get(PROTECTED_ROUTE).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_protected_route_with_invalid_auth_cookie_is_unauthorized() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server
            .get(PROTECTED_ROUTE)
            .add_cookie(Cookie::build((COOKIE_TOKEN, "FOOBAR")).build())
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_protected_route_with_expired_auth_cookie_is_unauthorized() {
        let server = get_test_server(Duration::seconds(-10));
        let response = server.post(LOG_IN_ROUTE).await;
        response.assert_status_ok();
        let token_cookie = response.cookie(COOKIE_TOKEN);

        let response = server.get(PROTECTED_ROUTE).add_cookie(token_cookie).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
