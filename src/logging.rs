//! Middleware for logging requests and responses.

use axum::{extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response};

/// The maximum number of body bytes logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and logged in full at the `debug` level. Password fields in JSON bodies
/// are redacted before logging.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (head, body_text) = extract_head_and_body_text_from_request(request).await;

    let is_json = head
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        log_request(&head, &redact_passwords(&body_text));
    } else {
        log_request(&head, &body_text);
    }

    let request = Request::from_parts(head, body_text.into());
    let response = next.run(request).await;

    let (head, body_text) = extract_head_and_body_text_from_response(response).await;
    log_response(&head, &body_text);

    Response::from_parts(head, body_text.into())
}

/// Replace the values of password fields in a JSON object with asterisks.
///
/// Bodies that are not JSON objects are returned unchanged.
fn redact_passwords(body_text: &str) -> String {
    let mut value: serde_json::Value = match serde_json::from_str(body_text) {
        Ok(value) => value,
        Err(_) => return body_text.to_string(),
    };

    if let Some(object) = value.as_object_mut() {
        for field in ["password", "confirm_password"] {
            if let Some(entry) = object.get_mut(field) {
                *entry = serde_json::Value::String("********".to_string());
            }
        }
    }

    value.to_string()
}

async fn extract_head_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (head, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    (head, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_head_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (head, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    (head, String::from_utf8_lossy(&body_bytes).to_string())
}

fn log_request(head: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {:}...",
            head.method,
            head.uri,
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {} {}\nbody: {body:?}", head.method, head.uri);
    }
}

fn log_response(head: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {:}...",
            head.status,
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", head.status);
    }
}

#[cfg(test)]
mod redact_tests {
    use super::redact_passwords;

    #[test]
    fn password_fields_are_redacted() {
        let body = r#"{"email":"test@test.com","password":"hunter2"}"#;

        let redacted = redact_passwords(body);

        assert!(!redacted.contains("hunter2"));
        assert!(redacted.contains("********"));
        assert!(redacted.contains("test@test.com"));
    }

    #[test]
    fn confirm_password_is_redacted_too() {
        let body = r#"{"password":"hunter2","confirm_password":"hunter2"}"#;

        let redacted = redact_passwords(body);

        assert!(!redacted.contains("hunter2"));
    }

    #[test]
    fn non_json_bodies_are_untouched() {
        assert_eq!(redact_passwords("password=hunter2"), "password=hunter2");
    }

    #[test]
    fn bodies_without_passwords_are_unchanged_semantically() {
        let body = r#"{"amount":"30.00"}"#;

        let redacted = redact_passwords(body);

        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&redacted).unwrap(),
            serde_json::from_str::<serde_json::Value>(body).unwrap()
        );
    }
}
