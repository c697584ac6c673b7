//! Rejection responses.
//!
//! A responder only chooses the body and its encoding. The gate forces the
//! status to `403 Forbidden` on whatever it renders.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};

/// Builds the response sent when the gate blocks a request.
pub trait RejectionResponder: Send + Sync {
    fn render(&self, message: &str) -> Response;
}

impl<F> RejectionResponder for F
where
    F: Fn(&str) -> Response + Send + Sync,
{
    fn render(&self, message: &str) -> Response {
        self(message)
    }
}

/// The message as a `text/plain` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl RejectionResponder for PlainText {
    fn render(&self, message: &str) -> Response {
        (StatusCode::FORBIDDEN, message.to_owned()).into_response()
    }
}

/// The message as a one-key JSON object, e.g. `{"bad_token": "<message>"}`.
#[derive(Debug, Clone)]
pub struct JsonField {
    key: String,
}

impl JsonField {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl RejectionResponder for JsonField {
    fn render(&self, message: &str) -> Response {
        let mut body = Map::new();
        body.insert(self.key.clone(), Value::String(message.to_owned()));
        (StatusCode::FORBIDDEN, Json(Value::Object(body))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::header;

    use super::*;

    #[test]
    fn test_plain_text_content_type() {
        let response = PlainText.render("No jwt header found");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
            Some(&b"text/plain; charset=utf-8"[..])
        );
    }

    #[test]
    fn test_json_field_content_type() {
        let response = JsonField::new("bad_token").render("Not enough segments");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
            Some(&b"application/json"[..])
        );
    }

    #[test]
    fn test_closure_is_a_responder() {
        let responder = |message: &str| (StatusCode::OK, format!("denied: {message}")).into_response();
        let response = responder.render("x");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
