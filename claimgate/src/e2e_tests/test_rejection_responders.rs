use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use super::helpers::{app, get_root, issue, my_jwt_gate};
use crate::gate::JsonField;

#[tokio::test]
async fn test_json_field_responder() {
    let gate = my_jwt_gate().with_responder(JsonField::new("bad_token"));

    let response = get_root(app(gate), Some("bad_token")).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.content_type.as_deref(), Some("application/json"));
    assert_eq!(response.json(), json!({"bad_token": "Not enough segments"}));
}

#[tokio::test]
async fn test_closure_responder_status_is_forced() {
    let gate = my_jwt_gate().with_responder(|message: &str| {
        (StatusCode::UNAUTHORIZED, format!("denied: {message}")).into_response()
    });

    let response = get_root(app(gate), None).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body, "denied: No jwt header found");
}

#[tokio::test]
async fn test_custom_responder_does_not_affect_accepted_requests() {
    let gate = my_jwt_gate().with_responder(JsonField::new("error"));
    let token = issue(&json!({"foo": 3, "bar": 3}));

    let response = get_root(app(gate), Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "Hello world");
}
