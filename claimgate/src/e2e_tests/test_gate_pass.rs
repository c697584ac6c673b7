use serde_json::json;

use super::helpers::{app, get_root, issue, my_jwt_gate};
use axum::http::StatusCode;

#[tokio::test]
async fn test_valid_token_reaches_handler() {
    let token = issue(&json!({"foo": 1, "bar": 10}));

    let response = get_root(app(my_jwt_gate()), Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "Hello world");
}

#[tokio::test]
async fn test_boundary_values_pass() {
    for bar in [0, 10] {
        let token = issue(&json!({"foo": -5, "bar": bar}));
        let response = get_root(app(my_jwt_gate()), Some(&token)).await;
        assert_eq!(response.status, StatusCode::OK, "bar={bar}");
    }
}

#[tokio::test]
async fn test_same_gate_serves_many_requests() {
    let router = app(my_jwt_gate());
    let good = issue(&json!({"foo": 1, "bar": 1}));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let router = router.clone();
            let token = if i % 2 == 0 { Some(good.clone()) } else { None };
            tokio::spawn(async move { get_root(router, token.as_deref()).await.status })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let status = handle.await.expect("task");
        let expected = if i % 2 == 0 {
            StatusCode::OK
        } else {
            StatusCode::FORBIDDEN
        };
        assert_eq!(status, expected);
    }
}
