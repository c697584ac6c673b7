use axum::http::StatusCode;
use serde_json::json;

use super::helpers::{app, get_root, issue, my_jwt_gate};
use crate::codec::{CryptoOptions, KeyMaterial, TokenCodec};
use crate::schema::{ClaimSchema, FieldSpec};

#[tokio::test]
async fn test_missing_header() {
    let response = get_root(app(my_jwt_gate()), None).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body, "No jwt header found");
    assert_eq!(
        response.content_type.as_deref(),
        Some("text/plain; charset=utf-8")
    );
}

#[tokio::test]
async fn test_empty_header() {
    let response = get_root(app(my_jwt_gate()), Some("")).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body, "No jwt header found");
}

#[tokio::test]
async fn test_malformed_token() {
    let response = get_root(app(my_jwt_gate()), Some("bad_token")).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body, "Not enough segments");
}

#[tokio::test]
async fn test_tampered_signature() {
    let token = issue(&json!({"foo": 1, "bar": 10}));
    let (rest, signature) = token.rsplit_once('.').expect("three segments");
    let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{rest}.{flipped}{}", &signature[1..]);

    let response = get_root(app(my_jwt_gate()), Some(&tampered)).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body, "Signature verification failed.");
}

#[tokio::test]
async fn test_schema_violation_names_field() {
    // Correctly signed, but only satisfies a different schema.
    let other = ClaimSchema::builder("Loose")
        .field("foo", FieldSpec::string())
        .field("bar", FieldSpec::integer())
        .build()
        .expect("valid schema");
    let token = TokenCodec::new(other)
        .new_token(
            json!({"foo": "one", "bar": 1000})
                .as_object()
                .expect("object"),
            &KeyMaterial::from("mykey"),
            None,
            &CryptoOptions::default(),
        )
        .expect("token issued");

    let response = get_root(app(my_jwt_gate()), Some(&token)).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.body.starts_with("foo: "), "{}", response.body);
}

#[tokio::test]
async fn test_wrong_key() {
    let token = TokenCodec::new(
        ClaimSchema::builder("MyJwt")
            .field("foo", FieldSpec::integer())
            .field("bar", FieldSpec::integer())
            .build()
            .expect("valid schema"),
    )
    .new_token(
        json!({"foo": 1, "bar": 1}).as_object().expect("object"),
        &KeyMaterial::from("notmykey"),
        None,
        &CryptoOptions::default(),
    )
    .expect("token issued");

    let response = get_root(app(my_jwt_gate()), Some(&token)).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body, "Signature verification failed.");
}
