use std::io::Write;
use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use super::helpers::{SECRET_KEY, app, get_root};
use crate::claims::ClaimValue;
use crate::codec::{CryptoOptions, KeyMaterial, TokenCodec};
use crate::gate::{Gate, GateConfig};
use crate::schema::ClaimSchema;

const DEFINITION: &str = r#"{
    "name": "Session",
    "unknown_claims": "reject",
    "fields": [
        {"name": "user", "type": "string", "min_length": 1},
        {"name": "role", "type": "string", "one_of": ["admin", "viewer"]},
        {"name": "scopes", "type": "array<string>", "required": false, "default": []}
    ]
}"#;

fn gated_by_file() -> (Gate, Arc<TokenCodec>) {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(DEFINITION.as_bytes()).expect("write schema");

    let schema = ClaimSchema::load(file.path()).expect("schema loads");
    let codec = Arc::new(TokenCodec::new(schema));
    let gate = Gate::new(GateConfig::new(
        "jwt",
        Arc::clone(&codec),
        KeyMaterial::from(SECRET_KEY),
    ))
    .expect("valid gate");
    (gate, codec)
}

#[tokio::test]
async fn test_loaded_schema_gates_requests() {
    let (gate, codec) = gated_by_file();
    let key = KeyMaterial::from(SECRET_KEY);
    let token = codec
        .new_token(
            json!({"user": "ada", "role": "admin"})
                .as_object()
                .expect("object"),
            &key,
            None,
            &CryptoOptions::default(),
        )
        .expect("token issued");

    let claims = codec
        .verify_token(&token, &key, None, &CryptoOptions::default())
        .expect("valid token");
    assert_eq!(claims.string("user").expect("user"), "ada");
    assert_eq!(claims.get("scopes"), Some(&ClaimValue::Array(Vec::new())));

    let response = get_root(app(gate), Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_loaded_schema_rejects_unknown_claims_on_issue() {
    let (_, codec) = gated_by_file();
    let result = codec.new_token(
        json!({"user": "ada", "role": "viewer", "extra": true})
            .as_object()
            .expect("object"),
        &KeyMaterial::from(SECRET_KEY),
        None,
        &CryptoOptions::default(),
    );

    let error = result.expect_err("unknown claim rejected");
    assert_eq!(error.to_string(), "extra: extra fields not permitted");
}
