//! Common helpers for end-to-end tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{Router, middleware, routing::get};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::codec::{CryptoOptions, KeyMaterial, TokenCodec};
use crate::gate::{self, Gate, GateConfig};
use crate::schema::{ClaimSchema, FieldSpec};

pub const SECRET_KEY: &str = "mykey";
pub const HEADER_NAME: &str = "jwt";

/// `foo` is any integer, `bar` an integer in `0..=10`.
#[must_use]
pub fn my_jwt_codec() -> Arc<TokenCodec> {
    let schema = ClaimSchema::builder("MyJwt")
        .field("foo", FieldSpec::integer())
        .field("bar", FieldSpec::integer().ge(0).le(10))
        .build()
        .expect("valid schema");
    Arc::new(TokenCodec::new(schema))
}

#[must_use]
pub fn my_jwt_gate() -> Gate {
    Gate::new(GateConfig::new(
        HEADER_NAME,
        my_jwt_codec(),
        KeyMaterial::from(SECRET_KEY),
    ))
    .expect("valid gate")
}

/// A router whose only route answers "Hello world", guarded by `token_gate`.
pub fn app(token_gate: Gate) -> Router {
    Router::new()
        .route("/", get(|| async { "Hello world" }))
        .layer(middleware::from_fn_with_state(
            Arc::new(token_gate),
            gate::enforce,
        ))
}

/// Sign `claims` with the shared test key.
#[must_use]
pub fn issue(claims: &Value) -> String {
    my_jwt_codec()
        .new_token(
            claims.as_object().expect("claims object"),
            &KeyMaterial::from(SECRET_KEY),
            None,
            &CryptoOptions::default(),
        )
        .expect("token issued")
}

/// Status and body text of one response.
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl TestResponse {
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("JSON body")
    }
}

/// Send `GET /` through `app`, with the token header if given.
pub async fn get_root(app: Router, token: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().uri("/");
    if let Some(token) = token {
        builder = builder.header(HEADER_NAME, token);
    }
    let request = builder.body(Body::empty()).expect("request");

    let response = app.oneshot(request).await.expect("infallible");
    let status = response.status();
    let content_type = response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();

    TestResponse {
        status,
        content_type,
        body: String::from_utf8(bytes.to_vec()).expect("utf-8 body"),
    }
}
