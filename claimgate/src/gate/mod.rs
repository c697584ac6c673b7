//! Request gate.
//!
//! Intercepts inbound requests, reads a token from one configured header and
//! lets the request through only if the token verifies against a
//! [`TokenCodec`].
//!
//! # Pre-conditions
//! - The header name is a valid HTTP header name.
//!
//! # Post-conditions
//! - Allowed requests reach the next handler unmodified.
//! - Blocked requests get status 403 with the failure reason as content.
//!
//! # Invariants
//! - Each request is decided independently. The gate keeps no state between
//!   requests and can serve any number of them concurrently.

mod rejection;

pub use rejection::{JsonField, PlainText, RejectionResponder};

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::Algorithm;

use crate::codec::{CryptoOptions, KeyMaterial, TokenCodec};
use crate::error::GateError;

/// Everything needed to build a [`Gate`].
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Request header carrying the token.
    pub header_name: String,
    /// Codec (and therefore schema) tokens must verify against.
    pub codec: Arc<TokenCodec>,
    pub key: KeyMaterial,
    /// Overrides the codec's default algorithm.
    pub algorithm: Option<Algorithm>,
    pub crypto_options: CryptoOptions,
}

impl GateConfig {
    pub fn new(header_name: impl Into<String>, codec: Arc<TokenCodec>, key: KeyMaterial) -> Self {
        Self {
            header_name: header_name.into(),
            codec,
            key,
            algorithm: None,
            crypto_options: CryptoOptions::default(),
        }
    }
}

/// Per-request verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// Blocked, with the human-readable reason.
    Reject(String),
}

/// Token gate for an axum router.
///
/// ```no_run
/// use std::sync::Arc;
///
/// use axum::{Router, middleware, routing::get};
/// use claimgate::{ClaimSchema, FieldSpec, Gate, GateConfig, KeyMaterial, TokenCodec, gate};
///
/// let schema = ClaimSchema::builder("MyJwt")
///     .field("foo", FieldSpec::integer())
///     .build()
///     .unwrap();
/// let codec = Arc::new(TokenCodec::new(schema));
/// let token_gate = Gate::new(GateConfig::new("jwt", codec, KeyMaterial::from("mykey"))).unwrap();
///
/// let app: Router = Router::new()
///     .route("/", get(|| async { "Hello world" }))
///     .layer(middleware::from_fn_with_state(Arc::new(token_gate), gate::enforce));
/// ```
pub struct Gate {
    header: HeaderName,
    header_label: String,
    codec: Arc<TokenCodec>,
    key: KeyMaterial,
    algorithm: Option<Algorithm>,
    crypto_options: CryptoOptions,
    responder: Arc<dyn RejectionResponder>,
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("header", &self.header)
            .field("schema", &self.codec.schema().name())
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl Gate {
    /// Build a gate that answers rejections with [`PlainText`].
    pub fn new(config: GateConfig) -> Result<Self, GateError> {
        let header = HeaderName::from_bytes(config.header_name.as_bytes())
            .map_err(|_| GateError::InvalidHeaderName(config.header_name.clone()))?;

        Ok(Self {
            header,
            header_label: config.header_name,
            codec: config.codec,
            key: config.key,
            algorithm: config.algorithm,
            crypto_options: config.crypto_options,
            responder: Arc::new(PlainText),
        })
    }

    /// Replace the rejection responder.
    #[must_use]
    pub fn with_responder(mut self, responder: impl RejectionResponder + 'static) -> Self {
        self.responder = Arc::new(responder);
        self
    }

    #[must_use]
    pub const fn header_name(&self) -> &HeaderName {
        &self.header
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Decide whether a request carrying `headers` may pass.
    ///
    /// A missing or empty header, or one that is not visible ASCII, counts
    /// as absent.
    #[must_use]
    pub fn decide(&self, headers: &HeaderMap) -> GateDecision {
        let token = headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty());
        let Some(token) = token else {
            return GateDecision::Reject(format!("No {} header found", self.header_label));
        };

        match self
            .codec
            .verify_token(token, &self.key, self.algorithm, &self.crypto_options)
        {
            Ok(_) => GateDecision::Allow,
            Err(error) => {
                tracing::warn!(
                    header = %self.header,
                    class = error.class(),
                    reason = %error,
                    "token rejected"
                );
                GateDecision::Reject(error.to_string())
            }
        }
    }

    /// Render a rejection. The status is always 403, whatever the
    /// responder chose.
    #[must_use]
    pub fn reject(&self, message: &str) -> Response {
        let mut response = self.responder.render(message);
        *response.status_mut() = StatusCode::FORBIDDEN;
        response
    }
}

/// Axum middleware running the gate in front of the next handler.
///
/// Use with [`axum::middleware::from_fn_with_state`].
pub async fn enforce(State(gate): State<Arc<Gate>>, request: Request, next: Next) -> Response {
    match gate.decide(request.headers()) {
        GateDecision::Allow => {
            tracing::debug!(uri = %request.uri(), "token accepted");
            next.run(request).await
        }
        GateDecision::Reject(message) => gate.reject(&message),
    }
}
