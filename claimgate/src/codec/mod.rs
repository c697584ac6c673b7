//! Schema-bound token codec.
//!
//! Binds a [`ClaimSchema`] to JWT issuance and verification.
//!
//! # Pre-conditions
//! - The key matches the algorithm family (HMAC secret for `HS*`, PEM keys
//!   otherwise).
//!
//! # Post-conditions
//! - `new_token` never returns a token that would fail its own
//!   `verify_token` with the same key, algorithm and options.
//! - `verify_token` returns a claim set only when both the signature layer
//!   and the schema layer pass.
//!
//! # Invariants
//! - A codec is read-only after construction. It can be shared across
//!   threads and called concurrently.
//! - Tokens use the standard `header.payload.signature` layout.

mod at_hash;
mod key;
mod options;

pub use key::KeyMaterial;
pub use options::CryptoOptions;

use jsonwebtoken::{Algorithm, decode, encode};
use serde_json::{Map, Value};

use crate::claims::{ClaimSet, FromClaims};
use crate::error::{IssueError, SignatureError, VerifyError};
use crate::schema::ClaimSchema;

/// Algorithm used by [`TokenCodec::new`].
pub const DEFAULT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Result of verifying a token: a typed claim set or the failure class.
pub type VerificationOutcome = Result<ClaimSet, VerifyError>;

/// Issues and verifies tokens whose payload must satisfy a schema.
///
/// ```
/// use claimgate::{ClaimSchema, CryptoOptions, FieldSpec, KeyMaterial, TokenCodec};
/// use serde_json::json;
///
/// let schema = ClaimSchema::builder("MyJwt")
///     .field("foo", FieldSpec::integer())
///     .field("bar", FieldSpec::integer().ge(0).le(10))
///     .build()
///     .unwrap();
/// let codec = TokenCodec::new(schema);
/// let key = KeyMaterial::from("mykey");
/// let options = CryptoOptions::default();
///
/// let claims = json!({"foo": 1, "bar": 10});
/// let token = codec
///     .new_token(claims.as_object().unwrap(), &key, None, &options)
///     .unwrap();
/// let verified = codec.verify_token(&token, &key, None, &options).unwrap();
/// assert_eq!(verified.integer("foo").unwrap(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct TokenCodec {
    schema: ClaimSchema,
    algorithm: Algorithm,
}

impl TokenCodec {
    /// A codec using [`DEFAULT_ALGORITHM`].
    #[must_use]
    pub const fn new(schema: ClaimSchema) -> Self {
        Self::with_algorithm(schema, DEFAULT_ALGORITHM)
    }

    #[must_use]
    pub const fn with_algorithm(schema: ClaimSchema, algorithm: Algorithm) -> Self {
        Self { schema, algorithm }
    }

    #[must_use]
    pub const fn schema(&self) -> &ClaimSchema {
        &self.schema
    }

    /// The algorithm used when a call does not override it.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Validate `claims` against the schema, sign them, and check that the
    /// result verifies.
    ///
    /// The signed payload is `claims` exactly as given, including claims the
    /// schema does not declare, plus `at_hash` when the options carry an
    /// access token. `algorithm` overrides the codec default.
    ///
    /// # Errors
    /// - [`IssueError::Schema`] if the claims break the schema. No token is
    ///   produced.
    /// - [`IssueError::Signature`] if the key cannot sign with the algorithm.
    /// - [`IssueError::SelfCheck`] if the fresh token fails verification.
    pub fn new_token(
        &self,
        claims: &Map<String, Value>,
        key: &KeyMaterial,
        algorithm: Option<Algorithm>,
        options: &CryptoOptions,
    ) -> Result<String, IssueError> {
        let algorithm = algorithm.unwrap_or(self.algorithm);
        self.schema.validate(claims)?;

        let encoding_key = key.encoding_key(algorithm)?;
        let token = match &options.access_token {
            Some(access_token) => {
                let mut payload = claims.clone();
                payload.insert(
                    at_hash::AT_HASH.to_owned(),
                    Value::String(at_hash::compute(access_token, algorithm)),
                );
                encode(&options.header(algorithm), &payload, &encoding_key)
            }
            None => encode(&options.header(algorithm), claims, &encoding_key),
        }
        .map_err(map_jwt_error)?;

        if let Err(error) = self.verify_token(&token, key, Some(algorithm), options) {
            tracing::error!(
                schema = self.schema.name(),
                class = error.class(),
                "issued token failed its own verification: {error}"
            );
            return Err(IssueError::SelfCheck(error));
        }

        tracing::debug!(schema = self.schema.name(), ?algorithm, "issued token");
        Ok(token)
    }

    /// Decode and authenticate `token`, then validate its payload.
    ///
    /// `algorithm` overrides the codec default; tokens signed with any other
    /// algorithm are rejected. A checked `at_hash` is dropped before schema
    /// validation unless the schema declares it.
    pub fn verify_token(
        &self,
        token: &str,
        key: &KeyMaterial,
        algorithm: Option<Algorithm>,
        options: &CryptoOptions,
    ) -> VerificationOutcome {
        let algorithm = algorithm.unwrap_or(self.algorithm);
        let mut payload = Self::decode_payload(token, key, algorithm, options)?;
        at_hash::verify(&payload, options.access_token.as_deref(), algorithm)?;
        if self.schema.field(at_hash::AT_HASH).is_none() {
            payload.remove(at_hash::AT_HASH);
        }
        let claims = self.schema.validate(&payload)?;
        Ok(claims)
    }

    /// [`verify_token`](Self::verify_token) followed by conversion into an
    /// application type.
    pub fn verify_as<T: FromClaims>(
        &self,
        token: &str,
        key: &KeyMaterial,
        algorithm: Option<Algorithm>,
        options: &CryptoOptions,
    ) -> Result<T, VerifyError> {
        let claims = self.verify_token(token, key, algorithm, options)?;
        Ok(claims.to_typed()?)
    }

    /// The signature layer: structure, signature, algorithm and registered
    /// time claims.
    fn decode_payload(
        token: &str,
        key: &KeyMaterial,
        algorithm: Algorithm,
        options: &CryptoOptions,
    ) -> Result<Map<String, Value>, SignatureError> {
        check_segments(token)?;
        let decoding_key = key.decoding_key(algorithm)?;
        let validation = options.validation(algorithm);
        let data = decode::<Map<String, Value>>(token, &decoding_key, &validation)
            .map_err(map_jwt_error)?;
        Ok(data.claims)
    }
}

/// Check the three-segment layout before handing the token to the
/// primitive, so structural failures get a stable message.
fn check_segments(token: &str) -> Result<(), SignatureError> {
    match token.split('.').count() {
        0..=2 => Err(SignatureError::NotEnoughSegments),
        3 => Ok(()),
        _ => Err(SignatureError::TooManySegments),
    }
}

/// Maps jsonwebtoken errors to our `SignatureError` type.
#[allow(clippy::needless_pass_by_value)]
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> SignatureError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => SignatureError::InvalidSignature,
        ErrorKind::ExpiredSignature => SignatureError::Expired,
        ErrorKind::ImmatureSignature => SignatureError::Immature,
        ErrorKind::InvalidAlgorithm => SignatureError::AlgorithmNotAllowed,
        ErrorKind::InvalidAudience => SignatureError::InvalidAudience,
        ErrorKind::InvalidIssuer => SignatureError::InvalidIssuer,
        ErrorKind::InvalidSubject => SignatureError::InvalidSubject,
        ErrorKind::MissingRequiredClaim(claim) => SignatureError::MissingClaim(claim.clone()),
        ErrorKind::Base64(_) => SignatureError::InvalidEncoding,
        ErrorKind::InvalidToken | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            SignatureError::InvalidContents
        }
        ErrorKind::InvalidKeyFormat => SignatureError::InvalidKey(error.to_string()),
        _ => SignatureError::Other(error.to_string()),
    }
}
