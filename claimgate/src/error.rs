//! Error taxonomy for issuing and verifying claim tokens.
//!
//! Verification fails in exactly one of two classes:
//! - [`SignatureError`]: the token itself is unusable (structure, signature,
//!   algorithm, registered time claims).
//! - [`SchemaError`]: the token is authentic but its payload breaks the
//!   declared claim contract.
//!
//! # Invariants
//! - Every message rendered by these types is safe to show to a client. No
//!   key material or token content is ever included.

use thiserror::Error;

/// The rule a claim violated during schema validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaRule {
    /// A required claim is absent.
    Required,
    /// The claim is present but has the wrong JSON type.
    Type,
    /// The claim has the right type but breaks a declared constraint.
    Constraint,
    /// The claim is not declared and the schema rejects unknown claims.
    Unknown,
}

impl SchemaRule {
    /// Short lowercase name of the rule.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Type => "type",
            Self::Constraint => "constraint",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SchemaRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload that does not satisfy its claim schema.
///
/// Names the first offending field (in schema declaration order) and the
/// rule it violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct SchemaError {
    field: String,
    rule: SchemaRule,
    message: String,
}

impl SchemaError {
    pub(crate) fn required(field: &str) -> Self {
        Self {
            field: field.to_owned(),
            rule: SchemaRule::Required,
            message: "field required".to_owned(),
        }
    }

    pub(crate) fn wrong_type(field: &str, expected: &str, found: &str) -> Self {
        Self {
            field: field.to_owned(),
            rule: SchemaRule::Type,
            message: format!("expected {expected}, found {found}"),
        }
    }

    pub(crate) fn constraint(field: &str, message: String) -> Self {
        Self {
            field: field.to_owned(),
            rule: SchemaRule::Constraint,
            message,
        }
    }

    pub(crate) fn unknown(field: &str) -> Self {
        Self {
            field: field.to_owned(),
            rule: SchemaRule::Unknown,
            message: "extra fields not permitted".to_owned(),
        }
    }

    /// The offending field.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The violated rule.
    #[must_use]
    pub const fn rule(&self) -> SchemaRule {
        self.rule
    }

    /// Human-readable description of the violation, without the field name.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A token that cannot be decoded or authenticated.
///
/// The messages follow the wording common to JOSE libraries so clients see
/// familiar reasons such as `Not enough segments`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Fewer than three dot-separated segments.
    #[error("Not enough segments")]
    NotEnoughSegments,
    /// More than three dot-separated segments.
    #[error("Too many segments")]
    TooManySegments,
    /// A segment is not valid base64url.
    #[error("Invalid token encoding")]
    InvalidEncoding,
    /// The header or payload is not the expected JSON structure.
    #[error("Invalid token contents")]
    InvalidContents,
    /// The signature does not match the header and payload.
    #[error("Signature verification failed.")]
    InvalidSignature,
    /// The `exp` claim is in the past.
    #[error("Signature has expired.")]
    Expired,
    /// The `nbf` claim is in the future.
    #[error("The token is not yet valid (nbf)")]
    Immature,
    /// The token's algorithm is not the configured one.
    #[error("The specified alg value is not allowed")]
    AlgorithmNotAllowed,
    /// The `aud` claim does not match.
    #[error("Invalid audience")]
    InvalidAudience,
    /// The `iss` claim does not match.
    #[error("Invalid issuer")]
    InvalidIssuer,
    /// The `sub` claim does not match.
    #[error("Invalid subject")]
    InvalidSubject,
    /// A registered claim required by the crypto options is absent.
    #[error("Token is missing the \"{0}\" claim")]
    MissingClaim(String),
    /// An access token was supplied but the token carries no `at_hash`.
    #[error("No at_hash claim in token.")]
    MissingAtHash,
    /// The token carries `at_hash` but no access token was supplied.
    #[error("No access_token provided to compare against at_hash claim.")]
    AccessTokenRequired,
    /// `at_hash` does not match the supplied access token.
    #[error("at_hash claim does not match access_token.")]
    AtHashMismatch,
    /// The key cannot be used with the requested algorithm.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// Any other failure reported by the signing primitive.
    #[error("{0}")]
    Other(String),
}

/// Why a token failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl VerifyError {
    /// The failure class, suitable as a structured log field.
    #[must_use]
    pub const fn class(&self) -> &'static str {
        match self {
            Self::Signature(_) => "signature",
            Self::Schema(_) => "schema",
        }
    }
}

/// Why a token could not be issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueError {
    /// The caller's claims break the schema. No token was produced.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The signing primitive refused the key or algorithm.
    #[error(transparent)]
    Signature(#[from] SignatureError),
    /// A freshly signed token failed its own verification. This means the
    /// schema and the codec disagree and is never caused by caller input.
    #[error("issued token failed its own verification: {0}")]
    SelfCheck(VerifyError),
}

/// A claim schema that cannot be declared as written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaDefinitionError {
    #[error("duplicate field: {0}")]
    DuplicateField(String),
    #[error("field {field}: constraint `{constraint}` does not apply to type {ty}")]
    IncompatibleConstraint {
        field: String,
        constraint: &'static str,
        ty: String,
    },
    #[error("field {field}: {reason}")]
    Unsatisfiable { field: String, reason: String },
    #[error("field {field}: invalid default value: {error}")]
    InvalidDefault { field: String, error: SchemaError },
    #[error("invalid schema definition: {0}")]
    Parse(String),
    #[error("failed to read schema definition {path}: {reason}")]
    Io { path: String, reason: String },
}

/// A gate that cannot be built from its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("invalid header name: {0:?}")]
    InvalidHeaderName(String),
}
