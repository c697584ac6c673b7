// Life of a token:
// Issuing:
//  1. Caller hands over raw claims
//  2. Claims are checked against the schema (fail fast, nothing is signed)
//  3. Claims are signed into header.payload.signature
//  4. The fresh token is verified end to end before it is returned
// Verifying:
//  1. Segment count is checked
//  2. Signature, algorithm and registered time claims are checked
//  3. The payload is checked against the schema into a typed ClaimSet
//
// System components:
//  - Claim schema (types, constraints, definition files)
//  - Token codec (schema bound to jsonwebtoken)
//  - Gate (axum middleware deciding pass or 403 per request)

pub mod claims;
pub mod codec;
pub mod config;
pub mod error;
pub mod gate;
pub mod schema;

#[cfg(test)]
mod e2e_tests;

pub use claims::{ClaimSet, ClaimValue, FromClaims};
pub use codec::{CryptoOptions, DEFAULT_ALGORITHM, KeyMaterial, TokenCodec, VerificationOutcome};
pub use error::{
    GateError, IssueError, SchemaDefinitionError, SchemaError, SchemaRule, SignatureError,
    VerifyError,
};
pub use gate::{Gate, GateConfig, GateDecision, JsonField, PlainText, RejectionResponder};
pub use jsonwebtoken::Algorithm;
pub use schema::{ClaimSchema, ClaimType, Constraint, FieldSpec, UnknownClaims};
