//! Claim schemas.
//!
//! A [`ClaimSchema`] is the declared contract for a token payload: an ordered
//! list of named fields, each with a semantic type, a required flag and value
//! constraints.
//!
//! # Pre-conditions
//! - Field names are unique within a schema.
//! - Every constraint applies to its field's type and can be satisfied.
//!
//! # Post-conditions
//! - `validate` either returns a fully typed [`ClaimSet`] or the first
//!   offending field in declaration order. Nothing partial is ever returned.
//!
//! # Invariants
//! - Schemas are immutable once built and safe to share across threads.
//! - Validation is a pure function of the schema and the raw payload.

mod definition;
mod field;

pub use definition::{FieldDefinition, SchemaDefinition};
pub use field::{ClaimType, Constraint, FieldSpec};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::claims::ClaimSet;
use crate::error::{SchemaDefinitionError, SchemaError};

/// What to do with payload claims the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownClaims {
    /// Drop them silently. Other consumers of the token may rely on them.
    #[default]
    Ignore,
    /// Fail validation on the first undeclared claim.
    Reject,
}

/// The declared contract for a token payload.
///
/// ```
/// use claimgate::{ClaimSchema, FieldSpec};
/// use serde_json::json;
///
/// let schema = ClaimSchema::builder("MyJwt")
///     .field("foo", FieldSpec::integer())
///     .field("bar", FieldSpec::integer().ge(0).le(10))
///     .build()
///     .unwrap();
///
/// let raw = json!({"foo": 1, "bar": 10});
/// let claims = schema.validate(raw.as_object().unwrap()).unwrap();
/// assert_eq!(claims.integer("bar").unwrap(), 10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSchema {
    name: String,
    fields: Vec<(String, FieldSpec)>,
    unknown_claims: UnknownClaims,
}

impl ClaimSchema {
    pub fn builder(name: impl Into<String>) -> ClaimSchemaBuilder {
        ClaimSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            unknown_claims: UnknownClaims::default(),
        }
    }

    /// Name of the schema, used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, spec)| spec)
    }

    #[must_use]
    pub const fn unknown_claims(&self) -> UnknownClaims {
        self.unknown_claims
    }

    /// Validate a raw payload into a typed claim set.
    ///
    /// Declared fields are checked in order; with [`UnknownClaims::Reject`]
    /// undeclared claims are checked afterwards in payload order.
    pub fn validate(&self, raw: &Map<String, Value>) -> Result<ClaimSet, SchemaError> {
        let mut values = Vec::with_capacity(self.fields.len());
        for (name, spec) in &self.fields {
            if let Some(value) = spec.validate(name, raw.get(name))? {
                values.push((name.clone(), value));
            }
        }

        if self.unknown_claims == UnknownClaims::Reject {
            if let Some(extra) = raw.keys().find(|key| self.field(key).is_none()) {
                return Err(SchemaError::unknown(extra));
            }
        }

        Ok(ClaimSet::from_validated(values))
    }
}

/// Builder for [`ClaimSchema`]. Declaration errors surface in [`build`].
///
/// [`build`]: ClaimSchemaBuilder::build
#[derive(Debug)]
pub struct ClaimSchemaBuilder {
    name: String,
    fields: Vec<(String, FieldSpec)>,
    unknown_claims: UnknownClaims,
}

impl ClaimSchemaBuilder {
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    #[must_use]
    pub const fn unknown_claims(mut self, policy: UnknownClaims) -> Self {
        self.unknown_claims = policy;
        self
    }

    /// Check every declaration and freeze the schema.
    pub fn build(self) -> Result<ClaimSchema, SchemaDefinitionError> {
        for (index, (name, spec)) in self.fields.iter().enumerate() {
            if self.fields[..index].iter().any(|(other, _)| other == name) {
                return Err(SchemaDefinitionError::DuplicateField(name.clone()));
            }
            spec.check_definition(name)?;
        }

        Ok(ClaimSchema {
            name: self.name,
            fields: self.fields,
            unknown_claims: self.unknown_claims,
        })
    }
}
