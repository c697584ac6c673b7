//! Declarative schema definitions loaded from JSON.
//!
//! ```json
//! {
//!   "name": "MyJwt",
//!   "unknown_claims": "ignore",
//!   "fields": [
//!     { "name": "foo", "type": "integer" },
//!     { "name": "bar", "type": "integer", "ge": 0, "le": 10 },
//!     { "name": "roles", "type": "array<string>", "required": false }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::{ClaimSchema, ClaimType, Constraint, FieldSpec, UnknownClaims};
use crate::claims::ClaimValue;
use crate::error::{SchemaDefinitionError, SchemaError};

/// A schema as written in a definition file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDefinition {
    pub name: String,
    #[serde(default)]
    pub unknown_claims: UnknownClaims,
    pub fields: Vec<FieldDefinition>,
}

/// A single field as written in a definition file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    pub ge: Option<f64>,
    pub gt: Option<f64>,
    pub le: Option<f64>,
    pub lt: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub one_of: Option<Vec<Value>>,
}

const fn default_required() -> bool {
    true
}

impl SchemaDefinition {
    pub fn from_json_str(json: &str) -> Result<Self, SchemaDefinitionError> {
        serde_json::from_str(json).map_err(|e| SchemaDefinitionError::Parse(e.to_string()))
    }
}

impl FieldDefinition {
    fn into_spec(self) -> Result<(String, FieldSpec), SchemaDefinitionError> {
        let ty: ClaimType = self.ty.parse().map_err(SchemaDefinitionError::Parse)?;

        let mut spec = FieldSpec::new(ty.clone());
        if !self.required {
            spec = spec.optional();
        }
        let bounds = [
            self.ge.map(Constraint::Ge),
            self.gt.map(Constraint::Gt),
            self.le.map(Constraint::Le),
            self.lt.map(Constraint::Lt),
            self.min_length.map(Constraint::MinLength),
            self.max_length.map(Constraint::MaxLength),
            self.one_of
                .map(|values| Constraint::OneOf(values.iter().map(ClaimValue::from_json).collect())),
        ];
        for constraint in bounds.into_iter().flatten() {
            spec = spec.constraint(constraint);
        }

        if let Some(default) = self.default {
            let typed = ty.coerce(&default).ok_or_else(|| SchemaDefinitionError::InvalidDefault {
                field: self.name.clone(),
                error: SchemaError::wrong_type(
                    &self.name,
                    &ty.to_string(),
                    crate::claims::json_kind(&default),
                ),
            })?;
            spec = spec.default_value(typed);
        }

        Ok((self.name, spec))
    }
}

impl TryFrom<SchemaDefinition> for ClaimSchema {
    type Error = SchemaDefinitionError;

    fn try_from(definition: SchemaDefinition) -> Result<Self, Self::Error> {
        let mut builder =
            Self::builder(definition.name).unknown_claims(definition.unknown_claims);
        for field in definition.fields {
            let (name, spec) = field.into_spec()?;
            builder = builder.field(name, spec);
        }
        builder.build()
    }
}

impl ClaimSchema {
    /// Parse and check a JSON schema definition.
    pub fn from_json_str(json: &str) -> Result<Self, SchemaDefinitionError> {
        SchemaDefinition::from_json_str(json)?.try_into()
    }

    /// Load a JSON schema definition from disk.
    pub fn load(path: &Path) -> Result<Self, SchemaDefinitionError> {
        let json = std::fs::read_to_string(path).map_err(|e| SchemaDefinitionError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }
}
