//! Typed claim values and validated claim sets.
//!
//! A [`ClaimSet`] can only be produced by a successful schema validation, so
//! holding one means every declared field already passed its type and
//! constraint checks.

use serde_json::{Map, Value};

use crate::error::SchemaError;

/// A single claim value after type checking.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimValue {
    Integer(i64),
    Number(f64),
    String(String),
    Boolean(bool),
    Array(Vec<ClaimValue>),
    /// Arbitrary JSON, for fields declared as `any`.
    Json(Value),
}

impl ClaimValue {
    /// Name of the value's type as used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Array(_) => "array",
            Self::Json(value) => json_kind(value),
        }
    }

    /// Render the value back to JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Integer(i) => Value::from(*i),
            Self::Number(n) => Value::from(*n),
            Self::String(s) => Value::String(s.clone()),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Json(value) => value.clone(),
        }
    }

    /// Best-effort conversion of untyped JSON, used for declared literals
    /// such as `one_of` lists.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Self::Boolean(*b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Self::Integer(i),
                (None, Some(f)) => Self::Number(f),
                (None, None) => Self::Json(value.clone()),
            },
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Value::Null | Value::Object(_) => Self::Json(value.clone()),
        }
    }

    /// Equality that treats `Integer(1)` and `Number(1.0)` as the same value.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn loosely_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Number(b)) | (Self::Number(b), Self::Integer(a)) => {
                *a as f64 == *b
            }
            (Self::Array(a), Self::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_eq(y))
            }
            _ => self == other,
        }
    }

    /// Numeric view of the value, if it is a number.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Length of a string (in characters) or array.
    #[must_use]
    pub fn length(&self) -> Option<usize> {
        match self {
            Self::String(s) => Some(s.chars().count()),
            Self::Array(items) => Some(items.len()),
            _ => None,
        }
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ClaimValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ClaimValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ClaimValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Name of a raw JSON value's type as used in error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_f64() {
                "number"
            } else {
                "integer"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A validated set of claims, in schema declaration order.
///
/// Equality ignores order. Claims the schema does not declare are not kept.
#[derive(Debug, Clone, Default)]
pub struct ClaimSet {
    values: Vec<(String, ClaimValue)>,
}

impl ClaimSet {
    /// Only the schema validator builds claim sets.
    pub(crate) const fn from_validated(values: Vec<(String, ClaimValue)>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClaimValue> {
        self.values
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClaimValue)> {
        self.values.iter().map(|(field, value)| (field.as_str(), value))
    }

    /// Read an integer claim.
    pub fn integer(&self, name: &str) -> Result<i64, SchemaError> {
        match self.require(name)? {
            ClaimValue::Integer(i) => Ok(*i),
            other => Err(SchemaError::wrong_type(name, "integer", other.kind())),
        }
    }

    /// Read a numeric claim. Integer claims are widened.
    pub fn number(&self, name: &str) -> Result<f64, SchemaError> {
        let value = self.require(name)?;
        value
            .as_f64()
            .ok_or_else(|| SchemaError::wrong_type(name, "number", value.kind()))
    }

    /// Read a string claim.
    pub fn string(&self, name: &str) -> Result<&str, SchemaError> {
        match self.require(name)? {
            ClaimValue::String(s) => Ok(s),
            other => Err(SchemaError::wrong_type(name, "string", other.kind())),
        }
    }

    /// Read a boolean claim.
    pub fn boolean(&self, name: &str) -> Result<bool, SchemaError> {
        match self.require(name)? {
            ClaimValue::Boolean(b) => Ok(*b),
            other => Err(SchemaError::wrong_type(name, "boolean", other.kind())),
        }
    }

    /// Render the claim set as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(field, value)| (field.clone(), value.to_json()))
            .collect()
    }

    /// Convert into an application type.
    pub fn to_typed<T: FromClaims>(&self) -> Result<T, SchemaError> {
        T::from_claims(self)
    }

    fn require(&self, name: &str) -> Result<&ClaimValue, SchemaError> {
        self.get(name).ok_or_else(|| SchemaError::required(name))
    }
}

impl PartialEq for ClaimSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(field, value)| other.get(field) == Some(value))
    }
}

/// Explicit conversion from a validated claim set into an application type.
///
/// Implementations read each field with the typed accessors on [`ClaimSet`],
/// so every failure names the field it came from.
///
/// ```
/// use claimgate::{ClaimSet, FromClaims, SchemaError};
///
/// struct Session {
///     user_id: i64,
/// }
///
/// impl FromClaims for Session {
///     fn from_claims(claims: &ClaimSet) -> Result<Self, SchemaError> {
///         Ok(Self {
///             user_id: claims.integer("user_id")?,
///         })
///     }
/// }
/// ```
pub trait FromClaims: Sized {
    fn from_claims(claims: &ClaimSet) -> Result<Self, SchemaError>;
}

impl FromClaims for ClaimSet {
    fn from_claims(claims: &ClaimSet) -> Result<Self, SchemaError> {
        Ok(claims.clone())
    }
}
