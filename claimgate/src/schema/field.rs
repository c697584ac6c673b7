//! Field declarations: semantic types, constraints and per-field validation.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::claims::{ClaimValue, json_kind};
use crate::error::{SchemaDefinitionError, SchemaError};

/// The semantic type of a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimType {
    /// A JSON integer that fits in an `i64`.
    Integer,
    /// Any JSON number. Integers are accepted and widened.
    Number,
    String,
    Boolean,
    /// A JSON array whose items all have the inner type.
    Array(Box<ClaimType>),
    /// Any JSON value, kept as is.
    Any,
}

impl ClaimType {
    const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Number)
    }

    const fn has_length(&self) -> bool {
        matches!(self, Self::String | Self::Array(_))
    }

    const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Number | Self::String | Self::Boolean
        )
    }

    /// Type-check a raw JSON value. Returns `None` on mismatch.
    pub(crate) fn coerce(&self, value: &Value) -> Option<ClaimValue> {
        match self {
            Self::Integer => value.as_i64().map(ClaimValue::Integer),
            Self::Number => value.as_f64().map(ClaimValue::Number),
            Self::String => value.as_str().map(|s| ClaimValue::String(s.to_owned())),
            Self::Boolean => value.as_bool().map(ClaimValue::Boolean),
            Self::Array(inner) => value
                .as_array()?
                .iter()
                .map(|item| inner.coerce(item))
                .collect::<Option<Vec<_>>>()
                .map(ClaimValue::Array),
            Self::Any => Some(ClaimValue::Json(value.clone())),
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("integer"),
            Self::Number => f.write_str("number"),
            Self::String => f.write_str("string"),
            Self::Boolean => f.write_str("boolean"),
            Self::Array(inner) => write!(f, "array<{inner}>"),
            Self::Any => f.write_str("any"),
        }
    }
}

impl FromStr for ClaimType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_prefix("array<").and_then(|rest| rest.strip_suffix('>')) {
            return Ok(Self::Array(Box::new(inner.parse()?)));
        }
        match s {
            "integer" => Ok(Self::Integer),
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            "boolean" => Ok(Self::Boolean),
            "any" => Ok(Self::Any),
            other => Err(format!("unknown claim type: {other}")),
        }
    }
}

/// A declared rule on a claim's value.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Greater than or equal.
    Ge(f64),
    /// Strictly greater than.
    Gt(f64),
    /// Less than or equal.
    Le(f64),
    /// Strictly less than.
    Lt(f64),
    /// Minimum length of a string (in characters) or array.
    MinLength(usize),
    /// Maximum length of a string (in characters) or array.
    MaxLength(usize),
    /// The value must equal one of the listed values.
    OneOf(Vec<ClaimValue>),
}

impl Constraint {
    /// Name used in definition files and error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ge(_) => "ge",
            Self::Gt(_) => "gt",
            Self::Le(_) => "le",
            Self::Lt(_) => "lt",
            Self::MinLength(_) => "min_length",
            Self::MaxLength(_) => "max_length",
            Self::OneOf(_) => "one_of",
        }
    }

    fn applies_to(&self, ty: &ClaimType) -> bool {
        match self {
            Self::Ge(_) | Self::Gt(_) | Self::Le(_) | Self::Lt(_) => ty.is_numeric(),
            Self::MinLength(_) | Self::MaxLength(_) => ty.has_length(),
            Self::OneOf(values) => {
                ty.is_scalar() && values.iter().all(|v| ty.coerce(&v.to_json()).is_some())
            }
        }
    }

    /// Check a type-correct value. The error is the violation message.
    fn check(&self, value: &ClaimValue) -> Result<(), String> {
        let ok = match self {
            Self::Ge(bound) => compare(value, *bound).is_some_and(Ordering::is_ge),
            Self::Gt(bound) => compare(value, *bound).is_some_and(Ordering::is_gt),
            Self::Le(bound) => compare(value, *bound).is_some_and(Ordering::is_le),
            Self::Lt(bound) => compare(value, *bound).is_some_and(Ordering::is_lt),
            Self::MinLength(min) => value.length().is_some_and(|len| len >= *min),
            Self::MaxLength(max) => value.length().is_some_and(|len| len <= *max),
            Self::OneOf(allowed) => allowed.iter().any(|a| a.loosely_eq(value)),
        };
        if ok {
            return Ok(());
        }
        let unit = if matches!(value, ClaimValue::Array(_)) {
            "items"
        } else {
            "characters"
        };
        Err(match self {
            Self::Ge(bound) => format!("ensure this value is greater than or equal to {bound}"),
            Self::Gt(bound) => format!("ensure this value is greater than {bound}"),
            Self::Le(bound) => format!("ensure this value is less than or equal to {bound}"),
            Self::Lt(bound) => format!("ensure this value is less than {bound}"),
            Self::MinLength(min) => format!("ensure this value has at least {min} {unit}"),
            Self::MaxLength(max) => format!("ensure this value has at most {max} {unit}"),
            Self::OneOf(allowed) => {
                let permitted: Vec<String> =
                    allowed.iter().map(|a| a.to_json().to_string()).collect();
                format!("unexpected value; permitted: {}", permitted.join(", "))
            }
        })
    }
}

/// Order a numeric claim against a bound. Integers are compared exactly,
/// without a round trip through `f64`.
fn compare(value: &ClaimValue, bound: f64) -> Option<Ordering> {
    match value {
        ClaimValue::Integer(i) => compare_integer(*i, bound),
        other => other.as_f64()?.partial_cmp(&bound),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn compare_integer(value: i64, bound: f64) -> Option<Ordering> {
    // 2^63 is exactly representable; every i64 is below it.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if bound.is_nan() {
        return None;
    }
    if bound >= LIMIT {
        return Some(Ordering::Less);
    }
    if bound < -LIMIT {
        return Some(Ordering::Greater);
    }
    let whole = bound.trunc();
    let ordering = value.cmp(&(whole as i64));
    if ordering != Ordering::Equal {
        return Some(ordering);
    }
    whole.partial_cmp(&bound)
}

/// The declaration of a single claim.
///
/// Fields are required unless marked optional or given a default.
///
/// ```
/// use claimgate::FieldSpec;
///
/// let bar = FieldSpec::integer().ge(0).le(10);
/// let role = FieldSpec::string().one_of(["reader", "writer"]).default_value("reader");
/// assert!(bar.is_required());
/// assert!(!role.is_required());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    ty: ClaimType,
    required: bool,
    default: Option<ClaimValue>,
    constraints: Vec<Constraint>,
}

impl FieldSpec {
    #[must_use]
    pub const fn new(ty: ClaimType) -> Self {
        Self {
            ty,
            required: true,
            default: None,
            constraints: Vec::new(),
        }
    }

    #[must_use]
    pub const fn integer() -> Self {
        Self::new(ClaimType::Integer)
    }

    #[must_use]
    pub const fn number() -> Self {
        Self::new(ClaimType::Number)
    }

    #[must_use]
    pub const fn string() -> Self {
        Self::new(ClaimType::String)
    }

    #[must_use]
    pub const fn boolean() -> Self {
        Self::new(ClaimType::Boolean)
    }

    #[must_use]
    pub const fn any() -> Self {
        Self::new(ClaimType::Any)
    }

    #[must_use]
    pub fn array(items: ClaimType) -> Self {
        Self::new(ClaimType::Array(Box::new(items)))
    }

    /// Allow the claim to be absent (or `null`).
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Value used when the claim is absent. Implies optional.
    ///
    /// The value is stored as the declared type would decode it, so a
    /// defaulted claim and an explicit one compare equal.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<ClaimValue>) -> Self {
        let value = value.into();
        self.required = false;
        self.default = Some(self.ty.coerce(&value.to_json()).unwrap_or(value));
        self
    }

    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn ge(self, bound: impl Into<f64>) -> Self {
        self.constraint(Constraint::Ge(bound.into()))
    }

    #[must_use]
    pub fn gt(self, bound: impl Into<f64>) -> Self {
        self.constraint(Constraint::Gt(bound.into()))
    }

    #[must_use]
    pub fn le(self, bound: impl Into<f64>) -> Self {
        self.constraint(Constraint::Le(bound.into()))
    }

    #[must_use]
    pub fn lt(self, bound: impl Into<f64>) -> Self {
        self.constraint(Constraint::Lt(bound.into()))
    }

    #[must_use]
    pub fn min_length(self, min: usize) -> Self {
        self.constraint(Constraint::MinLength(min))
    }

    #[must_use]
    pub fn max_length(self, max: usize) -> Self {
        self.constraint(Constraint::MaxLength(max))
    }

    #[must_use]
    pub fn one_of<V: Into<ClaimValue>>(self, values: impl IntoIterator<Item = V>) -> Self {
        self.constraint(Constraint::OneOf(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    #[must_use]
    pub const fn claim_type(&self) -> &ClaimType {
        &self.ty
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub const fn default(&self) -> Option<&ClaimValue> {
        self.default.as_ref()
    }

    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Check that the declaration can be satisfied by some value.
    pub(crate) fn check_definition(&self, name: &str) -> Result<(), SchemaDefinitionError> {
        for constraint in &self.constraints {
            if !constraint.applies_to(&self.ty) {
                return Err(SchemaDefinitionError::IncompatibleConstraint {
                    field: name.to_owned(),
                    constraint: constraint.name(),
                    ty: self.ty.to_string(),
                });
            }
        }
        self.check_bounds(name)?;
        self.check_lengths(name)?;

        if let Some(default) = &self.default {
            let required = Self {
                required: true,
                default: None,
                ..self.clone()
            };
            required
                .validate(name, Some(&default.to_json()))
                .map_err(|error| SchemaDefinitionError::InvalidDefault {
                    field: name.to_owned(),
                    error,
                })?;
        }
        Ok(())
    }

    fn check_bounds(&self, name: &str) -> Result<(), SchemaDefinitionError> {
        let lower = self.constraints.iter().filter_map(|c| match c {
            Constraint::Ge(b) => Some((*b, false)),
            Constraint::Gt(b) => Some((*b, true)),
            _ => None,
        });
        for (low, low_strict) in lower {
            let upper = self.constraints.iter().filter_map(|c| match c {
                Constraint::Le(b) => Some((*b, false)),
                Constraint::Lt(b) => Some((*b, true)),
                _ => None,
            });
            for (high, high_strict) in upper {
                if low > high || (low >= high && (low_strict || high_strict)) {
                    return Err(SchemaDefinitionError::Unsatisfiable {
                        field: name.to_owned(),
                        reason: format!("lower bound {low} exceeds upper bound {high}"),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_lengths(&self, name: &str) -> Result<(), SchemaDefinitionError> {
        let min = self.constraints.iter().filter_map(|c| match c {
            Constraint::MinLength(n) => Some(*n),
            _ => None,
        });
        let max = self
            .constraints
            .iter()
            .filter_map(|c| match c {
                Constraint::MaxLength(n) => Some(*n),
                _ => None,
            })
            .min();
        match (min.max(), max) {
            (Some(min), Some(max)) if min > max => Err(SchemaDefinitionError::Unsatisfiable {
                field: name.to_owned(),
                reason: format!("min_length {min} exceeds max_length {max}"),
            }),
            _ => Ok(()),
        }
    }

    /// Validate one raw claim. `Ok(None)` means an optional claim is absent
    /// and has no default.
    pub(crate) fn validate(
        &self,
        name: &str,
        raw: Option<&Value>,
    ) -> Result<Option<ClaimValue>, SchemaError> {
        let value = match raw {
            None | Some(Value::Null) if !self.required => return Ok(self.default.clone()),
            None => return Err(SchemaError::required(name)),
            Some(value) => value,
        };
        let Some(typed) = self.ty.coerce(value) else {
            if self.ty == ClaimType::Integer && value.is_u64() {
                return Err(SchemaError::constraint(
                    name,
                    "integer out of range".to_owned(),
                ));
            }
            return Err(SchemaError::wrong_type(
                name,
                &self.ty.to_string(),
                json_kind(value),
            ));
        };
        for constraint in &self.constraints {
            constraint
                .check(&typed)
                .map_err(|message| SchemaError::constraint(name, message))?;
        }
        Ok(Some(typed))
    }
}
