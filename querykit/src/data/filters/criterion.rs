//! Criterion value types
//!
//! A criterion is leaf data: a field path, an operation tag and a value.
//! It is never mutated after construction and holds no query state.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use super::error::FilterError;
use super::operation::Operation;

/// Minute-precision fallback accepted alongside the full ISO-8601 local form
const DATETIME_MINUTES_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// A single typed value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Scalar {
    /// String form of the value, used by ordering and pattern operations
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Interpret the value as an ISO-8601 local date-time
    pub fn to_datetime(&self) -> Result<NaiveDateTime, FilterError> {
        match self {
            Self::DateTime(dt) => Ok(*dt),
            other => parse_datetime(&other.to_text()),
        }
    }

    fn from_json(value: serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::String(s) => Ok(Self::Text(s)),
            serde_json::Value::Bool(b) => Ok(Self::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Integer(i))
                } else {
                    n.as_f64()
                        .map(Self::Float)
                        .ok_or_else(|| format!("unsupported number: {}", n))
                }
            }
            other => Err(format!("expected a scalar, got {}", other)),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(b) => write!(f, "{}", b),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

/// Parse an ISO-8601 local date-time (`2024-01-01T00:00:00`, optional fraction)
pub fn parse_datetime(text: &str) -> Result<NaiveDateTime, FilterError> {
    let text = text.trim();
    text.parse::<NaiveDateTime>().or_else(|source| {
        NaiveDateTime::parse_from_str(text, DATETIME_MINUTES_FORMAT).map_err(|_| {
            FilterError::InvalidDate {
                value: text.to_string(),
                source,
            }
        })
    })
}

/// Criterion payload: nothing, a single scalar, or a list of scalars
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CriterionValue {
    #[default]
    Absent,
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl CriterionValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    fn from_json(value: serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::Null => Ok(Self::Absent),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Scalar::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            other => Scalar::from_json(other).map(Self::Scalar),
        }
    }
}

impl<'de> Deserialize<'de> for CriterionValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(value).map_err(serde::de::Error::custom)
    }
}

macro_rules! scalar_value_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for CriterionValue {
                fn from(value: $ty) -> Self {
                    Self::Scalar(value.into())
                }
            }
        )*
    };
}

scalar_value_from!(Scalar, &str, String, i64, f64, bool, NaiveDateTime);

impl<T: Into<Scalar>> From<Vec<T>> for CriterionValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Wire form of a criterion before the operation tag is resolved
#[derive(Debug, Clone, Deserialize)]
pub struct RawCriterion {
    pub key: String,
    #[serde(alias = "operation")]
    pub operator: String,
    #[serde(default)]
    pub value: CriterionValue,
}

/// A single filter condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCriterion")]
pub struct Criterion {
    key: String,
    operator: Operation,
    #[serde(skip_serializing_if = "CriterionValue::is_absent")]
    value: CriterionValue,
}

impl Criterion {
    pub fn new(
        key: impl Into<String>,
        operator: Operation,
        value: impl Into<CriterionValue>,
    ) -> Self {
        Self {
            key: key.into(),
            operator,
            value: value.into(),
        }
    }

    /// Criterion for operations that ignore the value (null and emptiness checks)
    pub fn without_value(key: impl Into<String>, operator: Operation) -> Self {
        Self {
            key: key.into(),
            operator,
            value: CriterionValue::Absent,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> Operation {
        self.operator
    }

    pub fn value(&self) -> &CriterionValue {
        &self.value
    }

    /// The single scalar value, failing for absent values and lists
    pub fn scalar(&self) -> Result<&Scalar, FilterError> {
        match &self.value {
            CriterionValue::Scalar(s) => Ok(s),
            CriterionValue::Absent => Err(FilterError::MissingValue {
                key: self.key.clone(),
                operation: self.operator,
            }),
            CriterionValue::List(_) => {
                Err(self.invalid_value("expected a single value, got a list"))
            }
        }
    }

    /// The value as a list; a single scalar is treated as a one-element list
    pub fn list(&self) -> Result<Vec<Scalar>, FilterError> {
        match &self.value {
            CriterionValue::List(items) => Ok(items.clone()),
            CriterionValue::Scalar(s) => Ok(vec![s.clone()]),
            CriterionValue::Absent => Err(FilterError::MissingValue {
                key: self.key.clone(),
                operation: self.operator,
            }),
        }
    }

    pub(crate) fn invalid_value(&self, reason: impl Into<String>) -> FilterError {
        FilterError::InvalidValue {
            key: self.key.clone(),
            operation: self.operator,
            reason: reason.into(),
        }
    }
}

impl TryFrom<RawCriterion> for Criterion {
    type Error = FilterError;

    fn try_from(raw: RawCriterion) -> Result<Self, Self::Error> {
        let operator = raw.operator.parse::<Operation>()?;
        Ok(Self {
            key: raw.key,
            operator,
            value: raw.value,
        })
    }
}
