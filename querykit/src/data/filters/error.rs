//! Filter error types
//!
//! Every variant is a caller-input error: the supplied filter was malformed.
//! Nothing here is retried or recovered internally.

use thiserror::Error;

use super::operation::Operation;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Unknown filter operation: {0}")]
    UnknownOperation(String),

    #[error(
        "Invalid key path '{key}' for {operation}: expected {expected} segment(s), found {found}"
    )]
    InvalidKeyPath {
        key: String,
        operation: Operation,
        expected: usize,
        found: usize,
    },

    #[error("Invalid date-time value '{value}': {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Missing value for {operation} on '{key}'")]
    MissingValue { key: String, operation: Operation },

    #[error("Invalid value for {operation} on '{key}': {reason}")]
    InvalidValue {
        key: String,
        operation: Operation,
        reason: String,
    },

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Cannot filter by field '{field}' on {entity}")]
    UnknownField { entity: String, field: String },

    #[error("Unknown relation '{relation}' on {entity}")]
    UnknownRelation { entity: String, relation: String },

    #[error("'{name}' on {entity} is not a collection")]
    NotACollection { entity: String, name: String },

    #[error("Invalid filter JSON: {0}")]
    InvalidJson(String),

    #[error("Filter JSON exceeds maximum size of {max} bytes")]
    TooLarge { max: usize },

    #[error("Maximum {max} criteria allowed")]
    TooMany { max: usize },
}

impl FilterError {
    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownOperation(_) => "UNKNOWN_FILTER_OPERATION",
            Self::InvalidKeyPath { .. } => "INVALID_FILTER_KEY",
            Self::InvalidDate { .. } => "INVALID_FILTER_DATE",
            Self::MissingValue { .. } | Self::InvalidValue { .. } => "INVALID_FILTER_VALUE",
            Self::UnknownEntity(_) => "UNKNOWN_FILTER_ENTITY",
            Self::UnknownField { .. } => "INVALID_FILTER_COLUMN",
            Self::UnknownRelation { .. } | Self::NotACollection { .. } => {
                "INVALID_FILTER_RELATION"
            }
            Self::InvalidJson(_) => "INVALID_FILTER_JSON",
            Self::TooLarge { .. } => "FILTER_JSON_TOO_LARGE",
            Self::TooMany { .. } => "TOO_MANY_FILTERS",
        }
    }

    /// Whether this error stems from caller input rather than a system fault.
    ///
    /// Schema lookups for an entity the caller never registered are the only
    /// errors that point at the application instead of the request.
    pub fn is_bad_request(&self) -> bool {
        !matches!(self, Self::UnknownEntity(_))
    }
}
