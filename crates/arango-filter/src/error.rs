//! Error types for filter construction and compilation.

use thiserror::Error;

/// A specialized Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while building or compiling a filter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The filter document is not valid JSON or does not have the filter shape.
    #[error("invalid filter JSON: {message}")]
    InvalidJson {
        /// Parser message.
        message: String,
    },

    /// Offset or limit is negative.
    #[error("invalid {name}: {value} (must be >= 0)")]
    InvalidRange {
        /// Either `offset` or `limit`.
        name: &'static str,
        /// The rejected value.
        value: i64,
    },

    /// A sort entry does not follow the `field [ASC|DESC]` grammar.
    #[error("invalid sort filter: {entry}")]
    InvalidSort {
        /// The rejected sort entry.
        entry: String,
    },

    /// A filter contains a reserved AQL statement keyword.
    #[error("forbidden AQL operator detected: {keyword}")]
    ForbiddenKeyword {
        /// The reserved word that matched.
        keyword: String,
    },

    /// A condition value has a type that cannot be rendered.
    #[error("unsupported value type: {found}")]
    UnsupportedType {
        /// Description of the offending value.
        found: String,
    },

    /// An `and`/`or`/`not` operand is not a condition object.
    #[error("invalid {combinator} condition: {reason}")]
    InvalidCombinatorOperand {
        /// The combinator keyword.
        combinator: String,
        /// What was wrong with the operand.
        reason: String,
    },

    /// A function condition (`like`) is missing or has malformed arguments.
    #[error("invalid {function} arguments: {reason}")]
    InvalidFunctionArguments {
        /// The function keyword.
        function: String,
        /// What was wrong with the arguments.
        reason: String,
    },

    /// A field name is not a plain attribute path.
    #[error("invalid field name: {field}")]
    InvalidField {
        /// The rejected field name.
        field: String,
    },
}

impl FilterError {
    /// Creates an unsupported type error.
    pub fn unsupported_type(found: impl Into<String>) -> Self {
        FilterError::UnsupportedType {
            found: found.into(),
        }
    }

    /// Creates an invalid combinator operand error.
    pub fn invalid_operand(combinator: impl Into<String>, reason: impl Into<String>) -> Self {
        FilterError::InvalidCombinatorOperand {
            combinator: combinator.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid function arguments error.
    pub fn invalid_arguments(function: impl Into<String>, reason: impl Into<String>) -> Self {
        FilterError::InvalidFunctionArguments {
            function: function.into(),
            reason: reason.into(),
        }
    }

    /// Creates a forbidden keyword error.
    pub fn forbidden_keyword(keyword: impl Into<String>) -> Self {
        FilterError::ForbiddenKeyword {
            keyword: keyword.into(),
        }
    }
}

impl From<serde_json::Error> for FilterError {
    fn from(err: serde_json::Error) -> Self {
        FilterError::InvalidJson {
            message: err.to_string(),
        }
    }
}
