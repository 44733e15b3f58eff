//! Error types for the ArangoDB client.

use arango_filter_rs::FilterError;

/// ArangoDB error numbers with a dedicated predicate.
pub mod error_num {
    /// `ERROR_ARANGO_DOCUMENT_NOT_FOUND`.
    pub const DOCUMENT_NOT_FOUND: i64 = 1202;
    /// `ERROR_ARANGO_DATA_SOURCE_NOT_FOUND`.
    pub const COLLECTION_NOT_FOUND: i64 = 1203;
    /// `ERROR_ARANGO_DUPLICATE_NAME`.
    pub const DUPLICATE_NAME: i64 = 1207;
    /// `ERROR_ARANGO_UNIQUE_CONSTRAINT_VIOLATED`.
    pub const UNIQUE_CONSTRAINT_VIOLATED: i64 = 1210;
}

/// A failure reported by the database.
///
/// Carries the envelope's `errorNum` and the HTTP status independently; either
/// or both may be present.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    /// Message from the envelope, the body, or the status reason.
    pub message: String,
    /// `errorNum` from the response envelope.
    pub error_num: Option<i64>,
    /// HTTP status code, attached when outside 200-299.
    pub status_code: Option<u16>,
}

impl ApiError {
    /// Creates an error with neither annotation.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_num: None,
            status_code: None,
        }
    }

    /// Attaches an `errorNum`.
    pub fn with_error_num(mut self, error_num: i64) -> Self {
        self.error_num = Some(error_num);
        self
    }

    /// Attaches an HTTP status code.
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    fn message_contains(&self, needle: &str) -> bool {
        self.message.to_lowercase().contains(needle)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self.error_num,
            Some(error_num::DOCUMENT_NOT_FOUND | error_num::COLLECTION_NOT_FOUND)
        ) || self.status_code == Some(404)
            || self.message_contains("not found")
            || self.message_contains("unknown collection")
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code == Some(401)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status_code == Some(403)
    }

    pub fn is_bad_request(&self) -> bool {
        self.status_code == Some(400)
    }

    pub fn is_unique_violation(&self) -> bool {
        self.error_num == Some(error_num::UNIQUE_CONSTRAINT_VIOLATED)
            || self.message_contains("unique constraint violated")
    }

    pub fn is_duplicate_name(&self) -> bool {
        self.error_num == Some(error_num::DUPLICATE_NAME) || self.message_contains("duplicate name")
    }
}

/// Errors that can occur when talking to the database.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP exchange itself failed.
    #[error("the database HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A non-reqwest transport failed.
    #[error("the database transport failed: {0}")]
    Transport(String),

    /// The response envelope could not be decoded.
    #[error("could not decode the database response: {message}")]
    Decode { message: String },

    /// The database returned a logical error, a non-2xx status, or both.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The filter could not be compiled.
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// The request was canceled by the caller.
    #[error("the request was canceled")]
    Canceled,

    /// The query text is empty.
    #[error("nil or empty query")]
    EmptyQuery,

    /// The cursor producer stopped without a terminal item.
    #[error("the cursor stream ended unexpectedly")]
    StreamInterrupted,

    /// Client configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode {
            message: err.to_string(),
        }
    }
}

impl Error {
    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode {
            message: message.into(),
        }
    }

    /// Returns the database error, if any.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the HTTP status code this error was annotated with.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api(e) => e.status_code,
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns the `errorNum` this error was annotated with.
    pub fn error_num(&self) -> Option<i64> {
        self.as_api_error().and_then(|e| e.error_num)
    }

    pub fn has_status_code(&self, status_code: u16) -> bool {
        self.status_code() == Some(status_code)
    }

    pub fn has_error_num(&self, error_num: i64) -> bool {
        self.error_num() == Some(error_num)
    }

    /// True for errorNum 1202/1203, status 404, or a "not found" message.
    pub fn is_not_found(&self) -> bool {
        self.as_api_error().is_some_and(ApiError::is_not_found)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.as_api_error().is_some_and(ApiError::is_unauthorized)
    }

    pub fn is_forbidden(&self) -> bool {
        self.as_api_error().is_some_and(ApiError::is_forbidden)
    }

    pub fn is_bad_request(&self) -> bool {
        self.as_api_error().is_some_and(ApiError::is_bad_request)
    }

    pub fn is_unique_violation(&self) -> bool {
        self.as_api_error().is_some_and(ApiError::is_unique_violation)
    }

    pub fn is_duplicate_name(&self) -> bool {
        self.as_api_error().is_some_and(ApiError::is_duplicate_name)
    }

    /// Returns the appropriate CLI exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Filter(_) | Error::EmptyQuery => 1,
            Error::Api(_) | Error::Decode { .. } => 2,
            Error::Http(_) | Error::Transport(_) | Error::StreamInterrupted => 3,
            Error::Canceled => 4,
            Error::Config(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotated(error_num: Option<i64>, status_code: Option<u16>) -> Error {
        Error::Api(ApiError {
            message: "Error message".to_string(),
            error_num,
            status_code,
        })
    }

    #[test]
    fn test_both_annotations_are_queryable() {
        let err = annotated(Some(1207), Some(409));
        assert_eq!(err.status_code(), Some(409));
        assert_eq!(err.error_num(), Some(1207));
        assert!(err.has_status_code(409));
        assert!(err.has_error_num(1207));
        assert!(err.is_duplicate_name());
    }

    #[test]
    fn test_is_bad_request() {
        assert!(annotated(None, Some(400)).is_bad_request());
        assert!(!annotated(None, Some(401)).is_bad_request());
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(annotated(None, Some(401)).is_unauthorized());
    }

    #[test]
    fn test_is_not_found_by_error_num_or_status() {
        let err = annotated(Some(1202), Some(403));
        assert!(err.is_not_found());
        assert!(err.is_forbidden());

        assert!(annotated(Some(1203), None).is_not_found());
        assert!(annotated(None, Some(404)).is_not_found());
        assert!(!annotated(None, Some(500)).is_not_found());
    }

    #[test]
    fn test_is_unique_violation() {
        assert!(annotated(Some(1210), Some(403)).is_unique_violation());
        assert!(!annotated(Some(1202), Some(403)).is_unique_violation());
    }

    #[test]
    fn test_message_fallbacks() {
        let err = Error::Api(ApiError::new("collection or view not found"));
        assert!(err.is_not_found());

        let err = Error::Api(ApiError::new("unknown collection 'users'"));
        assert!(err.is_not_found());

        let err = Error::Api(ApiError::new("unique constraint violated - in index primary"));
        assert!(err.is_unique_violation());

        let err = Error::Api(ApiError::new("duplicate name"));
        assert!(err.is_duplicate_name());
    }

    #[test]
    fn test_predicates_false_for_non_api_errors() {
        let err = Error::Canceled;
        assert!(!err.is_not_found());
        assert_eq!(err.status_code(), None);
        assert_eq!(err.error_num(), None);
    }

    #[test]
    fn test_api_error_display_is_message() {
        let err = Error::Api(ApiError::new("ERROR !").with_error_num(1));
        assert_eq!(err.to_string(), "ERROR !");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::EmptyQuery.exit_code(), 1);
        assert_eq!(annotated(None, Some(500)).exit_code(), 2);
        assert_eq!(Error::Transport("down".into()).exit_code(), 3);
        assert_eq!(Error::Canceled.exit_code(), 4);
        assert_eq!(Error::Config("bad".into()).exit_code(), 5);
    }
}
