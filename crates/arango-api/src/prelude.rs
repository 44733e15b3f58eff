//! Prelude module for convenient imports.
//!
//! ```
//! use arango_api_rs::prelude::*;
//! ```

// Client types
pub use crate::client::{Database, DatabaseBuilder};

// Error types
pub use crate::error::{ApiError, Error, Result};

// Queries and streaming
pub use crate::aggregate::aggregate;
pub use crate::cursor::{CursorStream, StreamItem};
pub use crate::query::Query;

// Transport, auth and logging seams
pub use crate::auth::{Authentication, BasicAuth, JwtAuth};
pub use crate::logging::{LogRecord, LogVerbosity, Logger, NoopLogger, TracingLogger};
pub use crate::request::Request;
pub use crate::response::Response;
pub use crate::transport::{HttpTransport, RawResponse, Transport};

// Filters
pub use arango_filter_rs::{Filter, FilterError, ProcessedFilter};

pub use tokio_util::sync::CancellationToken;
