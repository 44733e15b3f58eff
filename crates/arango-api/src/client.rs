//! Database handle for an ArangoDB server.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arango_filter_rs::{Filter, FilterCompiler, ProcessedFilter};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::auth::{Authentication, BasicAuth, JwtAuth};
use crate::cursor::{self, CursorStream, DEFAULT_STREAM_CAPACITY};
use crate::error::{Error, Result};
use crate::logging::{LogVerbosity, Logger, LoggingTransport, NoopLogger, TracingLogger};
use crate::query::Query;
use crate::request::Request;
use crate::response::Response;
use crate::transport::{HttpTransport, Transport, DEFAULT_TIMEOUT};

/// Database used when none is configured.
pub const DEFAULT_DATABASE: &str = "_system";

struct Shared {
    url: String,
    transport: Arc<dyn Transport>,
    auth: Option<Arc<dyn Authentication>>,
    logger: Arc<dyn Logger>,
    stream_capacity: usize,
}

/// Handle to one database on an ArangoDB server.
///
/// Cloning is cheap; clones share the transport and authentication.
#[derive(Clone)]
pub struct Database {
    shared: Arc<Shared>,
    name: String,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("url", &self.shared.url)
            .field("name", &self.name)
            .field("auth", &self.shared.auth)
            .finish()
    }
}

impl Database {
    /// Starts building a handle for the server at `url`.
    pub fn builder(url: impl Into<String>) -> DatabaseBuilder {
        DatabaseBuilder::new(url)
    }

    /// Name of the targeted database.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Server URL without a trailing slash.
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    pub(crate) fn logger(&self) -> &dyn Logger {
        self.shared.logger.as_ref()
    }

    pub(crate) fn stream_capacity(&self) -> usize {
        self.shared.stream_capacity
    }

    /// Returns a handle to another database on the same server.
    pub fn switch_database(&self, name: impl Into<String>) -> Database {
        Database {
            shared: Arc::clone(&self.shared),
            name: name.into(),
        }
    }

    /// Runs the authentication setup, e.g. the JWT login.
    pub async fn connect(&self) -> Result<()> {
        match &self.shared.auth {
            Some(auth) => auth.setup(self.shared.transport.as_ref()).await,
            None => Ok(()),
        }
    }

    /// Sends a request and parses the response envelope.
    pub async fn send(&self, request: &Request) -> Result<Response> {
        let mut outgoing = request.clone();
        outgoing.path = request.resolved_path(&self.name);
        if let Some(auth) = &self.shared.auth {
            auth.apply(&mut outgoing)?;
        }

        let raw = self.shared.transport.send(&outgoing).await?;
        Response::parse(raw.status, &raw.headers, &raw.body)
    }

    /// Like [`send`](Self::send), but fails with [`Error::Canceled`] as soon as
    /// `cancel` fires. An in-flight exchange is dropped.
    pub async fn send_with_cancel(&self, request: &Request, cancel: &CancellationToken) -> Result<Response> {
        if cancel.is_cancelled() {
            return Err(Error::Canceled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Canceled),
            result = self.send(request) => result,
        }
    }

    /// Compiles a filter against this handle's conventions.
    pub async fn compile_filter(&self, var_name: &str, filter: &Filter) -> Result<ProcessedFilter> {
        Ok(FilterCompiler::new(var_name).compile(filter).await?)
    }

    /// Runs a query and returns all batches merged into one JSON array.
    pub async fn run_query(&self, query: &Query) -> Result<Vec<u8>> {
        self.run_query_with_cancel(query, CancellationToken::new()).await
    }

    pub async fn run_query_with_cancel(&self, query: &Query, cancel: CancellationToken) -> Result<Vec<u8>> {
        self.run_query_async_with_cancel(query, cancel)
            .await?
            .collect_all()
            .await
    }

    /// Runs a query and deserializes the merged result.
    pub async fn run<T: DeserializeOwned>(&self, query: &Query) -> Result<T> {
        let raw = self.run_query(query).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Runs a query and streams its batches as they arrive.
    ///
    /// Query compilation errors are returned here, before any request is sent.
    pub async fn run_query_async(&self, query: &Query) -> Result<CursorStream> {
        self.run_query_async_with_cancel(query, CancellationToken::new()).await
    }

    pub async fn run_query_async_with_cancel(
        &self,
        query: &Query,
        cancel: CancellationToken,
    ) -> Result<CursorStream> {
        let request = query.to_request().await?;
        Ok(cursor::spawn(self.clone(), request, cancel))
    }
}

enum AuthConfig {
    None,
    Basic { username: String, password: String },
    Jwt { username: String, password: String },
    Custom(Arc<dyn Authentication>),
}

/// Builder for [`Database`].
pub struct DatabaseBuilder {
    url: String,
    database: String,
    auth: AuthConfig,
    request_timeout: Duration,
    stream_capacity: usize,
    verbosity: LogVerbosity,
    logger: Option<Arc<dyn Logger>>,
    transport: Option<Arc<dyn Transport>>,
}

impl DatabaseBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: DEFAULT_DATABASE.to_string(),
            auth: AuthConfig::None,
            request_timeout: DEFAULT_TIMEOUT,
            stream_capacity: DEFAULT_STREAM_CAPACITY,
            verbosity: LogVerbosity::default(),
            logger: None,
            transport: None,
        }
    }

    pub fn database(mut self, name: impl Into<String>) -> Self {
        self.database = name.into();
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = AuthConfig::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Uses JWT authentication. [`Database::connect`] must run before the
    /// first request.
    pub fn jwt_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = AuthConfig::Jwt {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    pub fn authentication(mut self, auth: Arc<dyn Authentication>) -> Self {
        self.auth = AuthConfig::Custom(auth);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Number of pages buffered per cursor stream. Zero is treated as one.
    pub fn stream_capacity(mut self, capacity: usize) -> Self {
        self.stream_capacity = capacity.max(1);
        self
    }

    pub fn log_verbosity(mut self, verbosity: LogVerbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Sets the logger. Defaults to [`TracingLogger`].
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn without_logging(self) -> Self {
        self.logger(Arc::new(NoopLogger))
    }

    /// Replaces the HTTP transport, e.g. with a test double.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<Database> {
        let url = self.url.trim_end_matches('/').to_string();
        if self.database.is_empty() {
            return Err(Error::Config("database name is empty".to_string()));
        }

        let inner: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(url.clone(), self.request_timeout)?),
        };
        let logger = self.logger.unwrap_or_else(|| Arc::new(TracingLogger));
        let transport: Arc<dyn Transport> =
            Arc::new(LoggingTransport::new(inner, Arc::clone(&logger), self.verbosity));

        let auth: Option<Arc<dyn Authentication>> = match self.auth {
            AuthConfig::None => None,
            AuthConfig::Basic { username, password } => Some(Arc::new(BasicAuth::new(username, password))),
            AuthConfig::Jwt { username, password } => Some(Arc::new(JwtAuth::new(username, password))),
            AuthConfig::Custom(auth) => Some(auth),
        };

        Ok(Database {
            shared: Arc::new(Shared {
                url,
                transport,
                auth,
                logger,
                stream_capacity: self.stream_capacity,
            }),
            name: self.database,
        })
    }
}
