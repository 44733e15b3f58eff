//! Exchange logging.
//!
//! Components that log receive a [`Logger`] explicitly. [`LoggingTransport`]
//! wraps any [`Transport`] and reports every exchange through it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::request::Request;
use crate::transport::{RawResponse, Transport};

/// How much of each exchange gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogVerbosity {
    /// Method, path, outcome and elapsed time.
    #[default]
    Summary,
    /// Summary plus request and response bodies.
    Debug,
}

impl FromStr for LogVerbosity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "summary" => Ok(LogVerbosity::Summary),
            "debug" => Ok(LogVerbosity::Debug),
            other => Err(Error::Config(format!(
                "unknown log verbosity '{other}', expected 'summary' or 'debug'"
            ))),
        }
    }
}

impl fmt::Display for LogVerbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogVerbosity::Summary => f.write_str("summary"),
            LogVerbosity::Debug => f.write_str("debug"),
        }
    }
}

/// Something worth logging.
#[derive(Debug)]
pub enum LogRecord<'a> {
    /// A request is about to be sent. `body` is set only at debug verbosity.
    Request {
        method: &'a Method,
        path: &'a str,
        body: Option<&'a [u8]>,
    },
    /// The exchange succeeded. `body` is set only at debug verbosity.
    Success {
        method: &'a Method,
        path: &'a str,
        status: u16,
        elapsed: Duration,
        body: Option<&'a [u8]>,
    },
    /// The server answered with an error envelope.
    DatabaseError {
        method: &'a Method,
        path: &'a str,
        status: u16,
        message: &'a str,
        elapsed: Duration,
    },
    /// The request never got an answer.
    SendError {
        method: &'a Method,
        path: &'a str,
        error: &'a Error,
        elapsed: Duration,
    },
    /// A cursor stream finished.
    StreamFinished {
        pages: usize,
        elapsed: Duration,
        error: Option<&'a Error>,
    },
}

/// Receives log records.
pub trait Logger: Send + Sync + fmt::Debug {
    fn log(&self, record: &LogRecord<'_>);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _record: &LogRecord<'_>) {}
}

/// Forwards records to `tracing` events under the `arango` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

fn pretty_body(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned())
}

impl Logger for TracingLogger {
    fn log(&self, record: &LogRecord<'_>) {
        match record {
            LogRecord::Request { method, path, body } => match body {
                Some(body) => tracing::debug!(
                    target: "arango",
                    %method,
                    path,
                    body = %pretty_body(body),
                    "request"
                ),
                None => tracing::debug!(target: "arango", %method, path, "request"),
            },
            LogRecord::Success {
                method,
                path,
                status,
                elapsed,
                body,
            } => match body {
                Some(body) => tracing::info!(
                    target: "arango",
                    %method,
                    path,
                    status,
                    ?elapsed,
                    body = %pretty_body(body),
                    "success"
                ),
                None => tracing::info!(target: "arango", %method, path, status, ?elapsed, "success"),
            },
            LogRecord::DatabaseError {
                method,
                path,
                status,
                message,
                elapsed,
            } => tracing::warn!(
                target: "arango",
                %method,
                path,
                status,
                ?elapsed,
                message,
                "database error"
            ),
            LogRecord::SendError {
                method,
                path,
                error,
                elapsed,
            } => tracing::warn!(
                target: "arango",
                %method,
                path,
                ?elapsed,
                error = %error,
                "send error"
            ),
            LogRecord::StreamFinished {
                pages,
                elapsed,
                error,
            } => match error {
                Some(error) => tracing::warn!(
                    target: "arango",
                    pages,
                    ?elapsed,
                    error = %error,
                    "cursor stream failed"
                ),
                None => tracing::info!(target: "arango", pages, ?elapsed, "cursor stream finished"),
            },
        }
    }
}

#[derive(Deserialize)]
struct ErrorPeek {
    #[serde(default)]
    error: bool,
    #[serde(default, rename = "errorMessage")]
    error_message: String,
}

fn database_error_message(response: &RawResponse) -> Option<String> {
    let body = response.body.trim_ascii_start();
    if body.first() != Some(&b'{') {
        return None;
    }
    serde_json::from_slice::<ErrorPeek>(body)
        .ok()
        .filter(|peek| peek.error)
        .map(|peek| peek.error_message)
}

/// A transport that logs every exchange.
#[derive(Debug, Clone)]
pub struct LoggingTransport {
    inner: Arc<dyn Transport>,
    logger: Arc<dyn Logger>,
    verbosity: LogVerbosity,
}

impl LoggingTransport {
    pub fn new(inner: Arc<dyn Transport>, logger: Arc<dyn Logger>, verbosity: LogVerbosity) -> Self {
        Self {
            inner,
            logger,
            verbosity,
        }
    }

    fn debug(&self) -> bool {
        self.verbosity == LogVerbosity::Debug
    }
}

#[async_trait]
impl Transport for LoggingTransport {
    async fn send(&self, request: &Request) -> Result<RawResponse> {
        let method = &request.method;
        let path = request.path.as_str();
        self.logger.log(&LogRecord::Request {
            method,
            path,
            body: request.body.as_deref().filter(|_| self.debug()),
        });

        let start = Instant::now();
        let result = self.inner.send(request).await;
        let elapsed = start.elapsed();

        match &result {
            Err(error) => self.logger.log(&LogRecord::SendError {
                method,
                path,
                error,
                elapsed,
            }),
            Ok(response) => match database_error_message(response) {
                Some(message) => self.logger.log(&LogRecord::DatabaseError {
                    method,
                    path,
                    status: response.status,
                    message: &message,
                    elapsed,
                }),
                None => self.logger.log(&LogRecord::Success {
                    method,
                    path,
                    status: response.status,
                    elapsed,
                    body: Some(response.body.as_slice()).filter(|_| self.debug()),
                }),
            },
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingLogger {
        lines: Mutex<Vec<String>>,
    }

    impl Logger for RecordingLogger {
        fn log(&self, record: &LogRecord<'_>) {
            let line = match record {
                LogRecord::Request { method, path, body } => {
                    format!("request {method} {path} body={}", body.is_some())
                }
                LogRecord::Success { status, body, .. } => {
                    format!("success {status} body={}", body.is_some())
                }
                LogRecord::DatabaseError { message, .. } => format!("database error {message}"),
                LogRecord::SendError { error, .. } => format!("send error {error}"),
                LogRecord::StreamFinished { pages, .. } => format!("stream {pages}"),
            };
            self.lines.lock().unwrap().push(line);
        }
    }

    #[derive(Debug)]
    struct CannedTransport(Option<&'static str>);

    #[async_trait]
    impl Transport for CannedTransport {
        async fn send(&self, _request: &Request) -> Result<RawResponse> {
            match self.0 {
                Some(body) => Ok(RawResponse {
                    status: 200,
                    body: body.as_bytes().to_vec(),
                    ..RawResponse::default()
                }),
                None => Err(Error::Transport("connection refused".to_string())),
            }
        }
    }

    async fn logged(body: Option<&'static str>, verbosity: LogVerbosity) -> Vec<String> {
        let logger = Arc::new(RecordingLogger::default());
        let transport = LoggingTransport::new(Arc::new(CannedTransport(body)), logger.clone(), verbosity);
        let request = Request::new(Method::POST, "/_db/test/_api/cursor").body(b"{}".to_vec());
        let _ = transport.send(&request).await;
        let lines = logger.lines.lock().unwrap().clone();
        lines
    }

    #[tokio::test]
    async fn test_summary_omits_bodies() {
        let lines = logged(Some(r#"{"result":[]}"#), LogVerbosity::Summary).await;
        assert_eq!(
            lines,
            vec![
                "request POST /_db/test/_api/cursor body=false",
                "success 200 body=false"
            ]
        );
    }

    #[tokio::test]
    async fn test_debug_includes_bodies() {
        let lines = logged(Some(r#"{"result":[]}"#), LogVerbosity::Debug).await;
        assert_eq!(
            lines,
            vec![
                "request POST /_db/test/_api/cursor body=true",
                "success 200 body=true"
            ]
        );
    }

    #[tokio::test]
    async fn test_database_error_is_reported() {
        let lines = logged(
            Some(r#"{"error":true,"errorMessage":"ERROR !"}"#),
            LogVerbosity::Summary,
        )
        .await;
        assert_eq!(lines[1], "database error ERROR !");
    }

    #[tokio::test]
    async fn test_send_error_is_reported() {
        let lines = logged(None, LogVerbosity::Summary).await;
        assert_eq!(lines[1], "send error the database transport failed: connection refused");
    }

    #[test]
    fn test_verbosity_from_str() {
        assert_eq!("DEBUG".parse::<LogVerbosity>().unwrap(), LogVerbosity::Debug);
        assert_eq!("summary".parse::<LogVerbosity>().unwrap(), LogVerbosity::Summary);
        assert!("loud".parse::<LogVerbosity>().is_err());
    }

    #[test]
    fn test_pretty_body_falls_back_to_text() {
        assert_eq!(pretty_body(b"not json"), "not json");
        assert_eq!(pretty_body(br#"{"a":1}"#), "{\n  \"a\": 1\n}");
    }
}
