//! Outgoing request description.

use reqwest::Method;
use serde::Serialize;

use crate::error::Result;

/// Path of the AQL cursor API, relative to the database.
pub const CURSOR_PATH: &str = "/_api/cursor";

/// Path of the JWT login endpoint, relative to the server root.
pub const AUTH_PATH: &str = "/_open/auth";

/// Which URL prefix a request path is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `<url>/_db/<database><path>`
    Database,
    /// `<url><path>`
    Server,
}

/// A single HTTP request to the database.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub scope: Scope,
    pub body: Option<Vec<u8>>,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Creates a database-scoped request with no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            scope: Scope::Database,
            body: None,
            headers: Vec::new(),
        }
    }

    /// Creates a request resolved against the server root.
    pub fn server(method: Method, path: impl Into<String>) -> Self {
        Self {
            scope: Scope::Server,
            ..Self::new(method, path)
        }
    }

    /// Starts a query on the cursor API.
    pub fn create_cursor<B: Serialize>(body: &B) -> Result<Self> {
        Self::new(Method::POST, CURSOR_PATH).json(body)
    }

    /// Fetches the next batch of an open cursor.
    pub fn follow_cursor(id: &str) -> Self {
        Self::new(Method::PUT, format!("{CURSOR_PATH}/{id}"))
    }

    /// Releases an open cursor on the server.
    pub fn delete_cursor(id: &str) -> Self {
        Self::new(Method::DELETE, format!("{CURSOR_PATH}/{id}"))
    }

    /// Sets a JSON body.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Adds a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Sets a header, replacing any existing value with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Returns the value of a header, matched case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the path relative to the server URL.
    pub fn resolved_path(&self, database: &str) -> String {
        match self.scope {
            Scope::Database => format!("/_db/{}{}", database, self.path),
            Scope::Server => self.path.clone(),
        }
    }
}
