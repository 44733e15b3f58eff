//! Request authentication.

use std::fmt;
use std::sync::RwLock;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::request::{Request, AUTH_PATH};
use crate::response::Response;
use crate::transport::Transport;

/// Authenticates outgoing requests.
#[async_trait]
pub trait Authentication: Send + Sync + fmt::Debug {
    /// Runs once when the database handle connects.
    async fn setup(&self, transport: &dyn Transport) -> Result<()>;

    /// Runs on every outgoing request.
    fn apply(&self, request: &mut Request) -> Result<()>;
}

/// HTTP basic authentication.
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl Authentication for BasicAuth {
    async fn setup(&self, _transport: &dyn Transport) -> Result<()> {
        Ok(())
    }

    fn apply(&self, request: &mut Request) -> Result<()> {
        let credentials = STANDARD.encode(format!("{}:{}", self.username, self.password));
        request.set_header("Authorization", format!("Basic {credentials}"));
        Ok(())
    }
}

#[derive(Serialize)]
struct Login<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct Token {
    jwt: String,
}

/// JWT authentication: logs in on setup, then sends the token as a bearer.
pub struct JwtAuth {
    username: String,
    password: String,
    jwt: RwLock<Option<String>>,
}

impl JwtAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            jwt: RwLock::new(None),
        }
    }
}

impl fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuth")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl Authentication for JwtAuth {
    async fn setup(&self, transport: &dyn Transport) -> Result<()> {
        let request = Request::server(Method::POST, AUTH_PATH).json(&Login {
            username: &self.username,
            password: &self.password,
        })?;
        let raw = transport.send(&request).await?;
        let token: Token = Response::parse(raw.status, &raw.headers, &raw.body)?.unmarshal()?;

        let mut jwt = self
            .jwt
            .write()
            .map_err(|_| Error::Config("JWT token lock poisoned".to_string()))?;
        *jwt = Some(token.jwt);
        Ok(())
    }

    fn apply(&self, request: &mut Request) -> Result<()> {
        let jwt = self
            .jwt
            .read()
            .map_err(|_| Error::Config("JWT token lock poisoned".to_string()))?;
        let token = jwt.as_deref().ok_or_else(|| {
            Error::Config("JWT authentication is not set up, call connect() first".to_string())
        })?;
        request.set_header("Authorization", format!("bearer {token}"));
        Ok(())
    }
}
