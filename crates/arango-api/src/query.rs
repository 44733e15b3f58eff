//! AQL query builder.

use arango_filter_rs::{compile_filter, Filter};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::request::Request;

/// Variable bound to the wrapped query when a filter is applied.
pub const DEFAULT_VAR_NAME: &str = "var";

/// An AQL query sent to the cursor API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    aql: String,
    bind_vars: Map<String, Value>,
    batch_size: Option<u32>,
    cache: Option<bool>,
    filter: Option<Filter>,
    var_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CursorBody<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Map::is_empty")]
    bind_vars: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    batch_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache: Option<bool>,
}

/// Collapses whitespace runs into one space and trims.
fn normalize_whitespace(aql: &str) -> String {
    aql.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Query {
    pub fn new(aql: impl AsRef<str>) -> Self {
        Self {
            aql: normalize_whitespace(aql.as_ref()),
            ..Self::default()
        }
    }

    /// Sets a bind parameter.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bind_vars.insert(name.into(), value.into());
        self
    }

    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn cache(mut self, enable: bool) -> Self {
        self.cache = Some(enable);
        self
    }

    /// Applies a filter to the query's results.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets the variable the filter is compiled against.
    pub fn var_name(mut self, var_name: impl Into<String>) -> Self {
        self.var_name = Some(var_name.into());
        self
    }

    /// The normalized query text supplied by the caller.
    pub fn aql(&self) -> &str {
        &self.aql
    }

    pub fn bind_vars(&self) -> &Map<String, Value> {
        &self.bind_vars
    }

    /// Returns the query text with the filter applied.
    pub async fn compile(&self) -> Result<String> {
        if self.aql.is_empty() {
            return Err(Error::EmptyQuery);
        }
        let Some(filter) = &self.filter else {
            return Ok(self.aql.clone());
        };

        let var = match self.var_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_VAR_NAME,
        };
        let processed = compile_filter(var, Some(filter)).await?;
        if processed.is_empty() {
            return Ok(self.aql.clone());
        }
        Ok(format!(
            "FOR {var} IN ({}) {} RETURN {var}",
            self.aql,
            processed.to_aql()
        ))
    }

    /// Builds the cursor creation request.
    pub async fn to_request(&self) -> Result<Request> {
        let query = self.compile().await?;
        Request::create_cursor(&CursorBody {
            query: &query,
            bind_vars: &self.bind_vars,
            batch_size: self.batch_size,
            cache: self.cache,
        })
    }
}
