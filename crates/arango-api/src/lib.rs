//! ArangoDB HTTP client library
//!
//! Builds AQL cursor requests (optionally narrowed by a portable
//! [`Filter`](arango_filter_rs::Filter)), streams multi-batch results and
//! merges them into a single JSON array.
//!
//! # Quick Start
//!
//! ```no_run
//! use arango_api_rs::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let db = Database::builder("http://localhost:8529")
//!     .database("shop")
//!     .basic_auth("root", "secret")
//!     .build()?;
//! db.connect().await?;
//!
//! let query = Query::new("FOR p IN products RETURN p")
//!     .filter(Filter::from_json(r#"{"limit": 10, "where": {"price": {"lt": 20}}}"#)?);
//! let products = db.run_query(&query).await?;
//! println!("{}", String::from_utf8_lossy(&products));
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod auth;
pub mod client;
pub mod cursor;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod query;
pub mod request;
pub mod response;
pub mod transport;
