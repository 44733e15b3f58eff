//! Portable JSON filters compiled to AQL fragments.
//!
//! A [`Filter`] describes paging, sorting and a where-tree in a
//! database-neutral JSON shape. [`FilterCompiler`] validates it against the
//! reserved-keyword guard and renders it as [`ProcessedFilter`] fragments.
//!
//! # Example
//!
//! ```
//! use arango_filter_rs::{Filter, FilterCompiler};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let filter = Filter::from_json(r#"{"where": {"age": {"gte": 18}}, "sort": ["name"]}"#).unwrap();
//! let processed = FilterCompiler::new("u").compile(&filter).await.unwrap();
//!
//! assert_eq!(processed.where_, "u.age >= 18");
//! assert_eq!(processed.sort, "u.name ASC");
//! # }
//! ```

pub mod condition;
mod compiler;
mod error;
mod filter;
pub mod keywords;
mod translator;
pub mod value;

pub use compiler::{compile_filter, FilterCompiler};
pub use condition::{ComparisonOp, Condition};
pub use error::{FilterError, FilterResult};
pub use filter::{Filter, ProcessedFilter};
pub use translator::ConditionTranslator;
pub use value::{Scalar, Value};
