//! The portable filter description and its compiled form.

use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::condition::Condition;
use crate::error::{FilterError, FilterResult};
use crate::keywords::find_keyword;

/// A portable filter: paging, sorting and a where-tree.
///
/// A filter is immutable once handed to the compiler. Range checks on
/// `offset` and `limit` happen at compile time, not here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    /// Number of results to skip. Zero means absent.
    pub offset: i64,
    /// Maximum number of results. Zero means absent.
    pub limit: i64,
    /// Sort entries of the form `field [ASC|DESC]`.
    pub sort: Vec<String>,
    /// Top-level where entries, ANDed together.
    pub where_: Vec<Condition>,
    /// Opaque options passed through to callers.
    pub options: Map<String, serde_json::Value>,
}

/// Wire shape of a filter document.
#[derive(Debug, Deserialize)]
struct FilterDocument {
    #[serde(default)]
    offset: i64,
    #[serde(default)]
    limit: i64,
    #[serde(default)]
    sort: Vec<String>,
    #[serde(default, rename = "where")]
    where_: serde_json::Value,
    #[serde(default)]
    options: Map<String, serde_json::Value>,
}

impl Filter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON filter document.
    ///
    /// `where` may be one object or an array of objects.
    ///
    /// # Example
    ///
    /// ```
    /// use arango_filter_rs::Filter;
    ///
    /// let filter = Filter::from_json(r#"{"limit": 10, "where": {"age": {"gte": 18}}}"#).unwrap();
    /// assert_eq!(filter.limit, 10);
    /// assert_eq!(filter.where_.len(), 1);
    /// ```
    pub fn from_json(json: &str) -> FilterResult<Self> {
        let document: FilterDocument = serde_json::from_str(json)?;

        // Raw keys are guarded before conversion so a reserved word wins over shape errors.
        let mut keys = Vec::new();
        collect_keys(&document.where_, &mut keys);
        if let Some(keyword) = keys.iter().find_map(|key| find_keyword(key)) {
            tracing::debug!(keyword, "raw where-tree rejected by keyword guard");
            return Err(FilterError::forbidden_keyword(keyword));
        }

        let where_ = match &document.where_ {
            serde_json::Value::Null => Vec::new(),
            serde_json::Value::Object(object) if object.is_empty() => Vec::new(),
            serde_json::Value::Object(object) => vec![Condition::from_json_object(object)?],
            serde_json::Value::Array(entries) => entries
                .iter()
                .filter(|entry| !matches!(entry, serde_json::Value::Object(o) if o.is_empty()))
                .map(|entry| match entry {
                    serde_json::Value::Object(object) => Condition::from_json_object(object),
                    other => Err(FilterError::invalid_operand(
                        "where",
                        format!("entries must be objects: {other}"),
                    )),
                })
                .collect::<FilterResult<Vec<_>>>()?,
            other => {
                return Err(FilterError::InvalidJson {
                    message: format!("`where` must be an object or an array: {other}"),
                })
            }
        };

        Ok(Self {
            offset: document.offset,
            limit: document.limit,
            sort: document.sort,
            where_,
            options: document.options,
        })
    }

    /// Reads the `filter` (or `Filter`) parameter of a URL query string.
    ///
    /// Returns `Ok(None)` when the parameter is absent or empty.
    pub fn from_query(query: &str) -> FilterResult<Option<Self>> {
        let params: Vec<(String, String)> =
            serde_urlencoded::from_str(query.trim_start_matches('?')).map_err(|e| {
                FilterError::InvalidJson {
                    message: format!("invalid query string: {e}"),
                }
            })?;

        let raw = params
            .iter()
            .find(|(key, value)| key == "filter" && !value.is_empty())
            .or_else(|| {
                params
                    .iter()
                    .find(|(key, value)| key == "Filter" && !value.is_empty())
            })
            .map(|(_, value)| value.as_str());

        raw.map(Self::from_json).transpose()
    }

    /// Sets the offset.
    ///
    /// An offset without a limit renders as `LIMIT <offset>`, which AQL reads as a count.
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the limit.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Appends a sort entry.
    pub fn sort_by(mut self, entry: impl Into<String>) -> Self {
        self.sort.push(entry.into());
        self
    }

    /// Appends a top-level where entry.
    pub fn matching(mut self, condition: Condition) -> Self {
        self.where_.push(condition);
        self
    }

    /// Every string the keyword guard must inspect, in a stable order:
    /// sort entries first, then where fields depth first.
    pub fn keyword_candidates(&self) -> Vec<String> {
        let mut candidates = self.sort.clone();
        for condition in &self.where_ {
            condition.collect_fields(&mut candidates);
        }
        candidates
    }
}

/// Appends every object key of a raw where-tree, depth first.
fn collect_keys(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(object) => {
            for (key, child) in object {
                out.push(key.clone());
                collect_keys(child, out);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_keys(item, out);
            }
        }
        _ => {}
    }
}

/// AQL text fragments produced from a [`Filter`]. Empty means "omit".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFilter {
    /// `<offset>, <limit>`, `<offset>` or `<limit>`.
    pub offset_limit: String,
    /// `<var>.<field> <DIR>, ...`.
    pub sort: String,
    /// The translated where-tree.
    #[serde(rename = "where")]
    pub where_: String,
}

impl ProcessedFilter {
    /// Returns true if every fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.offset_limit.is_empty() && self.sort.is_empty() && self.where_.is_empty()
    }

    /// Renders the fragments as `FILTER .. SORT .. LIMIT ..`, skipping empty ones.
    pub fn to_aql(&self) -> String {
        let clauses = [
            ("FILTER", &self.where_),
            ("SORT", &self.sort),
            ("LIMIT", &self.offset_limit),
        ];

        clauses
            .iter()
            .filter(|(_, fragment)| !fragment.is_empty())
            .map(|(keyword, fragment)| format!("{keyword} {fragment}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_defaults() {
        let filter = Filter::from_json("{}").unwrap();
        assert_eq!(filter, Filter::default());
    }

    #[test]
    fn test_from_json_accepts_where_array() {
        let filter = Filter::from_json(
            r#"{"where": [{"not": {"firstName": "Fabien"}}, {"age": 3}]}"#,
        )
        .unwrap();
        assert_eq!(filter.where_.len(), 2);
    }

    #[test]
    fn test_from_json_keeps_negative_range() {
        let filter = Filter::from_json(r#"{"offset": -1, "limit": -2}"#).unwrap();
        assert_eq!(filter.offset, -1);
        assert_eq!(filter.limit, -2);
    }

    #[test]
    fn test_from_json_rejects_scalar_where() {
        let err = Filter::from_json(r#"{"where": 3}"#).unwrap_err();
        assert!(matches!(err, FilterError::InvalidJson { .. }));
    }

    #[test]
    fn test_from_json_invalid_document() {
        let err = Filter::from_json("{not json").unwrap_err();
        assert!(matches!(err, FilterError::InvalidJson { .. }));
    }

    #[test]
    fn test_from_json_keeps_options() {
        let filter = Filter::from_json(r#"{"options": {"details": true}}"#).unwrap();
        assert_eq!(filter.options.get("details"), Some(&serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_from_query_reads_filter_param() {
        let filter = Filter::from_query("?page=2&filter=%7B%22limit%22%3A5%7D")
            .unwrap()
            .unwrap();
        assert_eq!(filter.limit, 5);

        let filter = Filter::from_query("Filter=%7B%22offset%22%3A1%7D")
            .unwrap()
            .unwrap();
        assert_eq!(filter.offset, 1);
    }

    #[test]
    fn test_from_query_absent() {
        assert!(Filter::from_query("page=2").unwrap().is_none());
        assert!(Filter::from_query("").unwrap().is_none());
    }

    #[test]
    fn test_keyword_candidates_order() {
        let filter = Filter::new()
            .sort_by("name")
            .matching(Condition::gt("age", 3i64))
            .matching(Condition::like("bio", "%x%", None));
        assert_eq!(filter.keyword_candidates(), vec!["name", "age", "bio"]);
    }

    #[test]
    fn test_to_aql_clause_order() {
        let processed = ProcessedFilter {
            offset_limit: "1, 2".to_string(),
            sort: "var.a ASC".to_string(),
            where_: "var.b == 1".to_string(),
        };
        assert_eq!(
            processed.to_aql(),
            "FILTER var.b == 1 SORT var.a ASC LIMIT 1, 2"
        );
    }

    #[test]
    fn test_to_aql_skips_empty_clauses() {
        let processed = ProcessedFilter {
            offset_limit: "5".to_string(),
            ..Default::default()
        };
        assert_eq!(processed.to_aql(), "LIMIT 5");
        assert!(ProcessedFilter::default().to_aql().is_empty());
        assert!(ProcessedFilter::default().is_empty());
    }
}
