//! Filter compilation: paging, sorting and where-clause translation.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{FilterError, FilterResult};
use crate::filter::{Filter, ProcessedFilter};
use crate::keywords::check_keywords;
use crate::translator::ConditionTranslator;

fn sort_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\A[A-Za-z_][A-Za-z0-9._-]*(\s+(asc|desc))?\z")
            .expect("sort pattern is valid")
    })
}

/// Compiles [`Filter`]s into [`ProcessedFilter`] fragments.
///
/// Compilation is all-or-nothing: any error means no fragment is returned.
#[derive(Debug, Clone)]
pub struct FilterCompiler {
    translator: ConditionTranslator,
}

impl FilterCompiler {
    /// Creates a compiler for the given document variable (`var` when empty).
    pub fn new(var_name: impl Into<String>) -> Self {
        Self {
            translator: ConditionTranslator::new(var_name),
        }
    }

    /// The document variable fragments are rendered against.
    pub fn var_name(&self) -> &str {
        self.translator.var_name()
    }

    /// Compiles a filter.
    ///
    /// The keyword guard runs first over the untranslated filter, so a
    /// reserved word is reported even when the same entry is also malformed.
    ///
    /// # Errors
    ///
    /// Returns the first [`FilterError`] found; see the variants for details.
    pub async fn compile(&self, filter: &Filter) -> FilterResult<ProcessedFilter> {
        check_keywords(filter.keyword_candidates()).await?;

        let processed = ProcessedFilter {
            offset_limit: offset_limit(filter.offset, filter.limit)?,
            sort: self.sort(&filter.sort)?,
            where_: self.translator.translate_all(&filter.where_)?,
        };

        tracing::trace!(
            var = self.var_name(),
            offset_limit = %processed.offset_limit,
            sort = %processed.sort,
            where_ = %processed.where_,
            "compiled filter"
        );

        Ok(processed)
    }

    fn sort(&self, entries: &[String]) -> FilterResult<String> {
        let parts = entries
            .iter()
            .map(|entry| {
                if !sort_pattern().is_match(entry) {
                    return Err(FilterError::InvalidSort {
                        entry: entry.clone(),
                    });
                }

                let mut words = entry.split_whitespace();
                let field = words.next().unwrap_or_default();
                let direction = words
                    .next()
                    .map(str::to_ascii_uppercase)
                    .unwrap_or_else(|| "ASC".to_string());

                Ok(format!("{}.{} {}", self.var_name(), field, direction))
            })
            .collect::<FilterResult<Vec<_>>>()?;

        Ok(parts.join(", "))
    }
}

impl Default for FilterCompiler {
    fn default() -> Self {
        Self::new("var")
    }
}

fn offset_limit(offset: i64, limit: i64) -> FilterResult<String> {
    if offset < 0 {
        return Err(FilterError::InvalidRange {
            name: "offset",
            value: offset,
        });
    }
    if limit < 0 {
        return Err(FilterError::InvalidRange {
            name: "limit",
            value: limit,
        });
    }

    Ok(match (offset, limit) {
        (0, 0) => String::new(),
        (offset, 0) => offset.to_string(),
        (0, limit) => limit.to_string(),
        (offset, limit) => format!("{offset}, {limit}"),
    })
}

/// Compiles an optional filter against `var_name`.
///
/// A missing filter compiles to empty fragments.
pub async fn compile_filter(var_name: &str, filter: Option<&Filter>) -> FilterResult<ProcessedFilter> {
    match filter {
        Some(filter) => FilterCompiler::new(var_name).compile(filter).await,
        None => Ok(ProcessedFilter::default()),
    }
}
