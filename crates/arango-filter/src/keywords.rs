//! Reserved-keyword guard.
//!
//! Filter strings end up inside AQL text, so any sort entry or field name
//! that spells a statement keyword is refused outright.

use tokio::task::JoinSet;

use crate::error::{FilterError, FilterResult};

/// AQL statement keywords that may never appear in filter strings.
pub const RESERVED_KEYWORDS: &[&str] = &[
    "FOR", "RETURN", "FILTER", "SORT", "LIMIT", "LET", "COLLECT", "INTO", "KEEP", "WITH", "COUNT",
    "OPTIONS", "REMOVE", "UPDATE", "REPLACE", "INSERT", "UPSERT",
];

/// Returns the first reserved keyword spelled by an identifier token of `candidate`.
///
/// Tokens are maximal runs of ASCII letters, digits and underscores, compared
/// case-insensitively.
///
/// ```
/// use arango_filter_rs::keywords::find_keyword;
///
/// assert_eq!(find_keyword("INSeRT ASC"), Some("INSERT"));
/// assert_eq!(find_keyword("information"), None);
/// ```
pub fn find_keyword(candidate: &str) -> Option<&'static str> {
    candidate
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .find_map(|token| {
            RESERVED_KEYWORDS
                .iter()
                .copied()
                .find(|keyword| keyword.eq_ignore_ascii_case(token))
        })
}

/// Checks every candidate concurrently, one task per candidate.
///
/// All tasks are joined before returning. When several candidates match, the
/// error names the keyword of the lowest-indexed one.
pub async fn check_keywords(candidates: Vec<String>) -> FilterResult<()> {
    let mut tasks = JoinSet::new();

    for (index, candidate) in candidates.into_iter().enumerate() {
        tasks.spawn(async move { (index, find_keyword(&candidate).map(|kw| (kw, candidate))) });
    }

    let mut first: Option<(usize, &'static str, String)> = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Some((keyword, candidate)))) => {
                if first.as_ref().map_or(true, |(seen, _, _)| index < *seen) {
                    first = Some((index, keyword, candidate));
                }
            }
            Ok((_, None)) => {}
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => {}
        }
    }

    match first {
        Some((_, keyword, candidate)) => {
            tracing::debug!(keyword, candidate = %candidate, "filter rejected by keyword guard");
            Err(FilterError::forbidden_keyword(keyword))
        }
        None => Ok(()),
    }
}
