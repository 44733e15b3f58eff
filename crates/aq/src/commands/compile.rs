//! Compile command implementation.
//!
//! Compiles a filter locally and prints the AQL fragments.

use arango_filter_rs::{Filter, FilterCompiler, ProcessedFilter};

use super::{CommandContext, CommandError, Result};

/// Options for the compile command.
pub struct CompileOptions {
    /// Filter JSON or URL query string.
    pub input: String,
    /// Whether `input` is a URL query string.
    pub query_string: bool,
    /// Variable the fragments refer to.
    pub var: String,
}

/// Parses and compiles the filter described by `opts`.
pub async fn compile(opts: &CompileOptions) -> Result<ProcessedFilter> {
    let filter = if opts.query_string {
        Filter::from_query(&opts.input)?.ok_or_else(|| {
            CommandError::InvalidArgument("query string has no 'filter' parameter".to_string())
        })?
    } else {
        Filter::from_json(&opts.input)?
    };
    Ok(FilterCompiler::new(&opts.var).compile(&filter).await?)
}

/// Executes the compile command.
pub async fn execute(ctx: &CommandContext, opts: &CompileOptions) -> Result<()> {
    let processed = compile(opts).await?;

    if ctx.json_output {
        let output = serde_json::json!({
            "offsetLimit": processed.offset_limit,
            "sort": processed.sort,
            "where": processed.where_,
            "aql": processed.to_aql(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }
    if ctx.quiet {
        return Ok(());
    }

    if ctx.verbose {
        use owo_colors::OwoColorize;

        let rows = [
            ("where", &processed.where_),
            ("sort", &processed.sort),
            ("limit", &processed.offset_limit),
        ];
        for (label, fragment) in rows {
            if ctx.use_colors {
                eprintln!("{:>6}: {}", label.cyan(), fragment);
            } else {
                eprintln!("{:>6}: {}", label, fragment);
            }
        }
    }
    println!("{}", processed.to_aql());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(input: &str, query_string: bool) -> CompileOptions {
        CompileOptions {
            input: input.to_string(),
            query_string,
            var: "var".to_string(),
        }
    }

    #[tokio::test]
    async fn test_compile_json() {
        let processed = compile(&opts(
            r#"{"offset": 2, "limit": 5, "sort": ["name desc"], "where": {"age": {"gte": 21}}}"#,
            false,
        ))
        .await
        .unwrap();
        assert_eq!(processed.to_aql(), "FILTER var.age >= 21 SORT var.name DESC LIMIT 2, 5");
    }

    #[tokio::test]
    async fn test_compile_query_string() {
        let processed = compile(&opts("?filter=%7B%22limit%22%3A3%7D", true)).await.unwrap();
        assert_eq!(processed.offset_limit, "3");
    }

    #[tokio::test]
    async fn test_compile_query_string_without_filter() {
        let err = compile(&opts("page=2", true)).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_compile_rejects_keywords() {
        let err = compile(&opts(r#"{"sort": ["name REMOVE"]}"#, false)).await.unwrap_err();
        assert!(matches!(err, CommandError::Filter(_)));
        assert!(err.to_string().contains("REMOVE"));
    }
}
