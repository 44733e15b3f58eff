//! Query and stream command implementations.

use std::io::{self, Write};
use std::time::Instant;

use arango_api_rs::client::Database;
use arango_api_rs::cursor::StreamItem;
use arango_api_rs::query::Query;
use arango_filter_rs::Filter;
use tokio_util::sync::CancellationToken;

use super::connection::ConnectionSettings;
use super::{CommandContext, CommandError, Result};
use crate::cli::QueryArgs;

/// Splits a `NAME=VALUE` bind argument. VALUE is JSON when it parses, a
/// plain string otherwise.
fn parse_bind(arg: &str) -> Result<(String, serde_json::Value)> {
    let (name, value) = arg.split_once('=').ok_or_else(|| {
        CommandError::InvalidArgument(format!("bind parameter '{}' is not NAME=VALUE", arg))
    })?;
    if name.is_empty() {
        return Err(CommandError::InvalidArgument(format!(
            "bind parameter '{}' has an empty name",
            arg
        )));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

/// Builds the query from command-line arguments, falling back to config defaults.
pub fn build_query(args: &QueryArgs, settings: &ConnectionSettings) -> Result<Query> {
    let mut query = Query::new(&args.aql);
    for bind in &args.binds {
        let (name, value) = parse_bind(bind)?;
        query = query.bind(name, value);
    }
    if let Some(batch_size) = args.batch_size.or(settings.batch_size) {
        query = query.batch_size(batch_size);
    }
    if args.cache {
        query = query.cache(true);
    }
    if let Some(filter) = &args.filter {
        query = query.filter(Filter::from_json(filter)?);
    }
    if let Some(var) = args.var.as_ref().or(settings.var_name.as_ref()) {
        query = query.var_name(var);
    }
    Ok(query)
}

/// Cancels `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: &CancellationToken) {
    let token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received, canceling query");
            token.cancel();
        }
    });
}

/// Prints raw JSON with `--json`, pretty-printed otherwise.
fn print_json(ctx: &CommandContext, raw: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if ctx.json_output {
        stdout.write_all(raw)?;
        writeln!(stdout)?;
    } else {
        let value: serde_json::Value = serde_json::from_slice(raw)?;
        writeln!(stdout, "{}", serde_json::to_string_pretty(&value)?)?;
    }
    Ok(())
}

/// Runs the query and returns the merged result.
pub async fn fetch(db: &Database, query: &Query, cancel: CancellationToken) -> Result<Vec<u8>> {
    Ok(db.run_query_with_cancel(query, cancel).await?)
}

/// Executes the query command.
pub async fn execute_query(ctx: &CommandContext, db: &Database, query: &Query) -> Result<()> {
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(&cancel);

    let start = Instant::now();
    let raw = fetch(db, query, cancel).await?;

    if ctx.verbose {
        eprintln!("Query finished in {:?}", start.elapsed());
    }
    if !ctx.quiet {
        print_json(ctx, &raw)?;
    }
    Ok(())
}

/// Streams the query, handing each page to `on_page`. Returns the page count.
pub async fn stream_pages<F>(db: &Database, query: &Query, cancel: CancellationToken, mut on_page: F) -> Result<usize>
where
    F: FnMut(usize, &[u8]) -> Result<()>,
{
    let mut stream = db.run_query_async_with_cancel(query, cancel).await?;
    let mut pages = 0;

    while let Some(item) = stream.next().await {
        match item {
            StreamItem::Page(page) => {
                pages += 1;
                on_page(pages, &page)?;
            }
            StreamItem::Terminal => break,
            StreamItem::Error(err) => return Err(err.into()),
        }
    }
    Ok(pages)
}

/// Executes the stream command.
pub async fn execute_stream(ctx: &CommandContext, db: &Database, query: &Query) -> Result<()> {
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(&cancel);

    let start = Instant::now();
    let pages = stream_pages(db, query, cancel, |number, page| {
        if ctx.verbose {
            use owo_colors::OwoColorize;

            let label = format!("batch {}", number);
            if ctx.use_colors {
                eprintln!("{}", label.yellow());
            } else {
                eprintln!("{}", label);
            }
        }
        if ctx.quiet {
            return Ok(());
        }
        print_json(ctx, page)
    })
    .await?;

    if ctx.verbose {
        eprintln!("{} batches in {:?}", pages, start.elapsed());
    }
    Ok(())
}
