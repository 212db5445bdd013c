mod cli;

use std::error::Error as StdError;
use std::time::Duration;

use clap::Parser;
use eyre::{eyre, WrapErr};
use serde::Serialize;

use tzpro_core::api::block::BlockId;
use tzpro_core::api::contract::Contract;
use tzpro_core::api::explorer::Supply;
use tzpro_core::{Address, Client, ClientConfig, CoreError, Query, TableQuery, TableRow};

use cli::{Command, TableArgs};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    let mut config =
        ClientConfig::new(&args.url).with_timeout(Duration::from_secs(args.timeout.max(1)));
    if let Some(key) = &args.api_key {
        config = config.with_api_key(key);
    }
    let client = Client::new(&config).context("configure API client")?;

    // Dropping the command future on Ctrl-C aborts any in-flight request.
    tokio::select! {
        result = run(&client, &args.url, args.command) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted");
            Ok(())
        }
    }
}

async fn run(client: &Client, url: &str, command: Command) -> eyre::Result<()> {
    match command {
        Command::Status { columns } => {
            let status = client
                .explorer()
                .status_with_columns(&columns)
                .await
                .api_context(url)?;
            print_json(&status)
        }
        Command::Tip => print_json(&client.explorer().tip().await.api_context(url)?),
        Command::Config { height } => {
            let config = match height {
                Some(height) => client.explorer().config_at(height).await,
                None => client.explorer().config().await,
            };
            print_json(&config.api_context(url)?)
        }
        Command::Block { id } => {
            let id = match id {
                None => BlockId::Head,
                Some(id) => parse_block_id(&id)?,
            };
            print_json(&client.blocks().get(id, &Query::new()).await.api_context(url)?)
        }
        Command::Baker { address, meta } => {
            let address = parse_address(&address)?;
            let baker = client
                .bakers()
                .get(&address, &meta_query(meta))
                .await
                .api_context(url)?;
            print_json(&baker)
        }
        Command::Income { address, cycle } => {
            let address = parse_address(&address)?;
            let income = client
                .bakers()
                .income(&address, cycle, &Query::new())
                .await
                .api_context(url)?;
            print_json(&income)
        }
        Command::Contract { address, meta } => {
            let address = parse_address(&address)?;
            let contract = client
                .contracts()
                .get(&address, &meta_query(meta))
                .await
                .api_context(url)?;
            print_json(&contract)
        }
        Command::BigmapValues { id, limit, unpack } => {
            let mut params = Query::new().with_limit(limit);
            if unpack {
                params = params.with_unpack();
            }
            let values = client
                .contracts()
                .bigmap_values(id, &params)
                .await
                .api_context(url)?;
            print_json(&values)
        }
        Command::Metadata { address } => {
            let address = parse_address(&address)?;
            match client.metadata().wallet(&address).await {
                Ok(md) => print_json(&md),
                Err(err) if err.is_not_found() => {
                    println!("no metadata for {address}");
                    Ok(())
                }
                Err(err) => Err(err).api_context(url),
            }
        }
        Command::Contracts(table) => dump_table(client.new_table_query::<Contract>(), &table, url).await,
        Command::Supply(table) => dump_table(client.new_table_query::<Supply>(), &table, url).await,
    }
}

// ==============================================================================
// Output
// ==============================================================================

fn print_json<T: Serialize>(value: &T) -> eyre::Result<()> {
    let text = serde_json::to_string_pretty(value).context("encode output")?;
    println!("{text}");
    Ok(())
}

/// Print every row as one JSON line, following the cursor page by page.
async fn dump_table<T: TableRow + Serialize>(
    mut query: TableQuery<T>,
    args: &TableArgs,
    url: &str,
) -> eyre::Result<()> {
    query = query.with_limit(args.page_size);
    if let Some(cursor) = args.cursor {
        query = query.with_cursor(cursor);
    }

    let mut pages = 0usize;
    while let Some(rows) = query.next_page().await.api_context(url)? {
        for row in &rows {
            println!("{}", serde_json::to_string(row).context("encode row")?);
        }
        pages += 1;
        if args.max_pages.is_some_and(|max| pages >= max) {
            break;
        }
    }

    tracing::info!(
        table = query.table(),
        pages,
        cursor = ?query.cursor(),
        state = ?query.state(),
        "table dump finished"
    );
    Ok(())
}

// ==============================================================================
// Arguments
// ==============================================================================

fn parse_address(raw: &str) -> eyre::Result<Address> {
    raw.parse().wrap_err("parse address argument")
}

fn parse_block_id(raw: &str) -> eyre::Result<BlockId> {
    if raw == "head" {
        return Ok(BlockId::Head);
    }
    if let Ok(height) = raw.parse::<i64>() {
        return Ok(BlockId::Height(height));
    }
    raw.parse()
        .map(BlockId::Hash)
        .wrap_err("block must be `head`, a height, or a block hash")
}

fn meta_query(meta: bool) -> Query {
    if meta {
        Query::new().with_meta()
    } else {
        Query::new()
    }
}

// ==============================================================================
// Errors
// ==============================================================================

trait ApiContext<T> {
    fn api_context(self, url: &str) -> eyre::Result<T>;
}

impl<T> ApiContext<T> for Result<T, CoreError> {
    fn api_context(self, url: &str) -> eyre::Result<T> {
        self.map_err(|err| {
            eyre!(format_api_error(url, &err)).wrap_err("while querying the TzPro API")
        })
    }
}

/// Render an API failure with its full source chain and a hint for the
/// common failure modes.
fn format_api_error(url: &str, err: &CoreError) -> String {
    let detail = error_chain(err);
    let mut lines = vec![
        format!("request to `{url}` failed"),
        format!("error: {detail}"),
    ];

    let hint = match err {
        CoreError::Http(http) if http.is_unauthorized() => Some(
            "hint: the API rejected the request; set a valid key with --api-key or TZPRO_API_KEY",
        ),
        CoreError::Http(http) if http.is_not_found() => {
            Some("hint: the resource does not exist on this network")
        }
        CoreError::Http(http) if http.is_rate_limited() => {
            Some("hint: rate limit reached; retry later or use an API key with a higher quota")
        }
        CoreError::Decode { .. } => Some(
            "hint: the response did not have the expected shape; verify that --url points at a TzPro API",
        ),
        CoreError::Transport(_) if detail.contains("dns error") => Some(
            "hint: hostname resolution failed; verify the URL hostname and your DNS/network",
        ),
        CoreError::Transport(_)
            if detail.contains("certificate") || detail.contains("tls") || detail.contains("TLS") =>
        {
            Some("hint: TLS handshake failed; verify certificate trust and that the URL uses HTTPS")
        }
        CoreError::Transport(_) if detail.contains("timed out") || detail.contains("deadline") => {
            Some("hint: the request timed out; raise --timeout or check network reachability")
        }
        _ => None,
    };
    if let Some(hint) = hint {
        lines.push(hint.into());
    }

    lines.join("\n")
}

fn error_chain(err: &dyn StdError) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !parts.iter().any(|p| p.contains(&text)) {
            parts.push(text);
        }
        source = inner.source();
    }
    parts.join(": ")
}
