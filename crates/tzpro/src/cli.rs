use clap::{Args, Parser, Subcommand};

/// tzpro: query the TzPro blockchain indexer from the command line.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// API base URL.
    #[arg(long, default_value = "https://api.tzpro.io", env = "TZPRO_URL")]
    pub url: String,

    /// API key, sent as `X-Api-Key`.
    #[arg(long, env = "TZPRO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Indexer sync status.
    Status {
        /// Request a positional status with these columns.
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Current chain tip.
    Tip,

    /// Chain configuration, at head or at a past height.
    Config {
        #[arg(long)]
        height: Option<i64>,
    },

    /// A block by height or hash (defaults to head).
    Block { id: Option<String> },

    /// Baker profile.
    Baker {
        address: String,

        /// Embed address metadata.
        #[arg(long)]
        meta: bool,
    },

    /// Baker income for one cycle.
    Income { address: String, cycle: i64 },

    /// Contract profile.
    Contract {
        address: String,

        /// Embed address metadata.
        #[arg(long)]
        meta: bool,
    },

    /// Values of a bigmap.
    BigmapValues {
        id: i64,

        #[arg(long, default_value = "100")]
        limit: u32,

        /// Unpack packed Micheline bytes.
        #[arg(long)]
        unpack: bool,
    },

    /// Wallet or contract metadata.
    Metadata { address: String },

    /// Dump the contract table as JSON lines.
    Contracts(TableArgs),

    /// Dump the supply table as JSON lines.
    Supply(TableArgs),
}

#[derive(Args)]
pub struct TableArgs {
    /// Rows per request.
    #[arg(long, default_value = "500")]
    pub page_size: u32,

    /// Stop after this many pages.
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Resume after this row id.
    #[arg(long)]
    pub cursor: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_and_subcommand() {
        let cli = Cli::try_parse_from([
            "tzpro",
            "--url",
            "http://localhost:8000",
            "--timeout",
            "5",
            "income",
            "tz1irJKkXS2DBWkU1NnmFQx1c1L7pbGg4yhk",
            "650",
        ])
        .expect("arguments must parse");
        assert_eq!(cli.url, "http://localhost:8000");
        assert_eq!(cli.timeout, 5);
        assert!(matches!(cli.command, Command::Income { cycle: 650, .. }));
    }

    #[test]
    fn status_columns_are_comma_separated() {
        let cli = Cli::try_parse_from(["tzpro", "status", "--columns", "status,blocks"])
            .expect("arguments must parse");
        match cli.command {
            Command::Status { columns } => assert_eq!(columns, vec!["status", "blocks"]),
            _ => panic!("expected status"),
        }
    }

    #[test]
    fn table_defaults() {
        let cli = Cli::try_parse_from(["tzpro", "supply", "--max-pages", "2"])
            .expect("arguments must parse");
        match cli.command {
            Command::Supply(table) => {
                assert_eq!(table.page_size, 500);
                assert_eq!(table.max_pages, Some(2));
                assert_eq!(table.cursor, None);
            }
            _ => panic!("expected supply"),
        }
    }

    #[test]
    fn missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["tzpro"]).is_err());
        assert!(Cli::try_parse_from(["tzpro", "income", "tz1only"]).is_err());
    }
}
