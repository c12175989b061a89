//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use super::settings::{
    AuthSettings, HarvestSettings, Settings, DEFAULT_BLACKLIST, DEFAULT_CLIENT_SECRET,
};
use crate::services::OutputFormat;

/// Collects every address found in the headers of a Gmail mailbox.
#[derive(Parser, Debug)]
#[command(name = "mailcrawl", version)]
#[command(about = "Harvest a deduplicated contact list from Gmail message headers", long_about = None)]
pub struct Cli {
    /// Query to perform to select the messages.
    #[arg(short, long, default_value = "")]
    pub query: String,

    /// Limit the download to this many messages (0 for no limit).
    #[arg(short, long, default_value_t = 0)]
    pub limit: u64,

    /// Do not collect emails matching this regexp. Checked before the whitelist.
    #[arg(long, default_value = DEFAULT_BLACKLIST)]
    pub blacklist: String,

    /// Only collect emails matching this regexp. Checked after the blacklist.
    #[arg(long, default_value = "")]
    pub whitelist: String,

    /// Path to the OAuth client secret file.
    #[arg(long, default_value = DEFAULT_CLIENT_SECRET)]
    pub credentials: PathBuf,

    /// Path to the token cache file [default: ~/.credentials/gmailcrawl.json]
    #[arg(long)]
    pub token_cache: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl From<Cli> for Settings {
    fn from(cli: Cli) -> Self {
        Self {
            harvest: HarvestSettings {
                query: cli.query,
                limit: cli.limit,
                blacklist: cli.blacklist,
                whitelist: cli.whitelist,
            },
            auth: AuthSettings {
                client_secret_path: cli.credentials,
                token_cache_path: cli.token_cache,
            },
            output: cli.format,
        }
    }
}
