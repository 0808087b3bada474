use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "brandcomm-bot")]
#[command(about = "Telegram bot that files deals into Google Drive")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Register the webhook and serve it (default)
    Serve,

    /// Print the Google consent URL
    AuthUrl,

    /// Create the SQLite ledger schema
    Init,

    /// List recorded deals from the SQLite ledger
    Deals {
        /// Number of deals to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Only deals opened from this Telegram chat id
        #[arg(long)]
        chat: Option<i64>,
    },

    /// Validate configuration and fetch a Google access token
    Check,
}

impl Cli {
    pub fn action(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}
