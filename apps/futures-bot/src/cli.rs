use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Binance USDT-M futures price and balance lookup.
///
/// Credentials come from BINANCE_API_KEY / BINANCE_API_SECRET (a `.env` file
/// in the working directory is read too) unless given on the command line.
#[derive(Debug, Parser)]
#[command(name = "futures-bot", version)]
pub struct Cli {
    /// API key, overrides BINANCE_API_KEY
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// API secret, overrides BINANCE_API_SECRET
    #[arg(long, global = true)]
    pub api_secret: Option<String>,

    /// Use the testnet endpoint
    #[arg(long, global = true, conflicts_with = "production")]
    pub testnet: bool,

    /// Use the production endpoint (real funds)
    #[arg(long, global = true)]
    pub production: bool,

    /// Explicit REST base URL, wins over --testnet/--production
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Per-request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Extra attempts after a network failure
    #[arg(long, global = true, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Debug log file
    #[arg(long, global = true, value_name = "PATH", default_value = "bot.log")]
    pub log_file: PathBuf,

    /// Do not write a log file
    #[arg(long, global = true)]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show the latest price of a symbol
    Price {
        /// Futures symbol, e.g. BTCUSDT
        #[arg(long, short)]
        symbol: String,
    },
    /// Show futures account balances
    Balance {
        /// Hide assets with a zero balance
        #[arg(long)]
        non_zero: bool,
    },
    /// Show the exchange server time
    Time,
}
