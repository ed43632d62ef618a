//! # CLI Interface
//!
//! Command-line arguments for `ledgerline`, defined with `clap` derive.
//! Subcommands: `register`, `login`, `whoami`, `accounts`, `transactions`,
//! `transfer`, `logout`, `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ledgerline_client::config::{
    DEFAULT_API_BASE_URL, DEFAULT_HTTP_TIMEOUT, ENV_API_BASE_URL, ENV_HTTP_TIMEOUT_SECS,
};

/// Ledgerline banking client.
///
/// Signs in to the banking backend, lists accounts, and sends local
/// transfers confirmed with a one-time code.
#[derive(Parser, Debug)]
#[command(
    name = "ledgerline",
    about = "Send and confirm bank transfers from the terminal",
    version,
    propagate_version = true
)]
pub struct LedgerlineCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Backend base URL.
    #[arg(long, global = true, env = ENV_API_BASE_URL, default_value = DEFAULT_API_BASE_URL)]
    pub base_url: String,

    /// Per-request HTTP timeout, in seconds.
    #[arg(long, global = true, env = ENV_HTTP_TIMEOUT_SECS, default_value_t = DEFAULT_HTTP_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// File holding the session tokens between commands.
    ///
    /// Defaults to `~/.ledgerline/session.json`.
    #[arg(long, global = true, env = "LEDGERLINE_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, global = true, env = "LEDGERLINE_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format: `pretty` or `json`.
    #[arg(long, global = true, env = "LEDGERLINE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a user on the backend. Sign in afterwards with `login`.
    Register(RegisterArgs),
    /// Sign in and store the session tokens.
    Login(LoginArgs),
    /// Show the signed-in user.
    Whoami,
    /// List accounts with their balances.
    Accounts,
    /// Show recent transactions across all accounts, newest first.
    Transactions(TransactionsArgs),
    /// Send a local transfer and confirm it with the code you receive.
    Transfer(TransferArgs),
    /// Forget the stored session.
    Logout,
    /// Print version information and exit.
    Version,
}

/// Arguments for the `login` subcommand.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Account email.
    #[arg(long, short = 'e', env = "LEDGERLINE_EMAIL")]
    pub email: String,

    /// Account password. Read from stdin when omitted.
    #[arg(long, env = "LEDGERLINE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Arguments for the `register` subcommand.
#[derive(Parser, Debug)]
pub struct RegisterArgs {
    #[arg(long, short = 'e')]
    pub email: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    /// Street address.
    #[arg(long)]
    pub address: String,

    #[arg(long)]
    pub city: String,

    /// State, e.g. `NY`.
    #[arg(long)]
    pub state: String,

    #[arg(long)]
    pub postal_code: String,

    /// Date of birth, `YYYY-MM-DD`.
    #[arg(long)]
    pub dob: String,

    /// Social security number.
    #[arg(long, env = "LEDGERLINE_SSN", hide_env_values = true)]
    pub ssn: String,

    /// Password for the new user. Read from stdin when omitted.
    #[arg(long, env = "LEDGERLINE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Arguments for the `transactions` subcommand.
#[derive(Parser, Debug)]
pub struct TransactionsArgs {
    /// Show at most this many transactions.
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

/// Arguments for the `transfer` subcommand.
#[derive(Parser, Debug)]
pub struct TransferArgs {
    /// Id of the account to debit (see `ledgerline accounts`).
    #[arg(long)]
    pub from: u64,

    /// Amount, e.g. `5` or `12.50`.
    #[arg(long)]
    pub amount: String,

    /// Recipient email.
    #[arg(long)]
    pub to_email: String,

    /// Recipient bank name.
    #[arg(long)]
    pub to_bank: String,

    /// Recipient account number.
    #[arg(long)]
    pub to_account: String,

    /// Recipient routing number.
    #[arg(long)]
    pub to_routing: String,

    /// Optional note, sent as the transfer description.
    #[arg(long)]
    pub note: Option<String>,

    /// Submit this code once instead of prompting for it.
    #[arg(long)]
    pub otp: Option<String>,

    /// Print the flow's Prometheus metrics after the transfer.
    #[arg(long)]
    pub print_metrics: bool,
}
