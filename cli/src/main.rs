//! # Ledgerline CLI
//!
//! Entry point for the `ledgerline` binary. Parses CLI arguments,
//! initializes logging, and runs one subcommand:
//!
//! - `register`     create a user
//! - `login`        sign in and store the session
//! - `whoami`       show the signed-in user
//! - `accounts`     list accounts and the total balance
//! - `transactions` recent activity across accounts
//! - `transfer`     send a local transfer and confirm it with an OTP
//! - `logout`       delete the stored session
//! - `version`      print build version information

mod cli;
mod logging;
mod session_store;

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::signal;
use tokio::sync::{broadcast, watch};

use ledgerline_client::api::{BankApiClient, SignUpRequest};
use ledgerline_client::config::ClientConfig;
use ledgerline_client::flow::{FlowEvent, NoticeKind, TransferConfirmationFlow};
use ledgerline_client::metrics::FlowMetrics;
use ledgerline_client::otp::{Confirmation, CountdownState};
use ledgerline_client::transfer::TransferRequest;

use cli::{Commands, GlobalArgs, LedgerlineCli};
use logging::LogFormat;

type InputLines = Lines<BufReader<Stdin>>;

/// Countdown values at which the prompt reminds the user of the time left.
const REMINDER_SECONDS: [u32; 3] = [45, 30, 15];

#[tokio::main]
async fn main() -> Result<()> {
    let cli = LedgerlineCli::parse();
    logging::init_logging(
        &cli.global.log_level,
        LogFormat::from_str_lossy(&cli.global.log_format),
    )?;

    match cli.command {
        Commands::Register(args) => register(&cli.global, args).await,
        Commands::Login(args) => login(&cli.global, args).await,
        Commands::Whoami => whoami(&cli.global).await,
        Commands::Accounts => accounts(&cli.global).await,
        Commands::Transactions(args) => transactions(&cli.global, args).await,
        Commands::Transfer(args) => transfer(&cli.global, args).await,
        Commands::Logout => logout(&cli.global),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Session Commands
// ---------------------------------------------------------------------------

async fn register(global: &GlobalArgs, args: cli::RegisterArgs) -> Result<()> {
    let api = api_client(global)?;
    let password = match args.password {
        Some(password) => SecretString::new(password),
        None => read_password().await?,
    };

    let user = api
        .sign_up(&SignUpRequest {
            email: &args.email,
            password: password.expose_secret(),
            first_name: &args.first_name,
            last_name: &args.last_name,
            address: &args.address,
            city: &args.city,
            state: &args.state,
            postal_code: &args.postal_code,
            dob: &args.dob,
            ssn: &args.ssn,
        })
        .await
        .context("registration failed")?;

    tracing::info!(email = %args.email, "user registered");
    println!(
        "Registered {}. Sign in with `ledgerline login --email {}`.",
        user.display_name(),
        args.email
    );
    Ok(())
}

async fn login(global: &GlobalArgs, args: cli::LoginArgs) -> Result<()> {
    let api = api_client(global)?;
    let password = match args.password {
        Some(password) => SecretString::new(password),
        None => read_password().await?,
    };

    let credentials = api
        .sign_in(&args.email, password.expose_secret())
        .await
        .context("sign-in failed")?;
    let path = session_path(global);
    session_store::save(&path, &credentials)?;

    let greeting = match api.profile(&credentials).await {
        Ok(profile) => profile.display_name(),
        Err(e) => {
            tracing::warn!(error = %e, "could not load profile after sign-in");
            args.email.clone()
        }
    };
    tracing::info!(session_file = %path.display(), "signed in");
    println!("Signed in as {greeting}.");
    Ok(())
}

async fn whoami(global: &GlobalArgs) -> Result<()> {
    let credentials = session_store::load(&session_path(global))?;
    let profile = api_client(global)?
        .profile(&credentials)
        .await
        .context("failed to load profile")?;

    println!("{}", profile.display_name());
    if let Some(email) = &profile.email {
        println!("  Email : {email}");
    }
    Ok(())
}

async fn accounts(global: &GlobalArgs) -> Result<()> {
    let credentials = session_store::load(&session_path(global))?;
    let summary = api_client(global)?
        .list_accounts(&credentials)
        .await
        .context("failed to load accounts")?;

    println!("{:>6}  {:<24} {:>14}", "ID", "NAME", "BALANCE");
    for account in &summary.accounts {
        println!(
            "{:>6}  {:<24} {:>14}",
            account.id,
            account.name.as_deref().unwrap_or("-"),
            ledgerline_client::transfer::amount::format_cents(account.balance),
        );
    }
    println!(
        "{} account(s), total balance {}",
        summary.total_banks,
        summary.total_display()
    );
    Ok(())
}

async fn transactions(global: &GlobalArgs, args: cli::TransactionsArgs) -> Result<()> {
    let credentials = session_store::load(&session_path(global))?;
    let feed = api_client(global)?
        .list_transactions(&credentials)
        .await
        .context("failed to load transactions")?;

    println!(
        "{:<10}  {:<24} {:<10} {:>12}  {:<12} {}",
        "DATE", "NAME", "TYPE", "AMOUNT", "STATUS", "ACCOUNT"
    );
    let shown = args.limit.unwrap_or(feed.len());
    for tx in feed.iter().take(shown) {
        println!(
            "{:<10}  {:<24} {:<10} {:>12}  {:<12} {}",
            tx.date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".into()),
            tx.name.as_deref().unwrap_or("-"),
            tx.transaction_type.as_deref().unwrap_or("-"),
            ledgerline_client::transfer::amount::format_cents(tx.amount),
            tx.status.as_deref().unwrap_or("-"),
            tx.account_name
                .clone()
                .unwrap_or_else(|| tx.account_id.to_string()),
        );
    }
    println!("{} of {} transaction(s)", shown.min(feed.len()), feed.len());
    Ok(())
}

fn logout(global: &GlobalArgs) -> Result<()> {
    if session_store::remove(&session_path(global))? {
        println!("Signed out.");
    } else {
        println!("No stored session.");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transfer
// ---------------------------------------------------------------------------

async fn transfer(global: &GlobalArgs, args: cli::TransferArgs) -> Result<()> {
    let credentials = session_store::load(&session_path(global))?;
    let config = client_config(global);
    let api = Arc::new(BankApiClient::new(&config).context("failed to build HTTP client")?);
    let metrics = FlowMetrics::new().context("failed to register metrics")?;

    let mut builder = TransferRequest::builder()
        .source_account(args.from)
        .amount(args.amount.as_str())
        .recipient_email(args.to_email.as_str())
        .recipient_bank(args.to_bank.as_str())
        .recipient_account_number(args.to_account.as_str())
        .recipient_routing_number(args.to_routing.as_str());
    if let Some(note) = &args.note {
        builder = builder.note(note.as_str());
    }
    let request = builder.build().context("invalid transfer")?;

    println!(
        "Sending {} from account {} to {} ({}, {})",
        request.amount(),
        request.source_account_id(),
        request.recipient().email,
        request.recipient().bank_name,
        request.recipient().masked_account_number(),
    );

    let mut flow = TransferConfirmationFlow::new(api, credentials, config.countdown)
        .with_metrics(metrics.clone());
    let printer = tokio::spawn(print_notices(flow.subscribe()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let outcome = run_transfer(&mut flow, request, args.otp.as_deref(), &mut lines).await;

    // Dropping the flow closes the event channel and lets the printer drain.
    drop(flow);
    let _ = printer.await;

    if args.print_metrics {
        println!("{}", metrics.encode().context("failed to encode metrics")?);
    }

    match outcome? {
        Some(confirmation) => {
            tracing::info!(transfer_id = %confirmation.transfer_id, "transfer confirmed");
            Ok(())
        }
        None => bail!("transfer was not confirmed"),
    }
}

/// Creates the transfer and runs the OTP prompt until it is confirmed,
/// cancelled, or input ends. `Ok(None)` means not confirmed.
async fn run_transfer(
    flow: &mut TransferConfirmationFlow<BankApiClient>,
    request: TransferRequest,
    preset_code: Option<&str>,
    lines: &mut InputLines,
) -> Result<Option<Confirmation>> {
    let Some(mut initiated) = race_shutdown(flow.initiate(request), shutdown_signal()).await
    else {
        return Ok(None);
    };
    while initiated.is_err() {
        if !ask_yes_no(lines, "Retry? [y/N] ").await? {
            return Ok(None);
        }
        match race_shutdown(flow.retry(), shutdown_signal()).await {
            Some(result) => initiated = result,
            None => return Ok(None),
        }
    }

    if let Some(code) = preset_code {
        flow.enter_code(code);
        return Ok(confirm_or_cancel(flow).await);
    }

    let mut ticks = flow.subscribe_countdown();
    println!("Enter the code (q to cancel).");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    flow.cancel();
                    return Ok(None);
                };
                match line.trim() {
                    "" => continue,
                    "q" | "quit" => {
                        flow.cancel();
                        return Ok(None);
                    }
                    code => {
                        flow.enter_code(code);
                        if let Some(confirmation) = confirm_or_cancel(flow).await {
                            return Ok(Some(confirmation));
                        }
                        if flow.pending().is_none() {
                            return Ok(None);
                        }
                    }
                }
            }
            state = next_tick(&mut ticks) => {
                if state.resend_eligible {
                    println!(
                        "A new code may now be requested. Keep typing the current one, or q to cancel."
                    );
                } else if REMINDER_SECONDS.contains(&state.remaining_seconds) {
                    println!("{}s left to enter the code.", state.remaining_seconds);
                }
            }
            _ = shutdown_signal() => {
                flow.cancel();
                return Ok(None);
            }
        }
    }
}

/// Submits the typed code. An interrupt while the backend is answering
/// closes the challenge.
async fn confirm_or_cancel(
    flow: &mut TransferConfirmationFlow<BankApiClient>,
) -> Option<Confirmation> {
    match race_shutdown(flow.confirm(), shutdown_signal()).await {
        Some(result) => result.ok(),
        None => {
            flow.cancel();
            None
        }
    }
}

/// `Some(output)` if `work` finishes first, `None` if `shutdown` does.
async fn race_shutdown<T>(
    work: impl Future<Output = T>,
    shutdown: impl Future<Output = ()>,
) -> Option<T> {
    tokio::select! {
        output = work => Some(output),
        _ = shutdown => None,
    }
}

/// Resolves on the next countdown tick; never resolves once the countdown
/// is gone.
async fn next_tick(ticks: &mut Option<watch::Receiver<CountdownState>>) -> CountdownState {
    if let Some(rx) = ticks {
        if rx.changed().await.is_ok() {
            return *rx.borrow_and_update();
        }
    }
    *ticks = None;
    std::future::pending().await
}

async fn print_notices(mut events: broadcast::Receiver<FlowEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let notice = event.notice();
                match notice.kind {
                    NoticeKind::Error => eprintln!("{}: {}", notice.title, notice.description),
                    NoticeKind::Info | NoticeKind::Success => {
                        println!("{}. {}", notice.title, notice.description)
                    }
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "notice printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn client_config(global: &GlobalArgs) -> ClientConfig {
    ClientConfig {
        request_timeout: std::time::Duration::from_secs(global.timeout_secs),
        ..ClientConfig::with_base_url(global.base_url.as_str())
    }
}

fn api_client(global: &GlobalArgs) -> Result<BankApiClient> {
    BankApiClient::new(&client_config(global)).context("failed to build HTTP client")
}

fn session_path(global: &GlobalArgs) -> PathBuf {
    global
        .session_file
        .clone()
        .unwrap_or_else(session_store::default_path)
}

async fn read_password() -> Result<SecretString> {
    eprint!("Password: ");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let line = lines
        .next_line()
        .await
        .context("failed to read password")?
        .unwrap_or_default();
    Ok(SecretString::new(line.trim_end().to_string()))
}

async fn ask_yes_no(lines: &mut InputLines, prompt: &str) -> Result<bool> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let answer = lines.next_line().await.context("failed to read stdin")?;
    Ok(matches!(
        answer.as_deref().map(str::trim),
        Some("y") | Some("Y") | Some("yes")
    ))
}

/// Prints version information to stdout.
fn print_version() {
    println!("ledgerline {}", env!("CARGO_PKG_VERSION"));
    println!("rustc      {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// If a handler cannot be installed, that signal is simply never observed.
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
