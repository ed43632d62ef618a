//! # Ledgerline Client
//!
//! Client-side core of the Ledgerline banking front-end. The backend owns
//! balances, transfers, and OTP delivery; this crate owns the one stateful
//! interaction worth engineering on the client: confirming a transfer with
//! a one-time code inside a 60 second window.
//!
//! ## Architecture
//!
//! - **config**: Backend paths, OTP constants, runtime configuration.
//! - **session**: Access/refresh tokens, injected into every call.
//! - **api**: `reqwest` client for the REST backend and the
//!   [`api::TransferBackend`] seam.
//! - **transfer**: Amounts, requests, initiation, pending transfers.
//! - **otp**: Code input, countdown task, challenge state machine.
//! - **flow**: [`flow::TransferConfirmationFlow`], the composition of the two.
//! - **metrics**: Prometheus counters for the flow.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ledgerline_client::api::BankApiClient;
//! use ledgerline_client::config::ClientConfig;
//! use ledgerline_client::flow::TransferConfirmationFlow;
//! use ledgerline_client::transfer::TransferRequest;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let api = Arc::new(BankApiClient::new(&config)?);
//! let credentials = api.sign_in("jane@example.com", "hunter22").await?;
//!
//! let mut flow = TransferConfirmationFlow::new(api, credentials, config.countdown);
//! let request = TransferRequest::builder()
//!     .source_account(3)
//!     .amount("5.00")
//!     .recipient_email("sam@example.com")
//!     .recipient_bank("Ally Bank")
//!     .recipient_account_number("0123456789")
//!     .recipient_routing_number("021000021")
//!     .build()?;
//!
//! flow.initiate(request).await?;
//! flow.enter_code("123456");
//! let confirmation = flow.confirm().await?;
//! println!("confirmed {}", confirmation.transfer_id);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod flow;
pub mod metrics;
pub mod otp;
pub mod session;
pub mod transfer;

#[cfg(test)]
pub(crate) mod test_support;
