//! # Client Configuration & Constants
//!
//! Every literal the backend contract depends on lives here: endpoint paths,
//! cookie names, OTP lengths, countdown timing. If the backend team renames a
//! route, this is the only file that should change.
//!
//! Runtime knobs (base URL, timeouts) live in [`ClientConfig`], which can be
//! built from the environment or assembled by hand in tests.

use std::env;
use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Backend Endpoints
// ---------------------------------------------------------------------------

/// Default backend base URL when nothing is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://backend-five-wine-57.vercel.app";

/// Sign-in endpoint. Returns an access/refresh token pair.
pub const LOGIN_PATH: &str = "/login/";

/// Profile of the signed-in user.
pub const PROFILE_PATH: &str = "/profile/";

/// Bank accounts owned by the signed-in user.
pub const ACCOUNTS_PATH: &str = "/accounts/";

/// Creates an unconfirmed local transfer.
pub const LOCAL_TRANSFER_PATH: &str = "/local-transfer/";

/// Prefix of the OTP validation endpoint. The full path is
/// `/validate-local-transfer/{transfer_id}/`, with the id as one
/// percent-encoded segment.
pub const VALIDATE_TRANSFER_PATH_PREFIX: &str = "/validate-local-transfer/";

/// Registration of a new user.
pub const REGISTER_PATH: &str = "/register/";

/// Transactions of every account, grouped per account.
pub const TRANSACTIONS_PATH: &str = "/transactions/";

// ---------------------------------------------------------------------------
// Transfer Literals
// ---------------------------------------------------------------------------

/// Every local transfer debits the source account.
pub const LOCAL_TRANSFER_TRANSACTION_TYPE: &str = "DEBIT";

/// Title the backend expects on local transfers.
pub const LOCAL_TRANSFER_TITLE: &str = "local_transfer";

// ---------------------------------------------------------------------------
// Session Cookies
// ---------------------------------------------------------------------------

/// Cookie carrying the short-lived access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

// ---------------------------------------------------------------------------
// OTP Challenge
// ---------------------------------------------------------------------------

/// Shortest code we are willing to send to the backend.
pub const OTP_MIN_LENGTH: usize = 4;

/// Longest code the input surface accepts. Extra digits are dropped.
pub const OTP_MAX_LENGTH: usize = 6;

/// Seconds on the clock when a challenge opens.
pub const OTP_COUNTDOWN_SECS: u32 = 60;

/// Countdown granularity.
pub const OTP_TICK: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Per-request timeout. The backend is a serverless deployment and cold
/// starts can take a few seconds, so this is generous.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("ledgerline/", env!("CARGO_PKG_VERSION"));

/// Environment variable overriding [`DEFAULT_API_BASE_URL`].
pub const ENV_API_BASE_URL: &str = "LEDGERLINE_API_BASE_URL";

/// Environment variable overriding [`DEFAULT_HTTP_TIMEOUT`], in seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "LEDGERLINE_HTTP_TIMEOUT_SECS";

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric variable did not parse.
    #[error("invalid value for {name}: {value}")]
    InvalidNumber {
        /// Variable name.
        name: &'static str,
        /// The raw value found.
        value: String,
    },
}

/// Countdown parameters for OTP challenges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownConfig {
    /// Starting value, in ticks.
    pub start: u32,
    /// Length of one tick.
    pub tick: Duration,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            start: OTP_COUNTDOWN_SECS,
            tick: OTP_TICK,
        }
    }
}

/// Runtime configuration for [`crate::api::BankApiClient`] and the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// OTP countdown parameters.
    pub countdown: CountdownConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: DEFAULT_HTTP_TIMEOUT,
            countdown: CountdownConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a config pointing at `base_url` with default timings.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Reads the configuration from `LEDGERLINE_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var(ENV_API_BASE_URL).unwrap_or_else(|_| DEFAULT_API_BASE_URL.into());

        let request_timeout = match env::var(ENV_HTTP_TIMEOUT_SECS) {
            Ok(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidNumber {
                        name: ENV_HTTP_TIMEOUT_SECS,
                        value: raw.clone(),
                    })?;
                Duration::from_secs(secs)
            }
            Err(_) => DEFAULT_HTTP_TIMEOUT,
        };

        Ok(Self {
            request_timeout,
            ..Self::with_base_url(base_url)
        })
    }
}
