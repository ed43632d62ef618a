//! `reqwest`-based client for the banking backend.
//!
//! One method per endpoint. Every authenticated method takes the caller's
//! [`SessionCredentials`] explicitly and refuses to send anything when the
//! access token is missing.

use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::dto::{
    flatten_transactions, AccountTransactions, AccountsSummary, BankAccount,
    CreateLocalTransferBody, LocalTransferCreated, LoginRequest, LoginResponse, SignUpRequest,
    SignUpResponse, Transaction, UserProfile, ValidateOtpBody,
};
use super::error::{extract_error_message, ApiError};
use crate::config::{self, ClientConfig};
use crate::session::SessionCredentials;
use crate::transfer::TransferId;

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shown when registration answers 2xx without a user.
pub const SIGN_UP_FAILED_MESSAGE: &str = "Error creating user.";

/// How much of an error body ends up in the logs.
const LOGGED_BODY_CHARS: usize = 200;

/// Typed HTTP client for the banking backend.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone, Debug)]
pub struct BankApiClient {
    http: Client,
    base_url: Url,
}

impl BankApiClient {
    /// Builds a client with its own connection pool from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Self::with_http(http, &config.base_url)
    }

    /// Builds a client around an existing `reqwest::Client`.
    pub fn with_http(http: Client, base_url: &str) -> Result<Self, ApiError> {
        // `Url::join` drops the last path segment unless the base ends in '/'.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self { http, base_url })
    }

    /// The backend root every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Endpoints
    // -----------------------------------------------------------------------

    /// `POST /login/`: exchanges email and password for a token pair.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionCredentials, ApiError> {
        let request = self
            .request(Method::POST, self.endpoint(config::LOGIN_PATH)?)
            .json(&LoginRequest { email, password });

        let response = request.send().await?;
        let status = response.status();
        let body: LoginResponse = Self::decode(response, "sign_in").await?;

        match body.access {
            Some(access) if !access.is_empty() => Ok(SessionCredentials::new(
                access,
                body.refresh.unwrap_or_default(),
            )),
            _ => {
                warn!("login response carried no access token");
                Err(ApiError::Backend {
                    status,
                    message: "Invalid login credentials.".into(),
                })
            }
        }
    }

    /// `POST /register/`: creates a user. The caller signs in afterwards;
    /// no session is returned.
    pub async fn sign_up(&self, new_user: &SignUpRequest<'_>) -> Result<UserProfile, ApiError> {
        let request = self
            .request(Method::POST, self.endpoint(config::REGISTER_PATH)?)
            .json(new_user);

        let response = request.send().await?;
        let status = response.status();
        let body: SignUpResponse = Self::decode(response, "sign_up").await?;

        match body.user {
            Some(Value::Null) | None => {
                warn!("registration response carried no user");
                Err(ApiError::Backend {
                    status,
                    message: SIGN_UP_FAILED_MESSAGE.into(),
                })
            }
            Some(user) => Ok(serde_json::from_value(user).unwrap_or_else(|_| UserProfile {
                email: Some(new_user.email.to_string()),
                ..UserProfile::default()
            })),
        }
    }

    /// `GET /profile/`: the signed-in user.
    pub async fn profile(&self, credentials: &SessionCredentials) -> Result<UserProfile, ApiError> {
        let request = self.authorized(Method::GET, config::PROFILE_PATH, credentials)?;
        Self::decode(request.send().await?, "profile").await
    }

    /// `GET /accounts/`: the user's accounts with dashboard totals.
    pub async fn list_accounts(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<AccountsSummary, ApiError> {
        let request = self.authorized(Method::GET, config::ACCOUNTS_PATH, credentials)?;
        let accounts: Vec<BankAccount> = Self::decode(request.send().await?, "list_accounts").await?;
        Ok(AccountsSummary::from_accounts(accounts))
    }

    /// `GET /transactions/`: every account's transactions in one feed,
    /// newest first.
    pub async fn list_transactions(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Vec<Transaction>, ApiError> {
        let request = self.authorized(Method::GET, config::TRANSACTIONS_PATH, credentials)?;
        let groups: Vec<AccountTransactions> =
            Self::decode(request.send().await?, "list_transactions").await?;
        Ok(flatten_transactions(groups))
    }

    /// `POST /local-transfer/`: creates an unconfirmed transfer.
    pub async fn create_local_transfer(
        &self,
        credentials: &SessionCredentials,
        body: &CreateLocalTransferBody,
    ) -> Result<LocalTransferCreated, ApiError> {
        let request = self
            .authorized(Method::POST, config::LOCAL_TRANSFER_PATH, credentials)?
            .json(body);
        Self::decode(request.send().await?, "create_local_transfer").await
    }

    /// `POST /validate-local-transfer/{id}/`: confirms a transfer with the
    /// one-time code. Any 2xx is success; the body is ignored.
    pub async fn validate_local_transfer(
        &self,
        credentials: &SessionCredentials,
        transfer_id: &TransferId,
        otp: &str,
    ) -> Result<(), ApiError> {
        let url = self.validation_endpoint(transfer_id)?;
        let request = self
            .authorized_url(Method::POST, url, credentials)?
            .json(&ValidateOtpBody { otp });
        Self::check(request.send().await?, "validate_local_transfer").await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    /// `/validate-local-transfer/{id}/` with the id percent-encoded as a
    /// single path segment.
    fn validation_endpoint(&self, transfer_id: &TransferId) -> Result<Url, ApiError> {
        let id = transfer_id.as_str();
        let invalid = || ApiError::InvalidUrl(format!("transfer id {id:?} is not a path segment"));
        // `push` silently skips dot segments.
        if matches!(id, "." | "..") {
            return Err(invalid());
        }

        let mut url = self.endpoint(config::VALIDATE_TRANSFER_PATH_PREFIX)?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push(id)
            .push("");
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        debug!(%method, %url, request_id = %request_id, "backend request");

        let mut builder = self
            .http
            .request(method, url)
            .header(USER_AGENT, HeaderValue::from_static(config::USER_AGENT));
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            builder = builder.header(REQUEST_ID_HEADER, value);
        }
        builder
    }

    fn authorized(
        &self,
        method: Method,
        path: &str,
        credentials: &SessionCredentials,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        self.authorized_url(method, url, credentials)
    }

    fn authorized_url(
        &self,
        method: Method,
        url: Url,
        credentials: &SessionCredentials,
    ) -> Result<RequestBuilder, ApiError> {
        let token = credentials.access_token().ok_or_else(|| {
            warn!(path = url.path(), "refusing authenticated call without an access token");
            ApiError::Unauthorized
        })?;
        Ok(self.request(method, url).bearer_auth(token))
    }

    /// Turns a non-2xx response into [`ApiError::Backend`]; passes the body
    /// text through otherwise.
    async fn check(response: Response, operation: &'static str) -> Result<String, ApiError> {
        let status = response.status();
        let body_text = response.text().await?;

        if status.is_success() {
            return Ok(body_text);
        }

        let message = serde_json::from_str(&body_text)
            .ok()
            .and_then(|value| extract_error_message(&value))
            .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

        warn!(
            operation,
            http_status = status.as_u16(),
            response = %body_text.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
            "backend rejected request"
        );

        Err(ApiError::Backend { status, message })
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        operation: &'static str,
    ) -> Result<T, ApiError> {
        let body_text = Self::check(response, operation).await?;
        serde_json::from_str(&body_text).map_err(|e| {
            error!(
                operation,
                error = %e,
                response = %body_text.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
                "invalid JSON from backend"
            );
            ApiError::Decode(e.to_string())
        })
    }
}
