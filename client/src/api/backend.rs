//! The seam between the confirmation flow and the network.
//!
//! The flow only needs two backend operations. Putting them behind a trait
//! lets the state machines run against a scripted backend in tests and
//! against [`BankApiClient`] everywhere else.

use async_trait::async_trait;

use super::client::BankApiClient;
use super::dto::{CreateLocalTransferBody, LocalTransferCreated};
use super::error::ApiError;
use crate::session::SessionCredentials;
use crate::transfer::TransferId;

/// Backend operations used by transfer initiation and OTP confirmation.
#[async_trait]
pub trait TransferBackend: Send + Sync {
    /// Creates an unconfirmed transfer and returns its id.
    async fn create_local_transfer(
        &self,
        credentials: &SessionCredentials,
        body: &CreateLocalTransferBody,
    ) -> Result<LocalTransferCreated, ApiError>;

    /// Confirms a pending transfer with a one-time code.
    async fn validate_local_transfer(
        &self,
        credentials: &SessionCredentials,
        transfer_id: &TransferId,
        otp: &str,
    ) -> Result<(), ApiError>;
}

#[async_trait]
impl TransferBackend for BankApiClient {
    async fn create_local_transfer(
        &self,
        credentials: &SessionCredentials,
        body: &CreateLocalTransferBody,
    ) -> Result<LocalTransferCreated, ApiError> {
        BankApiClient::create_local_transfer(self, credentials, body).await
    }

    async fn validate_local_transfer(
        &self,
        credentials: &SessionCredentials,
        transfer_id: &TransferId,
        otp: &str,
    ) -> Result<(), ApiError> {
        BankApiClient::validate_local_transfer(self, credentials, transfer_id, otp).await
    }
}
