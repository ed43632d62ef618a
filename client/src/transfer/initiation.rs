//! Transfer initiation: turns a validated request into a pending transfer.
//!
//! One submit is one backend write. Nothing here retries on its own; a failed
//! request stays loaded so the user can press submit again.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::pending::PendingTransfer;
use super::request::TransferRequest;
use crate::api::{ApiError, CreateLocalTransferBody, TransferBackend};
use crate::session::SessionCredentials;

/// Message shown when the backend gives nothing better.
pub const INITIATION_FALLBACK_MESSAGE: &str = "An unexpected error occurred.";

/// Why a transfer could not be created.
#[derive(Debug, Error)]
pub enum InitiationError {
    /// `retry` was called with nothing loaded.
    #[error("no transfer request to retry")]
    NothingToRetry,

    /// The backend call failed. `message` is what the user should see.
    #[error("{message}")]
    Backend {
        message: String,
        #[source]
        source: ApiError,
    },
}

impl InitiationError {
    /// Non-fatal text for the user.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Submits transfer requests and keeps the last one loaded for retry.
pub struct TransferInitiation<B: ?Sized> {
    backend: Arc<B>,
    loaded: Option<TransferRequest>,
    last_error: Option<String>,
}

impl<B: TransferBackend + ?Sized> TransferInitiation<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            loaded: None,
            last_error: None,
        }
    }

    /// Submits `request`. It stays loaded whatever the outcome, until
    /// [`Self::reset`].
    pub async fn submit(
        &mut self,
        credentials: &SessionCredentials,
        request: TransferRequest,
    ) -> Result<PendingTransfer, InitiationError> {
        self.loaded = Some(request.clone());
        self.send(credentials, request).await
    }

    /// Resubmits the loaded request. This is the manual retry path.
    pub async fn retry(
        &mut self,
        credentials: &SessionCredentials,
    ) -> Result<PendingTransfer, InitiationError> {
        let request = self.loaded.clone().ok_or(InitiationError::NothingToRetry)?;
        self.send(credentials, request).await
    }

    /// The request currently loaded, if any.
    pub fn loaded(&self) -> Option<&TransferRequest> {
        self.loaded.as_ref()
    }

    /// Message from the last failed submit, cleared by the next attempt.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Clears the loaded request and any error ("form reset").
    pub fn reset(&mut self) {
        self.loaded = None;
        self.last_error = None;
    }

    async fn send(
        &mut self,
        credentials: &SessionCredentials,
        request: TransferRequest,
    ) -> Result<PendingTransfer, InitiationError> {
        self.last_error = None;
        let body = CreateLocalTransferBody::from_request(&request);

        match self.backend.create_local_transfer(credentials, &body).await {
            Ok(created) => {
                info!(
                    transfer_id = %created.transfer_id,
                    account = request.source_account_id(),
                    amount = %request.amount(),
                    "transfer created, awaiting confirmation"
                );
                Ok(PendingTransfer::new(created.transfer_id, request))
            }
            Err(source) => {
                let message = source.user_message(INITIATION_FALLBACK_MESSAGE);
                warn!(error = %source, account = request.source_account_id(), "transfer creation failed");
                self.last_error = Some(message.clone());
                Err(InitiationError::Backend { message, source })
            }
        }
    }
}
