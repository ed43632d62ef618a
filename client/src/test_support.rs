//! In-memory [`TransferBackend`] for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::Map;

use crate::api::{ApiError, CreateLocalTransferBody, LocalTransferCreated, TransferBackend};
use crate::session::SessionCredentials;
use crate::transfer::{PendingTransfer, TransferId, TransferRequest};

/// Answers from queued results; with an empty queue, creation hands out
/// sequential ids and validation succeeds.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    create_results: Mutex<VecDeque<Result<LocalTransferCreated, ApiError>>>,
    validate_results: Mutex<VecDeque<Result<(), ApiError>>>,
    create_calls: Mutex<Vec<CreateLocalTransferBody>>,
    validate_calls: Mutex<Vec<(TransferId, String)>>,
    next_id: AtomicU64,
    hold_validation: AtomicBool,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ..Self::default()
        }
    }

    pub(crate) fn backend_error(status: u16, message: &str) -> ApiError {
        ApiError::Backend {
            status: StatusCode::from_u16(status).unwrap(),
            message: message.to_string(),
        }
    }

    pub(crate) fn created(id: u64) -> LocalTransferCreated {
        LocalTransferCreated {
            transfer_id: TransferId::from(id),
            extra: Map::new(),
        }
    }

    pub(crate) fn push_create(&self, result: Result<LocalTransferCreated, ApiError>) {
        self.create_results.lock().push_back(result);
    }

    pub(crate) fn push_validate(&self, result: Result<(), ApiError>) {
        self.validate_results.lock().push_back(result);
    }

    /// Validation calls never complete from now on.
    pub(crate) fn hold_validation(&self) {
        self.hold_validation.store(true, Ordering::SeqCst);
    }

    pub(crate) fn create_calls(&self) -> Vec<CreateLocalTransferBody> {
        self.create_calls.lock().clone()
    }

    pub(crate) fn validate_calls(&self) -> Vec<(TransferId, String)> {
        self.validate_calls.lock().clone()
    }
}

#[async_trait]
impl TransferBackend for ScriptedBackend {
    async fn create_local_transfer(
        &self,
        credentials: &SessionCredentials,
        body: &CreateLocalTransferBody,
    ) -> Result<LocalTransferCreated, ApiError> {
        if !credentials.is_authenticated() {
            return Err(ApiError::Unauthorized);
        }
        self.create_calls.lock().push(body.clone());
        let scripted = self.create_results.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(Self::created(self.next_id.fetch_add(1, Ordering::SeqCst))))
    }

    async fn validate_local_transfer(
        &self,
        credentials: &SessionCredentials,
        transfer_id: &TransferId,
        otp: &str,
    ) -> Result<(), ApiError> {
        if !credentials.is_authenticated() {
            return Err(ApiError::Unauthorized);
        }
        self.validate_calls
            .lock()
            .push((transfer_id.clone(), otp.to_string()));
        if self.hold_validation.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let scripted = self.validate_results.lock().pop_front();
        scripted.unwrap_or(Ok(()))
    }
}

pub(crate) fn sample_request() -> TransferRequest {
    TransferRequest::builder()
        .source_account(11)
        .amount("5.00")
        .note("rent share")
        .recipient_email("jane@example.com")
        .recipient_bank("Ally Bank")
        .recipient_account_number("0123456789")
        .recipient_routing_number("021000021")
        .build()
        .unwrap()
}

pub(crate) fn pending_transfer(id: &str) -> PendingTransfer {
    PendingTransfer::new(TransferId::new(id), sample_request())
}
