//! # Transfer Confirmation Flow
//!
//! Ties [`TransferInitiation`] and [`OtpChallenge`] together for one user:
//!
//! 1. `initiate` creates the transfer and opens the challenge.
//! 2. `enter_code` / `confirm` drive the challenge.
//! 3. On confirmation the loaded request and the pending transfer are both
//!    discarded, leaving the flow ready for the next transfer.
//!
//! Every step publishes a [`FlowEvent`]; the return values carry the same
//! information for callers that prefer not to subscribe.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::debug;

use super::error::FlowError;
use super::events::{FlowEvent, EVENT_CHANNEL_CAPACITY};
use crate::api::TransferBackend;
use crate::config::CountdownConfig;
use crate::metrics::FlowMetrics;
use crate::otp::{
    ChallengeError, ChallengePhase, Confirmation, CountdownState, OtpChallenge, OtpChallengeState,
};
use crate::session::SessionCredentials;
use crate::transfer::{
    InitiationError, PendingTransfer, TransferId, TransferInitiation, TransferRequest,
};

/// Snapshot of the whole flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowState {
    /// The request kept for retry, if any.
    pub loaded_request: Option<TransferRequest>,
    /// Message from the last failed initiation.
    pub initiation_error: Option<String>,
    pub challenge: OtpChallengeState,
}

/// One user's transfer confirmation session.
pub struct TransferConfirmationFlow<B: ?Sized> {
    credentials: SessionCredentials,
    initiation: TransferInitiation<B>,
    challenge: OtpChallenge<B>,
    events: broadcast::Sender<FlowEvent>,
    metrics: Option<FlowMetrics>,
}

impl<B: TransferBackend + ?Sized> TransferConfirmationFlow<B> {
    /// An idle flow acting on behalf of `credentials`.
    pub fn new(backend: Arc<B>, credentials: SessionCredentials, countdown: CountdownConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            credentials,
            initiation: TransferInitiation::new(Arc::clone(&backend)),
            challenge: OtpChallenge::new(backend, countdown),
            events,
            metrics: None,
        }
    }

    /// Records counters and backend latency into `metrics`.
    pub fn with_metrics(mut self, metrics: FlowMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Swaps the credentials used for subsequent backend calls.
    pub fn set_credentials(&mut self, credentials: SessionCredentials) {
        self.credentials = credentials;
    }

    /// Events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.events.subscribe()
    }

    // -----------------------------------------------------------------------
    // Initiation
    // -----------------------------------------------------------------------

    /// Creates a transfer for `request` and opens its OTP challenge.
    pub async fn initiate(&mut self, request: TransferRequest) -> Result<TransferId, FlowError> {
        self.ensure_no_open_challenge()?;
        let started = Instant::now();
        let result = self.initiation.submit(&self.credentials, request).await;
        self.after_initiation(result, started)
    }

    /// Resubmits the request kept from the last initiation.
    pub async fn retry(&mut self) -> Result<TransferId, FlowError> {
        self.ensure_no_open_challenge()?;
        let started = Instant::now();
        let result = self.initiation.retry(&self.credentials).await;
        self.after_initiation(result, started)
    }

    fn ensure_no_open_challenge(&self) -> Result<(), FlowError> {
        match self.challenge.phase() {
            ChallengePhase::Idle => Ok(()),
            phase => {
                debug!(%phase, "initiation refused, challenge still open");
                Err(FlowError::ChallengeInProgress)
            }
        }
    }

    fn after_initiation(
        &mut self,
        result: Result<PendingTransfer, InitiationError>,
        started: Instant,
    ) -> Result<TransferId, FlowError> {
        match result {
            Ok(pending) => {
                self.observe_backend_latency(started);
                let transfer_id = pending.id().clone();

                let events = self.events.clone();
                self.challenge.open_with_callback(pending, move |confirmation| {
                    let _ = events.send(FlowEvent::TransferConfirmed {
                        transfer_id: confirmation.transfer_id.clone(),
                    });
                });

                if let Some(metrics) = &self.metrics {
                    metrics.transfers_initiated_total.inc();
                }
                self.emit(FlowEvent::TransferInitiated {
                    transfer_id: transfer_id.clone(),
                });
                Ok(transfer_id)
            }
            Err(err) => {
                if let InitiationError::Backend { .. } = err {
                    self.observe_backend_latency(started);
                    if let Some(metrics) = &self.metrics {
                        metrics.initiation_failures_total.inc();
                    }
                }
                self.emit(FlowEvent::InitiationFailed {
                    message: err.user_message(),
                });
                Err(err.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Challenge
    // -----------------------------------------------------------------------

    /// Replaces the typed code. Returns `false` when no challenge is open.
    pub fn enter_code(&mut self, raw: &str) -> bool {
        self.challenge.input(raw)
    }

    /// Submits the typed code.
    pub async fn confirm(&mut self) -> Result<Confirmation, FlowError> {
        let transfer_id = match (self.challenge.phase(), self.challenge.pending()) {
            (ChallengePhase::Active, Some(pending)) => pending.id().clone(),
            _ => return Err(FlowError::NoPendingTransfer),
        };

        let started = Instant::now();
        match self.challenge.submit(&self.credentials).await {
            Ok(confirmation) => {
                self.observe_backend_latency(started);
                if let Some(metrics) = &self.metrics {
                    metrics.otp_submissions_total.inc();
                    metrics.transfers_confirmed_total.inc();
                }
                // Form reset: nothing of this transfer survives.
                self.challenge.close();
                self.initiation.reset();
                Ok(confirmation)
            }
            Err(err) => {
                match &err {
                    ChallengeError::CodeTooShort { .. } => {
                        if let Some(metrics) = &self.metrics {
                            metrics.otp_local_rejections_total.inc();
                        }
                    }
                    ChallengeError::Rejected { .. } => {
                        self.observe_backend_latency(started);
                        if let Some(metrics) = &self.metrics {
                            metrics.otp_submissions_total.inc();
                            metrics.otp_verification_failures_total.inc();
                        }
                    }
                    ChallengeError::NotOpen { .. } | ChallengeError::InFlight => {}
                }
                self.emit(FlowEvent::VerificationFailed {
                    transfer_id,
                    message: err.user_message(),
                });
                Err(err.into())
            }
        }
    }

    /// Dismisses the open challenge. The request stays loaded for
    /// [`Self::retry`].
    pub fn cancel(&mut self) -> Option<PendingTransfer> {
        let discarded = self.challenge.close();
        if let Some(pending) = &discarded {
            self.emit(FlowEvent::ChallengeClosed {
                transfer_id: pending.id().clone(),
            });
        }
        discarded
    }

    /// Cancels any challenge and forgets the loaded request.
    pub fn reset(&mut self) {
        self.cancel();
        self.initiation.reset();
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Snapshot of the form and the challenge together.
    pub fn state(&self) -> FlowState {
        FlowState {
            loaded_request: self.initiation.loaded().cloned(),
            initiation_error: self.initiation.last_error().map(str::to_string),
            challenge: self.challenge.state(),
        }
    }

    /// Snapshot of the challenge alone.
    pub fn challenge_state(&self) -> OtpChallengeState {
        self.challenge.state()
    }

    /// The transfer awaiting confirmation.
    pub fn pending(&self) -> Option<&PendingTransfer> {
        self.challenge.pending()
    }

    /// Whether the challenge countdown is still ticking.
    pub fn countdown_running(&self) -> bool {
        self.challenge.countdown_running()
    }

    /// Countdown ticks of the open challenge.
    pub fn subscribe_countdown(&self) -> Option<watch::Receiver<CountdownState>> {
        self.challenge.subscribe_countdown()
    }

    fn emit(&self, event: FlowEvent) {
        debug!(?event, "flow event");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn observe_backend_latency(&self, started: Instant) {
        if let Some(metrics) = &self.metrics {
            metrics
                .backend_latency_seconds
                .observe(started.elapsed().as_secs_f64());
        }
    }
}
