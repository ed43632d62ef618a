//! # OTP Challenge State Machine
//!
//! ```text
//!            open()                 submit() (code ≥ 4)
//!   ┌──────┐ ──────► ┌────────┐ ──────────────────► ┌───────────┐
//!   │ Idle │         │ Active │                     │ Verifying │
//!   └──────┘ ◄────── └────────┘ ◄────────────────── └─────┬─────┘
//!      ▲     close()      │        backend error          │ backend ok
//!      │                  │ submit() (code < 4):          ▼
//!      │                  │ rejected locally        ┌──────────┐
//!      └──────────────────┴──────── close() ─────── │ Resolved │
//!                                                   └──────────┘
//! ```
//!
//! Opening a challenge resets every field and starts a fresh countdown.
//! Failure keeps the countdown running where it was. Every way out of the
//! challenge (close, success, drop) stops the countdown.
//!
//! Submission takes `&mut self`, so a second verification cannot start while
//! one is in flight. If the in-flight future is dropped before the backend
//! answers, the challenge falls back to `Active`.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::code::OtpCode;
use super::countdown::{Countdown, CountdownState};
use crate::api::{ApiError, TransferBackend};
use crate::config::CountdownConfig;
use crate::session::SessionCredentials;
use crate::transfer::{PendingTransfer, TransferId};

/// Shown when a code is too short to submit.
pub const INVALID_CODE_MESSAGE: &str = "Please enter a valid OTP code";

/// Shown when the backend rejects a code without saying why.
pub const VERIFY_FALLBACK_MESSAGE: &str = "Failed to verify OTP. Please try again.";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Where the challenge is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengePhase {
    /// Closed. Nothing is running.
    Idle,
    /// Open and accepting input; countdown running (or already at zero).
    Active,
    /// A verification call is in flight.
    Verifying,
    /// The backend accepted the code.
    Resolved,
}

impl fmt::Display for ChallengePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Active => write!(f, "Active"),
            Self::Verifying => write!(f, "Verifying"),
            Self::Resolved => write!(f, "Resolved"),
        }
    }
}

/// Everything a front-end needs to render the challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallengeState {
    pub phase: ChallengePhase,
    pub code: OtpCode,
    pub remaining_seconds: u32,
    pub resend_eligible: bool,
    pub attempt_in_flight: bool,
    /// Message from the last rejected submit, if any.
    pub error: Option<String>,
}

/// Proof that the backend confirmed a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub transfer_id: TransferId,
    pub confirmed_at: DateTime<Utc>,
    /// Countdown value at the moment of confirmation.
    pub remaining_seconds: u32,
}

/// Invoked once when the backend accepts a code.
pub type SuccessCallback = Box<dyn FnOnce(&Confirmation) + Send>;

/// Reasons a submit did not confirm the transfer.
#[derive(Debug, Error)]
pub enum ChallengeError {
    /// Fewer than the minimum number of digits. Nothing was sent.
    #[error("{}", INVALID_CODE_MESSAGE)]
    CodeTooShort { length: usize },

    /// The challenge is closed or already resolved.
    #[error("no open challenge (phase: {phase})")]
    NotOpen { phase: ChallengePhase },

    /// A verification call is already in flight.
    #[error("verification already in progress")]
    InFlight,

    /// The backend refused the code. `message` is what the user should see.
    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        source: ApiError,
    },
}

impl ChallengeError {
    /// Non-fatal text for the user.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Whether this failure happened without any network traffic.
    pub fn is_local(&self) -> bool {
        !matches!(self, ChallengeError::Rejected { .. })
    }
}

// ---------------------------------------------------------------------------
// Challenge
// ---------------------------------------------------------------------------

/// A timed one-time-code challenge bound to one pending transfer at a time.
pub struct OtpChallenge<B: ?Sized> {
    backend: Arc<B>,
    countdown_config: CountdownConfig,
    phase: ChallengePhase,
    pending: Option<PendingTransfer>,
    code: OtpCode,
    error: Option<String>,
    countdown: Option<Countdown>,
    on_success: Option<SuccessCallback>,
}

impl<B: TransferBackend + ?Sized> OtpChallenge<B> {
    /// A closed challenge.
    pub fn new(backend: Arc<B>, countdown_config: CountdownConfig) -> Self {
        Self {
            backend,
            countdown_config,
            phase: ChallengePhase::Idle,
            pending: None,
            code: OtpCode::default(),
            error: None,
            countdown: None,
            on_success: None,
        }
    }

    /// Opens the challenge for `pending`, replacing whatever was open.
    ///
    /// Must be called inside a Tokio runtime (the countdown is a task).
    pub fn open(&mut self, pending: PendingTransfer) {
        self.open_inner(pending, None);
    }

    /// Like [`Self::open`], with a callback fired on successful verification.
    pub fn open_with_callback<F>(&mut self, pending: PendingTransfer, on_success: F)
    where
        F: FnOnce(&Confirmation) + Send + 'static,
    {
        self.open_inner(pending, Some(Box::new(on_success)));
    }

    fn open_inner(&mut self, pending: PendingTransfer, on_success: Option<SuccessCallback>) {
        self.close();
        debug!(transfer_id = %pending.id(), "opening otp challenge");
        self.pending = Some(pending);
        self.countdown = Some(Countdown::start(self.countdown_config));
        self.on_success = on_success;
        self.phase = ChallengePhase::Active;
    }

    /// Replaces the typed code with the sanitized `raw` input. Ignored unless
    /// the challenge is `Active`.
    pub fn input(&mut self, raw: &str) -> bool {
        if self.phase != ChallengePhase::Active {
            return false;
        }
        self.code = OtpCode::sanitize(raw);
        true
    }

    /// Submits the current code.
    pub async fn submit(
        &mut self,
        credentials: &SessionCredentials,
    ) -> Result<Confirmation, ChallengeError> {
        match self.phase {
            ChallengePhase::Active => {}
            ChallengePhase::Verifying => return Err(ChallengeError::InFlight),
            phase => return Err(ChallengeError::NotOpen { phase }),
        }

        if !self.code.is_submittable() {
            self.error = Some(INVALID_CODE_MESSAGE.to_string());
            debug!(length = self.code.len(), "otp rejected locally");
            return Err(ChallengeError::CodeTooShort {
                length: self.code.len(),
            });
        }

        let transfer_id = match &self.pending {
            Some(pending) => pending.id().clone(),
            None => {
                return Err(ChallengeError::NotOpen { phase: self.phase });
            }
        };

        self.error = None;
        self.phase = ChallengePhase::Verifying;
        let backend = Arc::clone(&self.backend);
        let code = self.code.as_str().to_string();
        debug!(transfer_id = %transfer_id, "verifying otp");

        let result = {
            let _guard = InFlightGuard(&mut self.phase);
            backend
                .validate_local_transfer(credentials, &transfer_id, &code)
                .await
        };

        match result {
            Ok(()) => {
                let remaining_seconds = self.countdown_state().remaining_seconds;
                self.phase = ChallengePhase::Resolved;
                if let Some(countdown) = self.countdown.as_mut() {
                    countdown.cancel();
                }

                let confirmation = Confirmation {
                    transfer_id,
                    confirmed_at: Utc::now(),
                    remaining_seconds,
                };
                info!(
                    transfer_id = %confirmation.transfer_id,
                    remaining_seconds,
                    "transfer confirmed"
                );
                if let Some(callback) = self.on_success.take() {
                    callback(&confirmation);
                }
                Ok(confirmation)
            }
            Err(source) => {
                let message = source.user_message(VERIFY_FALLBACK_MESSAGE);
                warn!(transfer_id = %transfer_id, error = %source, "otp verification failed");
                self.error = Some(message.clone());
                Err(ChallengeError::Rejected { message, source })
            }
        }
    }

    /// Closes the challenge: `Idle`, fields cleared, countdown stopped.
    /// Returns the pending transfer that was open, if any.
    pub fn close(&mut self) -> Option<PendingTransfer> {
        if let Some(mut countdown) = self.countdown.take() {
            countdown.cancel();
        }
        if self.phase != ChallengePhase::Idle {
            debug!(phase = %self.phase, "closing otp challenge");
        }
        self.phase = ChallengePhase::Idle;
        self.code.clear();
        self.error = None;
        self.on_success = None;
        self.pending.take()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> ChallengePhase {
        self.phase
    }

    /// The transfer being confirmed.
    pub fn pending(&self) -> Option<&PendingTransfer> {
        self.pending.as_ref()
    }

    /// Message from the last rejected submit, until the next backend attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the countdown task is still alive.
    pub fn countdown_running(&self) -> bool {
        self.countdown.as_ref().is_some_and(Countdown::is_running)
    }

    /// A receiver notified on every countdown tick, while open.
    pub fn subscribe_countdown(&self) -> Option<watch::Receiver<CountdownState>> {
        self.countdown.as_ref().map(Countdown::subscribe)
    }

    /// Render-ready snapshot.
    pub fn state(&self) -> OtpChallengeState {
        let countdown = self.countdown_state();
        OtpChallengeState {
            phase: self.phase,
            code: self.code.clone(),
            remaining_seconds: countdown.remaining_seconds,
            resend_eligible: countdown.resend_eligible,
            attempt_in_flight: self.phase == ChallengePhase::Verifying,
            error: self.error.clone(),
        }
    }

    fn countdown_state(&self) -> CountdownState {
        self.countdown.as_ref().map(Countdown::state).unwrap_or(CountdownState {
            remaining_seconds: 0,
            resend_eligible: false,
        })
    }
}

/// Puts the challenge back to `Active` if a verification future is dropped
/// before the backend answers.
struct InFlightGuard<'a>(&'a mut ChallengePhase);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if *self.0 == ChallengePhase::Verifying {
            *self.0 = ChallengePhase::Active;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
