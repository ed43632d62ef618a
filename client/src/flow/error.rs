use thiserror::Error;

use crate::otp::ChallengeError;
use crate::transfer::InitiationError;

/// Errors surfaced by [`super::TransferConfirmationFlow`]. None of them end
/// the flow; each has a message meant for the user.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A challenge is open; resolve or cancel it before starting another
    /// transfer.
    #[error("a transfer is already awaiting confirmation")]
    ChallengeInProgress,

    /// There is no open challenge to submit a code to.
    #[error("no transfer is awaiting confirmation")]
    NoPendingTransfer,

    #[error(transparent)]
    Initiation(#[from] InitiationError),

    #[error(transparent)]
    Challenge(#[from] ChallengeError),
}

impl FlowError {
    /// Non-fatal text for the user.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
