//! Notifications published by the confirmation flow.
//!
//! Each event maps onto a short user-facing [`Notice`], which is what a
//! front-end shows as a toast or status line.

use crate::transfer::TransferId;

/// Capacity of the event channel. Slow subscribers lag instead of blocking.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Something the user should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// A transfer was created and its OTP challenge opened.
    TransferInitiated { transfer_id: TransferId },
    /// Creating the transfer failed; the request is still loaded.
    InitiationFailed { message: String },
    /// A code was rejected, locally or by the backend. The challenge is
    /// still open.
    VerificationFailed {
        transfer_id: TransferId,
        message: String,
    },
    /// The backend accepted the code.
    TransferConfirmed { transfer_id: TransferId },
    /// The challenge was dismissed without confirming.
    ChallengeClosed { transfer_id: TransferId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// Title and body of a user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: &'static str,
    pub description: String,
}

impl FlowEvent {
    pub fn notice(&self) -> Notice {
        match self {
            FlowEvent::TransferInitiated { .. } => Notice {
                kind: NoticeKind::Info,
                title: "Transfer initiated",
                description: "Please verify with the OTP sent to your registered contact.".into(),
            },
            FlowEvent::InitiationFailed { message } => Notice {
                kind: NoticeKind::Error,
                title: "Error",
                description: message.clone(),
            },
            FlowEvent::VerificationFailed { message, .. } => Notice {
                kind: NoticeKind::Error,
                title: "Verification failed",
                description: message.clone(),
            },
            FlowEvent::TransferConfirmed { .. } => Notice {
                kind: NoticeKind::Success,
                title: "Transfer successful",
                description: "Your funds have been transferred successfully.".into(),
            },
            FlowEvent::ChallengeClosed { transfer_id } => Notice {
                kind: NoticeKind::Info,
                title: "Transfer not confirmed",
                description: format!("Transfer {transfer_id} is awaiting confirmation."),
            },
        }
    }

    /// The transfer this event is about, if one exists yet.
    pub fn transfer_id(&self) -> Option<&TransferId> {
        match self {
            FlowEvent::TransferInitiated { transfer_id }
            | FlowEvent::VerificationFailed { transfer_id, .. }
            | FlowEvent::TransferConfirmed { transfer_id }
            | FlowEvent::ChallengeClosed { transfer_id } => Some(transfer_id),
            FlowEvent::InitiationFailed { .. } => None,
        }
    }
}
