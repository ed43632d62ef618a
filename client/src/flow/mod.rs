//! # Confirmation Flow
//!
//! The composition a front-end talks to: one initiation, one OTP challenge,
//! one stream of [`FlowEvent`]s.

pub mod confirmation;
pub mod error;
pub mod events;

pub use confirmation::{FlowState, TransferConfirmationFlow};
pub use error::FlowError;
pub use events::{FlowEvent, Notice, NoticeKind, EVENT_CHANNEL_CAPACITY};
