//! # One-Time Password Confirmation
//!
//! ```text
//! code.rs      - sanitized digit input
//! countdown.rs - 60 s resend countdown, a cancellable tokio task
//! challenge.rs - Idle/Active/Verifying/Resolved state machine
//! ```

pub mod challenge;
pub mod code;
pub mod countdown;

pub use challenge::{
    ChallengeError, ChallengePhase, Confirmation, OtpChallenge, OtpChallengeState,
    SuccessCallback, INVALID_CODE_MESSAGE, VERIFY_FALLBACK_MESSAGE,
};
pub use code::OtpCode;
pub use countdown::{Countdown, CountdownState};
