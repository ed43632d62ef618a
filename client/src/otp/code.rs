//! The digits typed into the challenge.

use std::fmt;

use crate::config::{OTP_MAX_LENGTH, OTP_MIN_LENGTH};

/// A numeric one-time code, at most [`OTP_MAX_LENGTH`] digits.
///
/// Input is sanitized on the way in: anything that is not an ASCII digit is
/// dropped and the result is cut to the maximum length, the same way a
/// numeric input box with a `maxLength` behaves.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Sanitizes raw input into a code.
    pub fn sanitize(input: &str) -> Self {
        Self(
            input
                .chars()
                .filter(|c| c.is_ascii_digit())
                .take(OTP_MAX_LENGTH)
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Long enough to be worth a round-trip.
    pub fn is_submittable(&self) -> bool {
        self.0.len() >= OTP_MIN_LENGTH
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

// Codes show up in logs via `?state`; keep the digits out of them.
impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OtpCode({} digits)", self.0.len())
    }
}
