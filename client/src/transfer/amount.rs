//! Money amounts in integer cents.
//!
//! User input arrives as decimal text ("5", "5.5", "5.00"). It is parsed
//! straight into cents and all arithmetic stays in cents. The transfer
//! endpoint takes its amount as a JSON number, so the conversion to a float
//! happens once, at serialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Fraction digits carried by every amount.
pub const DECIMALS: u32 = 2;

const CENTS_PER_UNIT: i64 = 100;

/// Reasons a piece of text is not a usable amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Empty or whitespace-only input.
    #[error("amount is required")]
    Empty,
    /// Not a decimal number.
    #[error("'{0}' is not a valid amount")]
    Malformed(String),
    /// More fraction digits than cents can hold.
    #[error("amount '{0}' has more than 2 decimal places")]
    TooPrecise(String),
    /// Zero or negative where a positive amount is required.
    #[error("amount must be greater than zero")]
    NotPositive,
    /// Does not fit in the cent representation.
    #[error("amount '{0}' is too large")]
    Overflow(String),
}

/// Parses signed decimal text into cents.
///
/// Accepts an optional leading sign, digits, and an optional fraction of at
/// most two digits. `".5"` and `"5."` are accepted.
pub fn parse_cents(input: &str) -> Result<i64, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let (negative, unsigned) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (whole, frac) = match unsigned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (unsigned, ""),
    };

    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
        return Err(AmountError::Malformed(trimmed.to_string()));
    }
    if frac.len() > DECIMALS as usize {
        return Err(AmountError::TooPrecise(trimmed.to_string()));
    }

    let overflow = || AmountError::Overflow(trimmed.to_string());

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let frac_value: i64 = format!("{:0<width$}", frac, width = DECIMALS as usize)
        .parse()
        .map_err(|_| AmountError::Malformed(trimmed.to_string()))?;

    let cents = whole_value
        .checked_mul(CENTS_PER_UNIT)
        .and_then(|c| c.checked_add(frac_value))
        .ok_or_else(overflow)?;

    Ok(if negative { -cents } else { cents })
}

/// Reads the longest leading decimal number in `input` and rounds it to
/// cents, half away from zero. Trailing text and extra fraction digits are
/// tolerated: `"100.505"` is 10051 and `"12.3abc"` is 1230.
///
/// Returns `None` when no digits lead the input or the value overflows.
/// Meant for figures reported by the backend, never for user input.
pub fn parse_cents_rounded(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let whole_len = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    let whole = &unsigned[..whole_len];
    let frac = match unsigned[whole_len..].strip_prefix('.') {
        Some(rest) => &rest[..rest.bytes().take_while(u8::is_ascii_digit).count()],
        None => "",
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }

    let mut frac_digits = frac.bytes().map(|b| i64::from(b - b'0'));
    let tenths = frac_digits.next().unwrap_or(0);
    let hundredths = frac_digits.next().unwrap_or(0);
    let round_up = frac_digits.next().is_some_and(|d| d >= 5);

    let whole_value: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let cents = whole_value
        .checked_mul(CENTS_PER_UNIT)?
        .checked_add(tenths * 10 + hundredths + i64::from(round_up))?;

    Some(if negative { -cents } else { cents })
}

/// Formats cents as decimal text with two fraction digits.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!(
        "{}{}.{:02}",
        sign,
        abs / CENTS_PER_UNIT as u64,
        abs % CENTS_PER_UNIT as u64
    )
}

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// A strictly positive transfer amount, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u64);

impl Amount {
    /// Wraps a cent value. Returns `None` for zero.
    pub fn from_cents(cents: u64) -> Option<Self> {
        (cents > 0).then_some(Self(cents))
    }

    /// Parses user input such as `"5.00"`.
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let cents = parse_cents(input)?;
        if cents <= 0 {
            return Err(AmountError::NotPositive);
        }
        Ok(Self(cents as u64))
    }

    /// Value in cents.
    pub fn cents(&self) -> u64 {
        self.0
    }

    /// `serialize_with` helper writing the amount as a JSON number in units
    /// (`500` cents becomes `5.0`).
    pub fn serialize_as_number<S: Serializer>(
        amount: &Amount,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(amount.0 as f64 / CENTS_PER_UNIT as f64)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let text = match raw {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "expected amount, found {}",
                    other
                )))
            }
        };
        Amount::parse(&text).map_err(serde::de::Error::custom)
    }
}
