//! Transfers that exist on the backend but have not been confirmed yet.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::request::TransferRequest;

/// Opaque transfer identifier issued by the backend.
///
/// The backend currently sends integers, but nothing on this side does
/// arithmetic with them, so both JSON numbers and strings are accepted and
/// kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TransferId(String);

impl TransferId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for TransferId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for TransferId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n.to_string())),
            Raw::Text(s) if !s.trim().is_empty() => Ok(Self(s)),
            Raw::Text(_) => Err(serde::de::Error::custom("transfer id is empty")),
        }
    }
}

/// A created, unconfirmed transfer.
///
/// Lives exactly as long as the confirmation session that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransfer {
    id: TransferId,
    request: TransferRequest,
    created_at: DateTime<Utc>,
}

impl PendingTransfer {
    pub fn new(id: TransferId, request: TransferRequest) -> Self {
        Self {
            id,
            request,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &TransferId {
        &self.id
    }

    /// The request this transfer was created from.
    pub fn request(&self) -> &TransferRequest {
        &self.request
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_id_accepts_numbers_and_strings() {
        let numeric: TransferId = serde_json::from_str("42").unwrap();
        assert_eq!(numeric.as_str(), "42");

        let textual: TransferId = serde_json::from_str("\"tr_9f\"").unwrap();
        assert_eq!(textual.as_str(), "tr_9f");
    }

    #[test]
    fn empty_transfer_id_is_rejected() {
        assert!(serde_json::from_str::<TransferId>("\"\"").is_err());
        assert!(serde_json::from_str::<TransferId>("null").is_err());
    }

    #[test]
    fn transfer_id_displays_raw_value() {
        assert_eq!(TransferId::from(7).to_string(), "7");
    }
}
