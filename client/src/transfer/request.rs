//! Transfer requests, assembled from user input.
//!
//! A [`TransferRequest`] is built once, submitted, and never mutated. The
//! builder only checks what the flow itself depends on (a source account, a
//! positive amount, a complete recipient). Field-level formatting rules for
//! emails and account numbers belong to whatever form collects them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::amount::{Amount, AmountError};

/// Why a transfer request could not be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// No source account was selected.
    #[error("please select a valid bank account")]
    MissingSourceAccount,
    /// The amount is missing or unusable.
    #[error(transparent)]
    Amount(#[from] AmountError),
    /// A recipient field was left blank.
    #[error("recipient {0} is required")]
    MissingRecipientField(&'static str),
}

/// Who receives the money. Kept on the client for display and audit; the
/// creation endpoint does not take it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Recipient's email address.
    pub email: String,
    /// Name of the receiving bank.
    pub bank_name: String,
    /// Receiving account number.
    pub account_number: String,
    /// Receiving bank routing number.
    pub routing_number: String,
}

impl Recipient {
    /// Account number with everything but the last four digits masked.
    pub fn masked_account_number(&self) -> String {
        let digits: Vec<char> = self.account_number.chars().collect();
        let keep = digits.len().min(4);
        let hidden = digits.len() - keep;
        let tail: String = digits[hidden..].iter().collect();
        format!("{}{}", "*".repeat(hidden), tail)
    }
}

/// An immutable, validated transfer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    source_account_id: u64,
    amount: Amount,
    note: Option<String>,
    recipient: Recipient,
}

impl TransferRequest {
    /// Starts a builder.
    pub fn builder() -> TransferRequestBuilder {
        TransferRequestBuilder::default()
    }

    /// Backend id of the account being debited.
    pub fn source_account_id(&self) -> u64 {
        self.source_account_id
    }

    /// Amount to move.
    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Free-text note, if one was given.
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Receiving party.
    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }
}

/// Fluent builder for [`TransferRequest`].
///
/// ```
/// use ledgerline_client::transfer::TransferRequest;
///
/// let request = TransferRequest::builder()
///     .source_account(7)
///     .amount("5.00")
///     .note("rent")
///     .recipient_email("jane@example.com")
///     .recipient_bank("Ally Bank")
///     .recipient_account_number("0123456789")
///     .recipient_routing_number("021000021")
///     .build()
///     .unwrap();
/// assert_eq!(request.amount().cents(), 500);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransferRequestBuilder {
    source_account_id: Option<u64>,
    amount: Option<String>,
    note: Option<String>,
    email: String,
    bank_name: String,
    account_number: String,
    routing_number: String,
}

impl TransferRequestBuilder {
    pub fn source_account(mut self, id: u64) -> Self {
        self.source_account_id = Some(id);
        self
    }

    /// Raw amount text; parsed in [`Self::build`].
    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    /// Optional note. Blank notes are dropped.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.note = if note.trim().is_empty() {
            None
        } else {
            Some(note.trim().to_string())
        };
        self
    }

    pub fn recipient_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn recipient_bank(mut self, bank_name: impl Into<String>) -> Self {
        self.bank_name = bank_name.into();
        self
    }

    pub fn recipient_account_number(mut self, account_number: impl Into<String>) -> Self {
        self.account_number = account_number.into();
        self
    }

    pub fn recipient_routing_number(mut self, routing_number: impl Into<String>) -> Self {
        self.routing_number = routing_number.into();
        self
    }

    /// Validates and freezes the request.
    pub fn build(self) -> Result<TransferRequest, RequestError> {
        let source_account_id = self
            .source_account_id
            .ok_or(RequestError::MissingSourceAccount)?;

        let amount = match self.amount {
            Some(raw) => Amount::parse(&raw)?,
            None => return Err(AmountError::Empty.into()),
        };

        let required = |value: String, field: &'static str| {
            let value = value.trim().to_string();
            if value.is_empty() {
                Err(RequestError::MissingRecipientField(field))
            } else {
                Ok(value)
            }
        };

        let recipient = Recipient {
            email: required(self.email, "email")?,
            bank_name: required(self.bank_name, "bank name")?,
            account_number: required(self.account_number, "account number")?,
            routing_number: required(self.routing_number, "routing number")?,
        };

        Ok(TransferRequest {
            source_account_id,
            amount,
            note: self.note,
            recipient,
        })
    }
}
