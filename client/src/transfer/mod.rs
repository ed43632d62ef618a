//! # Transfers
//!
//! ```text
//! amount.rs     - cents parsing/formatting, positive Amount
//! request.rs    - TransferRequest + builder
//! pending.rs    - TransferId, PendingTransfer
//! initiation.rs - submits a request, yields a PendingTransfer
//! ```

pub mod amount;
pub mod initiation;
pub mod pending;
pub mod request;

pub use amount::{Amount, AmountError};
pub use initiation::{InitiationError, TransferInitiation};
pub use pending::{PendingTransfer, TransferId};
pub use request::{Recipient, RequestError, TransferRequest, TransferRequestBuilder};
