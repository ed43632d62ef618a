//! # Backend API
//!
//! HTTP plumbing for the banking backend. The backend owns every piece of
//! business logic; this module only knows the endpoints and their shapes.
//!
//! ## Endpoints
//!
//! | Method | Path                                 | Used by                |
//! |--------|--------------------------------------|------------------------|
//! | POST   | `/register/`                         | registration           |
//! | POST   | `/login/`                            | sign-in                |
//! | GET    | `/profile/`                          | sign-in, `whoami`      |
//! | GET    | `/accounts/`                         | account picker         |
//! | GET    | `/transactions/`                     | activity feed          |
//! | POST   | `/local-transfer/`                   | transfer initiation    |
//! | POST   | `/validate-local-transfer/{id}/`     | OTP challenge          |

pub mod backend;
pub mod client;
pub mod dto;
pub mod error;

pub use backend::TransferBackend;
pub use client::BankApiClient;
pub use dto::{
    AccountsSummary, BankAccount, CreateLocalTransferBody, LocalTransferCreated, SignUpRequest,
    Transaction, UserProfile,
};
pub use error::{extract_error_message, ApiError};
