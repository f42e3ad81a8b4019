//! # Domain Module
//!
//! Business logic of the shared wallet ledger.
//!
//! - **parser**: extracting a signed amount and currency token from raw text
//! - **currency**: normalizing currency tokens and applying the scaling rule
//! - **validation**: bounds checking the scaled amount
//! - **registration_service**: idempotent user/chat-account provisioning
//! - **ledger_service**: the transaction coordinator tying it all together
//!
//! The domain layer operates on the storage layer's `DbConnection` and knows
//! nothing about the HTTP surface.

pub mod currency;
pub mod errors;
pub mod ledger_service;
pub mod parser;
pub mod registration_service;
pub mod validation;

pub use currency::Currency;
pub use errors::LedgerError;
pub use ledger_service::{IgnoreReason, LedgerService, ProcessOutcome};
pub use parser::{parse_message, ParseMode, ParseOutcome, RejectReason};
pub use registration_service::RegistrationService;
pub use validation::{validate_amount, AMOUNT_LIMIT};
