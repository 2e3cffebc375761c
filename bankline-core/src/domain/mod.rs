//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
pub mod result;
mod transfer;
mod user;

pub use account::Account;
pub use transfer::{TransferInstruction, TransferKind, TransferReceipt};
pub use user::{User, MIN_PASSWORD_LEN};
