//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod account;
mod auth;
pub mod identity;
pub mod logging;
pub mod migration;
mod status;
pub mod transfer;

pub use account::{parse_account_id, AccountService, CreateAccountRequest};
pub use auth::{AccessToken, AuthService};
pub use identity::{Claims, IdentityService};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use status::{AccountSummary, StatusService, StatusSummary};
pub use transfer::{TransferService, TransferStrategy};
