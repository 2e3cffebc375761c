//! Bankline Core - accounts, credentials and fund transfers
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Account, User, TransferInstruction, etc.)
//! - **ports**: Trait definitions for external dependencies (AccountStore)
//! - **services**: Business logic orchestration (transfers, accounts, auth)
//! - **adapters**: Concrete implementations (DuckDB, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::DuckDbRepository;
use config::Config;
use ports::AccountStore;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{status_for, Error, ErrorBody};
pub use domain::{Account, TransferInstruction, TransferKind, TransferReceipt, User};

/// Database file inside the bankline directory
pub const DB_FILENAME: &str = "bankline.duckdb";

/// Main context for Bankline operations
///
/// Holds the configuration, the account store and every service wired to
/// that store.
pub struct BanklineContext {
    pub config: Config,
    pub store: Arc<dyn AccountStore>,
    pub identity: IdentityService,
    pub account_service: AccountService,
    pub auth_service: AuthService,
    pub transfer_service: TransferService,
    pub status_service: StatusService,
}

impl BanklineContext {
    /// Open the DuckDB store in `bankline_dir` and wire the services
    pub fn new(bankline_dir: &Path) -> Result<Self> {
        let config = Config::load(bankline_dir)?;

        let repository = DuckDbRepository::new(&bankline_dir.join(DB_FILENAME))?;
        repository.ensure_schema()?;

        Self::with_store(config, Arc::new(repository))
    }

    /// Wire the services around an already-open store
    pub fn with_store(config: Config, store: Arc<dyn AccountStore>) -> Result<Self> {
        let identity = IdentityService::new(&config.auth)?;
        let strategy = TransferStrategy::from_atomic_flag(config.transfers.atomic);

        Ok(Self {
            account_service: AccountService::new(Arc::clone(&store), identity.clone()),
            auth_service: AuthService::new(Arc::clone(&store), identity.clone()),
            transfer_service: TransferService::new(Arc::clone(&store), strategy),
            status_service: StatusService::new(Arc::clone(&store)),
            identity,
            store,
            config,
        })
    }
}
