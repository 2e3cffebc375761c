//! Account store port - persistence abstraction

use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Account, User};

/// Balances of both sides after an atomic transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundsMoved {
    pub from_balance: i64,
    pub to_balance: i64,
}

/// Account and user persistence
///
/// Services depend only on this trait. Implementations (adapters) provide the
/// actual storage. All operations are synchronous point reads/writes.
pub trait AccountStore: Send + Sync {
    // === Accounts ===

    /// Get account by ID, `NotFound` if absent
    fn get_account(&self, id: Uuid) -> Result<Account>;

    /// Get all accounts, ordered by account number
    fn list_accounts(&self) -> Result<Vec<Account>>;

    /// Insert an account and its owning user as one all-or-nothing unit.
    ///
    /// Fails with `Conflict` if the national id or username is taken. The
    /// returned account carries the store-assigned number.
    fn create_account_with_user(&self, account: &Account, user: &User) -> Result<Account>;

    /// Persist the balance of an existing account, `NotFound` if absent
    fn update_account(&self, account: &Account) -> Result<()>;

    /// Delete an account together with its owning user, `NotFound` if absent
    fn delete_account(&self, id: Uuid) -> Result<()>;

    // === Users ===

    /// Get user by username, `NotFound` if absent
    fn get_user_by_username(&self, username: &str) -> Result<User>;

    // === Atomic transfer ===

    /// Move `amount` from `from` to `to` as one unit.
    ///
    /// The debit is conditional on the source balance covering `amount`
    /// (`InsufficientFunds` otherwise) and either both balances change or
    /// neither does. `from == to` credits the account without a funds check.
    fn transfer_funds(&self, from: Uuid, to: Uuid, amount: i64) -> Result<FundsMoved>;
}
