//! DuckDB account store implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::types::Type;
use duckdb::{params, Connection};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, User};
use crate::migrations::MIGRATIONS;
use crate::ports::{AccountStore, FundsMoved};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const ACCOUNT_COLUMNS: &str =
    "account_id, name, national_id, number, balance, user_id, created_at::VARCHAR";

const USER_COLUMNS: &str = "user_id, username, password_hash, account_id, created_at::VARCHAR";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB-backed account store
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Open (or create) the database at `db_path`
    ///
    /// Retries with exponential backoff when the file is locked by another
    /// process, e.g. two CLI invocations racing on startup.
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[bankline] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
    }

    fn try_open_connection(db_path: &Path) -> anyhow::Result<Connection> {
        // Extension autoloading off: nothing here needs extensions and cached
        // ones can fail code-signing checks on macOS
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    /// Run pending schema migrations
    pub fn run_migrations(&self) -> anyhow::Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn, MIGRATIONS).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> anyhow::Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }
}

impl AccountStore for DuckDbRepository {
    fn get_account(&self, id: Uuid) -> Result<Account> {
        let conn = self.lock()?;
        select_account(&conn, id)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_accounts ORDER BY number",
            ACCOUNT_COLUMNS
        ))?;

        let accounts = stmt
            .query_map([], row_to_account)?
            .collect::<duckdb::Result<Vec<_>>>()?;

        Ok(accounts)
    }

    fn create_account_with_user(&self, account: &Account, user: &User) -> Result<Account> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        // Sequences are not transactional: a rolled back insert leaves a gap
        let number: i64 =
            tx.query_row("SELECT nextval('account_number_seq')", [], |row| row.get(0))?;

        tx.execute(
            "INSERT INTO sys_users (user_id, username, password_hash, account_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                user.id.to_string(),
                user.username,
                user.password_hash,
                account.id.to_string(),
                format_timestamp(&user.created_at),
            ],
        )
        .map_err(|e| rename_conflict(e.into(), "username already registered"))?;

        tx.execute(
            "INSERT INTO sys_accounts (account_id, name, national_id, number, balance, user_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                account.id.to_string(),
                account.name,
                account.national_id,
                number,
                account.balance,
                user.id.to_string(),
                format_timestamp(&account.created_at),
            ],
        )
        .map_err(|e| rename_conflict(e.into(), "national id already registered"))?;

        tx.commit()?;

        Ok(Account {
            number,
            user_id: user.id,
            ..account.clone()
        })
    }

    fn update_account(&self, account: &Account) -> Result<()> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE sys_accounts SET balance = ? WHERE account_id = ?",
            params![account.balance, account.id.to_string()],
        )?;

        if rows == 0 {
            return Err(account_not_found(account.id));
        }
        Ok(())
    }

    /// Delete an account and its owning user in one transaction
    fn delete_account(&self, id: Uuid) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let account = select_account(&tx, id)?;

        tx.execute(
            "DELETE FROM sys_users WHERE user_id = ?",
            params![account.user_id.to_string()],
        )?;
        tx.execute(
            "DELETE FROM sys_accounts WHERE account_id = ?",
            params![id.to_string()],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn get_user_by_username(&self, username: &str) -> Result<User> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_users WHERE username = ?",
            USER_COLUMNS
        ))?;

        match stmt.query_row([username], row_to_user) {
            Ok(user) => Ok(user),
            Err(duckdb::Error::QueryReturnedNoRows) => {
                Err(Error::not_found(format!("user '{}' not found", username)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn transfer_funds(&self, from: Uuid, to: Uuid, amount: i64) -> Result<FundsMoved> {
        self.transfer_with(from, to, amount, credit_account)
    }
}

/// Credit step of a transfer, run inside the transfer's transaction
type CreditFn = fn(&Connection, Uuid, i64) -> Result<()>;

impl DuckDbRepository {
    /// One transaction: existence checks, conditional debit, credit.
    /// Any error drops the transaction, rolling back the debit.
    fn transfer_with(
        &self,
        from: Uuid,
        to: Uuid,
        amount: i64,
        credit: CreditFn,
    ) -> Result<FundsMoved> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let source = select_account(&tx, from)?;

        if from == to {
            let balance = source
                .balance
                .checked_add(amount)
                .ok_or_else(|| Error::validation("balance would overflow"))?;
            credit(&tx, from, amount)?;
            tx.commit()?;
            return Ok(FundsMoved {
                from_balance: balance,
                to_balance: balance,
            });
        }

        if source.balance < amount {
            return Err(insufficient_funds());
        }

        let destination = select_account(&tx, to)?;
        let to_balance = destination
            .balance
            .checked_add(amount)
            .ok_or_else(|| Error::validation("balance would overflow"))?;

        // Conditional debit: the funds check and the write are one statement
        let debited = tx.execute(
            "UPDATE sys_accounts SET balance = balance - ? WHERE account_id = ? AND balance >= ?",
            params![amount, from.to_string(), amount],
        )?;
        if debited == 0 {
            return Err(insufficient_funds());
        }

        credit(&tx, to, amount)?;

        tx.commit()?;

        Ok(FundsMoved {
            from_balance: source.balance - amount,
            to_balance,
        })
    }
}

fn credit_account(conn: &Connection, id: Uuid, amount: i64) -> Result<()> {
    let rows = conn.execute(
        "UPDATE sys_accounts SET balance = balance + ? WHERE account_id = ?",
        params![amount, id.to_string()],
    )?;
    if rows == 0 {
        return Err(account_not_found(id));
    }
    Ok(())
}

fn select_account(conn: &Connection, id: Uuid) -> Result<Account> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM sys_accounts WHERE account_id = ?",
        ACCOUNT_COLUMNS
    ))?;

    match stmt.query_row([id.to_string()], row_to_account) {
        Ok(account) => Ok(account),
        Err(duckdb::Error::QueryReturnedNoRows) => Err(account_not_found(id)),
        Err(e) => Err(e.into()),
    }
}

fn row_to_account(row: &duckdb::Row) -> duckdb::Result<Account> {
    // 0: account_id, 1: name, 2: national_id, 3: number, 4: balance,
    // 5: user_id, 6: created_at
    let created_str: String = row.get(6)?;
    Ok(Account {
        id: uuid_column(row, 0)?,
        name: row.get(1)?,
        national_id: row.get(2)?,
        number: row.get(3)?,
        balance: row.get(4)?,
        user_id: uuid_column(row, 5)?,
        created_at: parse_timestamp(&created_str),
    })
}

fn row_to_user(row: &duckdb::Row) -> duckdb::Result<User> {
    // 0: user_id, 1: username, 2: password_hash, 3: account_id, 4: created_at
    let created_str: String = row.get(4)?;
    Ok(User {
        id: uuid_column(row, 0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        account_id: uuid_column(row, 3)?,
        created_at: parse_timestamp(&created_str),
    })
}

fn uuid_column(row: &duckdb::Row, idx: usize) -> duckdb::Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s)
        .map_err(|e| duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn account_not_found(id: Uuid) -> Error {
    Error::not_found(format!("account '{}' not found", id))
}

fn insufficient_funds() -> Error {
    Error::insufficient_funds("you do not have enough balance for this operation")
}

fn rename_conflict(err: Error, msg: &str) -> Error {
    match err {
        Error::Conflict(_) => Error::conflict(msg),
        other => other,
    }
}

// Helper functions

/// Format for TIMESTAMP columns (UTC, microsecond precision)
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Parse a TIMESTAMP rendered as VARCHAR by DuckDB
///
/// DuckDB omits the fractional part when it is zero.
fn parse_timestamp(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(|_| Utc::now())
}
