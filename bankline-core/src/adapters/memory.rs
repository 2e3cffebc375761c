//! In-memory account store
//!
//! Same contract as the DuckDB adapter, held in process memory. Used by tests
//! and by embedders that don't want a database file.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, User};
use crate::ports::{AccountStore, FundsMoved};

#[derive(Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    users: HashMap<Uuid, User>,
    last_number: i64,
}

impl State {
    fn account(&self, id: Uuid) -> Result<&Account> {
        self.accounts
            .get(&id)
            .ok_or_else(|| Error::not_found(format!("account '{}' not found", id)))
    }

    fn account_mut(&mut self, id: Uuid) -> Result<&mut Account> {
        self.accounts
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("account '{}' not found", id)))
    }
}

/// Mutex-guarded account store; every operation is one critical section
#[derive(Default)]
pub struct InMemoryAccountStore {
    state: Mutex<State>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }
}

impl AccountStore for InMemoryAccountStore {
    fn get_account(&self, id: Uuid) -> Result<Account> {
        self.lock()?.account(id).cloned()
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let state = self.lock()?;
        let mut accounts: Vec<Account> = state.accounts.values().cloned().collect();
        accounts.sort_by_key(|a| a.number);
        Ok(accounts)
    }

    fn create_account_with_user(&self, account: &Account, user: &User) -> Result<Account> {
        let mut state = self.lock()?;

        if state.users.values().any(|u| u.username == user.username) {
            return Err(Error::conflict("username already registered"));
        }
        if state
            .accounts
            .values()
            .any(|a| a.national_id == account.national_id)
        {
            return Err(Error::conflict("national id already registered"));
        }
        if state.accounts.contains_key(&account.id) || state.users.contains_key(&user.id) {
            return Err(Error::conflict("identifier already in use"));
        }

        state.last_number += 1;
        let stored = Account {
            number: state.last_number,
            user_id: user.id,
            ..account.clone()
        };
        let owner = User {
            account_id: account.id,
            ..user.clone()
        };

        state.users.insert(owner.id, owner);
        state.accounts.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update_account(&self, account: &Account) -> Result<()> {
        let mut state = self.lock()?;
        state.account_mut(account.id)?.balance = account.balance;
        Ok(())
    }

    fn delete_account(&self, id: Uuid) -> Result<()> {
        let mut state = self.lock()?;
        let user_id = state.account(id)?.user_id;
        state.users.remove(&user_id);
        state.accounts.remove(&id);
        Ok(())
    }

    fn get_user_by_username(&self, username: &str) -> Result<User> {
        self.lock()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("user '{}' not found", username)))
    }

    fn transfer_funds(&self, from: Uuid, to: Uuid, amount: i64) -> Result<FundsMoved> {
        let mut state = self.lock()?;
        let from_balance = state.account(from)?.balance;

        if from == to {
            let balance = from_balance
                .checked_add(amount)
                .ok_or_else(|| Error::validation("balance would overflow"))?;
            state.account_mut(from)?.balance = balance;
            return Ok(FundsMoved {
                from_balance: balance,
                to_balance: balance,
            });
        }

        if from_balance < amount {
            return Err(Error::insufficient_funds(
                "you do not have enough balance for this operation",
            ));
        }

        let to_balance = state
            .account(to)?
            .balance
            .checked_add(amount)
            .ok_or_else(|| Error::validation("balance would overflow"))?;

        // All checks passed; both writes happen under the same guard
        state.account_mut(to)?.balance = to_balance;
        state.account_mut(from)?.balance = from_balance - amount;

        Ok(FundsMoved {
            from_balance: from_balance - amount,
            to_balance,
        })
    }
}
