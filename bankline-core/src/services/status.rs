//! Status service - system-wide account summary

use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::Result;
use crate::ports::AccountStore;

pub struct StatusService {
    store: Arc<dyn AccountStore>,
}

impl StatusService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    pub fn get_status(&self) -> Result<StatusSummary> {
        let accounts = self.store.list_accounts()?;

        Ok(StatusSummary {
            total_accounts: accounts.len() as i64,
            total_balance: accounts.iter().map(|a| a.balance as i128).sum(),
            negative_balances: accounts.iter().filter(|a| a.balance < 0).count() as i64,
            accounts: accounts
                .into_iter()
                .map(|a| AccountSummary {
                    id: a.id.to_string(),
                    number: a.number,
                    name: a.name,
                    balance: a.balance,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_accounts: i64,
    /// Sum of all balances; wider than a single balance
    pub total_balance: i128,
    /// Accounts overdrawn by concurrent non-atomic transfers
    pub negative_balances: i64,
    pub accounts: Vec<AccountSummary>,
}

#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub id: String,
    pub number: i64,
    pub name: String,
    pub balance: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryAccountStore;
    use crate::domain::{Account, User};

    fn open(store: &InMemoryAccountStore, name: &str, national_id: &str, balance: i64) {
        let user = User::new(name.to_lowercase(), "hash");
        let mut account = store
            .create_account_with_user(&Account::new(name, national_id, user.id), &user)
            .unwrap();
        account.balance = balance;
        store.update_account(&account).unwrap();
    }

    #[test]
    fn test_empty_status() {
        let status = StatusService::new(Arc::new(InMemoryAccountStore::new()))
            .get_status()
            .unwrap();
        assert_eq!(status.total_accounts, 0);
        assert_eq!(status.total_balance, 0);
        assert!(status.accounts.is_empty());
    }

    #[test]
    fn test_totals_do_not_overflow() {
        let store = Arc::new(InMemoryAccountStore::new());
        open(&store, "Alice", "111", i64::MAX);
        open(&store, "Bob", "222", i64::MAX);
        open(&store, "Carol", "333", -5);

        let status = StatusService::new(store).get_status().unwrap();
        assert_eq!(status.total_accounts, 3);
        assert_eq!(status.total_balance, 2 * i64::MAX as i128 - 5);
        assert_eq!(status.negative_balances, 1);

        let numbers: Vec<i64> = status.accounts.iter().map(|a| a.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }
}
