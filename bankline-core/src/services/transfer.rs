//! Transfer service - moves funds between accounts
//!
//! Two strategies share one contract. `Sequential` reads both accounts,
//! checks funds against what it read, then writes destination and source
//! as two independent updates. Concurrent transfers on the same source can
//! both pass the check, and a failure between the writes leaves the
//! destination credited without the source debited. `Atomic` hands the
//! whole movement to [`AccountStore::transfer_funds`], which debits only if
//! the balance covers the amount and applies both writes or neither.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{TransferInstruction, TransferKind, TransferReceipt};
use crate::ports::AccountStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransferStrategy {
    #[default]
    Sequential,
    Atomic,
}

impl TransferStrategy {
    pub fn from_atomic_flag(atomic: bool) -> Self {
        if atomic {
            Self::Atomic
        } else {
            Self::Sequential
        }
    }
}

pub struct TransferService {
    store: Arc<dyn AccountStore>,
    strategy: TransferStrategy,
}

impl TransferService {
    pub fn new(store: Arc<dyn AccountStore>, strategy: TransferStrategy) -> Self {
        Self { store, strategy }
    }

    pub fn strategy(&self) -> TransferStrategy {
        self.strategy
    }

    /// Move funds out of `source_account_id`, the caller's own account.
    ///
    /// The source id must come from the caller's validated credential.
    /// Transferring to the source itself is a deposit and skips the funds
    /// check.
    pub fn transfer(
        &self,
        source_account_id: Uuid,
        instruction: &TransferInstruction,
    ) -> Result<TransferReceipt> {
        instruction.validate().map_err(Error::validation)?;

        match self.strategy {
            TransferStrategy::Sequential => self.transfer_sequential(source_account_id, instruction),
            TransferStrategy::Atomic => self.transfer_atomic(source_account_id, instruction),
        }
    }

    fn transfer_sequential(
        &self,
        source_id: Uuid,
        instruction: &TransferInstruction,
    ) -> Result<TransferReceipt> {
        let amount = instruction.amount;
        let mut source = self.store.get_account(source_id)?;

        if instruction.to_account_id == source_id {
            source.balance = credit(source.balance, amount)?;
            self.store.update_account(&source)?;
            return Ok(TransferReceipt::new(
                source_id,
                source_id,
                amount,
                TransferKind::Deposit,
                source.balance,
            ));
        }

        if source.balance < amount {
            return Err(Error::insufficient_funds(
                "you do not have enough balance for this operation",
            ));
        }

        let mut destination = self.store.get_account(instruction.to_account_id)?;
        destination.balance = credit(destination.balance, amount)?;
        source.balance -= amount;

        // Destination first, then source; not one unit
        self.store.update_account(&destination)?;
        self.store.update_account(&source)?;

        Ok(TransferReceipt::new(
            source_id,
            destination.id,
            amount,
            TransferKind::Transfer,
            source.balance,
        ))
    }

    fn transfer_atomic(
        &self,
        source_id: Uuid,
        instruction: &TransferInstruction,
    ) -> Result<TransferReceipt> {
        let to = instruction.to_account_id;
        let moved = self
            .store
            .transfer_funds(source_id, to, instruction.amount)?;

        let kind = if to == source_id {
            TransferKind::Deposit
        } else {
            TransferKind::Transfer
        };
        Ok(TransferReceipt::new(
            source_id,
            to,
            instruction.amount,
            kind,
            moved.from_balance,
        ))
    }
}

fn credit(balance: i64, amount: i64) -> Result<i64> {
    balance
        .checked_add(amount)
        .ok_or_else(|| Error::validation("balance would overflow"))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::adapters::memory::InMemoryAccountStore;
    use crate::domain::{Account, User};
    use crate::ports::FundsMoved;

    fn open(store: &dyn AccountStore, name: &str, national_id: &str) -> Uuid {
        let user = User::new(name.to_lowercase(), "hash");
        let account = Account::new(name, national_id, user.id);
        store.create_account_with_user(&account, &user).unwrap().id
    }

    fn balance(store: &dyn AccountStore, id: Uuid) -> i64 {
        store.get_account(id).unwrap().balance
    }

    /// Delegates to an in-memory store but fails the Nth `update_account`
    struct FailingUpdates {
        inner: InMemoryAccountStore,
        fail_on: usize,
        updates: AtomicUsize,
    }

    impl FailingUpdates {
        fn new(fail_on: usize) -> Self {
            Self {
                inner: InMemoryAccountStore::new(),
                fail_on,
                updates: AtomicUsize::new(0),
            }
        }
    }

    impl AccountStore for FailingUpdates {
        fn get_account(&self, id: Uuid) -> Result<Account> {
            self.inner.get_account(id)
        }
        fn list_accounts(&self) -> Result<Vec<Account>> {
            self.inner.list_accounts()
        }
        fn create_account_with_user(&self, account: &Account, user: &User) -> Result<Account> {
            self.inner.create_account_with_user(account, user)
        }
        fn update_account(&self, account: &Account) -> Result<()> {
            let n = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_on {
                return Err(Error::database("connection lost"));
            }
            self.inner.update_account(account)
        }
        fn delete_account(&self, id: Uuid) -> Result<()> {
            self.inner.delete_account(id)
        }
        fn get_user_by_username(&self, username: &str) -> Result<User> {
            self.inner.get_user_by_username(username)
        }
        fn transfer_funds(&self, from: Uuid, to: Uuid, amount: i64) -> Result<FundsMoved> {
            self.inner.transfer_funds(from, to, amount)
        }
    }

    fn both_strategies() -> [TransferStrategy; 2] {
        [TransferStrategy::Sequential, TransferStrategy::Atomic]
    }

    #[test]
    fn test_example_scenario() {
        for strategy in both_strategies() {
            let store = Arc::new(InMemoryAccountStore::new());
            let alice = open(store.as_ref(), "Alice", "111");
            let bob = open(store.as_ref(), "Bob", "222");
            let service = TransferService::new(store.clone(), strategy);

            let receipt = service
                .transfer(alice, &TransferInstruction::new(alice, 100))
                .unwrap();
            assert_eq!(receipt.kind, TransferKind::Deposit);
            assert_eq!(receipt.balance_after, 100);

            let receipt = service
                .transfer(alice, &TransferInstruction::new(bob, 30))
                .unwrap();
            assert_eq!(receipt.kind, TransferKind::Transfer);
            assert_eq!(receipt.balance_after, 70);
            assert_eq!((balance(store.as_ref(), alice), balance(store.as_ref(), bob)), (70, 30));

            let err = service
                .transfer(alice, &TransferInstruction::new(bob, 1000))
                .unwrap_err();
            assert!(matches!(err, Error::InsufficientFunds(_)), "{:?}", strategy);
            assert_eq!((balance(store.as_ref(), alice), balance(store.as_ref(), bob)), (70, 30));
        }
    }

    #[test]
    fn test_deposit_skips_funds_check() {
        for strategy in both_strategies() {
            let store = Arc::new(InMemoryAccountStore::new());
            let alice = open(store.as_ref(), "Alice", "111");
            let service = TransferService::new(store.clone(), strategy);

            service
                .transfer(alice, &TransferInstruction::new(alice, 5_000))
                .unwrap();
            assert_eq!(balance(store.as_ref(), alice), 5_000);
        }
    }

    #[test]
    fn test_exact_balance_can_be_sent() {
        for strategy in both_strategies() {
            let store = Arc::new(InMemoryAccountStore::new());
            let alice = open(store.as_ref(), "Alice", "111");
            let bob = open(store.as_ref(), "Bob", "222");
            let service = TransferService::new(store.clone(), strategy);

            service.transfer(alice, &TransferInstruction::new(alice, 40)).unwrap();
            service.transfer(alice, &TransferInstruction::new(bob, 40)).unwrap();
            assert_eq!(balance(store.as_ref(), alice), 0);
            assert_eq!(balance(store.as_ref(), bob), 40);
        }
    }

    #[test]
    fn test_unknown_destination_leaves_source_untouched() {
        for strategy in both_strategies() {
            let store = Arc::new(InMemoryAccountStore::new());
            let alice = open(store.as_ref(), "Alice", "111");
            let service = TransferService::new(store.clone(), strategy);
            service.transfer(alice, &TransferInstruction::new(alice, 100)).unwrap();

            let err = service
                .transfer(alice, &TransferInstruction::new(Uuid::new_v4(), 10))
                .unwrap_err();
            assert!(matches!(err, Error::NotFound(_)));
            assert_eq!(balance(store.as_ref(), alice), 100);
        }
    }

    #[test]
    fn test_unknown_source_not_found() {
        for strategy in both_strategies() {
            let store = Arc::new(InMemoryAccountStore::new());
            let bob = open(store.as_ref(), "Bob", "222");
            let service = TransferService::new(store.clone(), strategy);

            let err = service
                .transfer(Uuid::new_v4(), &TransferInstruction::new(bob, 10))
                .unwrap_err();
            assert!(matches!(err, Error::NotFound(_)));
        }
    }

    #[test]
    fn test_insufficient_funds_checked_before_destination_lookup() {
        let store = Arc::new(InMemoryAccountStore::new());
        let alice = open(store.as_ref(), "Alice", "111");
        let service = TransferService::new(store, TransferStrategy::Sequential);

        let err = service
            .transfer(alice, &TransferInstruction::new(Uuid::new_v4(), 10))
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds(_)));
    }

    #[test]
    fn test_non_positive_amounts_rejected_without_writes() {
        for strategy in both_strategies() {
            let store = Arc::new(InMemoryAccountStore::new());
            let alice = open(store.as_ref(), "Alice", "111");
            let bob = open(store.as_ref(), "Bob", "222");
            let service = TransferService::new(store.clone(), strategy);

            for amount in [0, -1, i64::MIN] {
                let err = service
                    .transfer(alice, &TransferInstruction::new(bob, amount))
                    .unwrap_err();
                assert!(matches!(err, Error::Validation(_)));
            }
            assert_eq!(balance(store.as_ref(), alice), 0);
            assert_eq!(balance(store.as_ref(), bob), 0);
        }
    }

    #[test]
    fn test_overflowing_credit_rejected() {
        for strategy in both_strategies() {
            let store = Arc::new(InMemoryAccountStore::new());
            let alice = open(store.as_ref(), "Alice", "111");
            let service = TransferService::new(store.clone(), strategy);

            service.transfer(alice, &TransferInstruction::new(alice, i64::MAX)).unwrap();
            let err = service
                .transfer(alice, &TransferInstruction::new(alice, 1))
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
            assert_eq!(balance(store.as_ref(), alice), i64::MAX);
        }
    }

    #[test]
    fn test_sequential_failure_between_writes_credits_destination_only() {
        let store = Arc::new(FailingUpdates::new(3));
        let alice = open(store.as_ref(), "Alice", "111");
        let bob = open(store.as_ref(), "Bob", "222");
        let service = TransferService::new(store.clone(), TransferStrategy::Sequential);

        // Update #1: the deposit
        service.transfer(alice, &TransferInstruction::new(alice, 100)).unwrap();

        // Update #2 credits Bob, update #3 (debit Alice) fails
        let err = service
            .transfer(alice, &TransferInstruction::new(bob, 30))
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(balance(store.as_ref(), alice), 100);
        assert_eq!(balance(store.as_ref(), bob), 30);
    }

    #[test]
    fn test_atomic_strategy_does_not_use_separate_updates() {
        // Every update_account call fails; atomic transfers never make one
        let store = Arc::new(FailingUpdates::new(1));
        let alice = open(store.as_ref(), "Alice", "111");
        let bob = open(store.as_ref(), "Bob", "222");
        let service = TransferService::new(store.clone(), TransferStrategy::Atomic);

        service.transfer(alice, &TransferInstruction::new(alice, 100)).unwrap();
        service.transfer(alice, &TransferInstruction::new(bob, 30)).unwrap();
        assert_eq!(balance(store.as_ref(), alice), 70);
        assert_eq!(balance(store.as_ref(), bob), 30);
    }

    #[test]
    fn test_strategy_from_flag() {
        assert_eq!(TransferStrategy::from_atomic_flag(true), TransferStrategy::Atomic);
        assert_eq!(TransferStrategy::from_atomic_flag(false), TransferStrategy::Sequential);
        assert_eq!(TransferStrategy::default(), TransferStrategy::Sequential);
    }
}
