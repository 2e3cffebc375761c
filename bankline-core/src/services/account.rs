//! Account service - registration, lookup and deletion

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, User};
use crate::ports::AccountStore;
use crate::services::identity::IdentityService;

/// Input for opening an account together with its owning user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub name: String,
    pub national_id: String,
    pub username: String,
    pub password: String,
}

pub struct AccountService {
    store: Arc<dyn AccountStore>,
    identity: IdentityService,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, identity: IdentityService) -> Self {
        Self { store, identity }
    }

    /// Open a zero-balance account and its user in one store operation
    pub fn create_account(&self, request: &CreateAccountRequest) -> Result<Account> {
        User::validate_credentials(&request.username, &request.password)
            .map_err(Error::validation)?;

        let password_hash = self.identity.hash(&request.password)?;
        let user = User::new(request.username.trim(), password_hash);
        let account = Account::new(
            request.name.trim(),
            Account::normalize_national_id(&request.national_id),
            user.id,
        );
        account.validate().map_err(Error::validation)?;

        self.store.create_account_with_user(&account, &user)
    }

    /// Every account, by number. Not restricted to the caller.
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        self.store.list_accounts()
    }

    pub fn get_account(&self, caller: Uuid, id: Uuid) -> Result<Account> {
        ensure_owner(caller, id)?;
        self.store.get_account(id)
    }

    /// Delete the caller's account; the owning user goes with it
    pub fn delete_account(&self, caller: Uuid, id: Uuid) -> Result<()> {
        ensure_owner(caller, id)?;
        self.store.delete_account(id)
    }
}

/// Parse an account id supplied on the command line or in a request path
pub fn parse_account_id(raw: &str) -> Result<Uuid> {
    Account::parse_id(raw).map_err(Error::validation)
}

fn ensure_owner(caller: Uuid, id: Uuid) -> Result<()> {
    if caller != id {
        return Err(Error::forbidden("you cannot perform this operation"));
    }
    Ok(())
}
