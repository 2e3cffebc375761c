//! Auth service - login and bearer credential checks

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::ports::AccountStore;
use crate::services::identity::IdentityService;

const BAD_LOGIN: &str = "invalid username or password";

/// Credential returned by a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub token: String,
    pub token_type: String,
}

pub struct AuthService {
    store: Arc<dyn AccountStore>,
    identity: IdentityService,
}

impl AuthService {
    pub fn new(store: Arc<dyn AccountStore>, identity: IdentityService) -> Self {
        Self { store, identity }
    }

    /// Exchange a username and password for a credential bound to their account.
    ///
    /// An unknown username and a wrong password fail identically.
    pub fn login(&self, username: &str, password: &str) -> Result<AccessToken> {
        let user = match self.store.get_user_by_username(username.trim()) {
            Ok(user) => user,
            Err(Error::NotFound(_)) => return Err(Error::unauthenticated(BAD_LOGIN)),
            Err(e) => return Err(e),
        };

        if !self.identity.verify(password, &user.password_hash) {
            return Err(Error::unauthenticated(BAD_LOGIN));
        }

        Ok(AccessToken {
            token: self.identity.issue_credential(user.account_id)?,
            token_type: "Bearer".to_string(),
        })
    }

    /// Resolve the caller's account id from a presented token
    pub fn authenticate(&self, token: Option<&str>) -> Result<Uuid> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::unauthenticated("token header is not present"))?;
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        self.identity.validate_credential(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryAccountStore;
    use crate::config::{AuthSettings, SigningKey};
    use crate::services::account::{AccountService, CreateAccountRequest};

    fn setup() -> (AccountService, AuthService) {
        let store: Arc<dyn AccountStore> = Arc::new(InMemoryAccountStore::new());
        let settings = AuthSettings {
            signing_keys: vec![SigningKey::generate("k1")],
            ..AuthSettings::default()
        };
        let identity = IdentityService::new(&settings).unwrap();
        (
            AccountService::new(store.clone(), identity.clone()),
            AuthService::new(store, identity),
        )
    }

    fn register(accounts: &AccountService) -> Uuid {
        accounts
            .create_account(&CreateAccountRequest {
                name: "Alice".to_string(),
                national_id: "111".to_string(),
                username: "alice".to_string(),
                password: "correct horse".to_string(),
            })
            .unwrap()
            .id
    }

    #[test]
    fn test_login_binds_token_to_account() {
        let (accounts, auth) = setup();
        let account_id = register(&accounts);

        let token = auth.login("alice", "correct horse").unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(auth.authenticate(Some(&token.token)).unwrap(), account_id);

        let header = format!("Bearer {}", token.token);
        assert_eq!(auth.authenticate(Some(&header)).unwrap(), account_id);
    }

    #[test]
    fn test_bad_login_is_indistinguishable() {
        let (accounts, auth) = setup();
        register(&accounts);

        let wrong_password = auth.login("alice", "wrong password").unwrap_err();
        let unknown_user = auth.login("bob", "correct horse").unwrap_err();

        assert!(matches!(wrong_password, Error::Unauthenticated(_)));
        assert!(matches!(unknown_user, Error::Unauthenticated(_)));
        assert_eq!(wrong_password.message(), unknown_user.message());
    }

    #[test]
    fn test_missing_token() {
        let (_, auth) = setup();
        for token in [None, Some(""), Some("   ")] {
            assert!(matches!(auth.authenticate(token), Err(Error::Unauthenticated(_))));
        }
    }

    #[test]
    fn test_bad_token() {
        let (_, auth) = setup();
        assert!(matches!(
            auth.authenticate(Some("not.a.jwt")),
            Err(Error::InvalidCredential(_))
        ));
    }
}
