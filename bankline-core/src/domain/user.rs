//! User domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// A credential-holding identity that owns one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Argon2id PHC string; never leaves the process
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a user with an already-hashed password.
    ///
    /// `account_id` is filled in once the owning account exists.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            account_id: Uuid::nil(),
            created_at: Utc::now(),
        }
    }

    /// Validate a username/password pair before hashing
    pub fn validate_credentials(username: &str, password: &str) -> Result<(), &'static str> {
        if username.trim().is_empty() {
            return Err("username cannot be empty");
        }
        if username.chars().any(char::is_whitespace) {
            return Err("username cannot contain whitespace");
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err("password must be at least 8 characters");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = User::new("alice", "$argon2id$...");
        assert_eq!(user.username, "alice");
        assert!(user.account_id.is_nil());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("alice", "secret-hash");
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("passwordHash"));
    }

    #[test]
    fn test_credential_validation() {
        assert!(User::validate_credentials("alice", "correct horse").is_ok());
        assert!(User::validate_credentials("", "correct horse").is_err());
        assert!(User::validate_credentials("al ice", "correct horse").is_err());
        assert!(User::validate_credentials("alice", "short").is_err());
    }
}
