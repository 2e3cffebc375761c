//! Account domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A balance-holding account owned by exactly one user
///
/// Balance is kept in the smallest currency unit. Non-negativity is not a
/// storage invariant; it is only enforced when a transfer debits the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    /// External identifier (national tax id), unique across accounts
    pub national_id: String,
    /// Sequential account number, assigned by the store on creation
    pub number: i64,
    pub balance: i64,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new zero-balance account owned by `user_id`
    pub fn new(name: impl Into<String>, national_id: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            national_id: national_id.into(),
            number: 0,
            balance: 0,
            user_id,
            created_at: Utc::now(),
        }
    }

    /// Parse an account id supplied by a caller
    pub fn parse_id(raw: &str) -> Result<Uuid, &'static str> {
        Uuid::parse_str(raw.trim()).map_err(|_| "account id must be a UUID")
    }

    /// Normalize a national id: surrounding whitespace is not significant
    pub fn normalize_national_id(national_id: &str) -> String {
        national_id.trim().to_string()
    }

    /// Validate account data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("account name cannot be empty");
        }
        if self.national_id.trim().is_empty() {
            return Err("national id cannot be empty");
        }
        Ok(())
    }
}
