//! Configuration management
//!
//! Settings live in `settings.json` inside the bankline directory:
//! ```json
//! {
//!   "auth": { "signingKeys": [{ "id": "k1", "secret": "<base64>" }], "tokenTtlSecs": 900 },
//!   "transfers": { "atomic": false }
//! }
//! ```
//! Fields this crate doesn't manage are preserved when saving.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use base64::Engine;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default credential lifetime: 15 minutes
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 900;

const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    auth: AuthSettings,
    #[serde(default)]
    transfers: TransferSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Credential signing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    /// Key ring; the first key signs, every key verifies
    #[serde(default)]
    pub signing_keys: Vec<SigningKey>,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            signing_keys: Vec::new(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

fn default_token_ttl() -> u64 {
    DEFAULT_TOKEN_TTL_SECS
}

/// HMAC key for bearer credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey {
    pub id: String,
    /// Base64-encoded key material
    pub secret: String,
}

impl SigningKey {
    /// Generate a fresh random 256-bit key
    pub fn generate(id: impl Into<String>) -> Self {
        let secret: [u8; 32] = rand::thread_rng().gen();
        Self {
            id: id.into(),
            secret: base64::engine::general_purpose::STANDARD.encode(secret),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSettings {
    /// Run each transfer as one conditional, all-or-nothing store operation
    #[serde(default)]
    pub atomic: bool,
}

/// Bankline configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub auth: AuthSettings,
    pub transfers: TransferSettings,
}

impl Config {
    /// Load config from the bankline directory
    ///
    /// Environment overrides (for CI and deployments):
    /// - `BANKLINE_SIGNING_KEY`: base64 secret replacing the whole key ring
    /// - `BANKLINE_ATOMIC_TRANSFERS`: true/false
    ///
    /// If no signing key is configured anywhere, one is generated and saved.
    pub fn load(bankline_dir: &Path) -> Result<Self> {
        let raw = read_settings(bankline_dir)?;

        let mut config = Self {
            auth: raw.auth,
            transfers: raw.transfers,
        };

        config.apply_overrides(
            std::env::var("BANKLINE_SIGNING_KEY").ok(),
            std::env::var("BANKLINE_ATOMIC_TRANSFERS").ok().as_deref(),
        )?;

        if config.auth.signing_keys.is_empty() {
            config.auth.signing_keys.push(SigningKey::generate("k1"));
            config.save(bankline_dir)?;
        }

        Ok(config)
    }

    /// Save config to the bankline directory, keeping unmanaged fields
    pub fn save(&self, bankline_dir: &Path) -> Result<()> {
        let mut settings = read_settings(bankline_dir)?;

        settings.auth = self.auth.clone();
        settings.transfers = self.transfers;

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(bankline_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    /// Apply environment-style overrides on top of the file settings
    pub fn apply_overrides(
        &mut self,
        signing_key: Option<String>,
        atomic_transfers: Option<&str>,
    ) -> Result<()> {
        if let Some(secret) = signing_key {
            self.auth.signing_keys = vec![SigningKey {
                id: "env".to_string(),
                secret,
            }];
        }

        if let Some(value) = atomic_transfers {
            self.transfers.atomic = parse_flag(value).ok_or_else(|| {
                anyhow!(
                    "BANKLINE_ATOMIC_TRANSFERS must be true/1/yes or false/0/no, got '{}'",
                    value
                )
            })?;
        }

        Ok(())
    }

    /// Put a new signing key in front of the ring; older keys keep verifying
    pub fn rotate_signing_key(&mut self, id: impl Into<String>) {
        self.auth.signing_keys.insert(0, SigningKey::generate(id));
    }
}

fn read_settings(bankline_dir: &Path) -> Result<SettingsFile> {
    let settings_path = bankline_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    // A parse error must not turn into defaults; save() writes this back
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid settings file: {}", settings_path.display()))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
