//! Identity service - password hashing and bearer credentials
//!
//! Passwords are hashed with Argon2id into PHC strings. Credentials are
//! HS256 JSON Web Tokens whose `sub` claim is the caller's account id. The
//! header's `kid` selects the verification key, so keys can be rotated
//! without invalidating tokens signed by a key that is still in the ring.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::config::AuthSettings;
use crate::domain::result::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
    kid: String,
}

/// Claims carried by a credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account the bearer is authenticated as
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Decoded signing keys; the first one signs
#[derive(Clone)]
struct KeyRing {
    keys: Vec<(String, Vec<u8>)>,
}

impl KeyRing {
    fn from_settings(settings: &AuthSettings) -> Result<Self> {
        let mut keys = Vec::with_capacity(settings.signing_keys.len());
        for key in &settings.signing_keys {
            let secret = STANDARD.decode(&key.secret).map_err(|e| {
                Error::Config(format!("signing key '{}' is not valid base64: {}", key.id, e))
            })?;
            if secret.is_empty() {
                return Err(Error::Config(format!("signing key '{}' is empty", key.id)));
            }
            keys.push((key.id.clone(), secret));
        }
        if keys.is_empty() {
            return Err(Error::Config("no signing key configured".to_string()));
        }
        Ok(Self { keys })
    }

    fn signing_key(&self) -> (&str, &[u8]) {
        let (id, secret) = &self.keys[0];
        (id.as_str(), secret.as_slice())
    }

    fn find(&self, kid: &str) -> Option<&[u8]> {
        self.keys
            .iter()
            .find(|(id, _)| id == kid)
            .map(|(_, secret)| secret.as_slice())
    }
}

/// Hashes passwords and issues/validates bearer credentials
#[derive(Clone)]
pub struct IdentityService {
    keys: KeyRing,
    token_ttl: Duration,
}

impl IdentityService {
    pub fn new(settings: &AuthSettings) -> Result<Self> {
        Ok(Self {
            keys: KeyRing::from_settings(settings)?,
            token_ttl: token_ttl(settings.token_ttl_secs)?,
        })
    }

    /// Hash a password with a random salt
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(hashing_error)
    }

    /// Check a password against a stored hash; a malformed hash never matches
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    pub fn issue_credential(&self, account_id: Uuid) -> Result<String> {
        self.issue_credential_at(account_id, Utc::now())
    }

    /// Issue a credential as if the current time were `now`
    pub fn issue_credential_at(&self, account_id: Uuid, now: DateTime<Utc>) -> Result<String> {
        let (kid, secret) = self.keys.signing_key();

        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
            kid: kid.to_string(),
        };
        let expires = now
            .checked_add_signed(self.token_ttl)
            .ok_or_else(|| Error::config("token lifetime reaches past the supported date range"))?;
        let claims = Claims {
            sub: account_id,
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let signature = sign(secret, &signing_input)?;

        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
    }

    pub fn validate_credential(&self, token: &str) -> Result<Uuid> {
        self.validate_credential_at(token, Utc::now())
    }

    /// Validate a credential as if the current time were `now`
    pub fn validate_credential_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid> {
        let mut parts = token.trim().split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(Error::invalid_credential("malformed token")),
            };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(Error::invalid_credential(format!(
                "unexpected signing method: {}",
                header.alg
            )));
        }

        let secret = self
            .keys
            .find(&header.kid)
            .ok_or_else(|| Error::invalid_credential("unknown signing key"))?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| Error::invalid_credential("malformed token"))?;

        let mut mac = new_mac(secret)?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| Error::invalid_credential("invalid token"))?;

        let claims: Claims = decode_segment(claims_b64)?;
        if claims.exp <= now.timestamp() {
            return Err(Error::invalid_credential("token expired"));
        }

        Ok(claims.sub)
    }
}

fn token_ttl(secs: u64) -> Result<Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .filter(|ttl| *ttl > Duration::zero())
        .ok_or_else(|| Error::config(format!("tokenTtlSecs out of range: {}", secs)))
}

fn hashing_error(err: argon2::password_hash::Error) -> Error {
    Error::internal(format!("failed to hash password: {}", err))
}

fn new_mac(secret: &[u8]) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(secret)
        .map_err(|e| Error::Config(format!("unusable signing key: {}", e)))
}

fn sign(secret: &[u8], input: &str) -> Result<Vec<u8>> {
    let mut mac = new_mac(secret)?;
    mac.update(input.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| Error::invalid_credential("malformed token"))?;
    serde_json::from_slice(&bytes).map_err(|_| Error::invalid_credential("malformed token"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SigningKey;

    fn settings(keys: &[(&str, &[u8])]) -> AuthSettings {
        AuthSettings {
            signing_keys: keys
                .iter()
                .map(|(id, secret)| SigningKey {
                    id: id.to_string(),
                    secret: STANDARD.encode(secret),
                })
                .collect(),
            token_ttl_secs: 900,
        }
    }

    fn service() -> IdentityService {
        IdentityService::new(&settings(&[("k1", b"first secret key material")])).unwrap()
    }

    #[test]
    fn test_password_hashing() {
        let identity = service();
        let hash = identity.hash("my_secure_password_123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(identity.verify("my_secure_password_123", &hash));
        assert!(!identity.verify("wrong_password", &hash));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!service().verify("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_credential_round_trip() {
        let identity = service();
        let account_id = Uuid::new_v4();
        let token = identity.issue_credential(account_id).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(identity.validate_credential(&token).unwrap(), account_id);
    }

    #[test]
    fn test_expired_credential_rejected() {
        let identity = service();
        let issued = Utc::now() - Duration::seconds(901);
        let token = identity.issue_credential_at(Uuid::new_v4(), issued).unwrap();

        let err = identity.validate_credential(&token).unwrap_err();
        assert!(matches!(err, Error::InvalidCredential(_)));
        assert!(err.message().contains("expired"));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let identity = service();
        let token = identity.issue_credential(Uuid::new_v4()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_claims = Claims {
            sub: Uuid::new_v4(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 900,
        };
        let forged = format!(
            "{}.{}.{}",
            parts[0],
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap()),
            parts[2]
        );

        assert!(matches!(
            identity.validate_credential(&forged),
            Err(Error::InvalidCredential(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let identity = service();
        for token in ["", "abc", "a.b", "a.b.c", "a.b.c.d"] {
            assert!(
                matches!(identity.validate_credential(token), Err(Error::InvalidCredential(_))),
                "token {:?} should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_rotated_key_still_verifies() {
        let old = IdentityService::new(&settings(&[("k1", b"old secret")])).unwrap();
        let account_id = Uuid::new_v4();
        let token = old.issue_credential(account_id).unwrap();

        let rotated =
            IdentityService::new(&settings(&[("k2", b"new secret"), ("k1", b"old secret")]))
                .unwrap();
        assert_eq!(rotated.validate_credential(&token).unwrap(), account_id);

        // New tokens are signed with the new key and the old service can't verify them
        let fresh = rotated.issue_credential(account_id).unwrap();
        assert!(matches!(
            old.validate_credential(&fresh),
            Err(Error::InvalidCredential(_))
        ));
    }

    #[test]
    fn test_retired_key_rejected() {
        let old = IdentityService::new(&settings(&[("k1", b"old secret")])).unwrap();
        let token = old.issue_credential(Uuid::new_v4()).unwrap();

        let retired = IdentityService::new(&settings(&[("k2", b"new secret")])).unwrap();
        let err = retired.validate_credential(&token).unwrap_err();
        assert!(err.message().contains("unknown signing key"));
    }

    fn with_ttl(secs: u64) -> Result<IdentityService> {
        let mut settings = settings(&[("k1", b"secret")]);
        settings.token_ttl_secs = secs;
        IdentityService::new(&settings)
    }

    #[test]
    fn test_unrepresentable_ttl_is_config_error() {
        for secs in [0, 10_000_000_000_000_000, i64::MAX as u64, u64::MAX] {
            assert!(
                matches!(with_ttl(secs), Err(Error::Config(_))),
                "ttl {} should be rejected",
                secs
            );
        }
    }

    #[test]
    fn test_ttl_past_date_range_fails_on_issue() {
        // Representable as a duration, but now + ttl is past year 262143
        let identity = with_ttl(10_000_000_000_000).unwrap();
        let err = identity.issue_credential(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_long_but_valid_ttl() {
        let identity = with_ttl(100 * 365 * 24 * 60 * 60).unwrap();
        let account_id = Uuid::new_v4();
        let token = identity.issue_credential(account_id).unwrap();
        assert_eq!(identity.validate_credential(&token).unwrap(), account_id);
    }

    #[test]
    fn test_hashing_failure_is_internal() {
        let err = hashing_error(argon2::password_hash::Error::Password);
        assert!(matches!(err, Error::Internal(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_empty_key_ring_is_config_error() {
        let result = IdentityService::new(&AuthSettings::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
