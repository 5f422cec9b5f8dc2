use chrono::Utc;
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

use super::errors::AuthError;

/// Minimum HMAC key length accepted for HS256
const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime (100 years)
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Revocation lifetime for tokens that cannot be decoded (malformed or already expired)
const DEFAULT_INVALID_TOKEN_TTL: Duration = Duration::from_secs(60);

/// JWT claims carried by every access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub role: String,
    /// Issued-at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

/// Outcome of verifying a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenVerification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl TokenVerification {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            subject_id: None,
            role: None,
        }
    }

    fn from_claims(claims: Claims) -> Self {
        Self {
            valid: true,
            subject_id: Some(claims.sub),
            role: Some(claims.role),
        }
    }
}

/// Issues, verifies and revokes signed access tokens
///
/// The revocation set maps a token fingerprint (SHA-256 of the token) to the
/// epoch-millis instant after which the entry is meaningless. Entries are pruned
/// lazily by `verify`; `prune_expired` sweeps the whole set on demand.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    invalid_token_ttl: Duration,
    revoked: Arc<DashMap<String, i64>>,
}

impl TokenAuthority {
    /// Create a token authority with the given secret and token lifetime
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, AuthError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::WeakSecret {
                min: MIN_SECRET_LEN,
                actual: secret.len(),
            });
        }

        if ttl > MAX_TOKEN_LIFETIME {
            return Err(AuthError::InvalidLifetime(format!(
                "{:?} exceeds the maximum of {:?}",
                ttl, MAX_TOKEN_LIFETIME
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            invalid_token_ttl: DEFAULT_INVALID_TOKEN_TTL,
            revoked: Arc::new(DashMap::new()),
        })
    }

    /// Override how long undecodable tokens stay in the revocation set
    pub fn with_invalid_token_ttl(mut self, ttl: Duration) -> Self {
        self.invalid_token_ttl = ttl;
        self
    }

    /// Issue a signed token for a subject and role
    pub fn issue(&self, subject_id: &str, role: &str) -> Result<String, AuthError> {
        let issued_at = Utc::now().timestamp();
        let claims = Claims {
            sub: subject_id.to_string(),
            role: role.to_string(),
            iat: issued_at,
            // Bounded by MAX_TOKEN_LIFETIME in `new`
            exp: issued_at + self.ttl.as_secs() as i64,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Verify a token's signature, expiry and revocation status
    ///
    /// Fails closed: anything that is not a currently valid, unrevoked token is invalid.
    pub fn verify(&self, token: &str) -> TokenVerification {
        if self.is_revoked(&fingerprint(token)) {
            tracing::debug!("Rejected revoked token");
            return TokenVerification::invalid();
        }

        match self.decode(token) {
            Some(claims) => TokenVerification::from_claims(claims),
            None => TokenVerification::invalid(),
        }
    }

    /// Revoke a token until its natural expiry
    ///
    /// Tokens that cannot be decoded get a short fixed-lifetime entry instead.
    pub fn revoke(&self, token: &str) {
        let expires_at_ms = match self.decode(token) {
            // JWT expiry has second granularity and the token is accepted through
            // the whole of its final second.
            Some(claims) => claims.exp.saturating_add(1).saturating_mul(1000),
            None => now_millis().saturating_add(
                i64::try_from(self.invalid_token_ttl.as_millis()).unwrap_or(i64::MAX),
            ),
        };

        self.revoked.insert(fingerprint(token), expires_at_ms);
        tracing::info!("Token revoked ({} entries in revocation set)", self.revoked.len());
    }

    /// Remove every expired revocation entry, returning how many were dropped
    pub fn prune_expired(&self) -> usize {
        let now = now_millis();
        let before = self.revoked.len();
        self.revoked.retain(|_, expires_at| *expires_at >= now);
        before.saturating_sub(self.revoked.len())
    }

    /// Number of entries currently held in the revocation set
    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }

    /// Lookup with lazy pruning: an expired entry is deleted and treated as absent
    fn is_revoked(&self, fingerprint: &str) -> bool {
        let now = now_millis();
        if self
            .revoked
            .remove_if(fingerprint, |_, expires_at| now > *expires_at)
            .is_some()
        {
            return false;
        }
        self.revoked.contains_key(fingerprint)
    }

    fn decode(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .ok()
    }
}

fn fingerprint(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
