use crate::api::handlers::auth::types::Role;
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by the session cookie: account id plus the role naming the
/// table the id is unique within.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Mints and verifies HS256 session credentials. Stateless: no server-side
/// revocation, re-issuance only on a fresh login.
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(secret: SecretString, ttl_seconds: i64) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_seconds,
        }
    }

    /// Issue a signed session credential for the account.
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue(&self, account_id: Uuid, role: Role) -> Result<String> {
        let iat = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: account_id,
            role,
            iat,
            exp: iat + self.ttl_seconds,
        };
        encode(&Header::default(), &claims, &self.encoding).context("Failed to sign session token")
    }

    /// Verify a session credential and return its claims.
    /// # Errors
    /// Returns an error for a bad signature, malformed token, or expiry.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding, &Validation::default())
            .context("Invalid session token")?;
        Ok(data.claims)
    }
}
