use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use std::sync::OnceLock;

const TOKEN_BYTES: usize = 32;

/// Lowercase + trim so lookups and inserts agree on one canonical form.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Shape check only; real ownership proof is the verification email.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap_or_else(|_| unreachable!())
    });
    re.is_match(email)
}

/// Generate an opaque single-use token with 256 bits of CSPRNG entropy,
/// base64url-encoded without padding. Expiry is attached by the caller.
pub fn generate_token() -> Result<String> {
    let mut bytes = [0_u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("Failed to source random bytes for token")?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Build the reset link the client front-end understands.
#[must_use]
pub fn build_reset_url(client_base_url: &str, token: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(token.as_bytes()).collect();
    format!(
        "{}/#reset-password?token={}",
        client_base_url.trim_end_matches('/'),
        encoded
    )
}
