//! # PetConnect Account & Authentication Service
//!
//! Backend for the PetConnect adoption platform. It manages two parallel
//! account kinds with an identical credential lifecycle:
//!
//! - **Adopters** (`user` role): individuals browsing and adopting pets.
//! - **Organizations** (`ong` role): shelters and rescue groups, which must
//!   register with a phone number and a full address.
//!
//! Both kinds move through the same states: created unverified with a 24-hour
//! email verification token, verified by redeeming that token, authenticated
//! via a signed session cookie, and optionally through a one-hour
//! password-reset window. The role of an account is derived from which
//! collection it lives in and is fixed at creation.
//!
//! Sessions are stateless JWTs delivered in an `HttpOnly`, `SameSite=Strict`
//! cookie; logout instructs the client to drop the cookie and no server-side
//! revocation list exists, so a leaked token stays valid until expiry.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
