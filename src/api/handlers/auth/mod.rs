//! Account lifecycle and session handlers.
//!
//! Two account kinds share one lifecycle: individual adopters (`user`) and
//! organizations (`ong`) live in separate tables with identical verification,
//! login, and password-reset semantics. The handlers here coordinate the
//! storage layer, the password hasher, the session issuer, and outbound email.

mod error;
mod jwt;
pub mod login;
mod password;
pub mod reset;
pub mod session;
pub mod signup;
mod state;
mod storage;
mod types;
mod utils;
pub mod verification;

#[cfg(test)]
mod tests;

pub use error::AuthFlowError;
pub use jwt::{SessionClaims, SessionIssuer};
pub use login::{login, logout};
pub use reset::{forgot_password, reset_password};
pub use session::check_auth;
pub use signup::signup;
pub use state::{AuthConfig, AuthState};
pub use verification::verify_email;
pub use types::{
    Account, AccountEnvelope, Address, AddressPayload, ApiMessage, ForgotPasswordRequest,
    LoginRequest, ResetPasswordRequest, Role, RoleEnvelope, SignupRequest, VerifyEmailRequest,
};
