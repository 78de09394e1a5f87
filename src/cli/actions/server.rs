use crate::api::{
    self,
    email::{LogMailer, Mailer, ResendMailer},
    handlers::auth::{AuthConfig, AuthState, SessionIssuer},
};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub client_url: String,
    pub jwt_secret: SecretString,
    pub secure_cookies: bool,
    pub verification_token_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub resend_api_key: Option<SecretString>,
    pub resend_from: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = AuthConfig::new(args.client_url)
        .with_secure_cookies(args.secure_cookies)
        .with_verification_token_ttl_seconds(args.verification_token_ttl_seconds)
        .with_reset_token_ttl_seconds(args.reset_token_ttl_seconds)
        .with_session_ttl_seconds(args.session_ttl_seconds);

    let mailer: Arc<dyn Mailer> = match args.resend_api_key {
        Some(api_key) => Arc::new(ResendMailer::new(api_key, args.resend_from)?),
        None => {
            warn!("no Resend API key configured; outbound mail will only be logged");
            Arc::new(LogMailer)
        }
    };

    let sessions = SessionIssuer::new(args.jwt_secret, config.session_ttl_seconds());
    let auth_state = Arc::new(AuthState::new(config, sessions, mailer));

    api::new(args.port, args.dsn, auth_state).await
}
