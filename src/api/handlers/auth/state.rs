use crate::api::email::Mailer;
use crate::api::handlers::auth::jwt::SessionIssuer;
use std::sync::Arc;

const DEFAULT_VERIFICATION_TOKEN_TTL_SECONDS: i64 = 60 * 60 * 24;
const DEFAULT_RESET_TOKEN_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 60 * 60 * 24 * 7;

/// Auth policy knobs, constructed once at startup.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    client_base_url: String,
    secure_cookies: bool,
    verification_token_ttl_seconds: i64,
    reset_token_ttl_seconds: i64,
    session_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(client_base_url: String) -> Self {
        Self {
            client_base_url,
            secure_cookies: false,
            verification_token_ttl_seconds: DEFAULT_VERIFICATION_TOKEN_TTL_SECONDS,
            reset_token_ttl_seconds: DEFAULT_RESET_TOKEN_TTL_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure_cookies: bool) -> Self {
        self.secure_cookies = secure_cookies;
        self
    }

    #[must_use]
    pub fn with_verification_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.verification_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_reset_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn client_base_url(&self) -> &str {
        &self.client_base_url
    }

    #[must_use]
    pub const fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    #[must_use]
    pub const fn verification_token_ttl_seconds(&self) -> i64 {
        self.verification_token_ttl_seconds
    }

    #[must_use]
    pub const fn reset_token_ttl_seconds(&self) -> i64 {
        self.reset_token_ttl_seconds
    }

    #[must_use]
    pub const fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }
}

/// Shared per-process auth dependencies, injected into handlers via
/// `Extension<Arc<AuthState>>`.
pub struct AuthState {
    config: AuthConfig,
    sessions: SessionIssuer,
    mailer: Arc<dyn Mailer>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, sessions: SessionIssuer, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            config,
            sessions,
            mailer,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub const fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    #[must_use]
    pub fn mailer(&self) -> Arc<dyn Mailer> {
        Arc::clone(&self.mailer)
    }
}
