use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use secrecy::SecretString;

pub const ARG_CLIENT_URL: &str = "client-url";
pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";

/// Session and token settings parsed from CLI matches.
#[derive(Debug)]
pub struct Options {
    pub client_url: String,
    pub jwt_secret: SecretString,
    pub secure_cookies: bool,
    pub verification_token_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
}

impl Options {
    /// Extract auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let client_url = matches
            .get_one::<String>(ARG_CLIENT_URL)
            .cloned()
            .context("missing required argument: --client-url")?;
        let jwt_secret = matches
            .get_one::<String>(ARG_JWT_SECRET)
            .cloned()
            .map(SecretString::from)
            .context("missing required argument: --jwt-secret")?;

        Ok(Self {
            client_url,
            jwt_secret,
            secure_cookies: matches.get_flag(ARG_SECURE_COOKIES),
            verification_token_ttl_seconds: matches
                .get_one::<i64>("verification-token-ttl-seconds")
                .copied()
                .unwrap_or(86_400),
            reset_token_ttl_seconds: matches
                .get_one::<i64>("reset-token-ttl-seconds")
                .copied()
                .unwrap_or(3600),
            session_ttl_seconds: matches
                .get_one::<i64>("session-ttl-seconds")
                .copied()
                .unwrap_or(604_800),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CLIENT_URL)
                .long(ARG_CLIENT_URL)
                .help("Frontend base URL used for CORS and password reset links")
                .env("PETCONNECT_CLIENT_URL")
                .default_value("http://localhost:5173"),
        )
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Secret used to sign session tokens")
                .env("PETCONNECT_JWT_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIES)
                .long(ARG_SECURE_COOKIES)
                .help("Mark session cookies Secure (enable when serving over HTTPS)")
                .env("PETCONNECT_SECURE_COOKIES")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verification-token-ttl-seconds")
                .long("verification-token-ttl-seconds")
                .help("Email verification token TTL in seconds")
                .env("PETCONNECT_VERIFICATION_TOKEN_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("reset-token-ttl-seconds")
                .long("reset-token-ttl-seconds")
                .help("Password reset token TTL in seconds")
                .env("PETCONNECT_RESET_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("session-ttl-seconds")
                .long("session-ttl-seconds")
                .help("Session cookie and token TTL in seconds")
                .env("PETCONNECT_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
}
