use clap::{Arg, Command};
use secrecy::SecretString;

pub const ARG_RESEND_API_KEY: &str = "resend-api-key";
pub const ARG_RESEND_FROM: &str = "resend-from";

/// Outbound mail settings parsed from CLI matches.
#[derive(Debug)]
pub struct Options {
    /// When absent the server logs outbound mail instead of delivering it.
    pub resend_api_key: Option<SecretString>,
    pub resend_from: String,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &clap::ArgMatches) -> Self {
        Self {
            resend_api_key: matches
                .get_one::<String>(ARG_RESEND_API_KEY)
                .cloned()
                .map(SecretString::from),
            resend_from: matches
                .get_one::<String>(ARG_RESEND_FROM)
                .cloned()
                .unwrap_or_else(|| "PetConnect <onboarding@resend.dev>".to_string()),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_RESEND_API_KEY)
                .long(ARG_RESEND_API_KEY)
                .help("Resend API key; when omitted outbound mail is logged instead of sent")
                .env("PETCONNECT_RESEND_API_KEY"),
        )
        .arg(
            Arg::new(ARG_RESEND_FROM)
                .long(ARG_RESEND_FROM)
                .help("From address for transactional email")
                .env("PETCONNECT_RESEND_FROM")
                .default_value("PetConnect <onboarding@resend.dev>"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn missing_key_means_log_only() {
        temp_env::with_vars([("PETCONNECT_RESEND_API_KEY", None::<&str>)], || {
            let command = with_args(Command::new("petconnect"));
            let matches = command.get_matches_from(vec!["petconnect"]);
            let options = Options::parse(&matches);
            assert!(options.resend_api_key.is_none());
            assert_eq!(options.resend_from, "PetConnect <onboarding@resend.dev>");
        });
    }

    #[test]
    fn key_and_from_parsed() {
        let command = with_args(Command::new("petconnect"));
        let matches = command.get_matches_from(vec![
            "petconnect",
            "--resend-api-key",
            "re_123",
            "--resend-from",
            "PetConnect <hello@petconnect.dev>",
        ]);
        let options = Options::parse(&matches);
        assert_eq!(
            options.resend_api_key.map(|key| key.expose_secret().to_string()),
            Some("re_123".to_string())
        );
        assert_eq!(options.resend_from, "PetConnect <hello@petconnect.dev>");
    }
}
