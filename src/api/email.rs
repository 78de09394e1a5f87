//! Outbound transactional email.
//!
//! Delivery goes through the Resend HTTP API when an API key is configured,
//! and falls back to logging the message otherwise. Sends are fire-and-forget
//! from the handlers' point of view, with a bounded retry in the background.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::{header, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
const MAX_ATTEMPTS: u32 = 3;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl OutboundEmail {
    #[must_use]
    pub fn verification(to: &str, verification_token: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Verify your email address".to_string(),
            html: format!("Verify your email with this Token: {verification_token}"),
        }
    }

    #[must_use]
    pub fn welcome(to: &str, name: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Welcome to PetConnect".to_string(),
            html: format!("Welcome {name}! Hope you have a great time using our app."),
        }
    }

    #[must_use]
    pub fn password_reset(to: &str, reset_url: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Reset your password".to_string(),
            html: format!(
                "<p>Hello,</p>\
                 <p>Click the link below to reset your password:</p>\
                 <p><a href=\"{reset_url}\" target=\"_blank\" rel=\"noopener noreferrer\">Reset your password</a></p>\
                 <p>If you did not request a password reset, please ignore this email.</p>"
            ),
        }
    }

    #[must_use]
    pub fn reset_confirmation(to: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Your password has been reset".to_string(),
            html: "Your password has been reset successfully.".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Resend API returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("email transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), DeliveryError>;
}

/// Delivers email through the Resend HTTP API.
pub struct ResendMailer {
    client: Client,
    api_key: SecretString,
    from: String,
}

#[derive(Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl ResendMailer {
    /// Build a Resend-backed mailer.
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(api_key: SecretString, from: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build email HTTP client")?;

        Ok(Self {
            client,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), DeliveryError> {
        let payload = ResendPayload {
            from: &self.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
        };

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Api { status, body })
    }
}

/// Logs outbound mail instead of delivering it, for local development.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), DeliveryError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.html,
            "outbound email (log only)"
        );
        Ok(())
    }
}

/// Deliver in the background so handlers do not block on the email provider.
pub fn spawn_delivery(mailer: Arc<dyn Mailer>, email: OutboundEmail) {
    tokio::spawn(async move {
        deliver_with_retry(mailer.as_ref(), &email).await;
    });
}

async fn deliver_with_retry(mailer: &dyn Mailer, email: &OutboundEmail) {
    for attempt in 1..=MAX_ATTEMPTS {
        match mailer.send(email).await {
            Ok(()) => {
                info!(to = %email.to, subject = %email.subject, "email delivered");
                return;
            }
            Err(err) if attempt < MAX_ATTEMPTS => {
                let delay = backoff_delay(attempt);
                warn!(
                    to = %email.to,
                    subject = %email.subject,
                    attempt,
                    "email delivery failed, retrying in {}ms: {err}",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                error!(
                    to = %email.to,
                    subject = %email.subject,
                    "email delivery failed after {MAX_ATTEMPTS} attempts: {err}"
                );
            }
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let base = Duration::from_millis(500 * u64::from(2_u32.saturating_pow(attempt - 1)));
    base + jitter_delay()
}

fn jitter_delay() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..250))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FlakyMailer {
        failures: Mutex<u32>,
        sent: Mutex<Vec<OutboundEmail>>,
    }

    #[async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, email: &OutboundEmail) -> Result<(), DeliveryError> {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(DeliveryError::Api {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "boom".to_string(),
                });
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let mailer = FlakyMailer {
            failures: Mutex::new(2),
            sent: Mutex::new(Vec::new()),
        };
        let email = OutboundEmail::welcome("ana@example.com", "Ana");
        deliver_with_retry(&mailer, &email).await;
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let mailer = FlakyMailer {
            failures: Mutex::new(MAX_ATTEMPTS),
            sent: Mutex::new(Vec::new()),
        };
        let email = OutboundEmail::reset_confirmation("ana@example.com");
        deliver_with_retry(&mailer, &email).await;
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn backoff_grows_per_attempt() {
        assert!(backoff_delay(1) >= Duration::from_millis(500));
        assert!(backoff_delay(2) >= Duration::from_millis(1000));
        assert!(backoff_delay(3) >= Duration::from_millis(2000));
    }

    #[test]
    fn verification_email_carries_token() {
        let email = OutboundEmail::verification("ana@example.com", "abc123");
        assert_eq!(email.subject, "Verify your email address");
        assert!(email.html.contains("abc123"));
    }

    #[test]
    fn reset_email_links_url() {
        let email = OutboundEmail::password_reset(
            "ana@example.com",
            "http://localhost:5173/#reset-password?token=abc",
        );
        assert!(email
            .html
            .contains("href=\"http://localhost:5173/#reset-password?token=abc\""));
    }
}
