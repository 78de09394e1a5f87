//! Lifecycle tests that run against a real database.
//!
//! Gated on `PETCONNECT_TEST_DSN`: without it every test here passes as a
//! skip, so local runs without Postgres stay green. Point the variable at a
//! scratch database; migrations are applied on connect and each test uses
//! unique emails, so tests do not interfere with each other or with reruns.

use super::jwt::SessionIssuer;
use super::login::login;
use super::signup::signup;
use super::state::{AuthConfig, AuthState};
use super::storage::{self, InsertOutcome, NewUser};
use super::types::{AddressPayload, LoginRequest, Role, SignupRequest};
use super::utils::generate_token;
use crate::api::email::LogMailer;
use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, StatusCode},
    response::IntoResponse,
    Json,
};
use secrecy::SecretString;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc};
use uuid::Uuid;

async fn test_pool() -> Result<Option<PgPool>> {
    let Ok(dsn) = env::var("PETCONNECT_TEST_DSN") else {
        eprintln!("Skipping integration test: PETCONNECT_TEST_DSN is not set");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&dsn)
        .await
        .context("failed to connect test pool")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to apply migrations")?;

    Ok(Some(pool))
}

fn test_state() -> Arc<AuthState> {
    let config = AuthConfig::new("http://localhost:5173".to_string());
    let sessions = SessionIssuer::new(
        SecretString::from("test-secret".to_string()),
        config.session_ttl_seconds(),
    );
    Arc::new(AuthState::new(config, sessions, Arc::new(LogMailer)))
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

async fn insert_user_account(
    pool: &PgPool,
    email: &str,
    password: &str,
    verification_token: &str,
    verification_token_ttl_seconds: i64,
) -> Result<()> {
    let outcome = storage::insert_user(
        pool,
        NewUser {
            name: "Ana",
            email,
            password: password.to_string(),
            verification_token,
            verification_token_ttl_seconds,
        },
    )
    .await?;
    match outcome {
        InsertOutcome::Created(account) => {
            assert!(!account.is_verified);
            Ok(())
        }
        InsertOutcome::Conflict => anyhow::bail!("unexpected conflict inserting {email}"),
    }
}

fn user_signup(email: &str) -> SignupRequest {
    SignupRequest {
        name: Some("Ana".to_string()),
        email: Some(email.to_string()),
        password: Some("longenough1".to_string()),
        role: None,
        phone: None,
        address: None,
    }
}

fn ong_signup(email: &str) -> SignupRequest {
    SignupRequest {
        name: Some("Abrigo Recife".to_string()),
        email: Some(email.to_string()),
        password: Some("longenough1".to_string()),
        role: Some("ong".to_string()),
        phone: Some("+55 81 99999-0000".to_string()),
        address: Some(AddressPayload {
            street: Some("Rua A".to_string()),
            city: Some("Recife".to_string()),
            state: Some("PE".to_string()),
            zip_code: Some("50000-000".to_string()),
        }),
    }
}

async fn body_message(response: axum::response::Response) -> Result<String> {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .context("failed to read response body")?;
    let json: serde_json::Value = serde_json::from_slice(&body)?;
    Ok(json["message"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn verification_token_is_single_use() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };

    let email = unique_email("single-use");
    let token = generate_token()?;
    insert_user_account(&pool, &email, "longenough1", &token, 60).await?;

    let verified = storage::consume_verification_token(&pool, &token)
        .await?
        .context("first redemption should match")?;
    assert_eq!(verified.role, Role::User);
    assert_eq!(verified.email, email);

    // The redeeming UPDATE cleared the token, so a second call misses exactly
    // like a bogus code.
    assert!(storage::consume_verification_token(&pool, &token)
        .await?
        .is_none());

    Ok(())
}

#[tokio::test]
async fn expired_verification_token_misses() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };

    let email = unique_email("expired-verify");
    let token = generate_token()?;
    // Negative TTL stores an expires_at already in the past.
    insert_user_account(&pool, &email, "longenough1", &token, -1).await?;

    assert!(storage::consume_verification_token(&pool, &token)
        .await?
        .is_none());

    Ok(())
}

#[tokio::test]
async fn reset_token_expiry_boundary() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };

    let email = unique_email("reset-boundary");
    let verification = generate_token()?;
    insert_user_account(&pool, &email, "longenough1", &verification, 60).await?;

    // A token unknown to either table misses without touching any row.
    let bogus = generate_token()?;
    assert!(
        storage::consume_reset_token(&pool, &bogus, "newpassword1".to_string())
            .await?
            .is_none()
    );

    // Expired one second ago: must behave exactly like an absent token.
    let reset = generate_token()?;
    sqlx::query(
        "UPDATE users
        SET reset_password_token = $1,
            reset_password_expires_at = NOW() - INTERVAL '1 second'
        WHERE email = $2",
    )
    .bind(&reset)
    .bind(&email)
    .execute(&pool)
    .await?;

    assert!(
        storage::consume_reset_token(&pool, &reset, "newpassword1".to_string())
            .await?
            .is_none()
    );

    // Re-armed with a future expiry the same token redeems.
    sqlx::query(
        "UPDATE users
        SET reset_password_expires_at = NOW() + INTERVAL '60 seconds'
        WHERE email = $1",
    )
    .bind(&email)
    .execute(&pool)
    .await?;

    let hit = storage::consume_reset_token(&pool, &reset, "newpassword1".to_string()).await?;
    assert_eq!(hit.as_deref(), Some(email.as_str()));

    // Redemption cleared the token.
    assert!(
        storage::consume_reset_token(&pool, &reset, "anotherpass1".to_string())
            .await?
            .is_none()
    );

    Ok(())
}

#[tokio::test]
async fn signup_conflicts_across_tables() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let state = test_state();
    let email = unique_email("conflict");

    let response = signup(
        Extension(pool.clone()),
        Extension(state.clone()),
        Some(Json(user_signup(&email))),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);

    // Same email as an organization must be rejected even though the ongs
    // table itself has no such row.
    let response = signup(
        Extension(pool.clone()),
        Extension(state.clone()),
        Some(Json(ong_signup(&email))),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_message(response).await?, "Email already in use");

    // And the other way round: an ong email blocks a user signup.
    let ong_email = unique_email("conflict-ong");
    let response = signup(
        Extension(pool.clone()),
        Extension(state.clone()),
        Some(Json(ong_signup(&ong_email))),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);

    let response = signup(
        Extension(pool),
        Extension(state),
        Some(Json(user_signup(&ong_email))),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_message(response).await?, "Email already in use");

    Ok(())
}

#[tokio::test]
async fn reset_password_then_login_round_trip() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let state = test_state();

    let email = unique_email("reset-login");
    let verification = generate_token()?;
    insert_user_account(&pool, &email, "oldpassword1", &verification, 60).await?;
    storage::consume_verification_token(&pool, &verification)
        .await?
        .context("verification should match")?;

    let reset = generate_token()?;
    let stored = storage::start_password_reset(&pool, &email, &reset, 60).await?;
    assert_eq!(stored.as_deref(), Some(email.as_str()));

    let hit = storage::consume_reset_token(&pool, &reset, "newpassword1".to_string()).await?;
    assert_eq!(hit.as_deref(), Some(email.as_str()));

    // The new password logs in and a session cookie is issued.
    let response = login(
        Extension(pool.clone()),
        Extension(state.clone()),
        Some(Json(LoginRequest {
            email: Some(email.clone()),
            password: Some("newpassword1".to_string()),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(cookie.starts_with("token="));

    // The old password no longer does, with the generic credential message.
    let response = login(
        Extension(pool),
        Extension(state),
        Some(Json(LoginRequest {
            email: Some(email),
            password: Some("oldpassword1".to_string()),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_message(response).await?, "Invalid email or password");

    Ok(())
}
