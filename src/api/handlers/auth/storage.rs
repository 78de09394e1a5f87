//! Database access for both account tables.
//!
//! `users` and `ongs` share one lifecycle; every resolver operation probes
//! users first, then ongs, so call sites behave deterministically. Plaintext
//! passwords never leave this module unhashed: every insert or update that
//! sets a password hashes it here.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::password::hash_password;
use super::types::{Account, Address, Role};

/// Outcome when inserting a new account. The dual-lookup duplicate check runs
/// first, but the per-table unique index is the backstop for races.
pub(super) enum InsertOutcome {
    Created(Account),
    Conflict,
}

/// Row fields shared by both tables plus the stored credential.
pub(super) struct CredentialedAccount {
    pub(super) account: Account,
    pub(super) role: Role,
    pub(super) password_hash: Option<String>,
}

/// Fields needed after a verification token is consumed.
pub(super) struct VerifiedAccount {
    pub(super) role: Role,
    pub(super) name: String,
    pub(super) email: String,
}

/// New individual adopter account.
pub(super) struct NewUser<'a> {
    pub(super) name: &'a str,
    pub(super) email: &'a str,
    pub(super) password: String,
    pub(super) verification_token: &'a str,
    pub(super) verification_token_ttl_seconds: i64,
}

/// New organization account; phone and full address are mandatory.
pub(super) struct NewOng<'a> {
    pub(super) name: &'a str,
    pub(super) email: &'a str,
    pub(super) password: String,
    pub(super) phone: &'a str,
    pub(super) address: Address,
    pub(super) verification_token: &'a str,
    pub(super) verification_token_ttl_seconds: i64,
}

const USER_COLUMNS: &str =
    "id, name, email, is_verified, last_login, created_at, updated_at, password_hash";
const ONG_COLUMNS: &str = "id, name, email, is_verified, last_login, created_at, updated_at, \
     password_hash, phone, street, city, state, zip_code";

fn account_from_user_row(row: &PgRow) -> CredentialedAccount {
    CredentialedAccount {
        account: Account {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            is_verified: row.get("is_verified"),
            phone: None,
            address: None,
            last_login: row.get("last_login"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
        role: Role::User,
        password_hash: row.get("password_hash"),
    }
}

fn account_from_ong_row(row: &PgRow) -> CredentialedAccount {
    CredentialedAccount {
        account: Account {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            is_verified: row.get("is_verified"),
            phone: Some(row.get("phone")),
            address: Some(Address {
                street: row.get("street"),
                city: row.get("city"),
                state: row.get("state"),
                zip_code: row.get("zip_code"),
            }),
            last_login: row.get("last_login"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
        role: Role::Ong,
        password_hash: row.get("password_hash"),
    }
}

/// Resolve an account by email, users first, then ongs.
pub(super) async fn find_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<CredentialedAccount>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by email")?;

    if let Some(row) = row {
        return Ok(Some(account_from_user_row(&row)));
    }

    let query = format!("SELECT {ONG_COLUMNS} FROM ongs WHERE email = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup ong by email")?;

    Ok(row.map(|row| account_from_ong_row(&row)))
}

/// Resolve an account by id within the table named by `role`. Ids are only
/// unique per table, so the caller must already know the role.
pub(super) async fn find_by_id(pool: &PgPool, id: Uuid, role: Role) -> Result<Option<Account>> {
    let query = match role {
        Role::User => format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"),
        Role::Ong => format!("SELECT {ONG_COLUMNS} FROM ongs WHERE id = $1"),
    };
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by id")?;

    Ok(row.map(|row| match role {
        Role::User => account_from_user_row(&row).account,
        Role::Ong => account_from_ong_row(&row).account,
    }))
}

/// Insert an individual account with a pending verification token. The
/// plaintext password is hashed here.
pub(super) async fn insert_user(pool: &PgPool, new: NewUser<'_>) -> Result<InsertOutcome> {
    let password_hash = hash_password(new.password).await?;

    let query = format!(
        "INSERT INTO users
            (name, email, password_hash, verification_token, verification_token_expires_at)
        VALUES ($1, $2, $3, $4, NOW() + ($5 * INTERVAL '1 second'))
        RETURNING {USER_COLUMNS}"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(new.name)
        .bind(new.email)
        .bind(password_hash)
        .bind(new.verification_token)
        .bind(new.verification_token_ttl_seconds)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertOutcome::Created(account_from_user_row(&row).account)),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// Insert an organization account with a pending verification token. The
/// plaintext password is hashed here.
pub(super) async fn insert_ong(pool: &PgPool, new: NewOng<'_>) -> Result<InsertOutcome> {
    let password_hash = hash_password(new.password).await?;

    let query = format!(
        "INSERT INTO ongs
            (name, email, password_hash, phone, street, city, state, zip_code,
             verification_token, verification_token_expires_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW() + ($10 * INTERVAL '1 second'))
        RETURNING {ONG_COLUMNS}"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(new.name)
        .bind(new.email)
        .bind(password_hash)
        .bind(new.phone)
        .bind(new.address.street)
        .bind(new.address.city)
        .bind(new.address.state)
        .bind(new.address.zip_code)
        .bind(new.verification_token)
        .bind(new.verification_token_ttl_seconds)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertOutcome::Created(account_from_ong_row(&row).account)),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert ong"),
    }
}

/// Redeem a verification token. The conditional UPDATE matches and clears the
/// token in one statement, so redemption is single-use with no race window;
/// expired tokens miss exactly like absent ones.
pub(super) async fn consume_verification_token(
    pool: &PgPool,
    code: &str,
) -> Result<Option<VerifiedAccount>> {
    for (table, role) in [("users", Role::User), ("ongs", Role::Ong)] {
        let query = format!(
            "UPDATE {table}
            SET is_verified = TRUE,
                verification_token = NULL,
                verification_token_expires_at = NULL,
                updated_at = NOW()
            WHERE verification_token = $1
              AND verification_token_expires_at > NOW()
            RETURNING name, email"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(code)
            .fetch_optional(pool)
            .instrument(span)
            .await
            .context("failed to consume verification token")?;

        if let Some(row) = row {
            return Ok(Some(VerifiedAccount {
                role,
                name: row.get("name"),
                email: row.get("email"),
            }));
        }
    }

    Ok(None)
}

/// Attach a reset token to the account matching `email`, users first. Returns
/// the account's stored email when a row matched.
pub(super) async fn start_password_reset(
    pool: &PgPool,
    email: &str,
    reset_token: &str,
    reset_token_ttl_seconds: i64,
) -> Result<Option<String>> {
    for table in ["users", "ongs"] {
        let query = format!(
            "UPDATE {table}
            SET reset_password_token = $2,
                reset_password_expires_at = NOW() + ($3 * INTERVAL '1 second'),
                updated_at = NOW()
            WHERE email = $1
            RETURNING email"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(email)
            .bind(reset_token)
            .bind(reset_token_ttl_seconds)
            .fetch_optional(pool)
            .instrument(span)
            .await
            .context("failed to start password reset")?;

        if let Some(row) = row {
            return Ok(Some(row.get("email")));
        }
    }

    Ok(None)
}

/// Redeem a reset token and store the new credential. Hashing happens here;
/// the conditional UPDATE clears the token atomically with the credential
/// change. Returns the account's email when a row matched.
pub(super) async fn consume_reset_token(
    pool: &PgPool,
    reset_token: &str,
    new_password: String,
) -> Result<Option<String>> {
    // Unauthenticated path: probe the indexed token columns before paying for
    // the bcrypt hash. The conditional UPDATE below stays the authoritative
    // atomic consume.
    if !reset_token_pending(pool, reset_token).await? {
        return Ok(None);
    }

    let password_hash = hash_password(new_password).await?;

    for table in ["users", "ongs"] {
        let query = format!(
            "UPDATE {table}
            SET password_hash = $2,
                reset_password_token = NULL,
                reset_password_expires_at = NULL,
                updated_at = NOW()
            WHERE reset_password_token = $1
              AND reset_password_expires_at > NOW()
            RETURNING email"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(reset_token)
            .bind(&password_hash)
            .fetch_optional(pool)
            .instrument(span)
            .await
            .context("failed to consume reset token")?;

        if let Some(row) = row {
            return Ok(Some(row.get("email")));
        }
    }

    Ok(None)
}

async fn reset_token_pending(pool: &PgPool, reset_token: &str) -> Result<bool> {
    for table in ["users", "ongs"] {
        let query = format!(
            "SELECT 1 FROM {table}
            WHERE reset_password_token = $1
              AND reset_password_expires_at > NOW()"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(reset_token)
            .fetch_optional(pool)
            .instrument(span)
            .await
            .context("failed to probe reset token")?;

        if row.is_some() {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Record a successful login and return the new timestamp.
pub(super) async fn update_last_login(
    pool: &PgPool,
    id: Uuid,
    role: Role,
) -> Result<DateTime<Utc>> {
    let table = match role {
        Role::User => "users",
        Role::Ong => "ongs",
    };
    let query = format!(
        "UPDATE {table}
        SET last_login = NOW(), updated_at = NOW()
        WHERE id = $1
        RETURNING last_login"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to update last login")?;

    Ok(row.get("last_login"))
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::{borrow::Cow, error::Error as StdError, fmt};

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test db error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &str {
            "test db error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[test]
    fn unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23503"),
        }));
        assert!(!is_unique_violation(&err));

        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }
}
