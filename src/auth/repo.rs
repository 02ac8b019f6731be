use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Pending,
    Active,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// User record in the database. Soft-deleted rows (deleted_at set) are
/// excluded from every lookup.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub public_id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub status: UserStatus,
    pub role: UserRole,
    pub login_attempts: i32,
    pub lock_until: Option<OffsetDateTime>,
    pub last_login: Option<OffsetDateTime>,
    pub email_verified: bool,
    pub email_verified_at: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub verification_token_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone_number: Option<&'a str>,
    pub verification_token: &'a str,
    pub verification_token_expires: OffsetDateTime,
}

const USER_COLUMNS: &str = r#"
    id, public_id, email, password_hash, first_name, last_name, phone_number,
    status, role, login_attempts, lock_until, last_login,
    email_verified, email_verified_at, verification_token, verification_token_expires,
    created_at, updated_at, deleted_at
"#;

impl User {
    /// Find a non-deleted user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
    }

    /// Find a non-deleted user by internal id.
    pub async fn find_by_id(db: &PgPool, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Find the pending user holding an outstanding verification token.
    pub async fn find_by_verification_token(db: &PgPool, token: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE verification_token = $1 AND status = 'pending' AND deleted_at IS NULL"
        ))
        .bind(token)
        .fetch_optional(db)
        .await
    }

    /// Insert a new pending user with a fresh verification token.
    pub async fn create(db: &PgPool, new: NewUser<'_>) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users
                 (public_id, email, password_hash, first_name, last_name, phone_number,
                  verification_token, verification_token_expires)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.phone_number)
        .bind(new.verification_token)
        .bind(new.verification_token_expires)
        .fetch_one(db)
        .await
    }

    pub async fn record_login_failure(
        db: &PgPool,
        id: i64,
        attempts: i32,
        lock_until: Option<OffsetDateTime>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE users SET login_attempts = $2, lock_until = $3, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(attempts)
        .bind(lock_until)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn record_login_success(db: &PgPool, id: i64) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE users
             SET login_attempts = 0, lock_until = NULL, last_login = now(), updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Flip to active and consume the verification token.
    pub async fn mark_verified(db: &PgPool, id: i64) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE users
             SET status = 'active', email_verified = TRUE, email_verified_at = now(),
                 verification_token = NULL, verification_token_expires = NULL,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Overwrite the outstanding token; the previous one stops matching.
    pub async fn rotate_verification_token(
        db: &PgPool,
        id: i64,
        token: &str,
        expires: OffsetDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE users
             SET verification_token = $2, verification_token_expires = $3, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(expires)
        .execute(db)
        .await?;
        Ok(())
    }
}
