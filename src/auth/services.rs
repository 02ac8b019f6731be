use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::auth::claims::Claims;
use crate::auth::dto::{LoginData, LoginRequest, PublicUser, RegisterRequest, TokenData};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::{NewUser, User, UserStatus};
use crate::auth::verification::generate_verification_token;
use crate::email::templates;
use crate::error::ApiError;
use crate::state::AppState;

pub const MAX_LOGIN_ATTEMPTS: i32 = 5;
pub const LOCK_DURATION_MINUTES: i64 = 30;
pub const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    // Verified against on the unknown-email login path so both causes of
    // InvalidCredentials cost comparable work.
    static ref DUMMY_HASH: String =
        hash_password("qslip-dummy-password").expect("argon2 hash of a constant input");
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Lock schedule after a failed attempt. The counter is not reset by the
/// lock itself, so failures past the threshold keep extending it.
fn lockout_after(attempts: i32) -> Option<OffsetDateTime> {
    if attempts >= MAX_LOGIN_ATTEMPTS {
        Some(OffsetDateTime::now_utc() + Duration::minutes(LOCK_DURATION_MINUTES))
    } else {
        None
    }
}

fn verification_link(state: &AppState, token: &str) -> String {
    format!("{}/verify-email?token={}", state.config.frontend_url, token)
}

pub async fn register(state: &AppState, payload: RegisterRequest) -> Result<PublicUser, ApiError> {
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    let first_name = payload.first_name.trim();
    let last_name = payload.last_name.trim();
    if first_name.is_empty() {
        return Err(ApiError::Validation("First name is required".into()));
    }
    if last_name.is_empty() {
        return Err(ApiError::Validation("Last name is required".into()));
    }

    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::DuplicateEmail);
    }

    let password_hash = hash_password(&payload.password)?;
    let token = generate_verification_token();
    let expires = OffsetDateTime::now_utc() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS);

    // The partial unique index on active emails closes the race between the
    // existence check above and this insert; a 23505 surfaces as
    // DuplicateEmail through the sqlx error translation.
    let user = User::create(
        &state.db,
        NewUser {
            email: &email,
            password_hash: &password_hash,
            first_name,
            last_name,
            phone_number: payload.phone_number.as_deref(),
            verification_token: &token,
            verification_token_expires: expires,
        },
    )
    .await?;

    let body = templates::verification_email_body(&user.first_name, &verification_link(state, &token));
    if let Err(e) = state
        .mailer
        .send(&user.email, templates::VERIFY_SUBJECT, &body)
        .await
    {
        warn!(error = %e, user_id = user.id, "failed to send verification email");
    }

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(PublicUser::from(user))
}

pub async fn login(state: &AppState, payload: LoginRequest) -> Result<LoginData, ApiError> {
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            let _ = verify_password(&payload.password, &DUMMY_HASH);
            return Err(ApiError::InvalidCredentials);
        }
    };

    if let Some(lock_until) = user.lock_until {
        if lock_until > OffsetDateTime::now_utc() {
            warn!(user_id = user.id, "login attempt on locked account");
            return Err(ApiError::AccountLocked);
        }
    }

    if !verify_password(&payload.password, &user.password_hash) {
        let attempts = user.login_attempts + 1;
        let lock_until = lockout_after(attempts);
        User::record_login_failure(&state.db, user.id, attempts, lock_until).await?;
        warn!(user_id = user.id, attempts, "login invalid password");
        // The attempt that trips the threshold already answers as locked.
        return Err(if lock_until.is_some() {
            ApiError::AccountLocked
        } else {
            ApiError::InvalidCredentials
        });
    }

    User::record_login_success(&state.db, user.id).await?;

    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(&user)?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(LoginData {
        user: PublicUser::from(user),
        token,
    })
}

/// Tokens are stateless, so logout is record-keeping only.
pub fn logout(user_id: i64) {
    info!(user_id, "user logged out");
}

pub async fn get_profile(state: &AppState, user_id: i64) -> Result<PublicUser, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(PublicUser::from(user))
}

pub async fn verify_email(state: &AppState, token: &str) -> Result<(), ApiError> {
    let user = User::find_by_verification_token(&state.db, token)
        .await?
        .ok_or(ApiError::InvalidToken("Invalid verification token"))?;

    // An expired token is not cleared; the user stays pending until resend.
    match user.verification_token_expires {
        Some(expires) if expires > OffsetDateTime::now_utc() => {}
        _ => return Err(ApiError::TokenExpired),
    }

    User::mark_verified(&state.db, user.id).await?;
    info!(user_id = user.id, email = %user.email, "email verified");

    let body = templates::welcome_email_body(&user.first_name);
    if let Err(e) = state
        .mailer
        .send(&user.email, templates::WELCOME_SUBJECT, &body)
        .await
    {
        warn!(error = %e, user_id = user.id, "failed to send welcome email");
    }

    Ok(())
}

pub async fn resend_verification(state: &AppState, email: &str) -> Result<(), ApiError> {
    let email = email.trim().to_lowercase();
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or(ApiError::NotFound)?;

    if user.status == UserStatus::Active {
        return Err(ApiError::AlreadyVerified);
    }

    let token = generate_verification_token();
    let expires = OffsetDateTime::now_utc() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS);
    User::rotate_verification_token(&state.db, user.id, &token, expires).await?;
    info!(user_id = user.id, "verification token rotated");

    let body = templates::verification_email_body(&user.first_name, &verification_link(state, &token));
    if let Err(e) = state
        .mailer
        .send(&user.email, templates::VERIFY_SUBJECT, &body)
        .await
    {
        warn!(error = %e, user_id = user.id, "failed to send verification email");
    }

    Ok(())
}

/// Re-issues a token for a caller whose bearer token already verified.
/// Rejects users that have since been deleted.
pub async fn refresh(state: &AppState, claims: &Claims) -> Result<TokenData, ApiError> {
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::InvalidToken("Invalid or expired token"))?;

    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(&user)?;
    Ok(TokenData { token })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_lock_below_threshold() {
        for attempts in 1..MAX_LOGIN_ATTEMPTS {
            assert!(lockout_after(attempts).is_none(), "attempt {}", attempts);
        }
    }

    #[test]
    fn fifth_failure_locks_for_thirty_minutes() {
        let before = OffsetDateTime::now_utc();
        let lock = lockout_after(MAX_LOGIN_ATTEMPTS).expect("locked");
        let after = OffsetDateTime::now_utc();
        assert!(lock >= before + Duration::minutes(LOCK_DURATION_MINUTES));
        assert!(lock <= after + Duration::minutes(LOCK_DURATION_MINUTES));
    }

    #[test]
    fn failures_past_threshold_keep_locking() {
        assert!(lockout_after(MAX_LOGIN_ATTEMPTS + 1).is_some());
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("spaces in@x.com"));
        assert!(!is_valid_email(""));
    }
}
