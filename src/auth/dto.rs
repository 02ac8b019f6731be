use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::{User, UserRole, UserStatus};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

/// Public part of the user returned to clients. No password hash, no
/// verification tokens, no security counters.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub uuid: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub status: UserStatus,
    pub role: UserRole,
    pub email_verified: bool,
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            uuid: user.public_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            status: user.status,
            role: user.role,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

/// Payload returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginData {
    pub user: PublicUser,
    pub token: String,
}

/// Payload returned by the refresh endpoint.
#[derive(Debug, Serialize)]
pub struct TokenData {
    pub token: String,
}

/// Uniform success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_user() -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: 7,
            public_id: Uuid::new_v4(),
            email: "ann@example.com".into(),
            password_hash: "$argon2id$not-for-clients".into(),
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            phone_number: Some("+15551234".into()),
            status: UserStatus::Pending,
            role: UserRole::User,
            login_attempts: 3,
            lock_until: None,
            last_login: None,
            email_verified: false,
            email_verified_at: None,
            verification_token: Some("secret-token".into()),
            verification_token_expires: Some(now),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn public_user_strips_sensitive_fields() {
        let json = serde_json::to_string(&PublicUser::from(make_user())).unwrap();
        assert!(json.contains("ann@example.com"));
        assert!(json.contains("\"status\":\"pending\""));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("secret-token"));
        assert!(!json.contains("login_attempts"));
    }

    #[test]
    fn envelope_skips_absent_fields() {
        let json = serde_json::to_string(&ApiResponse::message("Logout successful")).unwrap();
        assert_eq!(
            json,
            r#"{"success":true,"message":"Logout successful"}"#
        );

        let json = serde_json::to_string(&ApiResponse::data(1)).unwrap();
        assert_eq!(json, r#"{"success":true,"data":1}"#);
    }
}
