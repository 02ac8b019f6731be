use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::dto::{
    ApiResponse, LoginData, LoginRequest, PublicUser, RegisterRequest,
    ResendVerificationRequest, TokenData, VerifyEmailQuery,
};
use crate::auth::extractors::AuthUser;
use crate::auth::services;
use crate::error::ApiError;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/resend-verification", post(resend_verification))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PublicUser>>), ApiError> {
    let user = services::register(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("User registered successfully", user)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginData>>, ApiError> {
    let data = services::login(&state, payload).await?;
    Ok(Json(ApiResponse::with_message("Login successful", data)))
}

#[instrument(skip(state, params))]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(params): Query<VerifyEmailQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let token = params
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Validation("Verification token is required".into()))?;
    services::verify_email(&state, token).await?;
    Ok(Json(ApiResponse::message("Email verified successfully")))
}

#[instrument(skip(state, payload))]
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(payload): Json<ResendVerificationRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    services::resend_verification(&state, &payload.email).await?;
    Ok(Json(ApiResponse::message("Verification email sent")))
}

#[instrument(skip(state, user))]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    let profile = services::get_profile(&state, user.0.sub).await?;
    Ok(Json(ApiResponse::data(profile)))
}

#[instrument(skip(user))]
pub async fn logout(user: AuthUser) -> Json<ApiResponse<()>> {
    services::logout(user.0.sub);
    Json(ApiResponse::message("Logout successful"))
}

#[instrument(skip(state, user))]
pub async fn refresh(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<TokenData>>, ApiError> {
    let data = services::refresh(&state, &user.0).await?;
    Ok(Json(ApiResponse::data(data)))
}
