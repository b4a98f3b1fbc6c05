use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        claims::Claims,
        dto::{
            ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest, RegisteredUser,
            ResetPasswordRequest,
        },
        jwt::AuthUser,
        services::{self, RESET_LINK_SENT},
    },
    error::ApiError,
    response::ApiResponse,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

pub fn home_routes() -> Router<AppState> {
    Router::new().route("/home", get(home))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let Json(payload) = payload?;
    let user = services::login(&state, payload).await?;
    Ok(Json(ApiResponse::ok("Login successful", user)))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<RegisteredUser>>), ApiError> {
    let Json(payload) = payload?;
    let user = services::register(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Register successful", user)),
    ))
}

#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Json(payload) = payload?;
    services::request_password_reset(&state, &payload.email).await?;
    Ok(Json(ApiResponse::message(RESET_LINK_SENT)))
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Json(payload) = payload?;
    services::complete_password_reset(&state, &payload.token, &payload.password).await?;
    Ok(Json(ApiResponse::message("Password reset successful")))
}

/// Protected sample endpoint: echoes the caller's token claims.
#[instrument(skip_all)]
pub async fn home(AuthUser(claims): AuthUser) -> Json<ApiResponse<Claims>> {
    Json(ApiResponse::ok("Welcome to Home!", claims))
}
