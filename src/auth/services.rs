use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RegisterRequest, RegisteredUser},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    error::ApiError,
    mail::EmailMessage,
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Reply to every reset request, whether or not the account exists.
pub const RESET_LINK_SENT: &str = "If this email is registered, a reset link has been sent.";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn internal(e: anyhow::Error) -> ApiError {
    ApiError::Internal(e.to_string())
}

#[instrument(skip(state, payload))]
pub async fn register(state: &AppState, payload: RegisterRequest) -> Result<RegisteredUser, ApiError> {
    let email = normalize_email(&payload.email);

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::BadRequest("Password too short".into()));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password).map_err(internal)?;
    let user = state.users.create(&email, &hash).await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(RegisteredUser {
        id: user.id,
        email: user.email,
    })
}

#[instrument(skip(state, payload))]
pub async fn login(state: &AppState, payload: LoginRequest) -> Result<LoginResponse, ApiError> {
    let email = normalize_email(&payload.email);

    let user = match state.users.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
    };

    if !verify_password(&payload.password, &user.password_hash).map_err(internal)? {
        warn!(email = %email, user_id = user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let access_token = JwtKeys::from_ref(state)
        .sign_session(user.id, &user.email)
        .map_err(internal)?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(LoginResponse {
        id: user.id,
        email: user.email,
        username: user.username,
        access_token,
    })
}

/// Mail a reset link if the account exists. The outcome is indistinguishable
/// to the caller either way, except for delivery failures.
#[instrument(skip(state))]
pub async fn request_password_reset(state: &AppState, email: &str) -> Result<(), ApiError> {
    let email = normalize_email(email);
    match send_reset_link(state, &email).await {
        Ok(true) => info!(email = %email, "password reset link sent"),
        Ok(false) => debug!(email = %email, "password reset for unknown email"),
        Err(e) => {
            error!(error = %e, email = %email, "password reset request failed");
            return Err(ApiError::Internal("Failed to send reset link".into()));
        }
    }
    Ok(())
}

async fn send_reset_link(state: &AppState, email: &str) -> anyhow::Result<bool> {
    let Some(user) = state.users.find_by_email(email).await? else {
        return Ok(false);
    };
    let token = JwtKeys::from_ref(state).sign_reset(user.id, &user.email)?;
    let message = EmailMessage::password_reset(&user.email, &state.config.mail.reset_url_base, &token);
    state.mailer.send(&message).await?;
    Ok(true)
}

/// Set a new password for the user named in a reset token. Tokens are not
/// consumed; any unexpired one can be replayed.
#[instrument(skip_all)]
pub async fn complete_password_reset(
    state: &AppState,
    token: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let claims = JwtKeys::from_ref(state).verify(token).map_err(|e| {
        warn!(error = %e, "reset token rejected");
        ApiError::BadRequest("Invalid or expired token".into())
    })?;

    if new_password.len() < MIN_PASSWORD_LEN {
        warn!(user_id = claims.id, "password too short");
        return Err(ApiError::BadRequest("Password too short".into()));
    }

    let hash = hash_password(new_password).map_err(internal)?;
    if !state.users.update_password(claims.id, &hash).await? {
        warn!(user_id = claims.id, "reset token names a missing user");
    }

    info!(user_id = claims.id, "password reset");
    Ok(())
}
