use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::Response,
    routing::post,
    Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RefreshRequest, TokenPair},
        jwt::JwtKeys,
        password::verify_password,
    },
    error::ApiError,
    extract::Json,
    response::success,
    state::AppState,
    users::repo_types::User,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jwt/create", post(login))
        .route("/jwt/refresh", post(refresh))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    // No format pre-check here: a malformed address is simply an unknown
    // account, so login answers 404 either way.
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or(ApiError::AccountNotFound)?;

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = user.id, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = keys.sign_pair(user.id, &user.email)?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(success(
        StatusCode::OK,
        "Logged in",
        TokenPair {
            access_token,
            refresh_token,
        },
    ))
}

/// Exchanges a refresh token for a new access+refresh pair. The user is
/// re-fetched so tokens for deleted accounts stop working; old refresh
/// tokens stay valid until their natural expiry (no revocation list).
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Response, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token)?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::AccountNotFound)?;

    let (access_token, refresh_token) = keys.sign_pair(user.id, &user.email)?;

    info!(user_id = user.id, "tokens rotated");
    Ok(success(
        StatusCode::OK,
        "Token refreshed",
        TokenPair {
            access_token,
            refresh_token,
        },
    ))
}
