use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{extractors::AuthUser, jwt::JwtKeys, password::hash_password},
    error::ApiError,
    extract::Json,
    media,
    response::success,
    state::AppState,
    users::{
        dto::{RegisterRequest, RegisteredUser, UpdateMeRequest, UserResponse},
        repo_types::User,
    },
    validate,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(register))
        .route(
            "/users/me",
            get(get_me).patch(update_me).delete(delete_me),
        )
        .route("/users/:id", get(get_user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    validate::require_valid_email(&payload.email)?;
    validate::require_password(&payload.password)?;
    validate::require_name("first_name", &payload.first_name)?;
    validate::require_name("last_name", &payload.last_name)?;

    // An embedded avatar is stored first; failure fails the registration.
    let profile_image = match payload.profile_image.as_deref() {
        Some(data) if media::is_data_uri(data) => Some(media::save_avatar(&state, data).await?),
        Some(url) if !url.is_empty() => Some(url.to_owned()),
        _ => None,
    };

    let hash = hash_password(&payload.password)?;
    let user = match User::create(
        &state.db,
        &payload.email,
        &hash,
        &payload.first_name,
        &payload.last_name,
        profile_image.as_deref(),
    )
    .await
    {
        Ok(user) => user,
        Err(e) => {
            // The avatar went to disk before the insert; don't orphan it
            // when the row loses (duplicate email, storage failure).
            if let Some(url) = profile_image.as_deref() {
                if let Err(cleanup) = media::delete_avatar(&state, url).await {
                    warn!(error = %cleanup, "could not remove avatar of failed registration");
                }
            }
            return Err(e);
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = keys.sign_pair(user.id, &user.email)?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(success(
        StatusCode::CREATED,
        "User created",
        RegisteredUser {
            user: UserResponse::from(&user),
            access_token,
            refresh_token,
        },
    ))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Response, ApiError> {
    let users = User::list(&state.db).await?;
    let data: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    Ok(success(StatusCode::OK, "All users", data))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::AccountNotFound)?;
    Ok(success(StatusCode::OK, "User found", UserResponse::from(&user)))
}

#[instrument(skip(state, principal), fields(user_id = principal.id))]
pub async fn get_me(
    State(state): State<AppState>,
    principal: AuthUser,
) -> Result<Response, ApiError> {
    let user = User::find_by_id(&state.db, principal.id)
        .await?
        .ok_or(ApiError::AccountNotFound)?;
    Ok(success(StatusCode::OK, "User found", UserResponse::from(&user)))
}

/// Partial merge: fields absent from the body keep their stored values.
#[instrument(skip(state, principal, payload), fields(user_id = principal.id))]
pub async fn update_me(
    State(state): State<AppState>,
    principal: AuthUser,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Response, ApiError> {
    let mut user = User::find_by_id(&state.db, principal.id)
        .await?
        .ok_or(ApiError::AccountNotFound)?;

    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        validate::require_valid_email(&email)?;
        user.email = email;
    }
    if let Some(first_name) = payload.first_name {
        validate::require_name("first_name", &first_name)?;
        user.first_name = first_name;
    }
    if let Some(last_name) = payload.last_name {
        validate::require_name("last_name", &last_name)?;
        user.last_name = last_name;
    }
    if let Some(image) = payload.profile_image.as_deref() {
        if media::is_data_uri(image) {
            user.profile_image = Some(media::save_avatar(&state, image).await?);
        } else if !image.is_empty() {
            user.profile_image = Some(image.to_owned());
        }
    }

    let user = user.save(&state.db).await?;
    info!(user_id = user.id, "user updated");
    Ok(success(StatusCode::OK, "User updated", UserResponse::from(&user)))
}

/// Removes the account row first, then the avatar file. A file failure after
/// the row is gone surfaces as the distinct `AvatarCleanup` error so the
/// client knows a cleanup step is still pending.
#[instrument(skip(state, principal), fields(user_id = principal.id))]
pub async fn delete_me(
    State(state): State<AppState>,
    principal: AuthUser,
) -> Result<Response, ApiError> {
    let user = User::find_by_id(&state.db, principal.id)
        .await?
        .ok_or(ApiError::AccountNotFound)?;

    let image_url = user.profile_image.clone();
    User::delete(&state.db, user.id).await?;

    if let Some(url) = image_url {
        media::delete_avatar(&state, &url).await?;
    }

    info!(user_id = user.id, "user deleted");
    Ok(success(StatusCode::OK, "User deleted", serde_json::Value::Null))
}
