use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::extractors::CurrentUser;
use crate::auth::password::hash_password;
use crate::auth::services::{authorize, Operation};
use crate::error::Error;
use crate::state::AppState;
use crate::users::dto::{
    AdminPasswordChangeRequest, ApiResponse, CreateUserRequest, PasswordChangeRequest,
    UpdateProfileRequest,
};
use crate::users::repo_types::{NewUser, ProfileChanges};
use crate::users::services::{
    validate_email, validate_name, validate_password, validate_password_repeat, validate_phone,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", delete(delete_user))
        .route("/users/:id/change-password", post(admin_change_password))
        .route("/api/user/profile", put(update_profile))
        .route("/api/user/password", put(change_password))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), Error> {
    authorize(None, Operation::Register, None)?;

    payload.email = payload.email.trim().to_lowercase();
    validate_name(&payload.name)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;
    validate_phone(payload.phone.as_deref())?;

    // Pre-check for a friendly rejection; the store's unique constraint is
    // still the final authority under concurrent registration.
    if state.store.find_by_email(&payload.email).await?.is_some() {
        return Err(Error::DuplicateEmail);
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .store
        .insert(NewUser {
            name: payload.name,
            email: payload.email,
            password_hash,
            phone: payload.phone,
        })
        .await?;

    info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(ApiResponse::user(user))))
}

#[instrument(skip(state, current))]
pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ApiResponse>, Error> {
    authorize(Some(&current.0), Operation::ListUsers, None)?;
    let users = state.store.list().await?;
    Ok(Json(ApiResponse::users(users)))
}

#[instrument(skip(state, current))]
pub async fn get_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse>, Error> {
    authorize(Some(&current.0), Operation::ReadUser, Some(id))?;
    let user = state.store.find_by_id(id).await?.ok_or(Error::NotFound)?;
    Ok(Json(ApiResponse::user(user)))
}

#[instrument(skip(state, current))]
pub async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse>, Error> {
    authorize(Some(&current.0), Operation::DeleteUser, Some(id))?;
    if !state.store.delete(id).await? {
        return Err(Error::NotFound);
    }
    info!(user_id = id, "user deleted");
    Ok(Json(ApiResponse::message("User deleted")))
}

#[instrument(skip(state, current, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(mut payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse>, Error> {
    let principal = current.0;
    authorize(Some(&principal), Operation::UpdateProfile, None)?;

    if let Some(name) = &payload.name {
        validate_name(name)?;
    }
    if let Some(email) = &mut payload.email {
        *email = email.trim().to_lowercase();
        validate_email(email)?;
        if *email != principal.email && state.store.find_by_email(email).await?.is_some() {
            return Err(Error::DuplicateEmail);
        }
    }
    if payload.phone.is_some() {
        validate_phone(payload.phone.as_deref())?;
    }

    let user = state
        .store
        .update_profile(
            principal.id,
            ProfileChanges {
                name: payload.name,
                email: payload.email,
                phone: payload.phone,
            },
        )
        .await?;

    info!(user_id = user.id, "profile updated");
    Ok(Json(ApiResponse::user(user)))
}

/// The Basic credentials on this request already prove possession of the
/// current password; no separate current-password field is required.
#[instrument(skip(state, current, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<PasswordChangeRequest>,
) -> Result<Json<ApiResponse>, Error> {
    let principal = current.0;
    authorize(Some(&principal), Operation::ChangePassword, None)?;

    validate_password(&payload.new_password)?;
    validate_password_repeat(&payload.new_password, &payload.new_password_repeat)?;

    let hash = hash_password(&payload.new_password)?;
    state.store.update_password_hash(principal.id, &hash).await?;

    info!(user_id = principal.id, "password changed");
    Ok(Json(ApiResponse::message("Password changed")))
}

#[instrument(skip(state, current, payload))]
pub async fn admin_change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AdminPasswordChangeRequest>,
) -> Result<Json<ApiResponse>, Error> {
    authorize(Some(&current.0), Operation::AdminChangePassword, Some(id))?;

    validate_password(&payload.new_password)?;

    let hash = hash_password(&payload.new_password)?;
    state.store.update_password_hash(id, &hash).await?;

    info!(user_id = id, admin_id = current.0.id, "password reset by administrator");
    Ok(Json(ApiResponse::message("User password changed")))
}
