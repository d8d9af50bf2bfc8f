use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use common::api::{Profile, UpdateProfileRequest};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::profile;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Profiles",
    operation_id = "getProfile",
    summary = "Get a profile by ID",
    params(("id" = Uuid, Path, description = "Profile ID")),
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Profile not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(profile_id = %id))]
pub async fn get_profile(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Profile>, AppError> {
    let profile = profile::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "Profiles",
    operation_id = "updateMyProfile",
    summary = "Update the caller's profile",
    description = "Changes username and/or image URL. Absent fields are left unchanged.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_my_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    payload.validate()?;

    let existing = profile::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    if payload.is_empty() {
        return Ok(Json(existing.into()));
    }

    let mut active: profile::ActiveModel = existing.into();
    if let Some(username) = payload.username {
        active.username = Set(Some(username.trim().to_string()));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    Ok(Json(updated.into()))
}
