use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use common::api::{AuthSession, Profile, SignInRequest, SignUpRequest, UpdateUserRequest};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::profile;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::state::AppState;
use crate::utils::{hash, jwt};

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn issue_session(state: &AppState, profile: profile::Model) -> Result<AuthSession, AppError> {
    let (access_token, expires_at) =
        jwt::sign(profile.id, &profile.email, profile.role, &state.config.auth)
            .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;
    Ok(AuthSession {
        access_token,
        token_type: "Bearer".into(),
        expires_at,
        profile: profile.into(),
    })
}

async fn load_profile<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<profile::Model, AppError> {
    // A valid token for a vanished profile is treated like a bad token.
    profile::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::TokenInvalid)
}

#[utoipa::path(
    post,
    path = "/signup",
    tag = "Auth",
    operation_id = "signUp",
    summary = "Create an account",
    description = "Creates credentials and the profile row in one step. The role is fixed for the lifetime of the account.",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created, session issued", body = AuthSession),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(role = %payload.role))]
pub async fn sign_up(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignUpRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = normalize_email(&payload.email);
    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;
    let username = payload
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    let now = Utc::now();
    let new_profile = profile::ActiveModel {
        id: Set(Uuid::now_v7()),
        email: Set(email),
        password_hash: Set(password_hash),
        username: Set(username),
        role: Set(payload.role),
        image_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let profile = new_profile
        .insert(&state.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailTaken,
            _ => AppError::from(e),
        })?;

    tracing::info!(user_id = %profile.id, "Account created");
    Ok((StatusCode::CREATED, Json(issue_session(&state, profile)?)))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "signIn",
    summary = "Sign in with email and password",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Session issued", body = AuthSession),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong email or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignInRequest>,
) -> Result<Json<AuthSession>, AppError> {
    payload.validate()?;

    let profile = profile::Entity::find()
        .filter(profile::Column::Email.eq(normalize_email(&payload.email)))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &profile.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    Ok(Json(issue_session(&state, profile)?))
}

#[utoipa::path(
    get,
    path = "/session",
    tag = "Auth",
    operation_id = "getSession",
    summary = "Current session profile",
    description = "Returns the profile behind the bearer token. Used to restore a session at startup.",
    responses(
        (status = 200, description = "Current profile", body = Profile),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn session(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Profile>, AppError> {
    let profile = load_profile(&state.db, auth_user.user_id).await?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    patch,
    path = "/user",
    tag = "Auth",
    operation_id = "updateUser",
    summary = "Change the account email",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<Profile>, AppError> {
    payload.validate()?;

    let existing = load_profile(&state.db, auth_user.user_id).await?;
    let mut active: profile::ActiveModel = existing.into();
    active.email = Set(normalize_email(&payload.email));
    active.updated_at = Set(Utc::now());

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailTaken,
            _ => AppError::from(e),
        })?;

    Ok(Json(updated.into()))
}
