use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use common::Role;
use common::api::StoredObject;
use common::storage::{Bucket, ObjectKey};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::entity::storage_object;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::state::AppState;

/// Request body limit for uploads: the object limit plus headroom for framing.
pub fn upload_body_limit(max_object_size: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max(usize::try_from(max_object_size).unwrap_or(usize::MAX).saturating_add(64 * 1024))
}

/// Who may write where.
///
/// `profile-images/{user_id}/..` belongs to that user, `submission-files/submissions/{user_id}/..`
/// to that student, and `task-files` to teachers.
/// Every writable path sits under a folder named after its writer.
fn check_write_access(auth_user: &AuthUser, key: &ObjectKey) -> Result<(), AppError> {
    let own_prefix = format!("{}/", auth_user.user_id);
    let in_own_folder = |folder: &str| {
        key.path()
            .strip_prefix(folder)
            .is_some_and(|rest| rest.starts_with(&own_prefix))
    };
    let allowed = match key.bucket() {
        Bucket::ProfileImages => key.path().starts_with(&own_prefix),
        Bucket::SubmissionFiles => auth_user.role == Role::Student && in_own_folder("submissions/"),
        Bucket::TaskFiles => auth_user.role == Role::Teacher && in_own_folder("tasks/"),
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

fn object_key(bucket: &str, path: &str) -> Result<ObjectKey, AppError> {
    let bucket: Bucket = bucket.parse()?;
    Ok(ObjectKey::new(bucket, path)?)
}

#[utoipa::path(
    put,
    path = "/object/{bucket}/{path}",
    tag = "Storage",
    operation_id = "uploadObject",
    summary = "Upload an object (upsert)",
    description = "Stores the raw request body at `bucket/path`, replacing any previous object the caller owns. \
        The `Content-Type` header is stored and served back; it is guessed from the path when absent.",
    params(
        ("bucket" = String, Path, description = "One of submission-files, task-files, profile-images"),
        ("path" = String, Path, description = "Object path inside the bucket"),
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Stored", body = StoredObject),
        (status = 400, description = "Empty body or invalid path (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Path not writable by caller (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown bucket (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "Object too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers, body), fields(bucket = %bucket, path = %path, size = body.len()))]
pub async fn upload_object(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StoredObject>, AppError> {
    let key = object_key(&bucket, &path)?;
    check_write_access(&auth_user, &key)?;

    if body.is_empty() {
        return Err(AppError::Validation("File is empty".into()));
    }
    let limit = state.config.storage.max_object_size;
    if body.len() as u64 > limit {
        return Err(AppError::PayloadTooLarge { limit });
    }

    let existing = storage_object::Entity::find_by_id((
        key.bucket().as_str().to_string(),
        key.path().to_string(),
    ))
    .one(&state.db)
    .await?;
    if existing.is_some_and(|o| o.owner_id != auth_user.user_id) {
        return Err(AppError::PermissionDenied);
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| mime_guess::from_path(key.path()).first().map(|m| m.to_string()));

    let meta = state.objects.put(&key, &body).await?;

    let now = Utc::now();
    let row = storage_object::ActiveModel {
        bucket: Set(key.bucket().as_str().to_string()),
        path: Set(key.path().to_string()),
        size: Set(meta.size as i64),
        content_type: Set(content_type),
        etag: Set(meta.etag.clone()),
        owner_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
    };
    storage_object::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([storage_object::Column::Bucket, storage_object::Column::Path])
                .update_columns([
                    storage_object::Column::Size,
                    storage_object::Column::ContentType,
                    storage_object::Column::Etag,
                    storage_object::Column::OwnerId,
                    storage_object::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await?;

    tracing::info!(object = %key, size = meta.size, "Object stored");

    Ok(Json(StoredObject {
        bucket: key.bucket(),
        path: key.path().to_string(),
        size: meta.size,
        public_url: StoredObject::public_url_for(
            &state.config.server.public_url,
            key.bucket(),
            key.path(),
        ),
    }))
}

#[utoipa::path(
    get,
    path = "/object/public/{bucket}/{path}",
    tag = "Storage",
    operation_id = "downloadPublicObject",
    summary = "Download a public object",
    description = "No authentication. Supports `If-None-Match` against the returned ETag.",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("path" = String, Path, description = "Object path inside the bucket"),
    ),
    responses(
        (status = 200, description = "Object content", content_type = "application/octet-stream"),
        (status = 304, description = "Not modified"),
        (status = 404, description = "Object not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers), fields(bucket = %bucket, path = %path))]
pub async fn download_public_object(
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let key = object_key(&bucket, &path)?;
    let meta = storage_object::Entity::find_by_id((
        key.bucket().as_str().to_string(),
        key.path().to_string(),
    ))
    .one(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Object not found".into()))?;

    let etag_value = format!("\"{}\"", meta.etag);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let reader = state.objects.get_stream(&key).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let content_type = meta
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, meta.size.to_string())
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
