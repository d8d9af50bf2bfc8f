use axum::Json;
use axum::extract::{Path, State};
use common::api::{ChangeKind, MarkAllReadResponse, Notification, UnreadCount};
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::notification;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppQuery;
use crate::models::notification::NotificationListQuery;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Notifications",
    operation_id = "listNotifications",
    summary = "List the caller's notifications",
    description = "Newest first. Every row unless `limit` is given.",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "Notifications", body = Vec<Notification>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id, limit = ?query.limit))]
pub async fn list_notifications(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<NotificationListQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let rows = notification::Entity::find()
        .filter(notification::Column::UserId.eq(auth_user.user_id))
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
        .limit(query.effective_limit())
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(Notification::from).collect()))
}

#[utoipa::path(
    get,
    path = "/unread-count",
    tag = "Notifications",
    operation_id = "countUnreadNotifications",
    summary = "Number of unread notifications",
    responses(
        (status = 200, description = "Unread count", body = UnreadCount),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn unread_count(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UnreadCount>, AppError> {
    let count = notification::Entity::find()
        .filter(notification::Column::UserId.eq(auth_user.user_id))
        .filter(notification::Column::IsRead.eq(false))
        .count(&state.db)
        .await?;
    Ok(Json(UnreadCount { count }))
}

#[utoipa::path(
    post,
    path = "/{id}/read",
    tag = "Notifications",
    operation_id = "markNotificationRead",
    summary = "Mark one notification as read",
    description = "Only the given row changes. Marking an already-read row is a no-op.",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Updated notification", body = Notification),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Notification not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(notification_id = %id))]
pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    let row = notification::Entity::find_by_id(id)
        .filter(notification::Column::UserId.eq(auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".into()))?;

    if row.is_read {
        return Ok(Json(row.into()));
    }

    let mut active: notification::ActiveModel = row.into();
    active.is_read = Set(true);
    let updated = Notification::from(active.update(&state.db).await?);

    state.realtime.publish(ChangeKind::Update, updated.clone());
    Ok(Json(updated))
}

#[utoipa::path(
    post,
    path = "/mark_all_notifications_read",
    tag = "Notifications",
    operation_id = "markAllNotificationsRead",
    summary = "Mark every notification of the caller as read",
    responses(
        (status = 200, description = "Rows updated", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn mark_all_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let txn = state.db.begin().await?;

    let unread = notification::Entity::find()
        .filter(notification::Column::UserId.eq(auth_user.user_id))
        .filter(notification::Column::IsRead.eq(false))
        .all(&txn)
        .await?;
    let ids: Vec<Uuid> = unread.iter().map(|n| n.id).collect();

    let result = notification::Entity::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .filter(notification::Column::Id.is_in(ids))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    for row in unread {
        let mut record = Notification::from(row);
        record.is_read = true;
        state.realtime.publish(ChangeKind::Update, record);
    }

    Ok(Json(MarkAllReadResponse {
        updated: result.rows_affected,
    }))
}
