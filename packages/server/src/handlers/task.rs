use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::Role;
use common::api::{CreateTaskRequest, Task, TaskDetail, UpdateTaskRequest};
use common::storage::validate_object_path;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{group, group_member, task};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::task::{TaskListQuery, parse_group_ids};
use crate::notify;
use crate::state::AppState;
use crate::utils::access::{check_group_access, find_group, find_visible_task, require_owner};

fn normalize_file_path(path: Option<String>) -> Result<Option<String>, AppError> {
    path.filter(|p| !p.trim().is_empty())
        .map(|p| validate_object_path(&p).map_err(|e| AppError::Validation(e.into())))
        .transpose()
}

/// Group IDs the caller can read, optionally narrowed to `requested`.
async fn visible_group_ids<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    requested: &[Uuid],
) -> Result<Vec<Uuid>, AppError> {
    let ids: Vec<Uuid> = match auth_user.role {
        Role::Teacher => {
            let mut q = group::Entity::find()
                .filter(group::Column::TeacherId.eq(auth_user.user_id))
                .select_only()
                .column(group::Column::Id);
            if !requested.is_empty() {
                q = q.filter(group::Column::Id.is_in(requested.to_vec()));
            }
            q.into_tuple().all(db).await?
        }
        Role::Student => {
            let mut q = group_member::Entity::find()
                .filter(group_member::Column::StudentId.eq(auth_user.user_id))
                .select_only()
                .column(group_member::Column::GroupId);
            if !requested.is_empty() {
                q = q.filter(group_member::Column::GroupId.is_in(requested.to_vec()));
            }
            q.into_tuple().all(db).await?
        }
    };
    Ok(ids)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Tasks",
    operation_id = "listTasks",
    summary = "List tasks across groups",
    description = "Tasks of the given groups (all readable groups when `group_ids` is absent), ordered by due date. \
        With `upcoming=true` only tasks due strictly after now are returned.",
    params(TaskListQuery),
    responses(
        (status = 200, description = "Tasks", body = Vec<Task>),
        (status = 400, description = "Malformed group_ids (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn list_tasks(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TaskListQuery>,
) -> Result<Json<Vec<Task>>, AppError> {
    let requested = parse_group_ids(query.group_ids.as_deref())?;
    let group_ids = visible_group_ids(&state.db, &auth_user, &requested).await?;
    if group_ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let mut select = task::Entity::find().filter(task::Column::GroupId.is_in(group_ids));
    if query.upcoming.unwrap_or(false) {
        select = select.filter(task::Column::DueDate.gt(Utc::now()));
    }

    let tasks = select
        .order_by_asc(task::Column::DueDate)
        .all(&state.db)
        .await?;

    Ok(Json(tasks.into_iter().map(Task::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Tasks",
    operation_id = "getTask",
    summary = "Get a task with its group",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task detail", body = TaskDetail),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Task not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(task_id = %id))]
pub async fn get_task(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskDetail>, AppError> {
    let (task, group) = find_visible_task(&state.db, &auth_user, id).await?;
    Ok(Json(TaskDetail {
        group: (&group).into(),
        task: task.into(),
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Tasks",
    operation_id = "updateTask",
    summary = "Update a task",
    description = "Owner teacher only. Absent fields are left unchanged.",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Updated task", body = Task),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the group's teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Task not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(task_id = %id))]
pub async fn update_task(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    payload.validate()?;

    let (task, group) = find_visible_task(&state.db, &auth_user, id).await?;
    require_owner(&auth_user, &group)?;

    let mut active: task::ActiveModel = task.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(due_date) = payload.due_date {
        active.due_date = Set(due_date);
    }
    if payload.file_path.is_some() {
        active.file_path = Set(normalize_file_path(payload.file_path)?);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/tasks",
    tag = "Tasks",
    operation_id = "listGroupTasks",
    summary = "List tasks of a group",
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Tasks ordered by due date", body = Vec<Task>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Group not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(group_id = %id))]
pub async fn list_group_tasks(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Task>>, AppError> {
    let group = find_group(&state.db, id).await?;
    check_group_access(&state.db, &auth_user, &group).await?;

    let tasks = task::Entity::find()
        .filter(task::Column::GroupId.eq(id))
        .order_by_asc(task::Column::DueDate)
        .all(&state.db)
        .await?;

    Ok(Json(tasks.into_iter().map(Task::from).collect()))
}

#[utoipa::path(
    post,
    path = "/{id}/tasks",
    tag = "Tasks",
    operation_id = "createTask",
    summary = "Create a task in a group",
    description = "Owner teacher only. Every member receives a `task` notification.",
    params(("id" = Uuid, Path, description = "Group ID")),
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the group's teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Group not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(group_id = %id, title = %payload.title))]
pub async fn create_task(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_teacher()?;
    payload.validate()?;

    let group = find_group(&state.db, id).await?;
    require_owner(&auth_user, &group)?;

    let now = Utc::now();
    let new_task = task::ActiveModel {
        id: Set(Uuid::now_v7()),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        due_date: Set(payload.due_date),
        group_id: Set(group.id),
        file_path: Set(normalize_file_path(payload.file_path)?),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let task = new_task.insert(&state.db).await?;

    notify::task_created(&state, &group, &task).await;

    Ok((StatusCode::CREATED, Json(Task::from(task))))
}
