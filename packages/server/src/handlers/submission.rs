use std::collections::{HashMap, HashSet};

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use common::api::{
    ProfileSummary, RateRequest, Submission, SubmissionView, SubmitRequest, TaskSummary,
};
use common::storage::validate_object_path;
use common::{Role, SubmissionStatus};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{group, profile, submission, task};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::submission::SubmissionListQuery;
use crate::notify;
use crate::state::AppState;
use crate::utils::access::{find_group, find_submission, find_task, find_visible_task, require_owner};

/// Join task summaries and author profiles onto submission rows, preserving order.
async fn build_views<C: ConnectionTrait>(
    db: &C,
    rows: Vec<submission::Model>,
) -> Result<Vec<SubmissionView>, AppError> {
    let task_ids: HashSet<Uuid> = rows.iter().map(|s| s.task_id).collect();
    let student_ids: HashSet<Uuid> = rows.iter().map(|s| s.student_id).collect();

    let tasks: HashMap<Uuid, TaskSummary> = task::Entity::find()
        .filter(task::Column::Id.is_in(task_ids))
        .all(db)
        .await?
        .iter()
        .map(|t| (t.id, TaskSummary::from(t)))
        .collect();
    let students: HashMap<Uuid, ProfileSummary> = profile::Entity::find()
        .filter(profile::Column::Id.is_in(student_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, ProfileSummary::from(p)))
        .collect();

    Ok(rows
        .into_iter()
        .filter_map(|s| {
            let task = tasks.get(&s.task_id)?.clone();
            let student = students.get(&s.student_id).cloned();
            Some(SubmissionView {
                submission: s.into(),
                task,
                student,
            })
        })
        .collect())
}

#[utoipa::path(
    put,
    path = "/{id}/submission",
    tag = "Submissions",
    operation_id = "submitTask",
    summary = "Hand in work for a task",
    description = "Upserts the caller's submission on `(task_id, student_id)`: the first call inserts, later calls \
        replace content and file path. Every hand-in resets the row to `pending` and clears any previous review.",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Stored submission", body = Submission),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not a student (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Task not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(task_id = %id, user_id = %auth_user.user_id))]
pub async fn submit(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<SubmitRequest>,
) -> Result<Json<Submission>, AppError> {
    auth_user.require_student()?;
    payload.validate()?;

    let (task, group) = find_visible_task(&state.db, &auth_user, id).await?;

    let file_path = payload
        .file_path
        .filter(|p| !p.trim().is_empty())
        .map(|p| validate_object_path(&p).map_err(|e| AppError::Validation(e.into())))
        .transpose()?;

    let now = Utc::now();
    let model = submission::ActiveModel {
        id: Set(Uuid::now_v7()),
        task_id: Set(task.id),
        student_id: Set(auth_user.user_id),
        content: Set(payload.content),
        file_path: Set(file_path),
        status: Set(SubmissionStatus::Pending),
        rating: Set(None),
        feedback: Set(None),
        submitted_at: Set(now),
        updated_at: Set(now),
    };

    submission::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([submission::Column::TaskId, submission::Column::StudentId])
                .update_columns([
                    submission::Column::Content,
                    submission::Column::FilePath,
                    submission::Column::Status,
                    submission::Column::Rating,
                    submission::Column::Feedback,
                    submission::Column::SubmittedAt,
                    submission::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await?;

    let stored = submission::Entity::find()
        .filter(submission::Column::TaskId.eq(task.id))
        .filter(submission::Column::StudentId.eq(auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("upserted submission not found".into()))?;

    notify::submission_received(&state, &group, &task, &stored).await;

    Ok(Json(stored.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/submission",
    tag = "Submissions",
    operation_id = "getMySubmission",
    summary = "The caller's submission for a task",
    description = "Returns `null` when the student has not handed in yet.",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Submission, or null when none exists", body = Submission),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Task not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(task_id = %id, user_id = %auth_user.user_id))]
pub async fn get_my_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Option<Submission>>, AppError> {
    let (task, _) = find_visible_task(&state.db, &auth_user, id).await?;

    let row = submission::Entity::find()
        .filter(submission::Column::TaskId.eq(task.id))
        .filter(submission::Column::StudentId.eq(auth_user.user_id))
        .one(&state.db)
        .await?;

    Ok(Json(row.map(Submission::from)))
}

#[utoipa::path(
    get,
    path = "/{id}/submissions",
    tag = "Submissions",
    operation_id = "listTaskSubmissions",
    summary = "All submissions for a task",
    description = "Owner teacher only. Newest hand-in first.",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Submissions", body = Vec<SubmissionView>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the group's teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Task not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(task_id = %id))]
pub async fn list_task_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SubmissionView>>, AppError> {
    let (task, group) = find_visible_task(&state.db, &auth_user, id).await?;
    require_owner(&auth_user, &group)?;

    let rows = submission::Entity::find()
        .filter(submission::Column::TaskId.eq(task.id))
        .order_by_desc(submission::Column::SubmittedAt)
        .all(&state.db)
        .await?;

    Ok(Json(build_views(&state.db, rows).await?))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Submissions",
    operation_id = "listSubmissions",
    summary = "List submissions visible to the caller",
    description = "Students see only their own rows; teachers see rows for tasks in their groups. \
        Ordered by `submitted_at` descending. `rated_only=true` keeps rows with both rating and feedback.",
    params(SubmissionListQuery),
    responses(
        (status = 200, description = "Submissions", body = Vec<SubmissionView>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Student asked for another student's rows (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn list_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SubmissionListQuery>,
) -> Result<Json<Vec<SubmissionView>>, AppError> {
    let mut select = submission::Entity::find();

    match auth_user.role {
        Role::Student => {
            if query.student_id.is_some_and(|id| id != auth_user.user_id) {
                return Err(AppError::PermissionDenied);
            }
            select = select.filter(submission::Column::StudentId.eq(auth_user.user_id));
        }
        Role::Teacher => {
            let group_ids: Vec<Uuid> = group::Entity::find()
                .filter(group::Column::TeacherId.eq(auth_user.user_id))
                .select_only()
                .column(group::Column::Id)
                .into_tuple()
                .all(&state.db)
                .await?;
            let task_ids: Vec<Uuid> = task::Entity::find()
                .filter(task::Column::GroupId.is_in(group_ids))
                .select_only()
                .column(task::Column::Id)
                .into_tuple()
                .all(&state.db)
                .await?;
            if task_ids.is_empty() {
                return Ok(Json(Vec::new()));
            }
            select = select.filter(submission::Column::TaskId.is_in(task_ids));
            if let Some(student_id) = query.student_id {
                select = select.filter(submission::Column::StudentId.eq(student_id));
            }
        }
    }

    if let Some(task_id) = query.task_id {
        select = select.filter(submission::Column::TaskId.eq(task_id));
    }
    if query.rated_only.unwrap_or(false) {
        select = select
            .filter(submission::Column::Rating.is_not_null())
            .filter(submission::Column::Feedback.is_not_null());
    }

    let rows = select
        .order_by_desc(submission::Column::SubmittedAt)
        .all(&state.db)
        .await?;

    Ok(Json(build_views(&state.db, rows).await?))
}

#[utoipa::path(
    post,
    path = "/{id}/rating",
    tag = "Submissions",
    operation_id = "rateSubmission",
    summary = "Rate a submission",
    description = "Owner teacher only. Stores 1-5 stars and feedback and marks the submission `completed`.",
    params(("id" = Uuid, Path, description = "Submission ID")),
    request_body = RateRequest,
    responses(
        (status = 200, description = "Rated submission", body = Submission),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the group's teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(submission_id = %id, rating = payload.rating))]
pub async fn rate_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<RateRequest>,
) -> Result<Json<Submission>, AppError> {
    auth_user.require_teacher()?;
    payload.validate()?;

    let existing = find_submission(&state.db, id).await?;
    let task = find_task(&state.db, existing.task_id).await?;
    let group = find_group(&state.db, task.group_id).await?;
    if group.teacher_id != auth_user.user_id {
        return Err(AppError::NotFound("Submission not found".into()));
    }

    let mut active: submission::ActiveModel = existing.into();
    active.rating = Set(Some(payload.rating));
    active.feedback = Set(Some(payload.feedback.trim().to_string()));
    active.status = Set(SubmissionStatus::Completed);
    active.updated_at = Set(Utc::now());
    let rated = active.update(&state.db).await?;

    notify::submission_rated(&state, &task, &rated).await;

    Ok(Json(rated.into()))
}
