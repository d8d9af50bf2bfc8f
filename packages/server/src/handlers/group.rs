use std::collections::{HashMap, HashSet};

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::Role;
use common::api::{
    CreateGroupRequest, CreateGroupResponse, GroupMember, GroupOverview, Membership,
    ProfileSummary, Task,
};
use futures::future::join_all;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{group, group_member, profile, task};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::group::{GroupListQuery, MembershipListQuery};
use crate::notify;
use crate::state::AppState;
use crate::utils::access::{check_group_access, find_group, require_owner};

/// Attach teacher summaries and nested tasks to group rows, preserving order.
pub(crate) async fn build_overviews<C: ConnectionTrait>(
    db: &C,
    groups: Vec<group::Model>,
) -> Result<Vec<GroupOverview>, AppError> {
    if groups.is_empty() {
        return Ok(Vec::new());
    }
    let group_ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
    let teacher_ids: HashSet<Uuid> = groups.iter().map(|g| g.teacher_id).collect();

    let teachers: HashMap<Uuid, ProfileSummary> = profile::Entity::find()
        .filter(profile::Column::Id.is_in(teacher_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, ProfileSummary::from(p)))
        .collect();

    let mut tasks_by_group: HashMap<Uuid, Vec<Task>> = HashMap::new();
    for t in task::Entity::find()
        .filter(task::Column::GroupId.is_in(group_ids))
        .order_by_asc(task::Column::DueDate)
        .all(db)
        .await?
    {
        tasks_by_group.entry(t.group_id).or_default().push(t.into());
    }

    Ok(groups
        .into_iter()
        .map(|g| {
            let tasks = tasks_by_group.remove(&g.id).unwrap_or_default();
            GroupOverview {
                id: g.id,
                name: g.name,
                description: g.description,
                teacher_id: g.teacher_id,
                created_at: g.created_at,
                teacher: teachers.get(&g.teacher_id).cloned(),
                tasks_count: tasks.len() as u64,
                tasks,
            }
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Groups",
    operation_id = "listGroups",
    summary = "List groups owned by a teacher",
    description = "Teacher-scoped read: groups filtered by `teacher_id`, newest first, each with its tasks and task count.",
    params(GroupListQuery),
    responses(
        (status = 200, description = "Groups owned by the teacher", body = Vec<GroupOverview>),
        (status = 400, description = "Missing or malformed teacher_id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "teacher_id is not the caller (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(teacher_id = %query.teacher_id))]
pub async fn list_groups(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<GroupListQuery>,
) -> Result<Json<Vec<GroupOverview>>, AppError> {
    if query.teacher_id != auth_user.user_id {
        return Err(AppError::PermissionDenied);
    }

    let groups = group::Entity::find()
        .filter(group::Column::TeacherId.eq(query.teacher_id))
        .order_by_desc(group::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(build_overviews(&state.db, groups).await?))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Groups",
    operation_id = "listMemberships",
    summary = "List a student's memberships",
    description = "Student-scoped read: membership rows filtered by `student_id`, each with the joined group nested.",
    params(MembershipListQuery),
    responses(
        (status = 200, description = "Memberships", body = Vec<Membership>),
        (status = 400, description = "Missing or malformed student_id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "student_id is not the caller (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(student_id = %query.student_id))]
pub async fn list_memberships(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<MembershipListQuery>,
) -> Result<Json<Vec<Membership>>, AppError> {
    if query.student_id != auth_user.user_id {
        return Err(AppError::PermissionDenied);
    }

    let rows = group_member::Entity::find()
        .filter(group_member::Column::StudentId.eq(query.student_id))
        .find_also_related(group::Entity)
        .order_by_desc(group_member::Column::JoinedAt)
        .all(&state.db)
        .await?;

    let (links, groups): (Vec<group_member::Model>, Vec<group::Model>) = rows
        .into_iter()
        .filter_map(|(link, g)| g.map(|g| (link, g)))
        .unzip();
    let overviews = build_overviews(&state.db, groups).await?;

    let items = links
        .into_iter()
        .zip(overviews)
        .map(|(link, group)| Membership {
            group_id: link.group_id,
            student_id: link.student_id,
            joined_at: link.joined_at,
            group,
        })
        .collect();

    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Groups",
    operation_id = "createGroup",
    summary = "Create a group",
    description = "Creates the group, then inserts the requested members concurrently. \
        Member inserts are not atomic with the group: failures are reported in `failed_member_ids` and never rolled back.",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = CreateGroupResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not a teacher (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name, members = payload.member_ids.len()))]
pub async fn create_group(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_teacher()?;
    payload.validate()?;

    let now = Utc::now();
    let new_group = group::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description.trim().to_string()),
        teacher_id: Set(auth_user.user_id),
        created_at: Set(now),
    };
    let group = new_group.insert(&state.db).await?;

    let mut seen = HashSet::new();
    let requested: Vec<Uuid> = payload
        .member_ids
        .into_iter()
        .filter(|id| seen.insert(*id))
        .collect();

    let students: HashSet<Uuid> = profile::Entity::find()
        .filter(profile::Column::Id.is_in(requested.clone()))
        .filter(profile::Column::Role.eq(Role::Student))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    let inserts = requested.iter().map(|&student_id| {
        let db = state.db.clone();
        let group_id = group.id;
        let is_student = students.contains(&student_id);
        async move {
            if !is_student {
                tracing::warn!(%student_id, "Skipping member: not a student profile");
                return (student_id, false);
            }
            let link = group_member::ActiveModel {
                group_id: Set(group_id),
                student_id: Set(student_id),
                joined_at: Set(now),
            };
            match group_member::Entity::insert(link).exec_without_returning(&db).await {
                Ok(_) => (student_id, true),
                Err(e) => {
                    tracing::error!(%student_id, error = %e, "Failed to add group member");
                    (student_id, false)
                }
            }
        }
    });

    let mut added_member_ids = Vec::new();
    let mut failed_member_ids = Vec::new();
    for (student_id, ok) in join_all(inserts).await {
        if ok {
            added_member_ids.push(student_id);
        } else {
            failed_member_ids.push(student_id);
        }
    }

    notify::members_added(&state, &group, &added_member_ids).await;
    tracing::info!(group_id = %group.id, added = added_member_ids.len(), failed = failed_member_ids.len(), "Group created");

    Ok((
        StatusCode::CREATED,
        Json(CreateGroupResponse {
            group: group.into(),
            added_member_ids,
            failed_member_ids,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Groups",
    operation_id = "getGroup",
    summary = "Get a group",
    description = "Visible to the owning teacher and to members. Others get 404.",
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group with tasks", body = GroupOverview),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Group not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(group_id = %id))]
pub async fn get_group(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupOverview>, AppError> {
    let group = find_group(&state.db, id).await?;
    check_group_access(&state.db, &auth_user, &group).await?;

    let overview = build_overviews(&state.db, vec![group])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("group overview vanished".into()))?;
    Ok(Json(overview))
}

#[utoipa::path(
    post,
    path = "/{id}/members",
    tag = "Group Members",
    operation_id = "joinGroup",
    summary = "Join a group by ID",
    description = "Adds the calling student to the group. Returns 409 if already a member.",
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 201, description = "Joined", body = Membership),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not a student (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Group not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already a member (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(group_id = %id, user_id = %auth_user.user_id))]
pub async fn join_group(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_student()?;

    let group = find_group(&state.db, id).await?;
    let student = profile::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    let link = group_member::ActiveModel {
        group_id: Set(group.id),
        student_id: Set(student.id),
        joined_at: Set(Utc::now()),
    };
    let link = match link.insert(&state.db).await {
        Ok(model) => model,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(AppError::Conflict(
                "You are already a member of this group".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    notify::member_joined(&state, &group, &student).await;

    let overview = build_overviews(&state.db, vec![group])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("group overview vanished".into()))?;

    Ok((
        StatusCode::CREATED,
        Json(Membership {
            group_id: link.group_id,
            student_id: link.student_id,
            joined_at: link.joined_at,
            group: overview,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}/members",
    tag = "Group Members",
    operation_id = "listGroupMembers",
    summary = "List group members",
    description = "Owner teacher only. Ordered by join time.",
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Members", body = Vec<GroupMember>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the group's teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Group not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(group_id = %id))]
pub async fn list_members(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GroupMember>>, AppError> {
    let group = find_group(&state.db, id).await?;
    require_owner(&auth_user, &group)?;

    let rows = group_member::Entity::find()
        .filter(group_member::Column::GroupId.eq(id))
        .find_also_related(profile::Entity)
        .order_by_asc(group_member::Column::JoinedAt)
        .all(&state.db)
        .await?;

    let items = rows
        .into_iter()
        .map(|(link, student)| GroupMember {
            student_id: link.student_id,
            joined_at: link.joined_at,
            profile: student.map(ProfileSummary::from),
        })
        .collect();

    Ok(Json(items))
}
