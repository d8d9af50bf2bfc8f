use sea_orm::{ConnectionTrait, EntityTrait};
use uuid::Uuid;

use crate::entity::{group, group_member, submission, task};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

/// Look up a group by ID, returning 404 if not found.
pub async fn find_group<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<group::Model, AppError> {
    group::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Group not found".into()))
}

/// Look up a task by ID, returning 404 if not found.
pub async fn find_task<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<task::Model, AppError> {
    task::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

pub async fn find_submission<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<submission::Model, AppError> {
    submission::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))
}

pub async fn is_member<C: ConnectionTrait>(
    db: &C,
    group_id: Uuid,
    student_id: Uuid,
) -> Result<bool, AppError> {
    Ok(group_member::Entity::find_by_id((group_id, student_id))
        .one(db)
        .await?
        .is_some())
}

/// Verify the caller owns the group.
pub fn require_owner(auth_user: &AuthUser, group: &group::Model) -> Result<(), AppError> {
    auth_user.require_teacher()?;
    if group.teacher_id != auth_user.user_id {
        return Err(AppError::PermissionDenied);
    }
    Ok(())
}

/// Verify the caller can read the group: its teacher or one of its members.
///
/// Returns 404 rather than 403 for outsiders so group IDs cannot be probed.
pub async fn check_group_access<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    group: &group::Model,
) -> Result<(), AppError> {
    if group.teacher_id == auth_user.user_id {
        return Ok(());
    }
    if is_member(db, group.id, auth_user.user_id).await? {
        return Ok(());
    }
    Err(AppError::NotFound("Group not found".into()))
}

/// Load a task together with its group after checking read access.
pub async fn find_visible_task<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    task_id: Uuid,
) -> Result<(task::Model, group::Model), AppError> {
    let task = find_task(db, task_id).await?;
    let group = find_group(db, task.group_id).await?;
    if check_group_access(db, auth_user, &group).await.is_err() {
        return Err(AppError::NotFound("Task not found".into()));
    }
    Ok((task, group))
}
