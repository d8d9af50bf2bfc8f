//! Notification rows created as a side effect of other writes.
//!
//! Each trigger runs after the primary write has committed. A failure here
//! is logged and never fails the request that caused it.

use chrono::Utc;
use common::NotificationKind;
use common::api::{ChangeKind, Notification};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::{group, group_member, notification, profile, submission, task};
use crate::state::AppState;

struct Draft {
    user_id: Uuid,
    title: String,
    message: String,
    kind: NotificationKind,
    related_id: Option<Uuid>,
}

async fn deliver(state: &AppState, drafts: Vec<Draft>) -> Result<(), DbErr> {
    if drafts.is_empty() {
        return Ok(());
    }
    let now = Utc::now();
    let mut ids = Vec::with_capacity(drafts.len());
    let models: Vec<notification::ActiveModel> = drafts
        .into_iter()
        .map(|d| {
            let id = Uuid::now_v7();
            ids.push(id);
            notification::ActiveModel {
                id: Set(id),
                user_id: Set(d.user_id),
                title: Set(d.title),
                message: Set(d.message),
                kind: Set(d.kind),
                related_id: Set(d.related_id),
                is_read: Set(false),
                created_at: Set(now),
            }
        })
        .collect();

    notification::Entity::insert_many(models)
        .exec_without_returning(&state.db)
        .await?;

    let rows = notification::Entity::find()
        .filter(notification::Column::Id.is_in(ids))
        .all(&state.db)
        .await?;
    for row in rows {
        state
            .realtime
            .publish(ChangeKind::Insert, Notification::from(row));
    }
    Ok(())
}

async fn run(state: &AppState, trigger: &'static str, drafts: Result<Vec<Draft>, DbErr>) {
    let result = match drafts {
        Ok(drafts) => deliver(state, drafts).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::warn!(trigger, error = %e, "Failed to create notifications");
    }
}

/// Tell every member of the group about a new task.
pub async fn task_created(state: &AppState, group: &group::Model, task: &task::Model) {
    let drafts = async {
        let members = group_member::Entity::find()
            .filter(group_member::Column::GroupId.eq(group.id))
            .all(&state.db)
            .await?;
        Ok::<Vec<Draft>, DbErr>(members
            .into_iter()
            .map(|m| Draft {
                user_id: m.student_id,
                title: "New task".into(),
                message: format!("{}: {}", group.name, task.title),
                kind: NotificationKind::Task,
                related_id: Some(task.id),
            })
            .collect())
    }
    .await;
    run(state, "task_created", drafts).await;
}

/// Tell the group's teacher a student handed in work.
pub async fn submission_received(
    state: &AppState,
    group: &group::Model,
    task: &task::Model,
    submission: &submission::Model,
) {
    let drafts = async {
        let student = profile::Entity::find_by_id(submission.student_id)
            .one(&state.db)
            .await?;
        let who = student
            .as_ref()
            .map(|p| p.username.clone().unwrap_or_else(|| p.email.clone()))
            .unwrap_or_else(|| "A student".into());
        Ok::<Vec<Draft>, DbErr>(vec![Draft {
            user_id: group.teacher_id,
            title: "New submission".into(),
            message: format!("{who} submitted {}", task.title),
            kind: NotificationKind::Submission,
            related_id: Some(submission.id),
        }])
    }
    .await;
    run(state, "submission_received", drafts).await;
}

/// Tell the student their submission was rated.
pub async fn submission_rated(state: &AppState, task: &task::Model, submission: &submission::Model) {
    let rating = submission.rating.unwrap_or_default();
    let drafts = Ok(vec![Draft {
        user_id: submission.student_id,
        title: "Submission rated".into(),
        message: format!("{}: {rating}/5", task.title),
        kind: NotificationKind::Feedback,
        related_id: Some(submission.id),
    }]);
    run(state, "submission_rated", drafts).await;
}

/// Tell the teacher a student joined their group.
pub async fn member_joined(state: &AppState, group: &group::Model, student: &profile::Model) {
    let who = student.username.clone().unwrap_or_else(|| student.email.clone());
    let drafts = Ok(vec![Draft {
        user_id: group.teacher_id,
        title: "New member".into(),
        message: format!("{who} joined {}", group.name),
        kind: NotificationKind::Group,
        related_id: Some(group.id),
    }]);
    run(state, "member_joined", drafts).await;
}

/// Welcome students added by the teacher at group creation.
pub async fn members_added(state: &AppState, group: &group::Model, student_ids: &[Uuid]) {
    let drafts = Ok(student_ids
        .iter()
        .map(|&student_id| Draft {
            user_id: student_id,
            title: "Added to group".into(),
            message: format!("You were added to {}", group.name),
            kind: NotificationKind::Group,
            related_id: Some(group.id),
        })
        .collect());
    run(state, "members_added", drafts).await;
}
