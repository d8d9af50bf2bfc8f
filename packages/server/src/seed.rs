use sea_orm::*;
use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use tracing::info;

use crate::entity::{group_member, notification, submission, task};

/// Ensure required database indexes exist.
///
/// Schema sync creates tables and columns but not composite indexes, so
/// they are created here on startup. The submission index is the upsert
/// target for `PUT /tasks/{id}/submission` and must be unique.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let unique_submission = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_submissions_task_student")
        .table(submission::Entity)
        .col(submission::Column::TaskId)
        .col(submission::Column::StudentId)
        .to_owned();
    // Upserts fail without this one, so it is not best-effort.
    create(db, "idx_submissions_task_student", unique_submission, true).await?;

    let notifications_by_user = Index::create()
        .if_not_exists()
        .name("idx_notifications_user_created")
        .table(notification::Entity)
        .col(notification::Column::UserId)
        .col(notification::Column::CreatedAt)
        .to_owned();
    create(db, "idx_notifications_user_created", notifications_by_user, false).await?;

    let members_by_student = Index::create()
        .if_not_exists()
        .name("idx_group_members_student")
        .table(group_member::Entity)
        .col(group_member::Column::StudentId)
        .to_owned();
    create(db, "idx_group_members_student", members_by_student, false).await?;

    let tasks_by_due = Index::create()
        .if_not_exists()
        .name("idx_tasks_group_due")
        .table(task::Entity)
        .col(task::Column::GroupId)
        .col(task::Column::DueDate)
        .to_owned();
    create(db, "idx_tasks_group_due", tasks_by_due, false).await?;

    Ok(())
}

async fn create(
    db: &DatabaseConnection,
    name: &str,
    stmt: IndexCreateStatement,
    required: bool,
) -> Result<(), DbErr> {
    match db.execute_unprepared(&stmt.to_string(PostgresQueryBuilder)).await {
        Ok(_) => {
            info!("Ensured index {} exists", name);
            Ok(())
        }
        Err(e) if required => Err(e),
        Err(e) => {
            tracing::warn!("Failed to create index {}: {}", name, e);
            Ok(())
        }
    }
}
