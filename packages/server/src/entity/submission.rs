use common::SubmissionStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// At most one row per `(task_id, student_id)`; see `seed::ensure_indexes`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub task_id: Uuid,
    #[sea_orm(belongs_to, from = "task_id", to = "id")]
    pub task: HasOne<super::task::Entity>,

    pub student_id: Uuid,
    #[sea_orm(belongs_to, from = "student_id", to = "id")]
    pub student: HasOne<super::profile::Entity>,

    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    /// Object path in the `submission-files` bucket.
    pub file_path: Option<String>,

    pub status: SubmissionStatus,
    pub rating: Option<i16>,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,

    pub submitted_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
