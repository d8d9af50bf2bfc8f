use common::api::{Submission, TaskSummary};
use serde::Deserialize;
use uuid::Uuid;

use crate::entity::{submission, task};

impl From<submission::Model> for Submission {
    fn from(model: submission::Model) -> Self {
        Self {
            id: model.id,
            task_id: model.task_id,
            student_id: model.student_id,
            content: model.content,
            file_path: model.file_path,
            status: model.status,
            rating: model.rating,
            feedback: model.feedback,
            submitted_at: model.submitted_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&task::Model> for TaskSummary {
    fn from(model: &task::Model) -> Self {
        Self {
            id: model.id,
            title: model.title.clone(),
            due_date: model.due_date,
            group_id: model.group_id,
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubmissionListQuery {
    /// Only rows by this student. Students may only pass their own ID.
    pub student_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    /// Only rows that carry both a rating and feedback.
    #[param(example = false)]
    pub rated_only: Option<bool>,
}
