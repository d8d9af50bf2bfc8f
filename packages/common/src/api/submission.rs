use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProfileSummary, ValidationError};
use crate::SubmissionStatus;

/// One student's answer to one task. Unique per `(task_id, student_id)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Submission {
    pub id: Uuid,
    pub task_id: Uuid,
    pub student_id: Uuid,
    pub content: Option<String>,
    pub file_path: Option<String>,
    pub status: SubmissionStatus,
    /// 1-5 stars, set by the teacher.
    pub rating: Option<i16>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Rated rows carry both a rating and feedback.
    pub fn is_rated(&self) -> bool {
        self.rating.is_some() && self.feedback.is_some()
    }
}

/// Task fields shown next to a submission row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TaskSummary {
    pub id: Uuid,
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub group_id: Uuid,
}

/// A submission list row with its task and author.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmissionView {
    pub submission: Submission,
    pub task: TaskSummary,
    pub student: Option<ProfileSummary>,
}

/// Student hand-in. Upserted on `(task_id, student_id)`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmitRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "answer")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl SubmitRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let has_content = self.content.as_deref().is_some_and(|c| !c.trim().is_empty());
        let has_file = self.file_path.as_deref().is_some_and(|p| !p.trim().is_empty());
        if !has_content && !has_file {
            return Err(ValidationError::new(
                "Please enter an answer or attach a file",
            ));
        }
        Ok(())
    }
}

/// Teacher review of a submission.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RateRequest {
    #[schema(example = 5, minimum = 1, maximum = 5)]
    pub rating: i16,
    #[serde(default)]
    #[schema(example = "Well done")]
    pub feedback: String,
}

impl RateRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ValidationError::new("Please select a rating"));
        }
        if self.feedback.chars().count() > 4096 {
            return Err(ValidationError::new(
                "Feedback must be at most 4096 characters",
            ));
        }
        Ok(())
    }
}
