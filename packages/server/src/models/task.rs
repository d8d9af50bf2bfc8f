use common::api::Task;
use serde::Deserialize;
use uuid::Uuid;

use crate::entity::task;
use crate::error::AppError;

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            due_date: model.due_date,
            group_id: model.group_id,
            file_path: model.file_path,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskListQuery {
    /// Comma-separated group IDs. Groups the caller cannot read are ignored.
    #[param(example = "0190c6a4-7d3e-7b3c-9d7e-2a4f1c0b5e61,0190c6a4-8a11-7c02-b4c9-5f8e2d6a7b10")]
    pub group_ids: Option<String>,
    /// Only tasks due strictly after now.
    #[param(example = true)]
    pub upcoming: Option<bool>,
}

/// Parse the comma-separated `group_ids` parameter.
pub fn parse_group_ids(raw: Option<&str>) -> Result<Vec<Uuid>, AppError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s).map_err(|_| AppError::Validation(format!("Invalid group id '{s}'")))
        })
        .collect()
}
