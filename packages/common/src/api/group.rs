use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProfileSummary, Task, ValidationError, validate_title};

/// A group row as stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Group {
    pub id: Uuid,
    #[schema(example = "Algebra")]
    pub name: String,
    pub description: String,
    pub teacher_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Minimal group reference embedded in task detail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GroupSummary {
    pub id: Uuid,
    pub name: String,
    pub teacher_id: Uuid,
}

/// A group list row with its teacher and nested tasks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GroupOverview {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub teacher_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub teacher: Option<ProfileSummary>,
    pub tasks: Vec<Task>,
    pub tasks_count: u64,
}

impl GroupOverview {
    pub fn summary(&self) -> GroupSummary {
        GroupSummary {
            id: self.id,
            name: self.name.clone(),
            teacher_id: self.teacher_id,
        }
    }
}

/// A student's membership row with the joined group nested in it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Membership {
    pub group_id: Uuid,
    pub student_id: Uuid,
    pub joined_at: DateTime<Utc>,
    pub group: GroupOverview,
}

/// A member as listed to the group's teacher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GroupMember {
    pub student_id: Uuid,
    pub joined_at: DateTime<Utc>,
    pub profile: Option<ProfileSummary>,
}

/// Request body for creating a group.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateGroupRequest {
    #[schema(example = "Algebra")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Students to add right after the group row is created.
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

impl CreateGroupRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("Please enter a group name"));
        }
        validate_title(&self.name, "Group name")?;
        if self.description.chars().count() > 4096 {
            return Err(ValidationError::new(
                "Description must be at most 4096 characters",
            ));
        }
        Ok(())
    }
}

/// Result of group creation. Member inserts are not rolled back on failure.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateGroupResponse {
    pub group: Group,
    pub added_member_ids: Vec<Uuid>,
    pub failed_member_ids: Vec<Uuid>,
}
