use common::api::{Group, GroupSummary};
use serde::Deserialize;
use uuid::Uuid;

use crate::entity::group;

impl From<group::Model> for Group {
    fn from(model: group::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            teacher_id: model.teacher_id,
            created_at: model.created_at,
        }
    }
}

impl From<&group::Model> for GroupSummary {
    fn from(model: &group::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            teacher_id: model.teacher_id,
        }
    }
}

/// Teacher-scoped group listing.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GroupListQuery {
    /// Owning teacher. Must be the caller.
    pub teacher_id: Uuid,
}

/// Student-scoped membership listing.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MembershipListQuery {
    /// Member. Must be the caller.
    pub student_id: Uuid,
}
