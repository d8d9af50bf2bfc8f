use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;
use crate::Role;

/// The denormalized profile kept in the session store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Profile {
    pub id: Uuid,
    #[schema(example = "ada@school.test")]
    pub email: String,
    #[schema(example = "ada")]
    pub username: Option<String>,
    pub role: Role,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Username when set, otherwise the email address.
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// Short identity embedded in list rows (group teacher, submission author).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
}

/// Profile fields a user may change on their own row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "ada_l")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(username) = &self.username {
            let username = username.trim();
            if username.is_empty() || username.chars().count() > 64 {
                return Err(ValidationError::new("Username must be 1-64 characters"));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.image_url.is_none()
    }
}
