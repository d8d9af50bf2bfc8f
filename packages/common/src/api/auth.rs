use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Profile, ValidationError, require_non_blank};
use crate::Role;

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid || email.len() > 254 {
        return Err(ValidationError::new("Please enter a valid email address"));
    }
    Ok(())
}

/// Request body for account creation.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SignUpRequest {
    #[schema(example = "ada@school.test")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "ada")]
    pub username: Option<String>,
}

impl SignUpRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        if self.password.len() < 6 || self.password.len() > 128 {
            return Err(ValidationError::new("Password must be 6-128 characters"));
        }
        if let Some(username) = &self.username
            && username.trim().chars().count() > 64
        {
            return Err(ValidationError::new("Username must be at most 64 characters"));
        }
        Ok(())
    }
}

/// Request body for password sign-in.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SignInRequest {
    #[schema(example = "ada@school.test")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

impl SignInRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&self.email, "Please fill in all fields")?;
        if self.password.is_empty() {
            return Err(ValidationError::new("Please fill in all fields"));
        }
        Ok(())
    }
}

/// Auth-level user update. Only the email is changeable.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    #[schema(example = "ada.lovelace@school.test")]
    pub email: String,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)
    }
}

/// A bearer session returned by sign-up and sign-in.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AuthSession {
    /// JWT to send as `Authorization: Bearer <token>`.
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub profile: Profile,
}
