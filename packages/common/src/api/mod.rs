//! Request and response bodies exchanged between the client and the backend.
//!
//! Field names follow the relational columns so rows can be rendered as-is.

mod auth;
mod group;
mod notification;
mod profile;
mod storage;
mod submission;
mod task;

pub use auth::{AuthSession, SignInRequest, SignUpRequest, UpdateUserRequest};
pub use group::{
    CreateGroupRequest, CreateGroupResponse, Group, GroupMember, GroupOverview, GroupSummary,
    Membership,
};
pub use notification::{
    ChangeKind, MarkAllReadResponse, Notification, NotificationChange, UnreadCount,
};
pub use profile::{Profile, ProfileSummary, UpdateProfileRequest};
pub use storage::StoredObject;
pub use submission::{RateRequest, Submission, SubmissionView, SubmitRequest, TaskSummary};
pub use task::{CreateTaskRequest, Task, TaskDetail, UpdateTaskRequest};

/// A request body that failed a local check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub(crate) fn require_non_blank(value: &str, message: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(message));
    }
    Ok(())
}

/// Validate a trimmed title (1-256 Unicode characters).
pub(crate) fn validate_title(title: &str, what: &str) -> Result<(), ValidationError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(ValidationError(format!("{what} must be 1-256 characters")));
    }
    Ok(())
}
