//! The backend seam. Every screen talks to the backend through [`Backend`].

pub mod http;
pub mod memory;

use std::pin::Pin;

use async_trait::async_trait;
use common::api::{
    AuthSession, CreateGroupRequest, CreateGroupResponse, CreateTaskRequest, GroupMember,
    GroupOverview, Membership, Notification, NotificationChange, Profile, RateRequest,
    SignInRequest, SignUpRequest, StoredObject, Submission, SubmissionView, SubmitRequest, Task,
    TaskDetail, UpdateProfileRequest, UpdateTaskRequest, UpdateUserRequest,
};
use common::storage::Bucket;
use futures::Stream;
use uuid::Uuid;

use crate::error::ClientError;

pub use http::HttpBackend;
pub use memory::MemoryBackend;

/// Realtime changes on the caller's notification rows.
pub type NotificationStream =
    Pin<Box<dyn Stream<Item = Result<NotificationChange, ClientError>> + Send>>;

/// Which groups a screen lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupQuery {
    /// Groups whose `teacher_id` is the given profile.
    OwnedBy(Uuid),
    /// Groups the given student is a member of.
    JoinedBy(Uuid),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Restrict to these groups. Empty means every group the caller can read.
    pub group_ids: Vec<Uuid>,
    /// Only tasks due strictly after now.
    pub upcoming: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionQuery {
    pub student_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    /// Only rows carrying both a rating and feedback.
    pub rated_only: bool,
}

/// Authentication, relational access, storage and realtime.
///
/// Methods that need an identity take the bearer token explicitly; the
/// [`SessionStore`](crate::SessionStore) owns it.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn sign_up(&self, req: &SignUpRequest) -> Result<AuthSession, ClientError>;
    async fn sign_in(&self, req: &SignInRequest) -> Result<AuthSession, ClientError>;
    /// Profile behind a token. Fails with 401 when the token is no longer valid.
    async fn session(&self, token: &str) -> Result<Profile, ClientError>;
    async fn update_user(&self, token: &str, req: &UpdateUserRequest)
    -> Result<Profile, ClientError>;

    async fn get_profile(&self, token: &str, id: Uuid) -> Result<Profile, ClientError>;
    async fn update_profile(
        &self,
        token: &str,
        req: &UpdateProfileRequest,
    ) -> Result<Profile, ClientError>;

    async fn list_groups(
        &self,
        token: &str,
        teacher_id: Uuid,
    ) -> Result<Vec<GroupOverview>, ClientError>;
    async fn list_memberships(
        &self,
        token: &str,
        student_id: Uuid,
    ) -> Result<Vec<Membership>, ClientError>;
    async fn create_group(
        &self,
        token: &str,
        req: &CreateGroupRequest,
    ) -> Result<CreateGroupResponse, ClientError>;
    async fn get_group(&self, token: &str, id: Uuid) -> Result<GroupOverview, ClientError>;
    async fn join_group(&self, token: &str, id: Uuid) -> Result<Membership, ClientError>;
    async fn list_members(&self, token: &str, id: Uuid) -> Result<Vec<GroupMember>, ClientError>;

    async fn list_group_tasks(&self, token: &str, group_id: Uuid)
    -> Result<Vec<Task>, ClientError>;
    async fn create_task(
        &self,
        token: &str,
        group_id: Uuid,
        req: &CreateTaskRequest,
    ) -> Result<Task, ClientError>;
    async fn list_tasks(&self, token: &str, query: &TaskQuery) -> Result<Vec<Task>, ClientError>;
    async fn get_task(&self, token: &str, id: Uuid) -> Result<TaskDetail, ClientError>;
    async fn update_task(
        &self,
        token: &str,
        id: Uuid,
        req: &UpdateTaskRequest,
    ) -> Result<Task, ClientError>;

    /// Upsert on `(task_id, caller)`.
    async fn submit(
        &self,
        token: &str,
        task_id: Uuid,
        req: &SubmitRequest,
    ) -> Result<Submission, ClientError>;
    async fn my_submission(
        &self,
        token: &str,
        task_id: Uuid,
    ) -> Result<Option<Submission>, ClientError>;
    async fn list_task_submissions(
        &self,
        token: &str,
        task_id: Uuid,
    ) -> Result<Vec<SubmissionView>, ClientError>;
    async fn list_submissions(
        &self,
        token: &str,
        query: &SubmissionQuery,
    ) -> Result<Vec<SubmissionView>, ClientError>;
    async fn rate_submission(
        &self,
        token: &str,
        id: Uuid,
        req: &RateRequest,
    ) -> Result<Submission, ClientError>;

    async fn list_notifications(
        &self,
        token: &str,
        limit: Option<u64>,
    ) -> Result<Vec<Notification>, ClientError>;
    async fn unread_count(&self, token: &str) -> Result<u64, ClientError>;
    async fn mark_read(&self, token: &str, id: Uuid) -> Result<Notification, ClientError>;
    /// The `mark_all_notifications_read` procedure. Returns the rows changed.
    async fn mark_all_read(&self, token: &str) -> Result<u64, ClientError>;

    /// Store `data` at `bucket/path`, replacing any previous object.
    async fn upload(
        &self,
        token: &str,
        bucket: Bucket,
        path: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredObject, ClientError>;
    /// Public URL for an object. Pure; does not check existence.
    fn public_url(&self, bucket: Bucket, path: &str) -> String;

    async fn subscribe_notifications(&self, token: &str)
    -> Result<NotificationStream, ClientError>;

    /// Run the one scoped read a [`GroupQuery`] describes.
    async fn groups(
        &self,
        token: &str,
        query: GroupQuery,
    ) -> Result<Vec<GroupOverview>, ClientError> {
        match query {
            GroupQuery::OwnedBy(teacher_id) => self.list_groups(token, teacher_id).await,
            GroupQuery::JoinedBy(student_id) => Ok(self
                .list_memberships(token, student_id)
                .await?
                .into_iter()
                .map(|m| m.group)
                .collect()),
        }
    }
}
