use std::time::Duration;

use async_trait::async_trait;
use common::api::{
    AuthSession, CreateGroupRequest, CreateGroupResponse, CreateTaskRequest, GroupMember,
    GroupOverview, MarkAllReadResponse, Membership, Notification, NotificationChange, Profile,
    RateRequest, SignInRequest, SignUpRequest, StoredObject, Submission, SubmissionView,
    SubmitRequest, Task, TaskDetail, UnreadCount, UpdateProfileRequest, UpdateTaskRequest,
    UpdateUserRequest,
};
use common::storage::Bucket;
use futures::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::{Backend, NotificationStream, SubmissionQuery, TaskQuery};
use crate::error::ClientError;

const API_PREFIX: &str = "/api/v1";

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// [`Backend`] over the classroom REST API.
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Use a preconfigured reqwest client.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{API_PREFIX}{path}", self.base_url))
    }

    fn authed(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.request(method, path).bearer_auth(token)
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let err = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => ClientError::api(status, body.code, body.message),
            Err(_) if text.is_empty() => ClientError::api(status, "HTTP_ERROR", status.to_string()),
            Err(_) => ClientError::api(status, "HTTP_ERROR", text),
        };
        tracing::debug!(%status, error = %err, "Request rejected");
        Err(err)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = Self::check(request.send().await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn sign_up(&self, req: &SignUpRequest) -> Result<AuthSession, ClientError> {
        self.send(self.request(Method::POST, "/auth/signup").json(req))
            .await
    }

    async fn sign_in(&self, req: &SignInRequest) -> Result<AuthSession, ClientError> {
        self.send(self.request(Method::POST, "/auth/login").json(req))
            .await
    }

    async fn session(&self, token: &str) -> Result<Profile, ClientError> {
        self.send(self.authed(Method::GET, "/auth/session", token))
            .await
    }

    async fn update_user(
        &self,
        token: &str,
        req: &UpdateUserRequest,
    ) -> Result<Profile, ClientError> {
        self.send(self.authed(Method::PATCH, "/auth/user", token).json(req))
            .await
    }

    async fn get_profile(&self, token: &str, id: Uuid) -> Result<Profile, ClientError> {
        self.send(self.authed(Method::GET, &format!("/profiles/{id}"), token))
            .await
    }

    async fn update_profile(
        &self,
        token: &str,
        req: &UpdateProfileRequest,
    ) -> Result<Profile, ClientError> {
        self.send(self.authed(Method::PATCH, "/profiles/me", token).json(req))
            .await
    }

    async fn list_groups(
        &self,
        token: &str,
        teacher_id: Uuid,
    ) -> Result<Vec<GroupOverview>, ClientError> {
        self.send(
            self.authed(Method::GET, "/groups", token)
                .query(&[("teacher_id", teacher_id)]),
        )
        .await
    }

    async fn list_memberships(
        &self,
        token: &str,
        student_id: Uuid,
    ) -> Result<Vec<Membership>, ClientError> {
        self.send(
            self.authed(Method::GET, "/group-members", token)
                .query(&[("student_id", student_id)]),
        )
        .await
    }

    async fn create_group(
        &self,
        token: &str,
        req: &CreateGroupRequest,
    ) -> Result<CreateGroupResponse, ClientError> {
        self.send(self.authed(Method::POST, "/groups", token).json(req))
            .await
    }

    async fn get_group(&self, token: &str, id: Uuid) -> Result<GroupOverview, ClientError> {
        self.send(self.authed(Method::GET, &format!("/groups/{id}"), token))
            .await
    }

    async fn join_group(&self, token: &str, id: Uuid) -> Result<Membership, ClientError> {
        self.send(self.authed(Method::POST, &format!("/groups/{id}/members"), token))
            .await
    }

    async fn list_members(&self, token: &str, id: Uuid) -> Result<Vec<GroupMember>, ClientError> {
        self.send(self.authed(Method::GET, &format!("/groups/{id}/members"), token))
            .await
    }

    async fn list_group_tasks(
        &self,
        token: &str,
        group_id: Uuid,
    ) -> Result<Vec<Task>, ClientError> {
        self.send(self.authed(Method::GET, &format!("/groups/{group_id}/tasks"), token))
            .await
    }

    async fn create_task(
        &self,
        token: &str,
        group_id: Uuid,
        req: &CreateTaskRequest,
    ) -> Result<Task, ClientError> {
        self.send(
            self.authed(Method::POST, &format!("/groups/{group_id}/tasks"), token)
                .json(req),
        )
        .await
    }

    async fn list_tasks(&self, token: &str, query: &TaskQuery) -> Result<Vec<Task>, ClientError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if !query.group_ids.is_empty() {
            let ids: Vec<String> = query.group_ids.iter().map(Uuid::to_string).collect();
            params.push(("group_ids", ids.join(",")));
        }
        if query.upcoming {
            params.push(("upcoming", "true".into()));
        }
        self.send(self.authed(Method::GET, "/tasks", token).query(&params))
            .await
    }

    async fn get_task(&self, token: &str, id: Uuid) -> Result<TaskDetail, ClientError> {
        self.send(self.authed(Method::GET, &format!("/tasks/{id}"), token))
            .await
    }

    async fn update_task(
        &self,
        token: &str,
        id: Uuid,
        req: &UpdateTaskRequest,
    ) -> Result<Task, ClientError> {
        self.send(
            self.authed(Method::PATCH, &format!("/tasks/{id}"), token)
                .json(req),
        )
        .await
    }

    async fn submit(
        &self,
        token: &str,
        task_id: Uuid,
        req: &SubmitRequest,
    ) -> Result<Submission, ClientError> {
        self.send(
            self.authed(Method::PUT, &format!("/tasks/{task_id}/submission"), token)
                .json(req),
        )
        .await
    }

    async fn my_submission(
        &self,
        token: &str,
        task_id: Uuid,
    ) -> Result<Option<Submission>, ClientError> {
        self.send(self.authed(Method::GET, &format!("/tasks/{task_id}/submission"), token))
            .await
    }

    async fn list_task_submissions(
        &self,
        token: &str,
        task_id: Uuid,
    ) -> Result<Vec<SubmissionView>, ClientError> {
        self.send(self.authed(Method::GET, &format!("/tasks/{task_id}/submissions"), token))
            .await
    }

    async fn list_submissions(
        &self,
        token: &str,
        query: &SubmissionQuery,
    ) -> Result<Vec<SubmissionView>, ClientError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(student_id) = query.student_id {
            params.push(("student_id", student_id.to_string()));
        }
        if let Some(task_id) = query.task_id {
            params.push(("task_id", task_id.to_string()));
        }
        if query.rated_only {
            params.push(("rated_only", "true".into()));
        }
        self.send(self.authed(Method::GET, "/submissions", token).query(&params))
            .await
    }

    async fn rate_submission(
        &self,
        token: &str,
        id: Uuid,
        req: &RateRequest,
    ) -> Result<Submission, ClientError> {
        self.send(
            self.authed(Method::POST, &format!("/submissions/{id}/rating"), token)
                .json(req),
        )
        .await
    }

    async fn list_notifications(
        &self,
        token: &str,
        limit: Option<u64>,
    ) -> Result<Vec<Notification>, ClientError> {
        let mut request = self.authed(Method::GET, "/notifications", token);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        self.send(request).await
    }

    async fn unread_count(&self, token: &str) -> Result<u64, ClientError> {
        let body: UnreadCount = self
            .send(self.authed(Method::GET, "/notifications/unread-count", token))
            .await?;
        Ok(body.count)
    }

    async fn mark_read(&self, token: &str, id: Uuid) -> Result<Notification, ClientError> {
        self.send(self.authed(Method::POST, &format!("/notifications/{id}/read"), token))
            .await
    }

    async fn mark_all_read(&self, token: &str) -> Result<u64, ClientError> {
        let body: MarkAllReadResponse = self
            .send(self.authed(Method::POST, "/rpc/mark_all_notifications_read", token))
            .await?;
        Ok(body.updated)
    }

    async fn upload(
        &self,
        token: &str,
        bucket: Bucket,
        path: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredObject, ClientError> {
        self.send(
            self.authed(Method::PUT, &format!("/storage/object/{bucket}/{path}"), token)
                .header(CONTENT_TYPE, content_type)
                .body(data),
        )
        .await
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        StoredObject::public_url_for(&self.base_url, bucket, path)
    }

    async fn subscribe_notifications(
        &self,
        token: &str,
    ) -> Result<NotificationStream, ClientError> {
        let response = self
            .authed(Method::GET, "/realtime/notifications", token)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(sse_changes(response.bytes_stream()))
    }
}

/// Decode a `text/event-stream` body into notification changes.
///
/// Comment lines (keep-alives) and events without data are skipped.
pub(crate) fn sse_changes<S, B>(bytes: S) -> NotificationStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = (Box::pin(bytes), Vec::<u8>::new());
    futures::stream::unfold(state, |(mut bytes, mut buf)| async move {
        loop {
            if let Some(end) = buf.windows(2).position(|w| w == b"\n\n") {
                let block: Vec<u8> = buf.drain(..end + 2).collect();
                if let Some(item) = parse_event(&String::from_utf8_lossy(&block)) {
                    return Some((item, (bytes, buf)));
                }
                continue;
            }
            match bytes.next().await {
                Some(Ok(chunk)) => {
                    buf.extend(chunk.as_ref().iter().filter(|&&b| b != b'\r'));
                }
                Some(Err(e)) => return Some((Err(ClientError::from(e)), (bytes, buf))),
                None => return None,
            }
        }
    })
    .boxed()
}

fn parse_event(block: &str) -> Option<Result<NotificationChange, ClientError>> {
    let data: Vec<&str> = block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect();
    if data.is_empty() {
        return None;
    }
    Some(serde_json::from_str(&data.join("\n")).map_err(|e| ClientError::Decode(e.to_string())))
}
