//! In-process backend with the server's access rules and triggers.
//!
//! Used by tests and offline demos. Rows live in one mutex-guarded state;
//! objects go to a [`MemoryObjectStore`].

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::api::{
    AuthSession, ChangeKind, CreateGroupRequest, CreateGroupResponse, CreateTaskRequest, Group,
    GroupMember, GroupOverview, Membership, Notification, NotificationChange, Profile,
    ProfileSummary, RateRequest, SignInRequest, SignUpRequest, StoredObject, Submission,
    SubmissionView, SubmitRequest, Task, TaskDetail, TaskSummary, UpdateProfileRequest,
    UpdateTaskRequest, UpdateUserRequest, ValidationError,
};
use common::storage::memory::MemoryObjectStore;
use common::storage::{Bucket, ObjectKey, ObjectStore, StorageError, validate_object_path};
use common::{NotificationKind, Role, SubmissionStatus};
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, broadcast};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use super::{Backend, NotificationStream, SubmissionQuery, TaskQuery};
use crate::error::ClientError;

const BASE_URL: &str = "memory://classroom";
const SESSION_TTL_HOURS: i64 = 24;
const MAX_PAGE: u64 = 200;

fn validation(err: ValidationError) -> ClientError {
    ClientError::api(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.0)
}

fn not_found(what: &str) -> ClientError {
    ClientError::api(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{what} not found"))
}

fn denied() -> ClientError {
    ClientError::api(
        StatusCode::FORBIDDEN,
        "PERMISSION_DENIED",
        "Insufficient permissions",
    )
}

fn token_invalid() -> ClientError {
    ClientError::api(
        StatusCode::UNAUTHORIZED,
        "TOKEN_INVALID",
        "Invalid or expired token",
    )
}

fn storage_error(err: StorageError) -> ClientError {
    match err {
        StorageError::NotFound(_) => not_found("Object"),
        StorageError::UnknownBucket(name) => not_found(&format!("Bucket '{name}'")),
        StorageError::InvalidPath(msg) => validation(ValidationError::new(msg)),
        StorageError::SizeLimitExceeded { limit, .. } => ClientError::api(
            StatusCode::PAYLOAD_TOO_LARGE,
            "PAYLOAD_TOO_LARGE",
            format!("File exceeds the {limit} byte limit"),
        ),
        StorageError::Io(e) => ClientError::Io(e),
    }
}

fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn normalize_file_path(path: Option<String>) -> Result<Option<String>, ClientError> {
    path.filter(|p| !p.trim().is_empty())
        .map(|p| validate_object_path(&p).map_err(|e| validation(ValidationError::new(e))))
        .transpose()
}

struct Account {
    profile: Profile,
    password_hash: String,
}

struct MemberRow {
    group_id: Uuid,
    student_id: Uuid,
    joined_at: DateTime<Utc>,
}

struct Draft {
    user_id: Uuid,
    title: String,
    message: String,
    kind: NotificationKind,
    related_id: Option<Uuid>,
}

#[derive(Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    groups: Vec<Group>,
    members: Vec<MemberRow>,
    tasks: Vec<Task>,
    submissions: Vec<Submission>,
    notifications: Vec<Notification>,
    object_owners: HashMap<ObjectKey, Uuid>,
}

impl State {
    fn caller(&self, token: &str) -> Result<Profile, ClientError> {
        let (user_id, expires_at) = self.sessions.get(token).ok_or_else(token_invalid)?;
        if *expires_at <= Utc::now() {
            return Err(token_invalid());
        }
        self.accounts
            .get(user_id)
            .map(|a| a.profile.clone())
            .ok_or_else(token_invalid)
    }

    fn issue_session(&mut self, profile: Profile) -> AuthSession {
        let access_token = format!("mem.{}", Uuid::new_v4().simple());
        let expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
        self.sessions
            .insert(access_token.clone(), (profile.id, expires_at));
        AuthSession {
            access_token,
            token_type: "Bearer".into(),
            expires_at,
            profile,
        }
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.accounts
            .values()
            .any(|a| a.profile.email == email && Some(a.profile.id) != except)
    }

    fn summary(&self, id: Uuid) -> Option<ProfileSummary> {
        self.accounts.get(&id).map(|a| ProfileSummary {
            id,
            email: a.profile.email.clone(),
            username: a.profile.username.clone(),
        })
    }

    fn group(&self, id: Uuid) -> Result<&Group, ClientError> {
        self.groups
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| not_found("Group"))
    }

    fn task(&self, id: Uuid) -> Result<&Task, ClientError> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found("Task"))
    }

    fn is_member(&self, group_id: Uuid, student_id: Uuid) -> bool {
        self.members
            .iter()
            .any(|m| m.group_id == group_id && m.student_id == student_id)
    }

    fn can_read_group(&self, caller: &Profile, group: &Group) -> bool {
        group.teacher_id == caller.id || self.is_member(group.id, caller.id)
    }

    fn visible_group(&self, caller: &Profile, id: Uuid) -> Result<Group, ClientError> {
        let group = self.group(id)?;
        if !self.can_read_group(caller, group) {
            return Err(not_found("Group"));
        }
        Ok(group.clone())
    }

    fn visible_task(&self, caller: &Profile, id: Uuid) -> Result<(Task, Group), ClientError> {
        let task = self.task(id)?;
        let group = self.group(task.group_id)?;
        if !self.can_read_group(caller, group) {
            return Err(not_found("Task"));
        }
        Ok((task.clone(), group.clone()))
    }

    fn group_tasks(&self, group_id: Uuid) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.group_id == group_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.due_date);
        tasks
    }

    fn overview(&self, group: &Group) -> GroupOverview {
        let tasks = self.group_tasks(group.id);
        GroupOverview {
            id: group.id,
            name: group.name.clone(),
            description: group.description.clone(),
            teacher_id: group.teacher_id,
            created_at: group.created_at,
            teacher: self.summary(group.teacher_id),
            tasks_count: tasks.len() as u64,
            tasks,
        }
    }

    fn view(&self, submission: &Submission) -> Option<SubmissionView> {
        let task = self.tasks.iter().find(|t| t.id == submission.task_id)?;
        Some(SubmissionView {
            submission: submission.clone(),
            task: TaskSummary {
                id: task.id,
                title: task.title.clone(),
                due_date: task.due_date,
                group_id: task.group_id,
            },
            student: self.summary(submission.student_id),
        })
    }

    fn views<'a>(&self, rows: impl Iterator<Item = &'a Submission>) -> Vec<SubmissionView> {
        let mut rows: Vec<&Submission> = rows.collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then(b.id.cmp(&a.id)));
        rows.into_iter().filter_map(|s| self.view(s)).collect()
    }

    fn deliver(&mut self, drafts: Vec<Draft>) -> Vec<Notification> {
        let now = Utc::now();
        let rows: Vec<Notification> = drafts
            .into_iter()
            .map(|d| Notification {
                id: Uuid::now_v7(),
                user_id: d.user_id,
                title: d.title,
                message: d.message,
                kind: d.kind,
                related_id: d.related_id,
                is_read: false,
                created_at: now,
            })
            .collect();
        self.notifications.extend(rows.iter().cloned());
        rows
    }

    fn display_name(&self, id: Uuid) -> String {
        self.accounts
            .get(&id)
            .map(|a| {
                a.profile
                    .username
                    .clone()
                    .unwrap_or_else(|| a.profile.email.clone())
            })
            .unwrap_or_else(|| "A student".into())
    }
}

/// [`Backend`] that keeps every row in memory.
pub struct MemoryBackend {
    state: Mutex<State>,
    objects: MemoryObjectStore,
    changes: broadcast::Sender<NotificationChange>,
    max_object_size: u64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(10 * 1024 * 1024)
    }
}

impl MemoryBackend {
    pub fn new(max_object_size: u64) -> Self {
        let (changes, _) = broadcast::channel(256);
        Self {
            state: Mutex::new(State::default()),
            objects: MemoryObjectStore::new(),
            changes,
            max_object_size,
        }
    }

    /// Bytes of a stored object.
    pub async fn object(&self, bucket: Bucket, path: &str) -> Result<Vec<u8>, ClientError> {
        let key = ObjectKey::new(bucket, path).map_err(storage_error)?;
        self.objects.get(&key).await.map_err(storage_error)
    }

    /// Number of stored submission rows, across all students.
    pub async fn submission_count(&self) -> usize {
        self.state.lock().await.submissions.len()
    }

    /// Revoke a session, as if its token had expired.
    pub async fn expire_session(&self, token: &str) {
        self.state.lock().await.sessions.remove(token);
    }

    fn publish(&self, event: ChangeKind, rows: Vec<Notification>) {
        for record in rows {
            let _ = self.changes.send(NotificationChange { event, record });
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn sign_up(&self, req: &SignUpRequest) -> Result<AuthSession, ClientError> {
        req.validate().map_err(validation)?;
        let mut state = self.state.lock().await;
        let email = normalize_email(&req.email);
        if state.email_taken(&email, None) {
            return Err(ClientError::api(
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                "An account with this email already exists",
            ));
        }
        let now = Utc::now();
        let profile = Profile {
            id: Uuid::now_v7(),
            email,
            username: req
                .username
                .as_ref()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
            role: req.role,
            image_url: None,
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(
            profile.id,
            Account {
                profile: profile.clone(),
                password_hash: hash_password(&req.password),
            },
        );
        tracing::info!(user_id = %profile.id, "Account created");
        Ok(state.issue_session(profile))
    }

    async fn sign_in(&self, req: &SignInRequest) -> Result<AuthSession, ClientError> {
        req.validate().map_err(validation)?;
        let mut state = self.state.lock().await;
        let email = normalize_email(&req.email);
        let hash = hash_password(&req.password);
        let profile = state
            .accounts
            .values()
            .find(|a| a.profile.email == email && a.password_hash == hash)
            .map(|a| a.profile.clone())
            .ok_or_else(|| {
                ClientError::api(
                    StatusCode::UNAUTHORIZED,
                    "INVALID_CREDENTIALS",
                    "Invalid email or password",
                )
            })?;
        Ok(state.issue_session(profile))
    }

    async fn session(&self, token: &str) -> Result<Profile, ClientError> {
        self.state.lock().await.caller(token)
    }

    async fn update_user(
        &self,
        token: &str,
        req: &UpdateUserRequest,
    ) -> Result<Profile, ClientError> {
        req.validate().map_err(validation)?;
        let mut state = self.state.lock().await;
        let caller = state.caller(token)?;
        let email = normalize_email(&req.email);
        if state.email_taken(&email, Some(caller.id)) {
            return Err(ClientError::api(
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                "An account with this email already exists",
            ));
        }
        let account = state.accounts.get_mut(&caller.id).ok_or_else(token_invalid)?;
        account.profile.email = email;
        account.profile.updated_at = Utc::now();
        Ok(account.profile.clone())
    }

    async fn get_profile(&self, token: &str, id: Uuid) -> Result<Profile, ClientError> {
        let state = self.state.lock().await;
        state.caller(token)?;
        state
            .accounts
            .get(&id)
            .map(|a| a.profile.clone())
            .ok_or_else(|| not_found("Profile"))
    }

    async fn update_profile(
        &self,
        token: &str,
        req: &UpdateProfileRequest,
    ) -> Result<Profile, ClientError> {
        req.validate().map_err(validation)?;
        let mut state = self.state.lock().await;
        let caller = state.caller(token)?;
        if req.is_empty() {
            return Ok(caller);
        }
        let account = state.accounts.get_mut(&caller.id).ok_or_else(token_invalid)?;
        if let Some(username) = &req.username {
            account.profile.username = Some(username.trim().to_string());
        }
        if let Some(image_url) = &req.image_url {
            account.profile.image_url = Some(image_url.clone());
        }
        account.profile.updated_at = Utc::now();
        Ok(account.profile.clone())
    }

    async fn list_groups(
        &self,
        token: &str,
        teacher_id: Uuid,
    ) -> Result<Vec<GroupOverview>, ClientError> {
        let state = self.state.lock().await;
        let caller = state.caller(token)?;
        if caller.id != teacher_id {
            return Err(denied());
        }
        let mut groups: Vec<&Group> = state
            .groups
            .iter()
            .filter(|g| g.teacher_id == teacher_id)
            .collect();
        groups.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(groups.into_iter().map(|g| state.overview(g)).collect())
    }

    async fn list_memberships(
        &self,
        token: &str,
        student_id: Uuid,
    ) -> Result<Vec<Membership>, ClientError> {
        let state = self.state.lock().await;
        let caller = state.caller(token)?;
        if caller.id != student_id {
            return Err(denied());
        }
        let mut links: Vec<&MemberRow> = state
            .members
            .iter()
            .filter(|m| m.student_id == student_id)
            .collect();
        links.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));
        Ok(links
            .into_iter()
            .filter_map(|link| {
                let group = state.group(link.group_id).ok()?;
                Some(Membership {
                    group_id: link.group_id,
                    student_id: link.student_id,
                    joined_at: link.joined_at,
                    group: state.overview(group),
                })
            })
            .collect())
    }

    async fn create_group(
        &self,
        token: &str,
        req: &CreateGroupRequest,
    ) -> Result<CreateGroupResponse, ClientError> {
        let mut state = self.state.lock().await;
        let caller = state.caller(token)?;
        if caller.role != Role::Teacher {
            return Err(denied());
        }
        req.validate().map_err(validation)?;

        let now = Utc::now();
        let group = Group {
            id: Uuid::now_v7(),
            name: req.name.trim().to_string(),
            description: req.description.trim().to_string(),
            teacher_id: caller.id,
            created_at: now,
        };
        state.groups.push(group.clone());

        let mut seen = HashSet::new();
        let mut added_member_ids = Vec::new();
        let mut failed_member_ids = Vec::new();
        for &student_id in req.member_ids.iter().filter(|id| seen.insert(**id)) {
            let is_student = state
                .accounts
                .get(&student_id)
                .is_some_and(|a| a.profile.role == Role::Student);
            if is_student {
                state.members.push(MemberRow {
                    group_id: group.id,
                    student_id,
                    joined_at: now,
                });
                added_member_ids.push(student_id);
            } else {
                tracing::warn!(%student_id, "Skipping member: not a student profile");
                failed_member_ids.push(student_id);
            }
        }

        let drafts = added_member_ids
            .iter()
            .map(|&student_id| Draft {
                user_id: student_id,
                title: "Added to group".into(),
                message: format!("You were added to {}", group.name),
                kind: NotificationKind::Group,
                related_id: Some(group.id),
            })
            .collect();
        let delivered = state.deliver(drafts);
        self.publish(ChangeKind::Insert, delivered);

        Ok(CreateGroupResponse {
            group,
            added_member_ids,
            failed_member_ids,
        })
    }

    async fn get_group(&self, token: &str, id: Uuid) -> Result<GroupOverview, ClientError> {
        let state = self.state.lock().await;
        let caller = state.caller(token)?;
        let group = state.visible_group(&caller, id)?;
        Ok(state.overview(&group))
    }

    async fn join_group(&self, token: &str, id: Uuid) -> Result<Membership, ClientError> {
        let mut state = self.state.lock().await;
        let caller = state.caller(token)?;
        if caller.role != Role::Student {
            return Err(denied());
        }
        let group = state.group(id)?.clone();
        if state.is_member(group.id, caller.id) {
            return Err(ClientError::api(
                StatusCode::CONFLICT,
                "CONFLICT",
                "You are already a member of this group",
            ));
        }
        let joined_at = Utc::now();
        state.members.push(MemberRow {
            group_id: group.id,
            student_id: caller.id,
            joined_at,
        });

        let who = state.display_name(caller.id);
        let delivered = state.deliver(vec![Draft {
            user_id: group.teacher_id,
            title: "New member".into(),
            message: format!("{who} joined {}", group.name),
            kind: NotificationKind::Group,
            related_id: Some(group.id),
        }]);
        self.publish(ChangeKind::Insert, delivered);

        Ok(Membership {
            group_id: group.id,
            student_id: caller.id,
            joined_at,
            group: state.overview(&group),
        })
    }

    async fn list_members(&self, token: &str, id: Uuid) -> Result<Vec<GroupMember>, ClientError> {
        let state = self.state.lock().await;
        let caller = state.caller(token)?;
        let group = state.group(id)?;
        if caller.role != Role::Teacher || group.teacher_id != caller.id {
            return Err(denied());
        }
        let mut links: Vec<&MemberRow> = state.members.iter().filter(|m| m.group_id == id).collect();
        links.sort_by_key(|m| m.joined_at);
        Ok(links
            .into_iter()
            .map(|m| GroupMember {
                student_id: m.student_id,
                joined_at: m.joined_at,
                profile: state.summary(m.student_id),
            })
            .collect())
    }

    async fn list_group_tasks(
        &self,
        token: &str,
        group_id: Uuid,
    ) -> Result<Vec<Task>, ClientError> {
        let state = self.state.lock().await;
        let caller = state.caller(token)?;
        state.visible_group(&caller, group_id)?;
        Ok(state.group_tasks(group_id))
    }

    async fn create_task(
        &self,
        token: &str,
        group_id: Uuid,
        req: &CreateTaskRequest,
    ) -> Result<Task, ClientError> {
        let mut state = self.state.lock().await;
        let caller = state.caller(token)?;
        if caller.role != Role::Teacher {
            return Err(denied());
        }
        req.validate().map_err(validation)?;
        let group = state.group(group_id)?.clone();
        if group.teacher_id != caller.id {
            return Err(denied());
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::now_v7(),
            title: req.title.trim().to_string(),
            description: req.description.trim().to_string(),
            due_date: req.due_date,
            group_id,
            file_path: normalize_file_path(req.file_path.clone())?,
            created_at: now,
            updated_at: now,
        };
        state.tasks.push(task.clone());

        let drafts = state
            .members
            .iter()
            .filter(|m| m.group_id == group_id)
            .map(|m| Draft {
                user_id: m.student_id,
                title: "New task".into(),
                message: format!("{}: {}", group.name, task.title),
                kind: NotificationKind::Task,
                related_id: Some(task.id),
            })
            .collect();
        let delivered = state.deliver(drafts);
        self.publish(ChangeKind::Insert, delivered);

        Ok(task)
    }

    async fn list_tasks(&self, token: &str, query: &TaskQuery) -> Result<Vec<Task>, ClientError> {
        let state = self.state.lock().await;
        let caller = state.caller(token)?;
        let now = Utc::now();
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| query.group_ids.is_empty() || query.group_ids.contains(&t.group_id))
            .filter(|t| {
                state
                    .group(t.group_id)
                    .is_ok_and(|g| state.can_read_group(&caller, g))
            })
            .filter(|t| !query.upcoming || t.is_upcoming(now))
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.due_date);
        Ok(tasks)
    }

    async fn get_task(&self, token: &str, id: Uuid) -> Result<TaskDetail, ClientError> {
        let state = self.state.lock().await;
        let caller = state.caller(token)?;
        let (task, group) = state.visible_task(&caller, id)?;
        Ok(TaskDetail {
            task,
            group: common::api::GroupSummary {
                id: group.id,
                name: group.name,
                teacher_id: group.teacher_id,
            },
        })
    }

    async fn update_task(
        &self,
        token: &str,
        id: Uuid,
        req: &UpdateTaskRequest,
    ) -> Result<Task, ClientError> {
        req.validate().map_err(validation)?;
        let mut state = self.state.lock().await;
        let caller = state.caller(token)?;
        let (_, group) = state.visible_task(&caller, id)?;
        if caller.role != Role::Teacher || group.teacher_id != caller.id {
            return Err(denied());
        }
        let file_path = match &req.file_path {
            Some(_) => Some(normalize_file_path(req.file_path.clone())?),
            None => None,
        };
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found("Task"))?;
        if let Some(title) = &req.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = &req.description {
            task.description = description.trim().to_string();
        }
        if let Some(due_date) = req.due_date {
            task.due_date = due_date;
        }
        if let Some(file_path) = file_path {
            task.file_path = file_path;
        }
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn submit(
        &self,
        token: &str,
        task_id: Uuid,
        req: &SubmitRequest,
    ) -> Result<Submission, ClientError> {
        let mut state = self.state.lock().await;
        let caller = state.caller(token)?;
        if caller.role != Role::Student {
            return Err(denied());
        }
        req.validate().map_err(validation)?;
        let (task, group) = state.visible_task(&caller, task_id)?;
        let file_path = normalize_file_path(req.file_path.clone())?;

        let now = Utc::now();
        let existing = state
            .submissions
            .iter()
            .position(|s| s.task_id == task_id && s.student_id == caller.id);
        let stored = match existing {
            Some(index) => {
                let existing = &mut state.submissions[index];
                existing.content = req.content.clone();
                existing.file_path = file_path;
                existing.status = SubmissionStatus::Pending;
                existing.rating = None;
                existing.feedback = None;
                existing.submitted_at = now;
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let row = Submission {
                    id: Uuid::now_v7(),
                    task_id,
                    student_id: caller.id,
                    content: req.content.clone(),
                    file_path,
                    status: SubmissionStatus::Pending,
                    rating: None,
                    feedback: None,
                    submitted_at: now,
                    updated_at: now,
                };
                state.submissions.push(row.clone());
                row
            }
        };

        let who = state.display_name(caller.id);
        let delivered = state.deliver(vec![Draft {
            user_id: group.teacher_id,
            title: "New submission".into(),
            message: format!("{who} submitted {}", task.title),
            kind: NotificationKind::Submission,
            related_id: Some(stored.id),
        }]);
        self.publish(ChangeKind::Insert, delivered);

        Ok(stored)
    }

    async fn my_submission(
        &self,
        token: &str,
        task_id: Uuid,
    ) -> Result<Option<Submission>, ClientError> {
        let state = self.state.lock().await;
        let caller = state.caller(token)?;
        state.visible_task(&caller, task_id)?;
        Ok(state
            .submissions
            .iter()
            .find(|s| s.task_id == task_id && s.student_id == caller.id)
            .cloned())
    }

    async fn list_task_submissions(
        &self,
        token: &str,
        task_id: Uuid,
    ) -> Result<Vec<SubmissionView>, ClientError> {
        let state = self.state.lock().await;
        let caller = state.caller(token)?;
        let (_, group) = state.visible_task(&caller, task_id)?;
        if caller.role != Role::Teacher || group.teacher_id != caller.id {
            return Err(denied());
        }
        Ok(state.views(state.submissions.iter().filter(|s| s.task_id == task_id)))
    }

    async fn list_submissions(
        &self,
        token: &str,
        query: &SubmissionQuery,
    ) -> Result<Vec<SubmissionView>, ClientError> {
        let state = self.state.lock().await;
        let caller = state.caller(token)?;

        let task_ids: Option<HashSet<Uuid>> = match caller.role {
            Role::Student => {
                if query.student_id.is_some_and(|id| id != caller.id) {
                    return Err(denied());
                }
                None
            }
            Role::Teacher => Some(
                state
                    .tasks
                    .iter()
                    .filter(|t| {
                        state
                            .group(t.group_id)
                            .is_ok_and(|g| g.teacher_id == caller.id)
                    })
                    .map(|t| t.id)
                    .collect(),
            ),
        };

        let rows = state.submissions.iter().filter(|s| {
            let in_scope = match &task_ids {
                None => s.student_id == caller.id,
                Some(ids) => {
                    ids.contains(&s.task_id) && query.student_id.is_none_or(|id| id == s.student_id)
                }
            };
            in_scope
                && query.task_id.is_none_or(|id| id == s.task_id)
                && (!query.rated_only || s.is_rated())
        });
        Ok(state.views(rows))
    }

    async fn rate_submission(
        &self,
        token: &str,
        id: Uuid,
        req: &RateRequest,
    ) -> Result<Submission, ClientError> {
        let mut state = self.state.lock().await;
        let caller = state.caller(token)?;
        if caller.role != Role::Teacher {
            return Err(denied());
        }
        req.validate().map_err(validation)?;

        let task_id = state
            .submissions
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.task_id)
            .ok_or_else(|| not_found("Submission"))?;
        let task = state.task(task_id)?.clone();
        if state.group(task.group_id)?.teacher_id != caller.id {
            return Err(not_found("Submission"));
        }

        let submission = state
            .submissions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("Submission"))?;
        submission.rating = Some(req.rating);
        submission.feedback = Some(req.feedback.trim().to_string());
        submission.status = SubmissionStatus::Completed;
        submission.updated_at = Utc::now();
        let rated = submission.clone();

        let delivered = state.deliver(vec![Draft {
            user_id: rated.student_id,
            title: "Submission rated".into(),
            message: format!("{}: {}/5", task.title, req.rating),
            kind: NotificationKind::Feedback,
            related_id: Some(rated.id),
        }]);
        self.publish(ChangeKind::Insert, delivered);

        Ok(rated)
    }

    async fn list_notifications(
        &self,
        token: &str,
        limit: Option<u64>,
    ) -> Result<Vec<Notification>, ClientError> {
        let state = self.state.lock().await;
        let caller = state.caller(token)?;
        let mut rows: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| n.user_id == caller.id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = limit {
            rows.truncate(limit.clamp(1, MAX_PAGE) as usize);
        }
        Ok(rows)
    }

    async fn unread_count(&self, token: &str) -> Result<u64, ClientError> {
        let state = self.state.lock().await;
        let caller = state.caller(token)?;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.user_id == caller.id && !n.is_read)
            .count() as u64)
    }

    async fn mark_read(&self, token: &str, id: Uuid) -> Result<Notification, ClientError> {
        let mut state = self.state.lock().await;
        let caller = state.caller(token)?;
        let row = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == caller.id)
            .ok_or_else(|| not_found("Notification"))?;
        if row.is_read {
            return Ok(row.clone());
        }
        row.is_read = true;
        let updated = row.clone();
        self.publish(ChangeKind::Update, vec![updated.clone()]);
        Ok(updated)
    }

    async fn mark_all_read(&self, token: &str) -> Result<u64, ClientError> {
        let mut state = self.state.lock().await;
        let caller = state.caller(token)?;
        let mut changed = Vec::new();
        for row in state
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == caller.id && !n.is_read)
        {
            row.is_read = true;
            changed.push(row.clone());
        }
        let updated = changed.len() as u64;
        self.publish(ChangeKind::Update, changed);
        Ok(updated)
    }

    async fn upload(
        &self,
        token: &str,
        bucket: Bucket,
        path: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredObject, ClientError> {
        let mut state = self.state.lock().await;
        let caller = state.caller(token)?;
        let key = ObjectKey::new(bucket, path).map_err(storage_error)?;

        let own_prefix = format!("{}/", caller.id);
        let in_own_folder = |folder: &str| {
            key.path()
                .strip_prefix(folder)
                .is_some_and(|rest| rest.starts_with(&own_prefix))
        };
        let allowed = match bucket {
            Bucket::ProfileImages => key.path().starts_with(&own_prefix),
            Bucket::SubmissionFiles => caller.role == Role::Student && in_own_folder("submissions/"),
            Bucket::TaskFiles => caller.role == Role::Teacher && in_own_folder("tasks/"),
        };
        if !allowed {
            return Err(denied());
        }
        if data.is_empty() {
            return Err(validation(ValidationError::new("File is empty")));
        }
        if data.len() as u64 > self.max_object_size {
            return Err(storage_error(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_object_size,
            }));
        }
        if state
            .object_owners
            .get(&key)
            .is_some_and(|owner| *owner != caller.id)
        {
            return Err(denied());
        }

        let meta = self.objects.put(&key, &data).await.map_err(storage_error)?;
        state.object_owners.insert(key.clone(), caller.id);

        Ok(StoredObject {
            bucket,
            path: key.path().to_string(),
            size: meta.size,
            public_url: self.public_url(bucket, key.path()),
        })
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        StoredObject::public_url_for(BASE_URL, bucket, path)
    }

    async fn subscribe_notifications(
        &self,
        token: &str,
    ) -> Result<NotificationStream, ClientError> {
        let caller = self.state.lock().await.caller(token)?;
        let user_id = caller.id;
        let stream = BroadcastStream::new(self.changes.subscribe()).filter_map(move |item| {
            match item {
                Ok(change) if change.record.user_id == user_id => Some(Ok(change)),
                _ => None,
            }
        });
        Ok(Box::pin(stream))
    }
}
