use chrono::{DateTime, Utc};
use common::api::{
    CreateTaskRequest, GroupMember, GroupOverview, SubmitRequest, Task, UpdateTaskRequest,
};
use common::storage::Bucket;
use uuid::Uuid;

use super::failure;
use crate::context::AppContext;
use crate::error::{Alert, ClientError};
use crate::upload::{self, Attachment};

/// Fields of the create/edit task modal.
#[derive(Clone, Debug, Default)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub attachment: Option<Attachment>,
}

impl TaskForm {
    /// Prefill the modal from an existing task.
    pub fn edit(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: Some(task.due_date),
            attachment: None,
        }
    }

    fn validate(&self) -> Result<DateTime<Utc>, ClientError> {
        if self.title.trim().is_empty() {
            return Err(ClientError::Validation("Task title is required".into()));
        }
        self.due_date
            .ok_or_else(|| ClientError::Validation("Please select a valid due date".into()))
    }
}

/// One group: its tasks for everyone, its members for the owner.
#[derive(Debug)]
pub struct GroupDetailScreen {
    pub group_id: Uuid,
    pub group: Option<GroupOverview>,
    pub tasks: Vec<Task>,
    pub members: Vec<GroupMember>,
    pub loading: bool,
    /// `Some(None)` while creating, `Some(Some(id))` while editing.
    pub task_modal: Option<Option<Uuid>>,
    pub submitting: bool,
    pub alert: Option<Alert>,
}

impl GroupDetailScreen {
    pub fn new(group_id: Uuid) -> Self {
        Self {
            group_id,
            group: None,
            tasks: Vec::new(),
            members: Vec::new(),
            loading: false,
            task_modal: None,
            submitting: false,
            alert: None,
        }
    }

    pub async fn load(&mut self, ctx: &AppContext) {
        self.loading = true;
        let result = async {
            let token = ctx.token().await?;
            let group = ctx.backend.get_group(&token, self.group_id).await?;
            let tasks = ctx.backend.list_group_tasks(&token, self.group_id).await?;
            let viewer = ctx.viewer().await?;
            let members = if group.teacher_id == viewer.id() {
                ctx.backend.list_members(&token, self.group_id).await?
            } else {
                Vec::new()
            };
            Ok::<_, ClientError>((group, tasks, members))
        }
        .await;
        match result {
            Ok((group, tasks, members)) => {
                self.group = Some(group);
                self.tasks = tasks;
                self.members = members;
            }
            Err(e) => tracing::error!(group_id = %self.group_id, error = %e, "Failed to load group"),
        }
        self.loading = false;
    }

    pub fn open_create_task(&mut self) {
        self.task_modal = Some(None);
    }

    pub fn open_edit_task(&mut self, task_id: Uuid) {
        self.task_modal = Some(Some(task_id));
    }

    /// Upload the task file if one is attached. Failure only drops the attachment.
    async fn upload_task_file(&mut self, ctx: &AppContext, attachment: &Attachment) -> Option<String> {
        let result = async {
            let token = ctx.token().await?;
            let viewer = ctx.viewer().await?;
            let path = upload::task_file_path(viewer.id(), attachment.extension().as_deref(), Utc::now());
            upload::upload(ctx.backend.as_ref(), &token, Bucket::TaskFiles, &path, attachment).await
        }
        .await;
        match result {
            Ok(stored) => Some(stored.path),
            Err(e) => {
                tracing::error!(error = %e, "Task file upload failed");
                self.alert = Some(Alert::new(
                    "File Upload Failed",
                    "The task will be created without the file attachment. You can try adding the file later.",
                ));
                None
            }
        }
    }

    /// Create or update a task, depending on which modal is open.
    pub async fn save_task(&mut self, ctx: &AppContext, form: &TaskForm) -> bool {
        let due_date = match form.validate() {
            Ok(due) => due,
            Err(e) => {
                self.alert = Some(Alert::from_error("Error", &e, ""));
                return false;
            }
        };
        let editing = self.task_modal.flatten();

        self.submitting = true;
        let file_path = match &form.attachment {
            Some(attachment) => self.upload_task_file(ctx, attachment).await,
            None => None,
        };

        let result = async {
            let token = ctx.token().await?;
            match editing {
                Some(task_id) => {
                    let req = UpdateTaskRequest {
                        title: Some(form.title.trim().to_string()),
                        description: Some(form.description.trim().to_string()),
                        due_date: Some(due_date),
                        file_path: file_path.clone(),
                    };
                    ctx.backend.update_task(&token, task_id, &req).await
                }
                None => {
                    let req = CreateTaskRequest {
                        title: form.title.trim().to_string(),
                        description: form.description.trim().to_string(),
                        due_date,
                        file_path: file_path.clone(),
                    };
                    ctx.backend.create_task(&token, self.group_id, &req).await
                }
            }
        }
        .await;
        self.submitting = false;

        let verb = if editing.is_some() { "update" } else { "create" };
        match result {
            Ok(_) => {
                let done = if editing.is_some() {
                    "Task updated successfully"
                } else {
                    "Task created successfully"
                };
                if self.alert.is_none() {
                    self.alert = Some(Alert::success(done));
                }
                self.task_modal = None;
                self.load(ctx).await;
                true
            }
            Err(e) => {
                self.alert = Some(failure("Error", &e, &format!("Failed to {verb} task")));
                false
            }
        }
    }

    /// Hand in a text answer straight from the task list.
    pub async fn submit_text(&mut self, ctx: &AppContext, task_id: Uuid, content: &str) -> bool {
        let req = SubmitRequest {
            content: Some(content.to_string()),
            file_path: None,
        };
        if let Err(e) = req.validate() {
            self.alert = Some(Alert::error(e.0));
            return false;
        }
        let result = async {
            let token = ctx.token().await?;
            ctx.backend.submit(&token, task_id, &req).await
        }
        .await;
        match result {
            Ok(_) => {
                self.alert = Some(Alert::success("Text submission successful!"));
                true
            }
            Err(e) => {
                tracing::error!(%task_id, error = %e, "Text submission failed");
                self.alert = Some(Alert::error(format!("Text submission failed: {e}")));
                false
            }
        }
    }

    /// Upload a file and hand it in as the answer.
    pub async fn submit_file(&mut self, ctx: &AppContext, task_id: Uuid, attachment: &Attachment) -> bool {
        let uploaded = async {
            let token = ctx.token().await?;
            let viewer = ctx.viewer().await?;
            let path = upload::submission_file_path(viewer.id(), &attachment.file_name, Utc::now());
            let stored =
                upload::upload(ctx.backend.as_ref(), &token, Bucket::SubmissionFiles, &path, attachment)
                    .await?;
            Ok::<_, ClientError>((token, stored))
        }
        .await;
        let (token, stored) = match uploaded {
            Ok(ok) => ok,
            Err(e) => {
                tracing::error!(%task_id, error = %e, "Submission upload failed");
                self.alert = Some(Alert::new("Upload Failed", e.to_string()));
                return false;
            }
        };

        let req = SubmitRequest {
            content: None,
            file_path: Some(stored.path),
        };
        match ctx.backend.submit(&token, task_id, &req).await {
            Ok(_) => {
                self.alert = Some(Alert::success("File uploaded successfully!"));
                true
            }
            Err(e) => {
                self.alert = Some(failure("Error", &e, "An unexpected error occurred"));
                false
            }
        }
    }
}
