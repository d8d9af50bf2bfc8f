use std::path::Path;

use chrono::Utc;
use common::api::{Submission, SubmissionView, SubmitRequest, TaskDetail};
use common::storage::Bucket;
use uuid::Uuid;

use super::failure;
use crate::context::AppContext;
use crate::error::{Alert, ClientError};
use crate::upload::{self, Attachment};
use crate::viewer::Viewer;

/// Task detail: the task, the student's own answer and, for the owning
/// teacher, every hand-in.
#[derive(Debug)]
pub struct TaskScreen {
    pub task_id: Uuid,
    pub detail: Option<TaskDetail>,
    pub submission: Option<Submission>,
    pub submissions: Vec<SubmissionView>,
    /// Answer text being edited.
    pub response: String,
    pub attachment: Option<Attachment>,
    pub loading: bool,
    pub submitting: bool,
    pub alert: Option<Alert>,
}

impl TaskScreen {
    pub fn new(task_id: Uuid) -> Self {
        Self {
            task_id,
            detail: None,
            submission: None,
            submissions: Vec::new(),
            response: String::new(),
            attachment: None,
            loading: false,
            submitting: false,
            alert: None,
        }
    }

    pub async fn load(&mut self, ctx: &AppContext) {
        self.loading = true;
        let detail = async {
            let token = ctx.token().await?;
            ctx.backend.get_task(&token, self.task_id).await
        }
        .await;
        match detail {
            Ok(detail) => self.detail = Some(detail),
            Err(e) => {
                self.alert = Some(failure("Error", &e, "Failed to load task details"));
                self.loading = false;
                return;
            }
        }

        let rows = async {
            let token = ctx.token().await?;
            match ctx.viewer().await? {
                Viewer::Student(_) => {
                    let mine = ctx.backend.my_submission(&token, self.task_id).await?;
                    Ok::<_, ClientError>((mine, Vec::new()))
                }
                Viewer::Teacher(_) => {
                    let all = ctx.backend.list_task_submissions(&token, self.task_id).await?;
                    Ok((None, all))
                }
            }
        }
        .await;
        match rows {
            Ok((mine, all)) => {
                if let Some(content) = mine.as_ref().and_then(|s| s.content.clone()) {
                    self.response = content;
                }
                self.submission = mine;
                self.submissions = all;
            }
            Err(e) => self.alert = Some(failure("Error", &e, "Something went wrong")),
        }
        self.loading = false;
    }

    /// Attach a file from disk, replacing any earlier pick.
    pub async fn attach(&mut self, ctx: &AppContext, path: impl AsRef<Path>) -> bool {
        match Attachment::read(path, ctx.config.max_attachment_size).await {
            Ok(attachment) => {
                self.attachment = Some(attachment);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Attachment rejected");
                self.alert = Some(e.alert());
                false
            }
        }
    }

    pub fn clear_attachment(&mut self) {
        self.attachment = None;
    }

    /// Upload the attachment if any, then upsert the answer.
    pub async fn submit(&mut self, ctx: &AppContext) -> bool {
        if self.response.trim().is_empty() && self.attachment.is_none() {
            self.alert = Some(Alert::error("Please enter a response or upload a file"));
            return false;
        }

        self.submitting = true;
        let result = async {
            let token = ctx.token().await?;
            let viewer = ctx.viewer().await?;
            let file_path = match &self.attachment {
                Some(attachment) => {
                    let path =
                        upload::submission_file_path(viewer.id(), &attachment.file_name, Utc::now());
                    let stored = upload::upload(
                        ctx.backend.as_ref(),
                        &token,
                        Bucket::SubmissionFiles,
                        &path,
                        attachment,
                    )
                    .await?;
                    Some(stored.path)
                }
                None => self.submission.as_ref().and_then(|s| s.file_path.clone()),
            };
            let content = Some(self.response.trim().to_string()).filter(|c| !c.is_empty());
            let req = SubmitRequest { content, file_path };
            ctx.backend.submit(&token, self.task_id, &req).await
        }
        .await;
        self.submitting = false;

        match result {
            Ok(submission) => {
                self.submission = Some(submission);
                self.attachment = None;
                self.alert = Some(Alert::success("Your answer has been submitted"));
                self.load(ctx).await;
                true
            }
            Err(e) => {
                self.alert = Some(failure("Error", &e, "Failed to submit your answer"));
                false
            }
        }
    }

    /// Public URL of the task's attached file.
    pub fn task_file_url(&mut self, ctx: &AppContext) -> Option<String> {
        let path = self
            .detail
            .as_ref()
            .and_then(|d| d.task.file_path.clone());
        match path {
            Some(path) => Some(ctx.backend.public_url(Bucket::TaskFiles, &path)),
            None => {
                self.alert = Some(Alert::error("File not available"));
                None
            }
        }
    }

    /// Public URL of the file handed in with the student's answer.
    pub fn submission_file_url(&mut self, ctx: &AppContext) -> Option<String> {
        let path = self.submission.as_ref().and_then(|s| s.file_path.clone());
        match path {
            Some(path) => Some(ctx.backend.public_url(Bucket::SubmissionFiles, &path)),
            None => {
                self.alert = Some(Alert::error("File not available"));
                None
            }
        }
    }

    /// Whether the task is still open for answers.
    pub fn is_upcoming(&self) -> bool {
        self.detail
            .as_ref()
            .is_some_and(|d| d.task.is_upcoming(Utc::now()))
    }
}
