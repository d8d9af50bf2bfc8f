use common::api::{GroupOverview, SubmissionView};
use uuid::Uuid;

use super::failure;
use super::groups::{CreateGroupForm, create_group};
use super::submissions::{RateForm, rate};
use crate::context::AppContext;
use crate::error::Alert;

/// Home tab: the viewer's groups and the submissions worth looking at.
///
/// Teachers see every hand-in for their tasks and can rate them; students
/// see their rated work.
#[derive(Debug, Default)]
pub struct HomeScreen {
    pub groups: Vec<GroupOverview>,
    pub submissions: Vec<SubmissionView>,
    pub loading: bool,
    pub create_open: bool,
    /// Submission the rate modal is open for.
    pub rating: Option<Uuid>,
    pub alert: Option<Alert>,
}

impl HomeScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, ctx: &AppContext) {
        self.loading = true;
        self.load_groups(ctx).await;
        self.load_submissions(ctx).await;
        self.loading = false;
    }

    async fn load_groups(&mut self, ctx: &AppContext) {
        let result = async {
            let viewer = ctx.viewer().await?;
            let token = ctx.token().await?;
            ctx.backend.groups(&token, viewer.group_query()).await
        }
        .await;
        match result {
            Ok(groups) => self.groups = groups,
            Err(e) => self.alert = Some(failure("Fetch groups", &e, "Something went wrong.")),
        }
    }

    async fn load_submissions(&mut self, ctx: &AppContext) {
        let result = async {
            let viewer = ctx.viewer().await?;
            let token = ctx.token().await?;
            ctx.backend
                .list_submissions(&token, &viewer.home_submissions_query())
                .await
        }
        .await;
        match result {
            Ok(rows) => self.submissions = rows,
            Err(e) => tracing::error!(error = %e, "Failed to load submissions"),
        }
    }

    /// Create a group together with its initial members.
    pub async fn create_group(&mut self, ctx: &AppContext, form: &CreateGroupForm) -> bool {
        match create_group(ctx, form).await {
            Ok(_) => {
                self.create_open = false;
                self.load(ctx).await;
                true
            }
            Err(e) => {
                self.alert = Some(failure("Creating error", &e, "Something went wrong."));
                false
            }
        }
    }

    pub fn open_rating(&mut self, submission_id: Uuid) {
        self.rating = Some(submission_id);
    }

    pub async fn rate(&mut self, ctx: &AppContext, form: &RateForm) -> bool {
        let Some(submission_id) = self.rating else {
            self.alert = Some(Alert::new("Not found", "Id is required"));
            return false;
        };
        match rate(ctx, submission_id, form).await {
            Ok(_) => {
                self.rating = None;
                self.load_submissions(ctx).await;
                true
            }
            Err(alert) => {
                self.alert = Some(alert);
                false
            }
        }
    }
}
