use common::api::{RateRequest, Submission, SubmissionView};
use uuid::Uuid;

use super::failure;
use crate::context::AppContext;
use crate::error::{Alert, ClientError};

/// Fields of the rate modal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RateForm {
    /// 1-5 stars; 0 means nothing picked yet.
    pub rating: i16,
    pub feedback: String,
}

/// Store a rating. Errors come back as the alert to show.
pub(crate) async fn rate(
    ctx: &AppContext,
    submission_id: Uuid,
    form: &RateForm,
) -> Result<Submission, Alert> {
    const TITLE: &str = "Rate";
    let req = RateRequest {
        rating: form.rating,
        feedback: form.feedback.trim().to_string(),
    };
    if let Err(e) = req.validate() {
        return Err(Alert::new(TITLE, e.0));
    }

    let result = async {
        let token = ctx.token().await?;
        ctx.backend.rate_submission(&token, submission_id, &req).await
    }
    .await;
    result.map_err(|e| match e {
        ClientError::Api { .. } => failure(
            TITLE,
            &e,
            "Something went wrong while updating the submission.",
        ),
        _ => failure(TITLE, &e, "Something went wrong."),
    })
}

/// Submissions tab, newest hand-in first.
#[derive(Debug, Default)]
pub struct SubmissionsScreen {
    pub rows: Vec<SubmissionView>,
    pub loading: bool,
    pub rating: Option<Uuid>,
    pub alert: Option<Alert>,
}

impl SubmissionsScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, ctx: &AppContext) {
        self.loading = true;
        let result = async {
            let viewer = ctx.viewer().await?;
            let token = ctx.token().await?;
            ctx.backend
                .list_submissions(&token, &viewer.submissions_query())
                .await
        }
        .await;
        match result {
            Ok(rows) => self.rows = rows,
            Err(e) => tracing::error!(error = %e, "Failed to load submissions"),
        }
        self.loading = false;
    }

    pub fn open_rating(&mut self, submission_id: Uuid) {
        self.rating = Some(submission_id);
    }

    pub fn close_rating(&mut self) {
        self.rating = None;
    }

    pub async fn rate(&mut self, ctx: &AppContext, form: &RateForm) -> bool {
        let Some(submission_id) = self.rating else {
            self.alert = Some(Alert::new("Not found", "Id is required"));
            return false;
        };
        match rate(ctx, submission_id, form).await {
            Ok(_) => {
                self.rating = None;
                self.load(ctx).await;
                true
            }
            Err(alert) => {
                self.alert = Some(alert);
                false
            }
        }
    }

    /// Rows still waiting for a review.
    pub fn pending(&self) -> impl Iterator<Item = &SubmissionView> {
        self.rows
            .iter()
            .filter(|row| !row.submission.status.is_reviewed())
    }
}
