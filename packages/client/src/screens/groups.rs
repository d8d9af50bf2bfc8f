use common::api::{CreateGroupRequest, CreateGroupResponse, GroupOverview};
use uuid::Uuid;

use super::failure;
use crate::context::AppContext;
use crate::error::{Alert, ClientError};
use crate::viewer::Viewer;

/// Fields of the create-group modal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateGroupForm {
    pub name: String,
    pub description: String,
    /// Students to add once the group exists.
    pub member_ids: Vec<Uuid>,
}

impl CreateGroupForm {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.name.trim().is_empty() {
            return Err(ClientError::Validation("Group name is required.".into()));
        }
        Ok(())
    }
}

/// Create a group, then its member rows. Member failures are reported, never rolled back.
pub(crate) async fn create_group(
    ctx: &AppContext,
    form: &CreateGroupForm,
) -> Result<CreateGroupResponse, ClientError> {
    form.validate()?;
    let token = ctx.token().await?;
    let req = CreateGroupRequest {
        name: form.name.trim().to_string(),
        description: form.description.trim().to_string(),
        member_ids: form.member_ids.clone(),
    };
    let created = ctx.backend.create_group(&token, &req).await?;
    if !created.failed_member_ids.is_empty() {
        tracing::warn!(
            group_id = %created.group.id,
            failed = ?created.failed_member_ids,
            "Some members could not be added"
        );
    }
    Ok(created)
}

/// Groups tab: the viewer's groups, plus create (teacher) and join (student).
#[derive(Debug, Default)]
pub struct GroupsScreen {
    pub groups: Vec<GroupOverview>,
    pub loading: bool,
    pub create_open: bool,
    pub join_open: bool,
    pub submitting: bool,
    pub alert: Option<Alert>,
}

impl GroupsScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, ctx: &AppContext) {
        self.loading = true;
        let result = async {
            let viewer = ctx.viewer().await?;
            let token = ctx.token().await?;
            ctx.backend.groups(&token, viewer.group_query()).await
        }
        .await;
        match result {
            Ok(groups) => self.groups = groups,
            Err(e) => self.alert = Some(failure("Error", &e, "Failed to load groups")),
        }
        self.loading = false;
    }

    pub fn open_create(&mut self) {
        self.create_open = true;
    }

    pub fn open_join(&mut self) {
        self.join_open = true;
    }

    pub fn close_modals(&mut self) {
        self.create_open = false;
        self.join_open = false;
    }

    pub async fn create(&mut self, ctx: &AppContext, form: &CreateGroupForm) -> bool {
        if let Err(e) = form.validate() {
            self.alert = Some(Alert::from_error("Validation", &e, ""));
            return false;
        }
        self.submitting = true;
        let result = create_group(ctx, form).await;
        self.submitting = false;
        match result {
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

    /// Join by a pasted group ID.
    pub async fn join(&mut self, ctx: &AppContext, group_id: &str) -> bool {
        const TITLE: &str = "Joining Group";
        let Ok(group_id) = group_id.trim().parse::<Uuid>() else {
            self.alert = Some(Alert::new(TITLE, "Please enter a valid group ID"));
            return false;
        };

        self.submitting = true;
        let result = async {
            let token = ctx.token().await?;
            ctx.backend.join_group(&token, group_id).await
        }
        .await;
        self.submitting = false;

        match result {
            Ok(_) => {
                self.join_open = false;
                self.load(ctx).await;
                true
            }
            Err(e) if e.is_conflict() => {
                self.alert = Some(Alert::new(TITLE, e.to_string()));
                false
            }
            Err(e) => {
                self.alert = Some(failure(TITLE, &e, "Something went wrong. Please try again."));
                false
            }
        }
    }

    /// Text copied to the clipboard when a teacher shares a group.
    pub fn share_text(group: &GroupOverview) -> String {
        group.id.to_string()
    }

    /// Whether the create action is offered at all.
    pub fn can_create(viewer: &Viewer) -> bool {
        viewer.is_teacher()
    }
}
