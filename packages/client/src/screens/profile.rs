use std::path::Path;

use chrono::Utc;
use common::api::{Profile, UpdateProfileRequest};
use common::storage::Bucket;

use super::failure;
use crate::context::AppContext;
use crate::error::Alert;
use crate::upload::{self, Attachment};

/// Profile tab: show and edit the signed-in profile, change the avatar, sign out.
#[derive(Debug, Default)]
pub struct ProfileScreen {
    pub profile: Option<Profile>,
    pub edit_open: bool,
    pub submitting: bool,
    pub alert: Option<Alert>,
}

impl ProfileScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, ctx: &AppContext) {
        let result = async {
            let token = ctx.token().await?;
            let viewer = ctx.viewer().await?;
            ctx.backend.get_profile(&token, viewer.id()).await
        }
        .await;
        match result {
            Ok(profile) => self.profile = Some(profile),
            Err(e) => tracing::error!(error = %e, "Failed to load profile"),
        }
    }

    /// Save the edit modal. The email goes through the auth user update,
    /// the username through the profile row.
    pub async fn save(&mut self, ctx: &AppContext, email: &str, username: &str) -> bool {
        if email.trim().is_empty() {
            self.alert = Some(Alert::error("Email is required"));
            return false;
        }

        self.submitting = true;
        let current_email = self.profile.as_ref().map(|p| p.email.clone());
        if current_email.as_deref() != Some(email.trim()) {
            if let Err(e) = ctx.session.update_email(email).await {
                self.submitting = false;
                tracing::error!(error = %e, "Email update failed");
                self.alert = Some(Alert::error(e.to_string()));
                return false;
            }
        }

        let result = async {
            let req = UpdateProfileRequest {
                username: Some(username.trim().to_string()).filter(|u| !u.is_empty()),
                image_url: None,
            };
            req.validate()?;
            let token = ctx.token().await?;
            ctx.backend.update_profile(&token, &req).await
        }
        .await;
        self.submitting = false;

        match result {
            Ok(profile) => {
                ctx.session.set_profile(profile.clone()).await;
                self.profile = Some(profile);
                self.edit_open = false;
                self.alert = Some(Alert::success("Profile updated successfully"));
                true
            }
            Err(e) => {
                self.alert = Some(failure("Error", &e, "Failed to update profile"));
                false
            }
        }
    }

    /// Upload a new avatar and point the profile at its public URL.
    pub async fn change_picture(&mut self, ctx: &AppContext, path: impl AsRef<Path>) -> bool {
        let attachment = match Attachment::read(path, ctx.config.max_attachment_size).await {
            Ok(attachment) => attachment,
            Err(e) => {
                tracing::warn!(error = %e, "Image rejected");
                self.alert = Some(Alert::error("Failed to select image"));
                return false;
            }
        };

        self.submitting = true;
        let result = async {
            let token = ctx.token().await?;
            let viewer = ctx.viewer().await?;
            let object_path =
                upload::profile_image_path(viewer.id(), attachment.extension().as_deref(), Utc::now());
            let stored = upload::upload(
                ctx.backend.as_ref(),
                &token,
                Bucket::ProfileImages,
                &object_path,
                &attachment,
            )
            .await?;
            let req = UpdateProfileRequest {
                username: None,
                image_url: Some(stored.public_url),
            };
            ctx.backend.update_profile(&token, &req).await
        }
        .await;
        self.submitting = false;

        match result {
            Ok(profile) => {
                ctx.session.set_profile(profile.clone()).await;
                self.profile = Some(profile);
                self.alert = Some(Alert::success("Profile picture updated successfully"));
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Error uploading image");
                self.alert = Some(Alert::error(format!(
                    "Failed to upload profile picture: {e}"
                )));
                false
            }
        }
    }

    pub async fn sign_out(&mut self, ctx: &AppContext) -> bool {
        match ctx.session.sign_out().await {
            Ok(()) => {
                self.profile = None;
                true
            }
            Err(e) => {
                self.alert = Some(failure("Error", &e, "Failed to sign out"));
                false
            }
        }
    }
}

