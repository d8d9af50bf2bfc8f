//! The signed-in identity and its lifecycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::Role;
use common::api::{AuthSession, Profile, SignInRequest, SignUpRequest, UpdateUserRequest};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::backend::Backend;
use crate::error::ClientError;
use crate::viewer::Viewer;

/// Bearer token plus the denormalized profile it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub profile: Profile,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn viewer(&self) -> Viewer {
        Viewer::from_profile(self.profile.clone())
    }
}

impl From<AuthSession> for Session {
    fn from(auth: AuthSession) -> Self {
        Self {
            token: auth.access_token,
            expires_at: auth.expires_at,
            profile: auth.profile,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Uuid),
    SignedOut,
    /// Profile or account fields of the current user changed.
    UserUpdated(Uuid),
}

/// Holds the current session. Constructed once at startup, refreshed on
/// auth events and cleared on sign-out.
pub struct SessionStore {
    backend: Arc<dyn Backend>,
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            backend,
            current: RwLock::new(None),
            events,
        }
    }

    /// Resume a saved session if the backend still accepts its token.
    ///
    /// Expired or rejected tokens are dropped. On other failures the saved
    /// profile is kept as-is.
    pub async fn restore(backend: Arc<dyn Backend>, saved: Option<Session>) -> Self {
        let store = Self::new(backend);
        let Some(saved) = saved else {
            return store;
        };
        if saved.is_expired(Utc::now()) {
            tracing::debug!("Saved session expired");
            return store;
        }

        match store.backend.session(&saved.token).await {
            Ok(profile) => {
                *store.current.write().await = Some(Session { profile, ..saved });
            }
            Err(e) if e.is_unauthorized() => {
                tracing::debug!("Saved session rejected");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not verify saved session");
                *store.current.write().await = Some(saved);
            }
        }
        store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    async fn start(&self, auth: AuthSession) -> Profile {
        let session = Session::from(auth);
        let profile = session.profile.clone();
        *self.current.write().await = Some(session);
        self.emit(AuthEvent::SignedIn(profile.id));
        profile
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Profile, ClientError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "Please enter an email and password".into(),
            ));
        }
        let req = SignInRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let auth = self.backend.sign_in(&req).await?;
        Ok(self.start(auth).await)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        role: Option<Role>,
        username: Option<String>,
    ) -> Result<Profile, ClientError> {
        let Some(role) = role.filter(|_| !email.trim().is_empty() && !password.is_empty()) else {
            return Err(ClientError::Validation(
                "Please enter an email, password and role".into(),
            ));
        };
        let req = SignUpRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            role,
            username,
        };
        req.validate()?;
        let auth = self.backend.sign_up(&req).await?;
        Ok(self.start(auth).await)
    }

    /// Drop the session. Tokens are stateless, so nothing is sent to the backend.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        if self.current.write().await.take().is_none() {
            return Err(ClientError::NotSignedIn);
        }
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    /// Re-read the profile behind the current token.
    pub async fn refresh(&self) -> Result<Profile, ClientError> {
        let token = self.token().await?;
        match self.backend.session(&token).await {
            Ok(profile) => {
                self.set_profile(profile.clone()).await;
                Ok(profile)
            }
            Err(e) if e.is_unauthorized() => {
                *self.current.write().await = None;
                self.emit(AuthEvent::SignedOut);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update_email(&self, email: &str) -> Result<Profile, ClientError> {
        if email.trim().is_empty() {
            return Err(ClientError::Validation("Email is required".into()));
        }
        let req = UpdateUserRequest {
            email: email.trim().to_string(),
        };
        req.validate()?;
        let token = self.token().await?;
        let profile = self.backend.update_user(&token, &req).await?;
        self.set_profile(profile.clone()).await;
        Ok(profile)
    }

    /// Replace the stored profile after a successful profile write.
    pub async fn set_profile(&self, profile: Profile) {
        let mut current = self.current.write().await;
        if let Some(session) = current.as_mut() {
            let id = profile.id;
            session.profile = profile;
            drop(current);
            self.emit(AuthEvent::UserUpdated(id));
        }
    }

    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.current.read().await.as_ref().map(|s| s.profile.clone())
    }

    pub async fn token(&self) -> Result<String, ClientError> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|s| s.token.clone())
            .ok_or(ClientError::NotSignedIn)
    }

    pub async fn viewer(&self) -> Result<Viewer, ClientError> {
        self.current
            .read()
            .await
            .as_ref()
            .map(Session::viewer)
            .ok_or(ClientError::NotSignedIn)
    }
}
