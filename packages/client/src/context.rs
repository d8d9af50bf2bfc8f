use std::sync::Arc;

use crate::backend::{Backend, HttpBackend};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::{Session, SessionStore};
use crate::viewer::Viewer;

/// Everything a screen needs: the backend, the session and the settings.
pub struct AppContext {
    pub backend: Arc<dyn Backend>,
    pub session: SessionStore,
    pub config: ClientConfig,
}

impl AppContext {
    pub fn new(backend: Arc<dyn Backend>, config: ClientConfig) -> Self {
        Self {
            session: SessionStore::new(backend.clone()),
            backend,
            config,
        }
    }

    /// Connect to the configured backend over HTTP and resume `saved`.
    pub async fn connect(config: ClientConfig, saved: Option<Session>) -> Result<Self, ClientError> {
        let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&config.base_url)?);
        let session = SessionStore::restore(backend.clone(), saved).await;
        Ok(Self {
            backend,
            session,
            config,
        })
    }

    pub async fn token(&self) -> Result<String, ClientError> {
        self.session.token().await
    }

    pub async fn viewer(&self) -> Result<Viewer, ClientError> {
        self.session.viewer().await
    }
}
