use std::sync::Arc;

use common::storage::ObjectStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::realtime::RealtimeHub;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub objects: Arc<dyn ObjectStore>,
    pub realtime: RealtimeHub,
}
