mod v1;

use axum::Router;

use crate::config::AppConfig;
use crate::state::AppState;

pub use v1::V1Api;

pub fn api_routes(config: &AppConfig) -> Router<AppState> {
    Router::new().nest("/v1", v1::routes(config))
}
