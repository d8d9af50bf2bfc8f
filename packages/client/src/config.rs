use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Backend origin, e.g. `http://127.0.0.1:3000`.
    pub base_url: String,
    /// Subscribe to the realtime notification feed where a screen supports it.
    pub realtime_notifications: bool,
    /// Rows shown by the compact notification center.
    pub notification_center_limit: u64,
    /// Largest attachment accepted before upload, in bytes.
    pub max_attachment_size: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".into(),
            realtime_notifications: false,
            notification_center_limit: 5,
            max_attachment_size: 10 * 1024 * 1024,
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let s = Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("realtime_notifications", defaults.realtime_notifications)?
            .set_default("notification_center_limit", defaults.notification_center_limit)?
            .set_default("max_attachment_size", defaults.max_attachment_size)?
            // Load from config/client.toml
            .add_source(File::with_name("config/client").required(false))
            // Override from environment (e.g., CLASSROOM_CLIENT__BASE_URL)
            .add_source(Environment::with_prefix("CLASSROOM_CLIENT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
