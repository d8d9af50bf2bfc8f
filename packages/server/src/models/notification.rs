use common::api::Notification;
use serde::Deserialize;

use crate::entity::notification;

/// Hard cap on an explicitly requested page.
pub const MAX_PAGE: u64 = 200;

impl From<notification::Model> for Notification {
    fn from(model: notification::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            message: model.message,
            kind: model.kind,
            related_id: model.related_id,
            is_read: model.is_read,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationListQuery {
    /// Newest N rows (1-200). Every row when absent.
    #[param(example = 5)]
    pub limit: Option<u64>,
}

impl NotificationListQuery {
    pub fn effective_limit(&self) -> Option<u64> {
        self.limit.map(|n| n.clamp(1, MAX_PAGE))
    }
}
