#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a notification refers to. Stored in the `type` column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// A task was published in one of the student's groups.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "task"))]
    Task,
    /// A student handed in work for one of the teacher's tasks.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "submission"))]
    Submission,
    /// The teacher rated a submission.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "feedback"))]
    Feedback,
    /// Group membership changed.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "group"))]
    Group,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "system"))]
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Submission => "submission",
            Self::Feedback => "feedback",
            Self::Group => "group",
            Self::System => "system",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
