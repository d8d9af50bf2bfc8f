//! Per-screen view state.
//!
//! A screen owns its rows, a loading flag, modal flags and the last alert.
//! Loaders replace state wholesale; mutations write once and then reload.

pub mod calendar;
pub mod group_detail;
pub mod groups;
pub mod home;
pub mod notifications;
pub mod profile;
pub mod submissions;
pub mod task;

pub use calendar::{CalendarScreen, DayMark};
pub use group_detail::{GroupDetailScreen, TaskForm};
pub use groups::{CreateGroupForm, GroupsScreen};
pub use home::HomeScreen;
pub use notifications::{NotificationCenter, NotificationIcon, NotificationsScreen, Route, badge_text};
pub use profile::ProfileScreen;
pub use submissions::{RateForm, SubmissionsScreen};
pub use task::TaskScreen;

use crate::error::{Alert, ClientError};

/// Log a failed call and turn it into the alert a screen shows.
pub(crate) fn failure(title: &str, err: &ClientError, fallback: &str) -> Alert {
    tracing::error!(error = %err, "{title}");
    Alert::from_error(title, err, fallback)
}
