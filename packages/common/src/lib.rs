pub mod api;
pub mod codec;
pub mod notification_kind;
pub mod role;
pub mod storage;
pub mod submission_status;

pub use notification_kind::NotificationKind;
pub use role::Role;
pub use submission_status::SubmissionStatus;
