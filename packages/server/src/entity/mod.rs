pub mod group;
pub mod group_member;
pub mod notification;
pub mod profile;
pub mod storage_object;
pub mod submission;
pub mod task;
