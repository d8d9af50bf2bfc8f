pub mod auth;
pub mod group;
pub mod notification;
pub mod profile;
pub mod realtime;
pub mod storage;
pub mod submission;
pub mod task;
