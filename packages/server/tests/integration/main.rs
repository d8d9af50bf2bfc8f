mod common;

mod auth;
mod group;
mod storage;
mod submission;
