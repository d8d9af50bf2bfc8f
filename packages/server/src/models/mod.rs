//! Conversions from entity rows to wire types, plus query-string parameters.
//!
//! Request and response bodies themselves live in `common::api` so the
//! client decodes exactly what the handlers encode.

pub mod group;
pub mod notification;
pub mod profile;
pub mod submission;
pub mod task;
