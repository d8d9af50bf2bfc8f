//! Application core of the classroom client.
//!
//! Everything a screen needs short of rendering: the session store, the
//! role-tagged [`Viewer`], per-screen loaders and mutation handlers, file
//! attachments and the notification badge. All backend access goes through
//! the [`Backend`] trait.

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod screens;
pub mod session;
pub mod upload;
pub mod viewer;

pub use backend::{Backend, GroupQuery, SubmissionQuery, TaskQuery};
pub use config::ClientConfig;
pub use context::AppContext;
pub use error::{Alert, ClientError};
pub use session::{AuthEvent, Session, SessionStore};
pub use viewer::Viewer;
