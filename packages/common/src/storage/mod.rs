//! Bucket/path object storage.
//!
//! Objects are addressed by a [`Bucket`] and a validated relative path.
//! Writes are upserts: putting the same key twice replaces the content.

mod bucket;
mod error;
mod key;
mod traits;

pub mod filesystem;
pub mod memory;

pub use bucket::Bucket;
pub use error::StorageError;
pub use key::{ObjectKey, sanitize_file_name, validate_object_path};
pub use traits::{BoxReader, ObjectMeta, ObjectStore};
