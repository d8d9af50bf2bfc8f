use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Metadata for an object in a bucket. The bytes live in the object store.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storage_objects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub bucket: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub path: String,

    pub size: i64,
    pub content_type: Option<String>,
    /// Hex SHA-256 of the content, served as the ETag.
    pub etag: String,
    /// Profile that last wrote the object.
    pub owner_id: Uuid,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
