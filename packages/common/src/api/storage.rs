use serde::{Deserialize, Serialize};

use crate::storage::Bucket;

/// Result of an upload: where the object lives and how to fetch it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StoredObject {
    pub bucket: Bucket,
    #[schema(example = "submissions/0190c6a4-7d3e-7b3c-9d7e-2a4f1c0b5e61/1718000000000-essay.pdf")]
    pub path: String,
    pub size: u64,
    pub public_url: String,
}

impl StoredObject {
    /// Public download URL for `bucket/path` under the given base URL.
    pub fn public_url_for(base_url: &str, bucket: Bucket, path: &str) -> String {
        format!(
            "{}/api/v1/storage/object/public/{}/{}",
            base_url.trim_end_matches('/'),
            bucket,
            path
        )
    }
}
