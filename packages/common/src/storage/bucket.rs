use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::StorageError;

/// The fixed set of public buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    SubmissionFiles,
    TaskFiles,
    ProfileImages,
}

impl Bucket {
    pub const ALL: &'static [Bucket] = &[Self::SubmissionFiles, Self::TaskFiles, Self::ProfileImages];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubmissionFiles => "submission-files",
            Self::TaskFiles => "task-files",
            Self::ProfileImages => "profile-images",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| StorageError::UnknownBucket(s.to_string()))
    }
}
