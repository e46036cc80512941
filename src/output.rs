//! Output record describing a produced artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata for one collage or PDF written by a composer.
///
/// Built once per successful composition and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub mime_type: String,
    /// Absolute (or caller-relative) path of the written file.
    pub filename: PathBuf,
    /// `{base_url}/{filename}`.
    pub url: String,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

impl MediaDescriptor {
    /// Describe `filename` written into `output_folder`, stamped with the
    /// current UTC time.
    pub fn new(mime_type: &str, output_folder: &Path, filename: &str, base_url: &str) -> Self {
        let now = Utc::now();
        Self {
            mime_type: mime_type.to_string(),
            filename: output_folder.join(filename),
            url: join_url(base_url, filename),
            date_created: now,
            date_modified: now,
        }
    }
}

/// `{base}/{name}`, without doubling a trailing slash on `base`.
pub(crate) fn join_url(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name)
}
