//! Types for storage operations

use serde::{Deserialize, Serialize};

/// Options for uploading a file
#[derive(Debug, Clone, Default)]
pub struct FileOptions {
    /// Content type of the stored object
    pub content_type: Option<String>,
}

impl FileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}

/// Body returned by a successful object upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// `<bucket>/<path>` of the stored object
    #[serde(rename = "Key", alias = "key")]
    pub key: String,

    /// Object id, sent by newer storage versions
    #[serde(rename = "Id", alias = "id", default)]
    pub id: Option<String>,
}

/// Content type for an object, looked up from its file extension. Names
/// without a known extension fall back to `image/jpeg` since uploads here
/// are photos.
pub fn content_type_for(file_name: &str) -> mime::Mime {
    mime_guess::from_path(file_name)
        .first()
        .unwrap_or(mime::IMAGE_JPEG)
}
