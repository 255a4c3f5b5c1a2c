use serde::{Deserialize, Serialize};

/// Body of a successful `POST /api/upload`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
}

impl UploadResponse {
    pub fn new(url: String) -> Self {
        Self { success: true, url }
    }
}
