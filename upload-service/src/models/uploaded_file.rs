use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata recorded for every file accepted by `POST /api/upload`.
/// Records are written once and never updated or deleted by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedFile {
    #[serde(rename = "_id")]
    pub id: String,
    pub filename: String,
    pub path: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    pub size: i64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl UploadedFile {
    pub fn new(
        filename: String,
        path: String,
        url: String,
        mimetype: Option<String>,
        size: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            filename,
            path,
            url,
            mimetype,
            size,
            created_at: Utc::now(),
        }
    }
}

/// Server-side name for an upload: `<unix millis>-<original name>`.
pub fn stored_file_name(original_name: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", now.timestamp_millis(), sanitize_file_name(original_name))
}

/// Keeps only the last path component of a client-supplied name and drops
/// control characters, so the result is always a single entry inside the
/// storage directory.
pub fn sanitize_file_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or("");
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "unnamed".to_string()
    } else {
        cleaned.to_string()
    }
}
