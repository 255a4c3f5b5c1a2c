use crate::dtos::UploadResponse;
use crate::models::{stored_file_name, UploadedFile};
use crate::services::metrics::{FILES_UPLOADED, FILE_UPLOAD_BYTES, FILE_UPLOAD_FAILURES};
use crate::services::StoredFile;
use crate::startup::AppState;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use futures::{StreamExt, TryStreamExt};
use metrics::{counter, histogram};
use service_core::error::AppError;

/// Multipart field that carries the file.
pub const FILE_FIELD: &str = "file";

struct AcceptedUpload {
    filename: String,
    mimetype: Option<String>,
    stored: StoredFile,
}

/// `POST /api/upload`
///
/// Streams the `file` part to disk under a timestamp-prefixed name, records it
/// and answers with its public URL. Content type and size are not restricted.
/// The file is written before the record, so a failed insert leaves it on disk.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut accepted: Option<AcceptedUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // A part without a filename is a text field, not a file.
        let Some(original_name) = field.file_name().map(str::to_string) else {
            tracing::debug!("Skipping '{}' part without a filename", FILE_FIELD);
            continue;
        };

        if let Some(previous) = &accepted {
            discard(&state, &previous.filename).await;
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Only one '{}' field is accepted per request",
                FILE_FIELD
            )));
        }

        let mimetype = field.content_type().map(str::to_string);
        let filename = stored_file_name(&original_name, Utc::now());

        tracing::info!(
            original_name = %original_name,
            filename = %filename,
            mimetype = ?mimetype,
            "Upload received"
        );

        let body = field
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e)))
            .boxed();

        let stored = state.storage.write(&filename, body).await.map_err(|e| {
            counter!(FILE_UPLOAD_FAILURES, "stage" => "storage").increment(1);
            tracing::error!(filename = %filename, error = %e, "Failed to write upload to disk");
            e
        })?;

        accepted = Some(AcceptedUpload {
            filename,
            mimetype,
            stored,
        });
    }

    let AcceptedUpload {
        filename,
        mimetype,
        stored,
    } = accepted.ok_or_else(|| {
        counter!(FILE_UPLOAD_FAILURES, "stage" => "request").increment(1);
        AppError::InternalError(anyhow::anyhow!(
            "No file uploaded in field '{}'",
            FILE_FIELD
        ))
    })?;

    let url = state.config.public_url(&filename);
    let path = stored.path.display().to_string();
    let record = UploadedFile::new(
        filename,
        path,
        url.clone(),
        mimetype,
        stored.size as i64,
    );

    if let Err(e) = state.files.insert(&record).await {
        counter!(FILE_UPLOAD_FAILURES, "stage" => "database").increment(1);
        tracing::error!(
            filename = %record.filename,
            path = %record.path,
            error = %e,
            "Failed to save file record; file stays on disk"
        );
        return Err(e);
    }

    counter!(FILES_UPLOADED).increment(1);
    histogram!(FILE_UPLOAD_BYTES).record(stored.size as f64);

    tracing::info!(
        file_id = %record.id,
        filename = %record.filename,
        size = stored.size,
        url = %url,
        "Upload completed"
    );

    Ok(Json(UploadResponse::new(url)))
}

async fn discard(state: &AppState, filename: &str) {
    if let Err(e) = state.storage.delete(filename).await {
        tracing::warn!(filename = %filename, error = %e, "Failed to discard rejected upload");
    }
}
