use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::{BoxStream, TryStreamExt};
use service_core::error::AppError;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Where a body ended up on disk.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: PathBuf,
    pub size: u64,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Streams `body` into a new file called `filename`. Never overwrites an
    /// existing file; a partially written file is removed on error.
    async fn write<'a>(
        &self,
        filename: &str,
        body: BoxStream<'a, Result<Bytes, AppError>>,
    ) -> Result<StoredFile, AppError>;

    async fn delete(&self, filename: &str) -> Result<(), AppError>;
}

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn write<'a>(
        &self,
        filename: &str,
        body: BoxStream<'a, Result<Bytes, AppError>>,
    ) -> Result<StoredFile, AppError> {
        let path = self.base_path.join(filename);

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    AppError::Conflict(anyhow::anyhow!("File {} already exists", filename))
                }
                _ => AppError::StorageError(
                    anyhow::Error::new(e).context(format!("Failed to create {}", path.display())),
                ),
            })?;

        match copy_body(file, body).await {
            Ok(size) => Ok(StoredFile { path, size }),
            Err(e) => {
                if let Err(remove_err) = fs::remove_file(&path).await {
                    tracing::warn!(
                        path = %path.display(),
                        error = %remove_err,
                        "Failed to remove partially written file"
                    );
                }
                Err(e)
            }
        }
    }

    async fn delete(&self, filename: &str) -> Result<(), AppError> {
        let path = self.base_path.join(filename);
        if path.exists() {
            fs::remove_file(path).await?;
        }
        Ok(())
    }
}

async fn copy_body(
    mut file: fs::File,
    mut body: BoxStream<'_, Result<Bytes, AppError>>,
) -> Result<u64, AppError> {
    let mut size = 0u64;
    while let Some(chunk) = body.try_next().await? {
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(size)
}
