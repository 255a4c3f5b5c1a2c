#![allow(dead_code)]

use async_trait::async_trait;
use service_core::config::Config as CoreConfig;
use service_core::error::AppError;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use upload_service::config::{
    CorsConfig, MongoConfig, PublicConfig, StorageConfig, StorageMode, UploadConfig,
};
use upload_service::models::UploadedFile;
use upload_service::services::FileRepository;
use upload_service::startup::Application;
use uuid::Uuid;

pub const TEST_URL_HOST: &str = "https://uploads.test.example";

/// Record store kept in memory; `failing` makes every insert fail the way an
/// unreachable database would.
#[derive(Default)]
pub struct InMemoryFiles {
    records: Mutex<Vec<UploadedFile>>,
    failing: bool,
}

impl InMemoryFiles {
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn records(&self) -> Vec<UploadedFile> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileRepository for InMemoryFiles {
    async fn insert(&self, file: &UploadedFile) -> Result<(), AppError> {
        if self.failing {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "server selection timeout: no available servers"
            )));
        }
        self.records.lock().unwrap().push(file.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        if self.failing {
            return Err(AppError::ServiceUnavailable);
        }
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub files: Arc<InMemoryFiles>,
    pub storage_root: PathBuf,
    pub config: UploadConfig,
}

pub fn test_config(mode: StorageMode) -> UploadConfig {
    UploadConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            ..CoreConfig::default()
        },
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: format!("upload_test_{}", Uuid::new_v4()),
        },
        storage: StorageConfig {
            mode,
            root: PathBuf::from(format!("target/test-storage-{}", Uuid::new_v4())),
        },
        public: PublicConfig {
            url_host: TEST_URL_HOST.to_string(),
        },
        cors: CorsConfig::default(),
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(StorageMode::Development, InMemoryFiles::default()).await
    }

    pub async fn spawn_with(mode: StorageMode, files: InMemoryFiles) -> Self {
        let config = test_config(mode);
        let files = Arc::new(files);

        let app = Application::build_with_repository(config.clone(), files.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            files,
            storage_root: config.storage.root.clone(),
            config,
        }
    }

    pub async fn upload(&self, form: reqwest::multipart::Form) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/api/upload", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.config.storage.directory()
    }

    /// Cleanup test resources (storage directory).
    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.storage_root).await;
    }
}

pub fn file_form(name: &str, mime: &str, bytes: Vec<u8>) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str(mime)
            .unwrap(),
    )
}
