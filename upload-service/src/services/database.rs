use crate::models::UploadedFile;
use async_trait::async_trait;
use mongodb::{
    bson::doc, options::IndexOptions, Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

/// Persistence for upload records.
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn insert(&self, file: &UploadedFile) -> Result<(), AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for upload-service");

        let filename_index = IndexModel::builder()
            .keys(doc! { "filename": 1 })
            .options(
                IndexOptions::builder()
                    .name("filename_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.files()
            .create_index(filename_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create filename index on files collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created unique index on files.filename");

        let created_at_index = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("created_at_desc".to_string())
                    .build(),
            )
            .build();

        self.files()
            .create_index(created_at_index, None)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create created_at index on files collection: {}",
                    e
                );
                AppError::from(e)
            })?;
        tracing::info!("Created index on files.created_at");

        Ok(())
    }

    pub fn files(&self) -> Collection<UploadedFile> {
        self.db.collection("files")
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }
}

#[async_trait]
impl FileRepository for MongoDb {
    async fn insert(&self, file: &UploadedFile) -> Result<(), AppError> {
        self.files().insert_one(file, None).await.map_err(|e| {
            tracing::error!(filename = %file.filename, "Failed to insert file record: {}", e);
            AppError::from(e)
        })?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}
