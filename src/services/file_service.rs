use crate::api::error::AppError;
use crate::config::UploadConfig;
use crate::entities::uploaded_files;
use crate::services::storage::{FileStore, NewUploadedFile};
use crate::utils::validation::{
    UploadError, ValidatedFile, escape_untrusted_name, validate_section,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::io::AsyncRead;
use uuid::Uuid;

pub struct FileService {
    store: Arc<dyn FileStore>,
    config: UploadConfig,
}

impl FileService {
    pub fn new(store: Arc<dyn FileStore>, config: UploadConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Runs the validator over one file section with the configured limits
    pub async fn validate<R>(&self, untrusted_name: &str, reader: R) -> Result<ValidatedFile, AppError>
    where
        R: AsyncRead + Unpin,
    {
        validate_section(untrusted_name, reader, &self.config)
            .await
            .map_err(|e| {
                tracing::info!("Rejected upload '{}': {}", untrusted_name, e);
                AppError::Upload(e)
            })
    }

    /// Persists a validated file under a fresh id
    pub async fn save(
        &self,
        untrusted_name: &str,
        file: ValidatedFile,
    ) -> Result<uploaded_files::Model, AppError> {
        if file.content.is_empty() {
            return Err(AppError::Upload(UploadError::EmptyFile));
        }

        let record = self
            .store
            .create(NewUploadedFile {
                id: None,
                untrusted_name: escape_untrusted_name(untrusted_name),
                content: file.content,
                uploaded_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            "Stored upload {} ({} bytes, {})",
            record.id,
            record.size,
            file.extension
        );

        Ok(record)
    }

    /// Replaces name and content of an existing record; `id` and `uploaded_at` are kept
    pub async fn replace(
        &self,
        id: &str,
        untrusted_name: &str,
        file: ValidatedFile,
    ) -> Result<uploaded_files::Model, AppError> {
        let id = parse_id(id)?;
        if file.content.is_empty() {
            return Err(AppError::Upload(UploadError::EmptyFile));
        }

        let record = self
            .store
            .replace(&id, escape_untrusted_name(untrusted_name), file.content)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        tracing::info!(
            "Replaced upload {} ({} bytes, {})",
            record.id,
            record.size,
            file.extension
        );

        Ok(record)
    }

    pub async fn list(&self) -> Result<Vec<uploaded_files::Summary>, AppError> {
        Ok(self.store.list_all().await?)
    }

    pub async fn details(&self, id: &str) -> Result<uploaded_files::Summary, AppError> {
        let id = parse_id(id)?;
        self.store
            .find_summary(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    pub async fn download(&self, id: &str) -> Result<uploaded_files::Model, AppError> {
        let id = parse_id(id)?;
        self.store
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let id = parse_id(id)?;
        if !self.store.delete_by_id(&id).await? {
            return Err(AppError::NotFound("File not found".to_string()));
        }
        tracing::info!("Deleted upload {}", id);
        Ok(())
    }

    pub async fn ping(&self) -> bool {
        self.store.ping().await.is_ok()
    }
}

/// Ids are UUIDs; anything else cannot match a record
fn parse_id(id: &str) -> Result<String, AppError> {
    Uuid::parse_str(id)
        .map(|uuid| uuid.to_string())
        .map_err(|_| AppError::NotFound("File not found".to_string()))
}
