use crate::entities::{prelude::*, uploaded_files};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

type Result<T> = std::result::Result<T, DbErr>;

/// A record ready to be inserted; `size` is derived from `content`
pub struct NewUploadedFile {
    pub id: Option<String>,
    pub untrusted_name: String,
    pub content: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

/// Persistence collaborator for uploaded files
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Inserts the record, generating an id when none is assigned
    async fn create(&self, file: NewUploadedFile) -> Result<uploaded_files::Model>;
    async fn find_by_id(&self, id: &str) -> Result<Option<uploaded_files::Model>>;
    async fn find_summary(&self, id: &str) -> Result<Option<uploaded_files::Summary>>;
    /// Replaces name and content of an existing record, keeping `id` and `uploaded_at`.
    /// Returns `None` when nothing matched.
    async fn replace(
        &self,
        id: &str,
        untrusted_name: String,
        content: Vec<u8>,
    ) -> Result<Option<uploaded_files::Model>>;
    /// Returns false when nothing matched
    async fn delete_by_id(&self, id: &str) -> Result<bool>;
    /// Newest first, without content
    async fn list_all(&self) -> Result<Vec<uploaded_files::Summary>>;
    async fn ping(&self) -> Result<()>;
}

pub struct DatabaseFileStore {
    db: DatabaseConnection,
}

impl DatabaseFileStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FileStore for DatabaseFileStore {
    async fn create(&self, file: NewUploadedFile) -> Result<uploaded_files::Model> {
        let id = file.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let size = file.content.len() as i64;

        let model = uploaded_files::ActiveModel {
            id: Set(id),
            untrusted_name: Set(file.untrusted_name),
            content: Set(file.content),
            size: Set(size),
            uploaded_at: Set(file.uploaded_at),
        }
        .insert(&self.db)
        .await?;

        Ok(model)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<uploaded_files::Model>> {
        Ok(UploadedFiles::find_by_id(id.to_string())
            .one(&self.db)
            .await?)
    }

    async fn find_summary(&self, id: &str) -> Result<Option<uploaded_files::Summary>> {
        Ok(UploadedFiles::find_by_id(id.to_string())
            .select_only()
            .columns(summary_columns())
            .into_model::<uploaded_files::Summary>()
            .one(&self.db)
            .await?)
    }

    async fn replace(
        &self,
        id: &str,
        untrusted_name: String,
        content: Vec<u8>,
    ) -> Result<Option<uploaded_files::Model>> {
        let Some(existing) = UploadedFiles::find_by_id(id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let size = content.len() as i64;
        let mut model = existing.into_active_model();
        model.untrusted_name = Set(untrusted_name);
        model.content = Set(content);
        model.size = Set(size);

        Ok(Some(model.update(&self.db).await?))
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let res = UploadedFiles::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn list_all(&self) -> Result<Vec<uploaded_files::Summary>> {
        Ok(UploadedFiles::find()
            .select_only()
            .columns(summary_columns())
            .order_by_desc(uploaded_files::Column::UploadedAt)
            .into_model::<uploaded_files::Summary>()
            .all(&self.db)
            .await?)
    }

    async fn ping(&self) -> Result<()> {
        self.db.ping().await
    }
}

fn summary_columns() -> [uploaded_files::Column; 4] {
    [
        uploaded_files::Column::Id,
        uploaded_files::Column::UntrustedName,
        uploaded_files::Column::Size,
        uploaded_files::Column::UploadedAt,
    ]
}
