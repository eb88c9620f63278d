use sea_orm::FromQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "uploaded_files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Client-supplied name, HTML-escaped; display only
    #[sea_orm(column_type = "Text")]
    pub untrusted_name: String,
    #[serde(skip_serializing)]
    pub content: Vec<u8>,
    pub size: i64,
    pub uploaded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Row without the content column, for listings and details
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize, ToSchema)]
pub struct Summary {
    pub id: String,
    pub untrusted_name: String,
    pub size: i64,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl From<Model> for Summary {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            untrusted_name: model.untrusted_name,
            size: model.size,
            uploaded_at: model.uploaded_at,
        }
    }
}
