use crate::entities::uploaded_files;
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub id: String,
    /// HTML-escaped client file name
    pub untrusted_name: String,
    pub size: i64,
    pub uploaded_at: chrono::DateTime<Utc>,
    /// File sections after the first one; they are not stored
    pub ignored_file_parts: usize,
}

impl UploadResponse {
    pub fn new(record: uploaded_files::Model, ignored_file_parts: usize) -> Self {
        Self {
            id: record.id,
            untrusted_name: record.untrusted_name,
            size: record.size,
            uploaded_at: record.uploaded_at,
            ignored_file_parts,
        }
    }
}

/// Documentation-only shape of the upload form
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
