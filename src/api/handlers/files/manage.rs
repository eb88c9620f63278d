use crate::api::error::AppError;
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::{HeaderMap, StatusCode},
};

use super::types::UploadResponse;
use super::upload::scan_upload;

#[utoipa::path(
    put,
    path = "/files/{id}",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    request_body(content = crate::api::handlers::files::UploadForm, content_type = "multipart/form-data", description = "Replacement file"),
    responses(
        (status = 200, description = "File replaced", body = UploadResponse),
        (status = 400, description = "No file in the request", body = crate::api::handlers::files::ErrorResponse),
        (status = 404, description = "File not found", body = crate::api::handlers::files::ErrorResponse),
        (status = 413, description = "File too large", body = crate::api::handlers::files::ErrorResponse),
        (status = 415, description = "Not multipart/form-data", body = crate::api::handlers::files::ErrorResponse),
        (status = 422, description = "Extension or content rejected", body = crate::api::handlers::files::ErrorResponse)
    ),
    tag = "files"
)]
pub async fn replace_file(
    State(state): State<crate::AppState>,
    Path(file_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let upload = scan_upload(&state, &headers, multipart).await?;
    let record = state
        .file_service
        .replace(&file_id, &upload.untrusted_name, upload.file)
        .await?;

    Ok(Json(UploadResponse::new(record, upload.ignored_file_parts)))
}

#[utoipa::path(
    delete,
    path = "/files/{id}",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File not found", body = crate::api::handlers::files::ErrorResponse)
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<crate::AppState>,
    Path(file_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.file_service.delete(&file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
