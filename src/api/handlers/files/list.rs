use crate::api::error::AppError;
use crate::entities::uploaded_files;
use axum::{
    Json,
    extract::{Path, State},
};

#[utoipa::path(
    get,
    path = "/files",
    responses(
        (status = 200, description = "All uploaded files, newest first", body = Vec<uploaded_files::Summary>)
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<uploaded_files::Summary>>, AppError> {
    Ok(Json(state.file_service.list().await?))
}

#[utoipa::path(
    get,
    path = "/files/{id}",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File details", body = uploaded_files::Summary),
        (status = 404, description = "File not found", body = crate::api::handlers::files::ErrorResponse)
    ),
    tag = "files"
)]
pub async fn get_file(
    State(state): State<crate::AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<uploaded_files::Summary>, AppError> {
    Ok(Json(state.file_service.details(&file_id).await?))
}
