use crate::api::error::AppError;
use crate::utils::multipart::{ContentDisposition, form_data_boundary};
use crate::utils::validation::{UploadError, ValidatedFile};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError, multipart::MultipartRejection},
    http::{HeaderMap, StatusCode},
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

use super::types::*;

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "File upload"),
    responses(
        (status = 201, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "No file in the request", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Not multipart/form-data", body = ErrorResponse),
        (status = 422, description = "Extension or content rejected", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let upload = scan_upload(&state, &headers, multipart).await?;
    let record = state
        .file_service
        .save(&upload.untrusted_name, upload.file)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse::new(record, upload.ignored_file_parts)),
    ))
}

/// First file part of a multipart body, validated
pub(super) struct ScannedUpload {
    pub untrusted_name: String,
    pub file: ValidatedFile,
    pub ignored_file_parts: usize,
}

/// Reads the whole body; nothing is persisted here
pub(super) async fn scan_upload(
    state: &crate::AppState,
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ScannedUpload, AppError> {
    // 1. Must be multipart/form-data with a boundary
    if form_data_boundary(headers).is_none() {
        return Err(AppError::UnsupportedMediaType);
    }
    let mut multipart = multipart.map_err(|_| AppError::UnsupportedMediaType)?;

    let mut accepted = None;
    let mut ignored_file_parts = 0;

    // 2. Scan sections; the first file part is validated, later ones are skipped
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(disposition) = ContentDisposition::from_headers(field.headers()) else {
            continue;
        };
        let Some(untrusted_name) = disposition.file_part_name().map(str::to_owned) else {
            continue;
        };

        if accepted.is_some() {
            ignored_file_parts += 1;
            tracing::warn!(
                "Ignoring additional file part '{}'; only the first file is stored",
                untrusted_name
            );
            continue;
        }

        let reader = StreamReader::new(field.map_err(std::io::Error::other));
        let validated = state
            .file_service
            .validate(&untrusted_name, reader)
            .await
            .map_err(|e| match e {
                AppError::Upload(UploadError::Stream(io))
                    if io.to_string().contains("length limit exceeded") =>
                {
                    AppError::PayloadTooLarge(
                        "Request body exceeds the maximum allowed limit".to_string(),
                    )
                }
                other => other,
            })?;
        accepted = Some((untrusted_name, validated));
    }

    // 3. Only a fully read body yields a file
    let (untrusted_name, file) = accepted.ok_or(AppError::NoFileProvided)?;
    Ok(ScannedUpload {
        untrusted_name,
        file,
        ignored_file_parts,
    })
}

fn multipart_error(e: MultipartError) -> AppError {
    let err_msg = e.to_string();
    if err_msg.contains("length limit exceeded") {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(err_msg)
    }
}
