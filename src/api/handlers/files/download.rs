use crate::api::error::AppError;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

#[utoipa::path(
    get,
    path = "/files/{id}/download",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "File not found", body = crate::api::handlers::files::ErrorResponse)
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<crate::AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, AppError> {
    let file = state.file_service.download(&file_id).await?;

    let content_disposition = attachment_disposition(&file.untrusted_name);
    let content_length = file.content.len().to_string();

    Ok((
        [
            (
                header::CONTENT_TYPE,
                mime::APPLICATION_OCTET_STREAM.to_string(),
            ),
            (header::CONTENT_DISPOSITION, content_disposition),
            (header::CONTENT_LENGTH, content_length),
        ],
        file.content,
    )
        .into_response())
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name
pub fn attachment_disposition(stored_name: &str) -> String {
    let ascii_filename = stored_name
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .take(64) // Truncate ASCII fallback to 64 chars for safety
        .collect::<String>();
    let fallback_filename = if ascii_filename.is_empty() {
        "file"
    } else {
        &ascii_filename
    };

    let encoded_filename = utf8_percent_encode(stored_name, NON_ALPHANUMERIC).to_string();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    )
}
