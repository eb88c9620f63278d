use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use crate::AppState;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub max_file_size: usize,
    pub permitted_extensions: Vec<String>,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_status = if state.file_service.ping().await {
        "connected"
    } else {
        "disconnected"
    };

    let config = state.file_service.config();

    Json(HealthResponse {
        status: "ok".to_string(),
        database: db_status.to_string(),
        max_file_size: config.max_file_size,
        permitted_extensions: config.permitted_extensions.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
