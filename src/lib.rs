pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::{MULTIPART_OVERHEAD, UploadConfig};
use crate::services::file_service::FileService;
use crate::services::storage::DatabaseFileStore;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::ServiceBuilder;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::files::upload::upload_file,
        api::handlers::files::list::list_files,
        api::handlers::files::list::get_file,
        api::handlers::files::download::download_file,
        api::handlers::files::manage::replace_file,
        api::handlers::files::manage::delete_file,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::files::UploadResponse,
            api::handlers::files::UploadForm,
            api::handlers::files::ErrorResponse,
            api::handlers::health::HealthResponse,
            entities::uploaded_files::Summary,
        )
    ),
    tags(
        (name = "files", description = "File upload and download endpoints"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub file_service: Arc<FileService>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: UploadConfig) -> Self {
        let store = Arc::new(DatabaseFileStore::new(db));
        Self {
            file_service: Arc::new(FileService::new(store, config)),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.file_service.config().max_file_size + MULTIPART_OVERHEAD;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/upload",
            post(api::handlers::files::upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/files", get(api::handlers::files::list_files))
        .route(
            "/files/:id",
            put(api::handlers::files::replace_file)
                .layer(DefaultBodyLimit::max(body_limit))
                .get(api::handlers::files::get_file)
                .delete(api::handlers::files::delete_file),
        )
        .route(
            "/files/:id/download",
            get(api::handlers::files::download_file),
        )
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(api::middleware::request_id::request_id_middleware))
                .layer(from_fn(api::middleware::metrics::metrics_middleware)),
        )
        .with_state(state)
}
