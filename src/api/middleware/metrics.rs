use super::request_id::REQUEST_ID_HEADER;
use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};

/// One `request_completed` event per request under the `metrics` target
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let request_bytes = header_str(&req, header::CONTENT_LENGTH.as_str())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    let request_id = header_str(&req, REQUEST_ID_HEADER)
        .unwrap_or("unknown")
        .to_owned();

    let response = next.run(req).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        warn!(
            target: "metrics",
            %method, %path, status, latency_ms, request_bytes, %request_id,
            "request_failed"
        );
    } else {
        info!(
            target: "metrics",
            %method, %path, status, latency_ms, request_bytes, %request_id,
            "request_completed"
        );
    }

    response
}

fn header_str<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}
