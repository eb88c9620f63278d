#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use file_upload_backend::config::UploadConfig;
use file_upload_backend::infrastructure::database;
use file_upload_backend::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

pub async fn setup_app(config: UploadConfig) -> Router {
    let db = database::setup_database("sqlite::memory:").await.unwrap();
    create_app(AppState::new(db, config))
}

pub fn jpeg(len: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.resize(len, 0x5A);
    data
}

/// One multipart section with the given header lines
pub fn raw_section(headers: &[&str], content: &[u8]) -> Vec<u8> {
    let mut part = format!("--{BOUNDARY}\r\n").into_bytes();
    for line in headers {
        part.extend_from_slice(line.as_bytes());
        part.extend_from_slice(b"\r\n");
    }
    part.extend_from_slice(b"\r\n");
    part.extend_from_slice(content);
    part.extend_from_slice(b"\r\n");
    part
}

/// One multipart section with an explicit Content-Disposition value
pub fn section(disposition: &str, content: &[u8]) -> Vec<u8> {
    raw_section(
        &[
            &format!("Content-Disposition: {disposition}"),
            "Content-Type: application/octet-stream",
        ],
        content,
    )
}

pub fn file_part(filename: &str, content: &[u8]) -> Vec<u8> {
    section(
        &format!("form-data; name=\"file\"; filename=\"{filename}\""),
        content,
    )
}

pub fn text_part(name: &str, value: &str) -> Vec<u8> {
    section(&format!("form-data; name=\"{name}\""), value.as_bytes())
}

pub fn multipart_body(parts: Vec<Vec<u8>>) -> Vec<u8> {
    let mut body = parts.concat();
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(body: Vec<u8>) -> Request<Body> {
    multipart_request("POST", "/upload", body)
}

pub fn multipart_request(method: &str, uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn list_count(app: &Router) -> usize {
    let response = send(app, get("/files")).await;
    body_json(response).await.as_array().unwrap().len()
}
