use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::constants::FAVICON_FILE;

pub async fn hello() -> &'static str {
    "Hello World"
}

pub async fn favicon() -> Response {
    match tokio::fs::read(FAVICON_FILE).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/x-icon")], bytes).into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "No favicon to serve");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
