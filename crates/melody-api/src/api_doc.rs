//! OpenAPI documentation, served at `/api/openapi.json`.

use axum::Json;
use utoipa::OpenApi;

use crate::handlers;
use melody_core::models::DownloadRequest;
use melody_infra::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Melody API",
        version = "0.1.0",
        description = "Converts the audio track of a media page to a downloadable file. Requests pass human verification, an origin check and a per-client daily download quota before conversion starts; the converted audio is streamed while it is produced."
    ),
    paths(handlers::download::download_audio),
    components(schemas(DownloadRequest, ErrorResponse)),
    tags(
        (name = "download", description = "Audio conversion and download")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
