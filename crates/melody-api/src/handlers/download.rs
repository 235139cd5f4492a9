use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::ClientIdentity;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use melody_core::models::DownloadRequest;
use melody_core::AppError;
use melody_infra::ErrorResponse;
use melody_processing::OnSuccess;
use std::sync::Arc;

/// Convert the audio track behind a page URL and stream it back.
///
/// Gates run in order: body decoding, human verification, origin, download quota.
/// The first failing gate answers and nothing after it runs. The download only
/// counts against the quota once the whole file was streamed.
#[utoipa::path(
    post,
    path = "/api/download",
    tag = "download",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Converted audio, streamed", content_type = "audio/mpeg"),
        (status = 400, description = "Malformed body or URL", body = ErrorResponse),
        (status = 403, description = "Verification failed or origin not allowed", body = ErrorResponse),
        (status = 429, description = "Download limit reached", body = ErrorResponse),
        (status = 500, description = "Rate limit store or media tools failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(client = %client.0))]
pub async fn download_audio(
    State(state): State<Arc<AppState>>,
    client: ClientIdentity,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<DownloadRequest>,
) -> Result<Response, HttpAppError> {
    let ClientIdentity(identifier) = client;

    if !state.verifier.verify(&request.recaptcha_token).await {
        tracing::warn!(gate = "verification", "Human verification rejected");
        return Err(AppError::VerificationFailed("token rejected".to_string()).into());
    }

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !state.origin_policy.is_allowed(origin) {
        tracing::warn!(gate = "origin", origin = %origin, "Origin not allowed");
        return Err(AppError::OriginNotAllowed(origin.to_string()).into());
    }

    let limited = state.rate_limiter.check_limit(&identifier).await.map_err(|e| {
        tracing::error!(gate = "rate_limit", error = %e, "Rate limit lookup failed");
        e
    })?;
    if limited {
        return Err(AppError::RateLimited {
            limit: state.rate_limiter.max_downloads(),
        }
        .into());
    }

    let limiter = state.rate_limiter.clone();
    let counted = identifier.clone();
    let on_success: OnSuccess = Box::pin(async move {
        if let Err(e) = limiter.record_download(&counted).await {
            tracing::error!(client = %counted, error = %e, "Failed to record completed download");
        }
    });

    let prepared = state.orchestrator.start(&request.url, on_success).await?;
    tracing::info!(
        url = %request.url,
        title = %prepared.metadata.title,
        "Streaming converted audio"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, prepared.content_type)
        .header(header::CONTENT_DISPOSITION, prepared.content_disposition)
        .body(Body::from_stream(prepared.stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            AppError::Internal(e.to_string()).into()
        })
}
