//! Route configuration and setup.
//!
//! Health checks live in [health](health).

mod health;

use crate::api_doc;
use crate::constants::{DOWNLOAD_PATH, MAX_REQUEST_BODY_BYTES, OPENAPI_PATH};
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{header, request::Parts, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use melody_infra::{request_id_middleware, OriginPolicy};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Router<()> {
    let cors = setup_cors(state.origin_policy.clone());

    Router::new()
        .route("/", get(handlers::root::hello))
        .route("/favicon.ico", get(handlers::root::favicon))
        .route(DOWNLOAD_PATH, post(handlers::download::download_audio))
        .route(OPENAPI_PATH, get(api_doc::openapi_json))
        .merge(health::health_routes())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// CORS for browser clients, admitting the same origins as the download handler.
fn setup_cors(policy: OriginPolicy) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin.to_str().is_ok_and(|origin| policy.is_allowed(origin))
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ORIGIN,
            header::ACCEPT,
            header::CONTENT_DISPOSITION,
        ])
        .expose_headers([header::CONTENT_DISPOSITION])
}
