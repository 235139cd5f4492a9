//! API constants

use std::time::Duration;

/// API base path prefix
pub const API_BASE: &str = "/api";

pub const DOWNLOAD_PATH: &str = "/api/download";

pub const OPENAPI_PATH: &str = "/api/openapi.json";

/// Served from the working directory when present.
pub const FAVICON_FILE: &str = "favicon.ico";

/// Largest accepted request body. A download request is a URL and a token.
pub const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024;

/// Upper bound for each dependency probe in the health endpoints.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
