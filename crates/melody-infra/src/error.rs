//! HTTP error response format
//!
//! The `IntoResponse` implementation for `AppError` lives in `melody-api`: the orphan
//! rule forbids implementing axum's trait for a `melody-core` type here.

use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable message, safe to show to end users
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine readable code such as `RATE_LIMITED`
    pub code: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}
