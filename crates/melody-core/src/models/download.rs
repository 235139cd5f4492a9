use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Body of `POST /api/download`.
///
/// Both fields are untrusted caller input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    /// Page URL the extractor should resolve
    #[validate(
        length(min = 1, message = "url must not be empty"),
        url(message = "url must be a valid URL"),
        custom(function = "validate_http_scheme")
    )]
    #[schema(example = "https://www.youtube.com/watch?v=dQw4w9WgXcQ")]
    pub url: String,
    /// Token issued by the human-verification widget
    #[serde(alias = "verificationToken", default)]
    pub recaptcha_token: String,
}

fn validate_http_scheme(url: &str) -> Result<(), ValidationError> {
    let lower = url.trim_start().to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::new("scheme").with_message("url must use http or https".into()))
    }
}
