use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response body of the remote human-verification service (reCAPTCHA v3 `siteverify`).
///
/// `success` is required. `score` is absent on failed checks; a successful check
/// without a score is still rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub success: bool,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub challenge_ts: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(rename = "error-codes", default)]
    pub error_codes: Vec<String>,
}

impl VerificationResult {
    /// Accept iff the service reported success and the score reaches `min_score`.
    pub fn is_accepted(&self, min_score: f64) -> bool {
        self.success && self.score.is_some_and(|score| score >= min_score)
    }
}
