use std::time::Duration;

use anyhow::Context;
use melody_core::models::VerificationResult;

use super::HumanVerifier;

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("verification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("verification service returned status {0}")]
    Status(u16),

    #[error("malformed verification response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// reCAPTCHA v3 `siteverify` client.
#[derive(Clone)]
pub struct RecaptchaVerifier {
    client: reqwest::Client,
    secret_key: String,
    verify_url: String,
    min_score: f64,
}

impl RecaptchaVerifier {
    /// Requests are abandoned, and the token rejected, after `timeout`.
    pub fn new(
        secret_key: impl Into<String>,
        verify_url: impl Into<String>,
        min_score: f64,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for verification service")?;

        Ok(Self {
            client,
            secret_key: secret_key.into(),
            verify_url: verify_url.into(),
            min_score,
        })
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    /// One form encoded POST of `secret` and `response`. No retries.
    pub async fn fetch_result(&self, token: &str) -> Result<VerificationResult, VerificationError> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", self.secret_key.as_str()), ("response", token)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerificationError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice::<VerificationResult>(&body)?)
    }
}

#[async_trait::async_trait]
impl HumanVerifier for RecaptchaVerifier {
    #[tracing::instrument(skip_all)]
    async fn verify(&self, token: &str) -> bool {
        if token.trim().is_empty() {
            tracing::warn!("Rejecting empty verification token");
            return false;
        }

        let result = match self.fetch_result(token).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "Verification call failed, rejecting");
                return false;
            }
        };

        let accepted = result.is_accepted(self.min_score);
        if accepted {
            tracing::debug!(score = ?result.score, action = ?result.action, "Verification passed");
        } else {
            tracing::warn!(
                success = result.success,
                score = ?result.score,
                min_score = self.min_score,
                error_codes = ?result.error_codes,
                hostname = ?result.hostname,
                "Verification rejected"
            );
        }
        accepted
    }
}
