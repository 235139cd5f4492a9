//! Human verification gate
//!
//! A [`HumanVerifier`] turns a client supplied challenge token into an accept or
//! reject decision. Any doubt about the answer is a rejection.

mod recaptcha;

pub use recaptcha::{RecaptchaVerifier, VerificationError};

#[async_trait::async_trait]
pub trait HumanVerifier: Send + Sync {
    /// `true` only when the remote service vouched for the token.
    async fn verify(&self, token: &str) -> bool;
}
