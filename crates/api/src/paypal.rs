//! PayPal instant payment notification check.

use async_trait::async_trait;
use diacamma_core::payoff::{PaymentError, PaymentVerifier, VerifyResult};
use tracing::debug;

/// Posts the notification back to PayPal with `cmd=_notify-validate`.
#[derive(Debug, Clone)]
pub struct PaypalVerifier {
    client: reqwest::Client,
    url: String,
}

impl PaypalVerifier {
    /// Creates a verifier posting to `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

fn failed(err: &reqwest::Error) -> PaymentError {
    PaymentError::VerificationFailed(err.to_string())
}

#[async_trait]
impl PaymentVerifier for PaypalVerifier {
    async fn verify(&self, fields: &[(String, String)]) -> Result<VerifyResult, PaymentError> {
        let mut form = Vec::with_capacity(fields.len() + 1);
        form.push(("cmd".to_string(), "_notify-validate".to_string()));
        form.extend(fields.iter().cloned());

        let body = self
            .client
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| failed(&e))?
            .text()
            .await
            .map_err(|e| failed(&e))?;
        debug!(url = %self.url, answer = %body.trim(), "payment notification checked");
        Ok(VerifyResult::from_response(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_verification_failure() {
        let verifier = PaypalVerifier::new("http://127.0.0.1:9/cgi-bin/webscr");
        let result = verifier.verify(&[("txn_id".to_string(), "1".to_string())]).await;
        assert!(matches!(result, Err(PaymentError::VerificationFailed(_))));
    }
}
