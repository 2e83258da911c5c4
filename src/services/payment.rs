use async_trait::async_trait;

use crate::error::{AppError, AppResult};

/// Opaque boundary to the payment provider. Any error is a hard failure and
/// the purchase must not be committed.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, amount: f64) -> AppResult<()>;
}

/// Development stand-in that accepts every transfer.
pub struct StubPaymentGateway;

#[async_trait]
impl PaymentGateway for StubPaymentGateway {
    async fn charge(&self, amount: f64) -> AppResult<()> {
        tracing::info!(amount, "payment received");
        Ok(())
    }
}

/// Authorizes transfers against a remote provider endpoint.
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    url: String,
}

impl HttpPaymentGateway {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(&self, amount: f64) -> AppResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "amount": amount }))
            .send()
            .await
            .map_err(|e| AppError::Payment(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Payment(format!(
                "payment provider returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
