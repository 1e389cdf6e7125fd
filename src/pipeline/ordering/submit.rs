use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use super::OrderError;
use crate::pipeline::structuring::{bounded_snippet, MAX_ERROR_BODY_CHARS};

/// Delivers a formatted order payload. `true` means the service accepted it.
pub trait OrderTransport {
    fn submit(&self, payload: &str) -> bool;
}

/// Blocking HTTP transport that POSTs the payload as JSON.
pub struct HttpOrderClient {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpOrderClient {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, OrderError> {
        let parsed = reqwest::Url::parse(endpoint)
            .map_err(|e| OrderError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(OrderError::InvalidEndpoint(format!(
                "{endpoint}: unsupported scheme {}",
                parsed.scheme()
            )));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| OrderError::HttpClient(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl OrderTransport for HttpOrderClient {
    fn submit(&self, payload: &str) -> bool {
        let result = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send();

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!(status = response.status().as_u16(), "Order accepted");
                true
            }
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().unwrap_or_default();
                tracing::warn!(
                    status,
                    body = %bounded_snippet(&body, MAX_ERROR_BODY_CHARS),
                    "Order rejected by ordering service"
                );
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Order submission failed");
                false
            }
        }
    }
}
