//! HTTP client for the game server.
//!
//! Posts form-encoded requests and returns the status plus body text. The
//! cookie store keeps the server's session cookie between requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::ports::{
    TransportError, TransportPort, TransportRequest, TransportResponse,
};

/// Client for the game's form endpoints
#[derive(Clone)]
pub struct GameClient {
    client: Client,
    base_url: String,
}

impl GameClient {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(
                    error = %e,
                    "HTTP client builder failed; falling back to defaults without cookie store"
                );
                Client::new()
            });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
            &config.user_agent,
        )
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

fn map_send_error(endpoint: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(endpoint)
    } else {
        TransportError::request_failed(endpoint, error)
    }
}

#[async_trait]
impl TransportPort for GameClient {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.url(&request.endpoint);
        tracing::debug!(url = %url, fields = request.params.len(), "Submitting form");

        let response = self
            .client
            .post(&url)
            .form(&request.params)
            .send()
            .await
            .map_err(|e| map_send_error(&request.endpoint, e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::timeout(&request.endpoint)
            } else {
                TransportError::body(&request.endpoint, e)
            }
        })?;

        tracing::debug!(url = %url, status, bytes = body.len(), "Response received");
        Ok(TransportResponse { status, body })
    }
}
