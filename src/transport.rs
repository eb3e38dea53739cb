// src/transport.rs

//! HTTP transport to the bridge controller.
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("device returned status {0}")]
    BadStatus(u16),

    #[error("payload did not decode: {0}")]
    Decode(String),
}

/// Round-trip capability to the device. Poll loops and the command
/// dispatcher only ever reach the device through this trait.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value, FetchError>;
    async fn post_text(&self, path: &str) -> Result<String, FetchError>;
}

/// Transport over a shared [`reqwest::Client`].
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> color_eyre::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl DeviceTransport for HttpTransport {
    async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
        // Every poll must see current device truth, not a cached response.
        let response = self
            .client
            .get(self.url(path))
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn post_text(&self, path: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .post(self.url(path))
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let transport =
            HttpTransport::new("http://192.168.4.1/", Duration::from_secs(3)).unwrap();
        assert_eq!(transport.url("/state"), "http://192.168.4.1/state");
    }

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(
            FetchError::BadStatus(403).to_string(),
            "device returned status 403"
        );
    }
}
