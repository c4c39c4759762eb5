//! HTTP transport for the catalog API
//!
//! Thin wrapper over reqwest that speaks the backend's envelope format:
//! successful responses carry `{"data": ...}` and failures carry
//! `{"error": {"message": ...}}`.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use storefront_core::envelope::{Envelope, ErrorEnvelope};
use storefront_core::models::Health;

use crate::error::{ClientError, ClientResult};

/// Client for the storefront backend API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client with the default timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    /// Create a new API client with a custom request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self { client, base_url }
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request and decode the response body as JSON
    ///
    /// Non-2xx responses become `ClientError::Api` with the server's
    /// error message when the body parses as an error envelope.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> ClientResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut builder = self
            .client
            .request(method, &url)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        self.execute(builder).await
    }

    /// Issue a GET request with query parameters
    pub async fn get_with_params(
        &self,
        path: &str,
        params: &[(&str, String)],
        token: Option<&str>,
    ) -> ClientResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {} ({} params)", url, params.len());

        let mut builder = self.client.get(&url).query(params);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        self.execute(builder).await
    }

    async fn execute(&self, builder: reqwest::RequestBuilder) -> ClientResult<Value> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(error_from_response(status, &text));
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// GET a path and unwrap the `data` field of the envelope
    pub async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> ClientResult<T> {
        let body = self.request(Method::GET, path, None, token).await?;
        decode_data(body)
    }

    /// POST a payload and unwrap the `data` field of the envelope
    pub async fn post_data<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body)?;
        let response = self.request(Method::POST, path, Some(&body), token).await?;
        decode_data(response)
    }

    /// PUT a payload and unwrap the `data` field of the envelope
    pub async fn put_data<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body)?;
        let response = self.request(Method::PUT, path, Some(&body), token).await?;
        decode_data(response)
    }

    /// DELETE a path, discarding the response body
    pub async fn delete(&self, path: &str, token: Option<&str>) -> ClientResult<()> {
        self.request(Method::DELETE, path, None, token).await?;
        Ok(())
    }

    /// Check backend health
    pub async fn health(&self) -> ClientResult<Health> {
        self.get_data("/health", None).await
    }
}

fn decode_data<T: DeserializeOwned>(body: Value) -> ClientResult<T> {
    let envelope: Envelope<T> = serde_json::from_value(body)?;
    Ok(envelope.data)
}

fn error_from_response(status: StatusCode, body: &str) -> ClientError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return ClientError::Api {
            status: status.as_u16(),
            message: envelope.error.message,
            details: envelope.error.details,
        };
    }
    ClientError::Api {
        status: status.as_u16(),
        message: format!("Request failed with status {}", status.as_u16()),
        details: None,
    }
}
