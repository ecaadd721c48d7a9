//! Shared HTTP client for the Archivo API.
//!
//! Provides a minimal client with optional Bearer auth, generic GET/POST helpers
//! that map failures onto [`BackendError`], and the domain methods the upload
//! engine needs (asset lists, directory lookup/create, multipart upload).

pub mod api;

use archivo_core::{BackendError, ClientConfig};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// No credentials (development backends).
    None,
    /// `Authorization: Bearer {token}`
    Bearer(String),
}

/// HTTP client for the Archivo API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
    request_timeout: Duration,
    upload_timeout: Option<Duration>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let auth = match &config.token {
            Some(token) => Auth::Bearer(token.clone()),
            None => Auth::None,
        };

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth,
            request_timeout: config.request_timeout,
            upload_timeout: config.upload_timeout,
        })
    }

    /// Create client from environment: ARCHIVO_API_URL (or API_URL), ARCHIVO_API_TOKEN (or API_TOKEN).
    pub fn from_env() -> anyhow::Result<Self> {
        let config = ClientConfig::from_env()?;
        Ok(Self::new(&config)?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::None => request,
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
        }
    }

    /// GET request with query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let url = self.build_url(path);
        let mut request = self.client.get(&url).timeout(self.request_timeout);
        request = self.apply_auth(request);

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(transport_error)?;
        parse_json(check_status(response).await?).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let url = self.build_url(path);
        let request = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(body);
        let request = self.apply_auth(request);

        let response = request.send().await.map_err(transport_error)?;
        parse_json(check_status(response).await?).await
    }

    /// POST multipart form. The response body is not consumed beyond the status.
    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<(), BackendError> {
        let url = self.build_url(path);
        let mut request = self.client.post(&url).multipart(form);
        if let Some(timeout) = self.upload_timeout {
            request = request.timeout(timeout);
        }
        let request = self.apply_auth(request);

        let response = request.send().await.map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(err.to_string())
    } else {
        BackendError::Transport(err.to_string())
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    response
        .json()
        .await
        .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse response as JSON: {}", e)))
}

/// Pass successful responses through; turn anything else into `BackendError::Status`
/// carrying the body's `error` code and `message`/`detail` text when present.
async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = error_fields(&body);
    Err(BackendError::status(status.as_u16(), code, message))
}

fn error_fields(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        let trimmed = body.trim();
        return (None, (!trimmed.is_empty()).then(|| trimmed.to_string()));
    };

    let text = |key: &str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    let message = text("message").or_else(|| text("detail"));
    let code = text("error");
    (code, message)
}
