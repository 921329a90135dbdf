use crate::domain::model::SignedUrlPayload;
use crate::domain::ports::{ConfigProvider, Presigner};
use crate::utils::error::{EdgeError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_API_PREFIXES: &[&str] = &["/api/v1", "/api"];
pub const DEFAULT_PRESIGN_PATH: &str = "/images/presigned-url";

/// 只有路由層級的錯誤才換下一個前綴
fn is_fallthrough(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND || status == StatusCode::METHOD_NOT_ALLOWED
}

#[derive(Debug, Clone)]
pub struct ForwardedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ForwardedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    prefixes: Vec<String>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            prefixes: DEFAULT_API_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn from_config(config: &impl ConfigProvider) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs()))
            .build()?;

        Ok(Self {
            client,
            base_url: config.backend_url().trim_end_matches('/').to_string(),
            prefixes: config.api_prefixes(),
        })
    }

    pub fn with_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.prefixes = prefixes;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn candidate_urls(&self, sub_path: &str) -> Vec<String> {
        let sub_path = if sub_path.starts_with('/') {
            sub_path.to_string()
        } else {
            format!("/{}", sub_path)
        };

        self.prefixes
            .iter()
            .map(|prefix| format!("{}{}{}", self.base_url, prefix, sub_path))
            .collect()
    }

    /// GET `sub_path` under each prefix in order.
    ///
    /// 404/405 falls through to the next prefix. Any other failure, including
    /// transport errors and undecodable bodies, yields `None` immediately.
    pub async fn fetch_json<T: DeserializeOwned>(&self, sub_path: &str) -> Option<T> {
        for url in self.candidate_urls(sub_path) {
            let response = match self.client.get(&url).header(ACCEPT, "application/json").send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("Backend request to {} failed: {}", url, e);
                    return None;
                }
            };

            let status = response.status();
            if is_fallthrough(status) {
                tracing::debug!("{} answered {}, trying next prefix", url, status);
                continue;
            }

            if !status.is_success() {
                tracing::warn!("Backend {} answered {}", url, status);
                return None;
            }

            return match response.json::<T>().await {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Backend {} returned an undecodable body: {}", url, e);
                    None
                }
            };
        }

        tracing::debug!("No API prefix served {}", sub_path);
        None
    }

    /// Proxy variant of [`fetch_json`](Self::fetch_json): same prefix rules, but
    /// the upstream status and body are handed back untouched.
    pub async fn forward(
        &self,
        method: Method,
        sub_path: &str,
        body: Option<&serde_json::Value>,
        headers: &HeaderMap,
    ) -> Result<ForwardedResponse> {
        let candidates = self.candidate_urls(sub_path);
        if candidates.is_empty() {
            return Err(EdgeError::ConfigError {
                message: "no API prefixes configured".to_string(),
            });
        }

        let last = candidates.len() - 1;
        for (index, url) in candidates.iter().enumerate() {
            let mut request = self
                .client
                .request(method.clone(), url)
                .headers(headers.clone())
                .header(ACCEPT, "application/json");
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if is_fallthrough(status) && index < last {
                tracing::debug!("{} {} answered {}, trying next prefix", method, url, status);
                continue;
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.bytes().await?.to_vec();

            tracing::debug!("{} {} -> {}", method, url, status);
            return Ok(ForwardedResponse {
                status: status.as_u16(),
                content_type,
                body,
            });
        }

        unreachable!("the last candidate always returns")
    }
}

/// Presigner backed by the backend's presigned-URL endpoint.
#[derive(Debug, Clone)]
pub struct HttpPresigner {
    backend: BackendClient,
    path: String,
}

impl HttpPresigner {
    pub fn new(backend: BackendClient, path: impl Into<String>) -> Self {
        Self {
            backend,
            path: path.into(),
        }
    }
}

#[async_trait]
impl Presigner for HttpPresigner {
    async fn presign(&self, key: &str) -> Result<SignedUrlPayload> {
        let encoded: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
        let sub_path = format!("{}?key={}", self.path, encoded);

        self.backend
            .fetch_json::<SignedUrlPayload>(&sub_path)
            .await
            .ok_or_else(|| EdgeError::UpstreamError {
                status: StatusCode::BAD_GATEWAY.as_u16(),
                message: format!("no presigned URL for '{}'", key),
            })
    }
}
