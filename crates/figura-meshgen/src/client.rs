// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the model generator service.
//!
//! Provides [`MeshServiceClient`], which handles request construction,
//! bearer authentication, per-call timeouts, and mapping of HTTP failures
//! onto [`FiguraError`]. Nothing here retries: a failed submission is
//! reported to the caller, and the poller owns the retry budget for status
//! queries.

use std::time::Duration;

use figura_config::model::MeshConfig;
use figura_core::FiguraError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use tracing::debug;

use crate::types::{GenerateRequest, ServiceErrorBody, ServiceResponse};

/// HTTP client for the model generator service.
#[derive(Debug, Clone)]
pub struct MeshServiceClient {
    client: reqwest::Client,
    base_url: String,
    submit_timeout: Duration,
    status_timeout: Duration,
}

impl MeshServiceClient {
    /// Creates a client for the service described by `config`.
    ///
    /// The bearer token, when configured, is attached to every request.
    pub fn new(config: &MeshConfig) -> Result<Self, FiguraError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                FiguraError::Config(format!("invalid mesh token header value: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| FiguraError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            submit_timeout: Duration::from_secs(config.submit_timeout_secs),
            status_timeout: Duration::from_secs(config.status_timeout_secs),
        })
    }

    /// Returns the service base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /generate`. Any failure is a [`FiguraError::Submission`].
    pub async fn generate(&self, request: &GenerateRequest) -> Result<ServiceResponse, FiguraError> {
        let url = format!("{}/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.submit_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| FiguraError::Submission {
                message: format!("model generator unreachable: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(request_id = %request.id, status = %status, "submission response received");

        if !status.is_success() {
            let description = error_description(response).await;
            return Err(FiguraError::Submission {
                message: format!("model generator returned {status}: {description}"),
                source: None,
            });
        }

        response
            .json::<ServiceResponse>()
            .await
            .map_err(|e| FiguraError::Submission {
                message: format!("failed to parse submission response: {e}"),
                source: Some(Box::new(e)),
            })
    }

    /// `GET /status/{request_id}`.
    ///
    /// 401/403 map to `Unauthorized`, 404 to `JobNotFound`; any other failure
    /// is `Transport`, which the poller treats as retryable.
    pub async fn status(&self, request_id: &str) -> Result<ServiceResponse, FiguraError> {
        let url = format!("{}/status/{request_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.status_timeout)
            .send()
            .await
            .map_err(|e| FiguraError::Transport {
                message: format!("status query failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        match status {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(FiguraError::JobNotFound {
                    request_id: request_id.to_string(),
                });
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let description = error_description(response).await;
                return Err(FiguraError::Unauthorized(format!(
                    "model generator rejected credentials: {description}"
                )));
            }
            s => {
                let description = error_description(response).await;
                return Err(FiguraError::Transport {
                    message: format!("status query returned {s}: {description}"),
                    source: None,
                });
            }
        }

        response
            .json::<ServiceResponse>()
            .await
            .map_err(|e| FiguraError::Transport {
                message: format!("failed to parse status response: {e}"),
                source: Some(Box::new(e)),
            })
    }

    /// Downloads a finished mesh. Relative URLs resolve against the base URL.
    pub async fn download(&self, model_url: &str) -> Result<Vec<u8>, FiguraError> {
        let url = self.resolve_url(model_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.submit_timeout)
            .send()
            .await
            .map_err(|e| FiguraError::Transport {
                message: format!("artifact download failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FiguraError::Transport {
                message: format!("artifact download returned {status} for {url}"),
                source: None,
            });
        }

        let bytes = response.bytes().await.map_err(|e| FiguraError::Transport {
            message: format!("failed to read artifact body: {e}"),
            source: Some(Box::new(e)),
        })?;
        debug!(url = %url, bytes = bytes.len(), "artifact downloaded");
        Ok(bytes.to_vec())
    }

    /// `GET /`; `Ok(status)` whenever the service answered at all.
    pub async fn ping(&self) -> Result<StatusCode, FiguraError> {
        let url = format!("{}/", self.base_url);
        self.client
            .get(&url)
            .timeout(self.status_timeout)
            .send()
            .await
            .map(|r| r.status())
            .map_err(|e| FiguraError::Transport {
                message: format!("model generator unreachable: {e}"),
                source: Some(Box::new(e)),
            })
    }

    fn resolve_url(&self, model_url: &str) -> String {
        if model_url.starts_with("http://") || model_url.starts_with("https://") {
            model_url.to_string()
        } else if model_url.starts_with('/') {
            format!("{}{model_url}", self.base_url)
        } else {
            format!("{}/{model_url}", self.base_url)
        }
    }
}

async fn error_description(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ServiceErrorBody>(&body)
        .ok()
        .and_then(|b| b.description())
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> MeshServiceClient {
        MeshServiceClient::new(&MeshConfig {
            base_url: base_url.to_string(),
            token: Some("svc-token".into()),
            ..MeshConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn generate_sends_bearer_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header("authorization", "Bearer svc-token"))
            .and(body_partial_json(serde_json::json!({"id": "req-1", "image": "aGk="})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "queued",
                "message": "accepted",
                "request_id": "req-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let response = client
            .generate(&GenerateRequest {
                id: "req-1".into(),
                image: "aGk=".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.status, "queued");
        assert_eq!(response.request_id.as_deref(), Some("req-1"));
    }

    #[tokio::test]
    async fn generate_failure_carries_service_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"detail": "Invalid image data"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .generate(&GenerateRequest {
                id: "req-2".into(),
                image: "xx".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FiguraError::Submission { .. }));
        assert!(err.to_string().contains("Invalid image data"), "{err}");
    }

    #[tokio::test]
    async fn status_maps_http_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/gone"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"detail": "Request ID gone not found"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/status/denied"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/status/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(matches!(
            client.status("gone").await,
            Err(FiguraError::JobNotFound { .. })
        ));
        assert!(matches!(
            client.status("denied").await,
            Err(FiguraError::Unauthorized(_))
        ));
        let flaky = client.status("flaky").await.unwrap_err();
        assert!(flaky.is_retryable_poll_error());
    }

    #[tokio::test]
    async fn unreachable_service_is_a_submission_error() {
        let client = test_client("http://127.0.0.1:9");
        let err = client
            .generate(&GenerateRequest {
                id: "r".into(),
                image: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FiguraError::Submission { .. }));
    }

    #[tokio::test]
    async fn download_resolves_relative_urls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/test-1700000000.glb"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"glTF".to_vec()))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let bytes = client.download("/files/test-1700000000.glb").await.unwrap();
        assert_eq!(bytes, b"glTF");

        let absolute = format!("{}/files/test-1700000000.glb", server.uri());
        assert_eq!(client.download(&absolute).await.unwrap(), b"glTF");
    }
}
