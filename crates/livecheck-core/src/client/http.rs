use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{redact_token, HttpClient, HttpResponse, TransportError};
use crate::error::CheckError;

/// reqwest-backed [`HttpClient`] with a bounded per-request timeout.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self, CheckError> {
        Ok(Self::with_client(Self::build_client(timeout)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &crate::config::CheckerConfig) -> Result<Self, CheckError> {
        Self::new(config.request_timeout)
    }

    pub fn build_client(timeout: Duration) -> Result<Client, CheckError> {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .gzip(true)
            .build()
            .map_err(|e| CheckError::Config(format!("Failed to build HTTP client: {e}")))
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(url, e))?;

        debug!(status, bytes = body.len(), "Streams response received");
        Ok(HttpResponse { status, body })
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> TransportError {
    let url = redact_token(url);
    let e = e.without_url();
    if e.is_timeout() {
        warn!(%url, "Streams request timed out");
        TransportError::Timeout { url }
    } else {
        warn!(%url, error = %e, "Streams request network error");
        TransportError::Network {
            url,
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_returns_body_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/streams"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"streams":[]}"#))
            .mount(&server)
            .await;

        let client = ReqwestClient::new(Duration::from_secs(5)).unwrap();
        let response = client
            .get(&format!("{}/streams", server.uri()))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert!(response.is_success());
        assert_eq!(response.body, r#"{"streams":[]}"#);
    }

    #[tokio::test]
    async fn get_passes_error_status_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/streams"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":"Unauthorized"}"#))
            .mount(&server)
            .await;

        let client = ReqwestClient::new(Duration::from_secs(5)).unwrap();
        let response = client
            .get(&format!("{}/streams", server.uri()))
            .await
            .unwrap();
        assert_eq!(response.status, 401);
        assert!(!response.is_success());
        assert!(response.body.contains("Unauthorized"));
    }

    #[tokio::test]
    async fn get_sends_exactly_one_request_on_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/streams"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = ReqwestClient::new(Duration::from_secs(5)).unwrap();
        let response = client
            .get(&format!("{}/streams", server.uri()))
            .await
            .unwrap();
        assert_eq!(response.status, 500);
    }

    #[tokio::test]
    async fn get_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"streams":[]}"#)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = ReqwestClient::new(Duration::from_millis(200)).unwrap();
        let err = client
            .get(&format!("{}/slow", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_timeout(), "{:?}", err);
    }

    #[tokio::test]
    async fn get_reports_connection_failure() {
        let client = ReqwestClient::new(Duration::from_secs(2)).unwrap();
        let err = client.get("http://127.0.0.1:1/streams").await.unwrap_err();
        assert!(matches!(err, TransportError::Network { .. }), "{:?}", err);
    }

    #[tokio::test]
    async fn transport_errors_do_not_leak_token() {
        let client = ReqwestClient::new(Duration::from_secs(2)).unwrap();
        let err = client
            .get("http://127.0.0.1:1/streams?channel=a&oauth_token=hunter2")
            .await
            .unwrap_err();
        assert!(!err.to_string().contains("hunter2"), "{}", err);
    }
}
