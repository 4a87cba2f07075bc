//! Gateway HTTP Client - Paced REST Client
//!
//! Wraps reqwest with request pacing, a concurrency cap and retries for
//! every call to the order-book gateway. Responses are JSON envelopes;
//! this layer only deals with transport and status codes.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::errors::{SdkError, SdkResult};

/// Configuration for the gateway HTTP client.
#[derive(Debug, Clone)]
pub struct GatewayClientConfig {
  /// Base URL of the gateway, without trailing slash.
  pub base_url: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum concurrent requests.
  pub max_concurrent: usize,
  /// Sustained requests per second.
  pub requests_per_second: u32,
  /// Maximum retries on 429 and 5xx.
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
}

impl Default for GatewayClientConfig {
  fn default() -> Self {
    Self {
      base_url: "https://api.market.iex.ec".to_string(),
      timeout: Duration::from_secs(30),
      max_concurrent: 4,
      requests_per_second: 5,
      max_retries: 3,
      retry_base_delay: Duration::from_millis(250),
    }
  }
}

/// Paced HTTP client for the gateway.
pub struct GatewayClient {
  http: Client,
  config: GatewayClientConfig,
  semaphore: Arc<Semaphore>,
  limiter: DefaultDirectRateLimiter,
}

impl GatewayClient {
  pub fn new(config: GatewayClientConfig) -> SdkResult<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(5)
      .build()
      .map_err(|e| SdkError::Gateway(format!("failed to build HTTP client: {e}")))?;

    let per_second = NonZeroU32::new(config.requests_per_second)
      .ok_or_else(|| SdkError::configuration("gateway requests_per_second must be positive"))?;

    Ok(Self {
      http,
      semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
      limiter: RateLimiter::direct(Quota::per_second(per_second)),
      config,
    })
  }

  pub fn base_url(&self) -> &str {
    &self.config.base_url
  }

  pub async fn get(&self, path: &str, query: &[(String, String)], auth: Option<&str>) -> SdkResult<Value> {
    let url = format!("{}{}", self.config.base_url, path);
    let mut request = self.http.get(&url).query(query);
    if let Some(auth) = auth {
      request = request.header("Authorization", auth);
    }
    self.execute_with_retry(request, "GET", path).await
  }

  /// GET where a 404 means "no such resource" rather than an error.
  pub async fn get_optional(
    &self,
    path: &str,
    query: &[(String, String)],
    auth: Option<&str>,
  ) -> SdkResult<Option<Value>> {
    let url = format!("{}{}", self.config.base_url, path);
    let mut request = self.http.get(&url).query(query);
    if let Some(auth) = auth {
      request = request.header("Authorization", auth);
    }
    let (status, body) = self.send_with_retry(request, "GET", path).await?;
    if status == StatusCode::NOT_FOUND {
      debug!(path, "Gateway resource not found");
      return Ok(None);
    }
    decode_body(status, &body, "GET", path).map(Some)
  }

  pub async fn post(&self, path: &str, body: &Value, auth: Option<&str>) -> SdkResult<Value> {
    let url = format!("{}{}", self.config.base_url, path);
    let mut request = self.http.post(&url).json(body);
    if let Some(auth) = auth {
      request = request.header("Authorization", auth);
    }
    self.execute_with_retry(request, "POST", path).await
  }

  pub async fn delete(&self, path: &str, query: &[(String, String)], auth: Option<&str>) -> SdkResult<Value> {
    let url = format!("{}{}", self.config.base_url, path);
    let mut request = self.http.delete(&url).query(query);
    if let Some(auth) = auth {
      request = request.header("Authorization", auth);
    }
    self.execute_with_retry(request, "DELETE", path).await
  }

  async fn execute_with_retry(&self, request: RequestBuilder, method: &str, path: &str) -> SdkResult<Value> {
    let (status, body) = self.send_with_retry(request, method, path).await?;
    decode_body(status, &body, method, path)
  }

  /// Send with pacing, the concurrency cap and retries on 429 and 5xx.
  async fn send_with_retry(
    &self,
    request: RequestBuilder,
    method: &str,
    path: &str,
  ) -> SdkResult<(StatusCode, String)> {
    let _permit = self
      .semaphore
      .acquire()
      .await
      .map_err(|_| SdkError::Gateway("request semaphore closed".into()))?;

    let mut last_error = None;

    for attempt in 0..=self.config.max_retries {
      if attempt > 0 {
        let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
        debug!(attempt, delay_ms = delay.as_millis(), "Retrying request");
        sleep(delay).await;
      }

      self.limiter.until_ready().await;

      let req = request
        .try_clone()
        .ok_or_else(|| SdkError::Gateway("request body cannot be retried".into()))?;

      match req.send().await {
        Ok(response) => match response.status() {
          StatusCode::TOO_MANY_REQUESTS => {
            warn!(method, path, "Rate limited by gateway, backing off");
            last_error = Some(SdkError::Gateway("rate limited".into()));
          }
          status if status.is_server_error() => {
            warn!(status = %status, method, path, "Gateway server error, retrying");
            last_error = Some(SdkError::Gateway(format!("server error {status}")));
          }
          status => {
            let body = response
              .text()
              .await
              .map_err(|e| SdkError::Gateway(format!("failed to read response: {e}")))?;
            return Ok((status, body));
          }
        },
        Err(e) => {
          warn!(error = %e, attempt, method, path, "Request failed");
          last_error = Some(SdkError::Gateway(e.to_string()));
        }
      }
    }

    Err(last_error.unwrap_or_else(|| SdkError::Gateway("max retries exceeded".into())))
  }
}

/// Parse a response body as JSON.
///
/// 4xx other than 429 are returned as-is when the body is JSON, so the
/// envelope's `error` reaches the caller.
fn decode_body(status: StatusCode, body: &str, method: &str, path: &str) -> SdkResult<Value> {
  serde_json::from_str(body).map_err(|_| SdkError::Gateway(format!("{method} {path} returned {status}: {body}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_decode_keeps_json_error_envelope() {
    let value = decode_body(StatusCode::BAD_REQUEST, r#"{"ok":false,"error":"invalid sign"}"#, "POST", "/apporders").unwrap();
    assert_eq!(value["error"], "invalid sign");
  }

  #[test]
  fn test_decode_rejects_non_json_body() {
    let err = decode_body(StatusCode::NOT_FOUND, "Not Found", "GET", "/apporders/0x01").unwrap_err();
    assert_eq!(err.name(), "GatewayError");
    assert!(err.to_string().contains("404"));
  }

  #[tokio::test]
  async fn test_not_found_is_absent() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut buf = [0u8; 1024];
      let _ = socket.read(&mut buf).await.unwrap();
      socket
        .write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 9\r\nconnection: close\r\n\r\nNot Found")
        .await
        .unwrap();
    });

    let client = GatewayClient::new(GatewayClientConfig {
      base_url: format!("http://{address}"),
      ..GatewayClientConfig::default()
    })
    .unwrap();
    let found = client.get_optional("/apporders/0x01", &[], None).await.unwrap();
    assert!(found.is_none());
  }
}
