use super::retry::RetryPolicy;
use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};
use uuid::Uuid;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

/// Uniform outcome of a backend request
///
/// Handled HTTP failures never escape as a Rust `Err` from the client; they
/// travel here together with the status so the caller can decide how to
/// render them.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub body: Result<T, AppError>,
}

impl<T> ApiResponse<T> {
    pub fn success(status: u16, data: T) -> Self {
        Self {
            status,
            body: Ok(data),
        }
    }

    pub fn failure(error: AppError) -> Self {
        Self {
            status: error.status_code(),
            body: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.body.is_ok()
    }

    pub fn data(&self) -> Option<&T> {
        self.body.as_ref().ok()
    }

    pub fn error(&self) -> Option<&AppError> {
        self.body.as_ref().err()
    }

    /// User-facing error text, if the request failed
    pub fn error_message(&self) -> Option<String> {
        self.error().map(AppError::user_message)
    }

    pub fn into_result(self) -> AppResult<T> {
        self.body
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResponse<U> {
        ApiResponse {
            status: self.status,
            body: self.body.map(f),
        }
    }
}

/// HTTP client for the raffle backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    auth_token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Create a client from API configuration
    pub fn new(config: &ApiConfig) -> Self {
        Self::with_policy(&config.base_url, config.timeout(), RetryPolicy::from(config))
    }

    /// Create a client with an explicit timeout and retry schedule
    pub fn with_policy(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            retry,
            auth_token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Set the session token sent as `Authorization: Bearer ...`
    pub async fn set_auth_token(&self, token: impl Into<String>) {
        *self.auth_token.write().await = Some(token.into());
    }

    pub async fn clear_auth_token(&self) {
        *self.auth_token.write().await = None;
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResponse<T> {
        self.request(endpoint, Method::GET, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ApiResponse<T> {
        match serde_json::to_value(body) {
            Ok(value) => self.request(endpoint, Method::POST, Some(value)).await,
            Err(e) => ApiResponse::failure(e.into()),
        }
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ApiResponse<T> {
        match serde_json::to_value(body) {
            Ok(value) => self.request(endpoint, Method::PATCH, Some(value)).await,
            Err(e) => ApiResponse::failure(e.into()),
        }
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResponse<T> {
        self.request(endpoint, Method::DELETE, None).await
    }

    /// Perform a request, retrying transient failures with exponential backoff
    ///
    /// Network errors, timeouts, 5xx and 408 are retried up to
    /// `max_retries` times. Any other error response is returned at once.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<serde_json::Value>,
    ) -> ApiResponse<T> {
        let mut retry = 0;

        loop {
            match self.send_once::<T>(endpoint, &method, body.as_ref()).await {
                Ok((status, data)) => return ApiResponse::success(status, data),
                Err(err) if err.is_retryable() && retry < self.retry.max_retries => {
                    let delay = self.retry.delay_for(retry);
                    warn!(
                        "{} {} failed ({}), retry {}/{} in {:?}",
                        method, endpoint, err, retry + 1, self.retry.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        error!(
                            "{} {} failed after {} attempts: {}",
                            method,
                            endpoint,
                            retry + 1,
                            err
                        );
                    } else {
                        debug!("{} {} rejected: {}", method, endpoint, err);
                    }
                    return ApiResponse::failure(err);
                }
            }
        }
    }

    /// Perform a single attempt without retries
    pub async fn request_once<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<serde_json::Value>,
    ) -> ApiResponse<T> {
        match self.send_once::<T>(endpoint, &method, body.as_ref()).await {
            Ok((status, data)) => ApiResponse::success(status, data),
            Err(err) => ApiResponse::failure(err),
        }
    }

    /// Quick reachability probe against `/api/nonce`
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/nonce", self.base_url);
        match tokio::time::timeout(HEALTH_CHECK_TIMEOUT, self.http.get(&url).send()).await {
            Ok(Ok(response)) => {
                debug!("Health check status: {}", response.status());
                response.status().is_success()
            }
            Ok(Err(e)) => {
                warn!("Health check failed: {}", e);
                false
            }
            Err(_) => {
                warn!("Health check timed out after {:?}", HEALTH_CHECK_TIMEOUT);
                false
            }
        }
    }

    async fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        if let Some(token) = self.auth_token.read().await.as_deref() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Session token contains invalid header characters, not sent"),
            }
        }

        if let Ok(value) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
            headers.insert("x-request-id", value);
        }

        headers
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: &Method,
        body: Option<&serde_json::Value>,
    ) -> AppResult<(u16, T)> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut builder = self
            .http
            .request(method.clone(), &url)
            .headers(self.headers().await);

        if *method != Method::GET {
            if let Some(body) = body {
                builder = builder.json(body);
            }
        }

        debug!("{} {}", method, url);

        // Dropping the in-flight future on timeout cancels the request
        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        };

        let (status, bytes) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => return Err(AppError::Timeout(self.timeout.as_millis() as u64)),
        };

        let code = status.as_u16();

        if status.is_success() {
            let data = if bytes.iter().all(u8::is_ascii_whitespace) {
                serde_json::from_str("null")?
            } else {
                serde_json::from_slice(&bytes)?
            };
            return Ok((code, data));
        }

        let message = error_message(&bytes);
        if status.is_server_error() || code == 408 {
            Err(AppError::Server {
                status: code,
                message,
            })
        } else {
            Err(AppError::Client {
                status: code,
                message,
            })
        }
    }
}

/// Build an endpoint path from raw segments and query pairs
///
/// Each segment and query value is percent-encoded, so ids containing `/`,
/// `?`, `#` or `&` stay inside their own component.
pub fn endpoint(segments: &[&str], query: &[(&str, &str)]) -> AppResult<String> {
    let mut url = Url::parse("http://endpoint.invalid/")
        .map_err(|e| AppError::Message(format!("Endpoint builder: {}", e)))?;

    url.path_segments_mut()
        .map_err(|_| AppError::Message("Endpoint builder: URL cannot hold a path".to_string()))?
        .clear()
        .extend(segments);

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    let mut path = url.path().to_string();
    if let Some(q) = url.query() {
        path.push('?');
        path.push_str(q);
    }
    Ok(path)
}

/// Pull `error` (or `message`) out of a JSON error body, falling back to raw text
fn error_message(bytes: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(bytes) {
        for key in ["error", "message", "mensaje"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }

    let text = String::from_utf8_lossy(bytes).trim().to_string();
    if text.is_empty() {
        "Request failed".to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(br#"{"error":"Sorteo no encontrado"}"#), "Sorteo no encontrado");
        assert_eq!(error_message(br#"{"message":"bad"}"#), "bad");
        assert_eq!(error_message(b"upstream down"), "upstream down");
        assert_eq!(error_message(b""), "Request failed");
    }

    #[test]
    fn test_endpoint_encodes_segments_and_query() {
        assert_eq!(endpoint(&["sorteos", "r1", "estado"], &[]).unwrap(), "/sorteos/r1/estado");
        assert_eq!(
            endpoint(&["sorteos", "a/b?c#d"], &[]).unwrap(),
            "/sorteos/a%2Fb%3Fc%23d"
        );
        assert_eq!(
            endpoint(&["api", "verify-payment", "tx 1"], &[("reference", "raffle_r1&x=1")]).unwrap(),
            "/api/verify-payment/tx%201?reference=raffle_r1%26x%3D1"
        );
    }

    #[test]
    fn test_response_helpers() {
        let ok: ApiResponse<u32> = ApiResponse::success(200, 5);
        assert!(ok.is_success());
        assert_eq!(ok.data(), Some(&5));
        assert_eq!(ok.map(|n| n * 2).into_result().unwrap(), 10);

        let failed: ApiResponse<u32> = ApiResponse::failure(AppError::Timeout(8000));
        assert_eq!(failed.status, 408);
        assert!(failed.error_message().is_some());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::with_policy("http://localhost:9/", Duration::from_secs(1), RetryPolicy::none());
        assert_eq!(client.base_url(), "http://localhost:9");
    }
}
