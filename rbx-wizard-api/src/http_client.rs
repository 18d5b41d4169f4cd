//! Resource client
//!
//! One entry point, [`ApiClient::request`], shared by every typed service.
//!
//! # Contract
//! - **URL** - `path` is appended to the configured base URL; query pairs are appended in order
//! - **Headers** - the configured default set, overridable per call (case-insensitive)
//! - **Deadline** - the configured timeout unless the call opts out; on expiry the transfer is
//!   dropped (aborted) and [`ApiError::Timeout`] is returned
//! - **Errors** - non-success statuses become [`ApiError::HttpStatus`] with a normalized message
//! - **Bodies** - JSON content is parsed, anything else is returned as raw text

use std::future::Future;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::utils::log_sanitizer::truncate_for_log;

/// Fallback used when an error body parses as JSON but carries no usable message.
const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// Per-request deadline policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestTimeout {
    /// Use the client's configured timeout.
    #[default]
    Default,
    /// Use a specific deadline for this request.
    After(Duration),
    /// Wait indefinitely (long-running review calls).
    Disabled,
}

/// Optional parts of a request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters, appended in order.
    pub query: Vec<(String, String)>,
    /// Header overrides for this call.
    pub headers: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<Value>,
    /// Deadline policy.
    pub timeout: RequestTimeout,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query parameter; the value is coerced to a string.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Override (or add) a header for this call.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::SerializationError {
            detail: e.to_string(),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = RequestTimeout::After(timeout);
        self
    }

    /// Opt out of the deadline entirely.
    #[must_use]
    pub fn no_timeout(mut self) -> Self {
        self.timeout = RequestTimeout::Disabled;
        self
    }
}

/// A successful response body.
///
/// The shape depends on the declared content type, so callers must check it.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// The response declared a JSON content type.
    Json(Value),
    /// Any other content type.
    Text(String),
}

impl ResponseBody {
    /// Decode a JSON body into `T`.
    ///
    /// A text body or a JSON body of the wrong shape is an [`ApiError::UnexpectedBody`].
    pub fn into_json<T: DeserializeOwned>(self, path: &str) -> Result<T> {
        match self {
            Self::Json(value) => serde_json::from_value(value).map_err(|e| {
                log::error!("[{path}] Response shape mismatch: {e}");
                ApiError::UnexpectedBody {
                    path: path.to_string(),
                    detail: e.to_string(),
                }
            }),
            Self::Text(text) => Err(ApiError::UnexpectedBody {
                path: path.to_string(),
                detail: format!(
                    "expected JSON, received text: {}",
                    truncate_for_log(&text)
                ),
            }),
        }
    }

    /// The body as text; a JSON string is unwrapped, other JSON is re-serialized.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Json(Value::String(text)) | Self::Text(text) => text,
            Self::Json(value) => value.to_string(),
        }
    }
}

/// HTTP client bound to one backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Use an existing `reqwest` client (shared connection pool, proxies, ...).
    #[must_use]
    pub fn with_http_client(http: reqwest::Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Issue a request and normalize the outcome.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<ResponseBody> {
        let url = self.build_url(path, &options.query)?;
        log::debug!("{method} {url}");

        let mut builder = self.http.request(method, url);
        for (name, value) in merge_headers(&self.config.default_headers, &options.headers) {
            builder = builder.header(name, value);
        }
        if let Some(body) = &options.body {
            let bytes = serde_json::to_vec(body).map_err(|e| ApiError::SerializationError {
                detail: e.to_string(),
            })?;
            builder = builder.body(bytes);
        }

        let deadline = match options.timeout {
            RequestTimeout::Default => Some(self.config.timeout),
            RequestTimeout::After(limit) => Some(limit),
            RequestTimeout::Disabled => None,
        };

        with_deadline(deadline, path, execute(builder, path)).await
    }

    /// `GET` a JSON resource.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, RequestOptions::new())
            .await?
            .into_json(path)
    }

    /// Send `body` as JSON with `method` and decode a JSON response.
    pub async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let options = RequestOptions::new().json(body)?;
        self.request(method, path, options).await?.into_json(path)
    }

    fn build_url(&self, path: &str, query: &[(String, String)]) -> Result<url::Url> {
        let raw = format!("{}{path}", self.config.base_url);
        let mut url = url::Url::parse(&raw).map_err(|e| ApiError::NetworkError {
            path: path.to_string(),
            detail: format!("Invalid URL '{raw}': {e}"),
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// Race `exchange` against an optional deadline.
///
/// Losing the race drops the exchange future, which aborts the in-flight transfer.
async fn with_deadline<F>(deadline: Option<Duration>, path: &str, exchange: F) -> Result<ResponseBody>
where
    F: Future<Output = Result<ResponseBody>>,
{
    let Some(limit) = deadline else {
        return exchange.await;
    };
    if let Ok(outcome) = tokio::time::timeout(limit, exchange).await {
        outcome
    } else {
        let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
        log::warn!("[{path}] Request aborted after {timeout_ms}ms");
        Err(ApiError::Timeout {
            path: path.to_string(),
            timeout_ms,
        })
    }
}

/// Send the request, read the body, and classify it.
async fn execute(builder: RequestBuilder, path: &str) -> Result<ResponseBody> {
    let response = builder.send().await.map_err(|e| {
        log::error!("[{path}] Transport failure: {e}");
        ApiError::NetworkError {
            path: path.to_string(),
            detail: e.to_string(),
        }
    })?;

    let status = response.status();
    log::debug!("[{path}] Response Status: {status}");

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let text = response.text().await.map_err(|e| ApiError::NetworkError {
        path: path.to_string(),
        detail: format!("Failed to read response body: {e}"),
    })?;
    log::debug!("[{path}] Response Body: {}", truncate_for_log(&text));

    if !status.is_success() {
        let message = error_message(status, &text);
        if status.is_client_error() {
            log::warn!("[{path}] HTTP {}: {message}", status.as_u16());
        } else {
            log::error!("[{path}] HTTP {}: {message}", status.as_u16());
        }
        return Err(ApiError::HttpStatus {
            path: path.to_string(),
            status: status.as_u16(),
            message,
        });
    }

    decode_body(path, content_type.as_deref(), text)
}

fn decode_body(path: &str, content_type: Option<&str>, text: String) -> Result<ResponseBody> {
    if !content_type.is_some_and(is_json_content_type) {
        return Ok(ResponseBody::Text(text));
    }
    if text.trim().is_empty() {
        return Ok(ResponseBody::Json(Value::Null));
    }
    serde_json::from_str(&text)
        .map(ResponseBody::Json)
        .map_err(|e| {
            log::error!("[{path}] JSON parse failed: {e}");
            log::error!("[{path}] Raw response: {}", truncate_for_log(&text));
            ApiError::ParseError {
                path: path.to_string(),
                detail: e.to_string(),
            }
        })
}

/// Normalize an error body into one message.
///
/// Recognizes `{"message": ...}` and `{"detail": ...}` bodies; a body that is not JSON
/// yields a message synthesized from the status line.
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => message_field(&value, "message")
            .or_else(|| message_field(&value, "detail"))
            .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
        Err(_) => format!(
            "HTTP Error {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        ),
    }
}

fn message_field(value: &Value, field: &str) -> Option<String> {
    match value.get(field)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Default headers overridden by per-call headers with the same (case-insensitive) name.
fn merge_headers(
    defaults: &[(String, String)],
    overrides: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = defaults
        .iter()
        .filter(|(name, _)| {
            !overrides
                .iter()
                .any(|(other, _)| other.eq_ignore_ascii_case(name))
        })
        .cloned()
        .collect();
    merged.extend(overrides.iter().cloned());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- error_message ----

    #[test]
    fn error_message_prefers_message_field() {
        let msg = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"message":"bad input","detail":"ignored"}"#,
        );
        assert_eq!(msg, "bad input");
    }

    #[test]
    fn error_message_reads_detail_field() {
        let msg = error_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail":"boom"}"#);
        assert_eq!(msg, "boom");
    }

    #[test]
    fn error_message_serializes_structured_detail() {
        let msg = error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"loc":["body","code"],"msg":"field required"}]}"#,
        );
        assert!(msg.contains("field required"));
    }

    #[test]
    fn error_message_generic_when_no_known_field() {
        let msg = error_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"x"}"#);
        assert_eq!(msg, GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn error_message_synthesized_from_status_when_not_json() {
        let msg = error_message(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(msg, "HTTP Error 502: Bad Gateway");
    }

    // ---- content type ----

    #[test]
    fn json_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/markdown"));
        assert!(!is_json_content_type("text/plain; charset=utf-8"));
    }

    #[test]
    fn decode_text_body() {
        let body = decode_body("/llm/review", Some("text/plain"), "# Report".to_string());
        assert!(matches!(body, Ok(ResponseBody::Text(ref t)) if t == "# Report"));
    }

    #[test]
    fn decode_missing_content_type_is_text() {
        let body = decode_body("/x", None, "{\"a\":1}".to_string());
        assert!(matches!(body, Ok(ResponseBody::Text(_))));
    }

    #[test]
    fn decode_invalid_json_is_parse_error() {
        let body = decode_body("/x", Some("application/json"), "not json".to_string());
        assert!(matches!(body, Err(ApiError::ParseError { .. })));
    }

    // ---- headers ----

    #[test]
    fn merge_headers_overrides_case_insensitively() {
        let defaults = vec![("Content-Type".to_string(), "application/json".to_string())];
        let overrides = vec![
            ("content-type".to_string(), "text/plain".to_string()),
            ("X-Trace".to_string(), "1".to_string()),
        ];
        let merged = merge_headers(&defaults, &overrides);
        assert_eq!(merged.len(), 2);
        assert!(merged.contains(&("content-type".to_string(), "text/plain".to_string())));
        assert!(!merged.iter().any(|(n, _)| n == "Content-Type"));
    }

    // ---- url ----

    #[test]
    fn build_url_appends_query_in_order() {
        let client = ApiClient::new(ClientConfig::new("http://localhost:8000"));
        let url = client
            .build_url(
                "/statements",
                &RequestOptions::new()
                    .query("page", 2)
                    .query("draft", true)
                    .query("q", "a b")
                    .query,
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/statements?page=2&draft=true&q=a+b"
        );
    }

    #[test]
    fn build_url_without_query_has_no_question_mark() {
        let client = ApiClient::new(ClientConfig::default());
        let url = client.build_url("/validator", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/validator");
    }

    // ---- body helpers ----

    #[test]
    fn into_text_unwraps_json_string() {
        let body = ResponseBody::Json(Value::String("## Review".to_string()));
        assert_eq!(body.into_text(), "## Review");
    }

    #[test]
    fn into_json_rejects_text() {
        let body = ResponseBody::Text("plain".to_string());
        let result: Result<Value> = body.into_json("/statements");
        assert!(matches!(result, Err(ApiError::UnexpectedBody { .. })));
    }

    #[tokio::test]
    async fn deadline_elapsed_is_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ResponseBody::Text(String::new()))
        };
        let result = with_deadline(Some(Duration::from_millis(10)), "/statements", slow).await;
        assert!(
            matches!(&result, Err(ApiError::Timeout { timeout_ms: 10, .. })),
            "unexpected result: {result:?}"
        );
    }

    #[tokio::test]
    async fn disabled_deadline_waits() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(ResponseBody::Text("done".to_string()))
        };
        let result = with_deadline(None, "/llm/review", slow).await;
        assert!(matches!(result, Ok(ResponseBody::Text(ref t)) if t == "done"));
    }
}
