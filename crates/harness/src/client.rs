//! HTTP request execution against the service under test

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::{HarnessConfig, ORGANIZER_HEADER};
use crate::error::{HarnessError, HarnessResult};
use crate::model::{Items, ResponseId};

/// The capability controllers are built on: send one request, get one response.
///
/// Implementations never assert on the status and never retry.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> HarnessResult<ApiResponse>;

    async fn get(&self, path: &str) -> HarnessResult<ApiResponse> {
        self.execute(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> HarnessResult<ApiResponse> {
        self.execute(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: Value) -> HarnessResult<ApiResponse> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> HarnessResult<ApiResponse> {
        self.execute(Method::DELETE, path, None).await
    }
}

/// Serialize a request payload for [`RequestExecutor`]
pub fn json_body<B: Serialize>(body: &B) -> HarnessResult<Value> {
    Ok(serde_json::to_value(body)?)
}

/// Everything observed about one round-trip
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.body.contains(needle)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Fail with [`HarnessError::ContractMismatch`] unless the status matches
    pub fn expect_status(self, expected: StatusCode) -> HarnessResult<Self> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(HarnessError::ContractMismatch {
                method: self.method.to_string(),
                path: self.path,
                expected: expected.as_u16(),
                actual: self.status.as_u16(),
                body: self.body,
            })
        }
    }

    pub fn expect_ok(self) -> HarnessResult<Self> {
        self.expect_status(StatusCode::OK)
    }

    /// Deserialize the body as `T`
    pub fn json<T: DeserializeOwned>(&self) -> HarnessResult<T> {
        serde_json::from_str(&self.body).map_err(|e| self.payload_error(e.to_string()))
    }

    /// Unwrap a `{ "items": [...] }` collection body
    pub fn items<T: DeserializeOwned>(&self) -> HarnessResult<Vec<T>> {
        Ok(self.json::<Items<T>>()?.items)
    }

    /// Extract the identifier a create call returned
    pub fn response_id(&self) -> HarnessResult<ResponseId> {
        let id: ResponseId = self.json()?;
        if id.id.is_empty() {
            return Err(self.payload_error("empty id in create response".into()));
        }
        Ok(id)
    }

    pub(crate) fn payload_error(&self, reason: String) -> HarnessError {
        HarnessError::Payload {
            method: self.method.to_string(),
            path: self.path.clone(),
            reason,
            body: self.body.clone(),
        }
    }
}

/// reqwest-backed executor bound to one base URI and fixed default headers.
///
/// Immutable after construction; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct RequestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RequestClient {
    /// Build a client; without `timeout` a request waits as long as the service takes
    pub fn new(
        base_url: impl Into<String>,
        headers: HeaderMap,
        timeout: Option<Duration>,
    ) -> HarnessResult<Self> {
        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| HarnessError::Config(format!("building HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &HarnessConfig) -> HarnessResult<Self> {
        let headers = default_headers(config)?;
        Self::new(config.base_url(), headers, config.http.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RequestExecutor for RequestClient {
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> HarnessResult<ApiResponse> {
        let transport = |source| HarnessError::Transport {
            method: method.to_string(),
            path: path.to_string(),
            source,
        };

        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(body) = &body {
            trace!("{} {} body: {}", method, path, body);
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(transport)?;

        debug!("{} {} -> {}", method, path, status);
        trace!("{} {} response: {}", method, path, text);

        Ok(ApiResponse {
            method,
            path: path.to_string(),
            status,
            headers,
            body: text,
        })
    }
}

/// JSON content type, the organizer identity header, and configured extras
pub fn default_headers(config: &HarnessConfig) -> HarnessResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static("x-goog-authenticated-user-id"),
        header_value(ORGANIZER_HEADER, &config.http.organizer_id)?,
    );

    for (name, value) in &config.http.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HarnessError::Config(format!("invalid header name '{name}': {e}")))?;
        let value = header_value(name.as_str(), value)?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn header_value(name: &str, value: &str) -> HarnessResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| HarnessError::Config(format!("invalid value for header {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Raffle;

    const RAFFLE_JSON: &str = r#"{"id":"r1","name":"abc12","note":"xyz34"}"#;

    fn response(status: StatusCode, body: &str) -> ApiResponse {
        ApiResponse {
            method: Method::GET,
            path: "/api/raffles".into(),
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    #[test]
    fn test_default_headers() {
        let mut config = HarnessConfig::default();
        config.http.headers.insert("X-Test-Run".into(), "42".into());
        let headers = default_headers(&config).unwrap();

        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(headers.get(ORGANIZER_HEADER).unwrap(), "dummy_test_user");
        assert_eq!(headers.get("x-test-run").unwrap(), "42");
    }

    #[test]
    fn test_rejects_bad_header_name() {
        let mut config = HarnessConfig::default();
        config.http.headers.insert("bad header".into(), "1".into());
        assert!(matches!(default_headers(&config), Err(HarnessError::Config(_))));
    }

    #[test]
    fn test_expect_status_carries_body() {
        let err = response(StatusCode::INTERNAL_SERVER_ERROR, "boom").expect_ok().unwrap_err();
        match err {
            HarnessError::ContractMismatch { expected, actual, body, path, .. } => {
                assert_eq!(expected, 200);
                assert_eq!(actual, 500);
                assert_eq!(body, "boom");
                assert_eq!(path, "/api/raffles");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_response_id_requires_value() {
        let ok = response(StatusCode::OK, r#"{"id":"abc"}"#);
        assert_eq!(ok.response_id().unwrap().id, "abc");

        let empty = response(StatusCode::OK, r#"{"id":""}"#);
        assert!(matches!(empty.response_id(), Err(HarnessError::Payload { .. })));

        let garbage = response(StatusCode::OK, "not json");
        assert!(matches!(garbage.response_id(), Err(HarnessError::Payload { .. })));
    }

    #[test]
    fn test_items_require_envelope_key() {
        let listed = response(StatusCode::OK, &format!(r#"{{"items":[{RAFFLE_JSON}]}}"#));
        assert_eq!(listed.items::<Raffle>().unwrap().len(), 1);

        let empty = response(StatusCode::OK, r#"{"items":null}"#);
        assert!(empty.items::<Raffle>().unwrap().is_empty());

        let renamed = response(StatusCode::OK, &format!(r#"{{"data":[{RAFFLE_JSON}]}}"#));
        assert!(matches!(renamed.items::<Raffle>(), Err(HarnessError::Payload { .. })));
    }

    #[test]
    fn test_base_url_normalized() {
        let client = RequestClient::new(
            "http://localhost:8081/",
            HeaderMap::new(),
            Some(Duration::from_secs(1)),
        )
        .unwrap();
        assert_eq!(client.url("/api/raffles"), "http://localhost:8081/api/raffles");
    }
}
