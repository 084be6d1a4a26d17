//! HTTP transport seam
//!
//! The engine never speaks HTTP itself. It hands a resolved
//! [`TransportRequest`] to a [`Transport`] and gets back a [`RawReply`].
//! [`ReqwestTransport`] is the default implementation; tests plug in
//! in-memory doubles.

use crate::config::ConfigStore;
use crate::error::{ConfigError, TransportError};
use crate::request::Method;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Fully resolved outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// Reply as received from the wire
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawReply {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Sends one request and returns the reply
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the exchange
    ///
    /// Non-2xx statuses are replies, not errors.
    async fn send(&self, request: TransportRequest) -> Result<RawReply, TransportError>;
}

/// Client settings read from the `transport` config mapping
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportSettings {
    /// Whole-request timeout; none means no bound
    pub timeout: Option<Duration>,
    /// `User-Agent` sent with every request
    pub user_agent: Option<String>,
}

impl TransportSettings {
    /// Read `transport.timeout_secs` and `transport.user_agent`
    ///
    /// A missing `transport` mapping yields defaults.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidTransport` for values of the wrong shape.
    pub fn from_config(config: &ConfigStore) -> Result<Self, ConfigError> {
        let Ok(section) = config.get("transport") else {
            return Ok(Self::default());
        };
        let Value::Object(section) = section else {
            return Err(ConfigError::InvalidTransport(
                "expected a mapping".to_string(),
            ));
        };

        let timeout = match section.get("timeout_secs") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(n.as_u64().map(Duration::from_secs).ok_or_else(
                || ConfigError::InvalidTransport(format!("timeout_secs must be a whole number: {n}")),
            )?),
            Some(Value::String(s)) => Some(Duration::from_secs(s.trim().parse().map_err(
                |_| ConfigError::InvalidTransport(format!("timeout_secs is not a number: {s}")),
            )?)),
            Some(other) => {
                return Err(ConfigError::InvalidTransport(format!(
                    "timeout_secs has unexpected type: {other}"
                )))
            }
        };

        let user_agent = match section.get("user_agent") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(ConfigError::InvalidTransport(format!(
                    "user_agent must be a string: {other}"
                )))
            }
        };

        Ok(Self {
            timeout,
            user_agent,
        })
    }
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client from settings
    ///
    /// # Errors
    /// Returns `TransportError::Setup` if the client cannot be constructed.
    pub fn new(settings: &TransportSettings) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &settings.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        let http = builder
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        Ok(Self { http })
    }

    /// Wrap an existing client
    #[must_use]
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Send(err.to_string())
        }
    }
}

/// Header pairs in wire order; values that are not UTF-8 are decoded lossily
fn reply_headers(headers: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
        Method::Head => reqwest::Method::HEAD,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawReply, TransportError> {
        tracing::debug!("Sending {} {}", request.method, request.url);

        let mut builder = self
            .http
            .request(to_reqwest_method(request.method), request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = reply_headers(response.headers());
        let body = response.bytes().await?.to_vec();

        Ok(RawReply {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reply_headers_keep_non_utf8_values() {
        use reqwest::header::{HeaderMap, HeaderValue};

        let mut headers = HeaderMap::new();
        headers.insert("x-plain", HeaderValue::from_static("ok"));
        headers.insert("x-latin1", HeaderValue::from_bytes(b"caf\xe9").unwrap());

        let pairs = reply_headers(&headers);
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&("x-plain".to_string(), "ok".to_string())));
        assert!(pairs.contains(&("x-latin1".to_string(), "caf\u{fffd}".to_string())));
    }

    #[test]
    fn settings_default_without_section() {
        let config = ConfigStore::new(json!({"host": {"hostname": "h"}}));
        assert_eq!(
            TransportSettings::from_config(&config).unwrap(),
            TransportSettings::default()
        );
    }

    #[test]
    fn settings_read_numbers_and_strings() {
        let config = ConfigStore::new(json!({
            "transport": {"timeout_secs": "15", "user_agent": "routest/0.1"}
        }));
        let settings = TransportSettings::from_config(&config).unwrap();
        assert_eq!(settings.timeout, Some(Duration::from_secs(15)));
        assert_eq!(settings.user_agent.as_deref(), Some("routest/0.1"));

        let config = ConfigStore::new(json!({"transport": {"timeout_secs": 3}}));
        let settings = TransportSettings::from_config(&config).unwrap();
        assert_eq!(settings.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn settings_reject_bad_shapes() {
        let config = ConfigStore::new(json!({"transport": {"timeout_secs": "soon"}}));
        assert!(matches!(
            TransportSettings::from_config(&config),
            Err(ConfigError::InvalidTransport(_))
        ));

        let config = ConfigStore::new(json!({"transport": 5}));
        assert!(TransportSettings::from_config(&config).is_err());
    }

    #[test]
    fn client_builds_from_settings() {
        let settings = TransportSettings {
            timeout: Some(Duration::from_secs(1)),
            user_agent: Some("routest-test".to_string()),
        };
        assert!(ReqwestTransport::new(&settings).is_ok());
    }
}
