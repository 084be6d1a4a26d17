//! Recorded HTTP exchanges

use crate::parameters::ParameterStore;
use crate::transport::RawReply;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Snapshot of one completed exchange
///
/// Holds the reply plus the query pairs of the request that produced it, and
/// a parameter index built from both so later requests can reuse them.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    status_code: u16,
    status_text: String,
    headers: Vec<(String, String)>,
    body: Arc<[u8]>,
    request_query: Vec<(String, String)>,
    parameters: ParameterStore,
    received_at: DateTime<Utc>,
}

impl ResponseRecord {
    /// Build from a transport reply and the originating request's query
    #[must_use]
    pub fn from_reply(reply: RawReply, request_query: Vec<(String, String)>) -> Self {
        let record = Self {
            status_code: reply.status,
            status_text: reply.status_text,
            headers: reply.headers,
            body: Arc::from(reply.body),
            request_query,
            parameters: ParameterStore::new(),
            received_at: Utc::now(),
        };
        record.parameters.import_from_response(&record);
        record
    }

    #[inline]
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    #[inline]
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Check for a 2xx status
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    #[inline]
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value for a case-insensitive header name
    #[must_use]
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_value("content-type")
    }

    #[inline]
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8, lossy
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body
    ///
    /// # Errors
    /// Returns the JSON error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    /// Body as an untyped JSON value
    ///
    /// # Errors
    /// Returns the JSON error if the body is not JSON.
    pub fn json_value(&self) -> serde_json::Result<serde_json::Value> {
        self.json()
    }

    /// Query pairs of the request that produced this reply
    #[inline]
    #[must_use]
    pub fn request_query(&self) -> &[(String, String)] {
        &self.request_query
    }

    /// Parameters imported from the exchange
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    #[inline]
    #[must_use]
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Copy with one header set, replacing any same-named value
    ///
    /// The parameter index is rebuilt from the new headers.
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
        self.headers.push((key.to_string(), value.to_string()));

        let parameters = ParameterStore::new();
        parameters.import_from_response(&self);
        self.parameters = parameters;
        self
    }

    /// Copy with the body replaced
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Arc::from(body.into());
        self
    }
}
