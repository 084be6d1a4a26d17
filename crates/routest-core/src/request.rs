//! Outgoing request drafts
//!
//! Before-hooks and parameter export act on an [`HttpRequest`]: a method, a
//! base URL, a path template that may still contain `{key}` placeholders,
//! query pairs, headers and an optional body. [`HttpRequest::to_transport`]
//! resolves it into the wire form the transport sends.

use crate::error::{TransportError, ValidationError};
use crate::transport::TransportRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl Method {
    /// Uppercase wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
        }
    }
}

impl FromStr for Method {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            "HEAD" => Ok(Self::Head),
            _ => Err(ValidationError::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload with its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    /// Raw bytes
    pub content: Vec<u8>,
    /// `Content-Type` header value
    pub content_type: String,
}

impl RequestBody {
    /// JSON body from a value
    #[must_use]
    pub fn json(value: &serde_json::Value) -> Self {
        Self {
            content: value.to_string().into_bytes(),
            content_type: "application/json".to_string(),
        }
    }

    /// Plain text body
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: text.into().into_bytes(),
            content_type: "text/plain; charset=utf-8".to_string(),
        }
    }
}

/// Request draft before URL resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: Method,
    base_url: String,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Create new draft
    ///
    /// A `?query` suffix on `path` is split off into query pairs.
    #[must_use]
    pub fn new(method: Method, base_url: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (
                path.to_string(),
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect(),
            ),
            None => (path, Vec::new()),
        };

        Self {
            method,
            base_url: base_url.into(),
            path,
            query,
            headers: Vec::new(),
            body: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Path template, with any substitutions applied so far
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded query pairs in order
    #[inline]
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    #[inline]
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[inline]
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Replace the method
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// Append a query pair; existing pairs with the same key stay
    pub fn append_query(&mut self, key: &str, value: &str) {
        self.query.push((key.to_string(), value.to_string()));
    }

    /// Replace every literal `{key}` in the path with `value`
    pub fn substitute_path(&mut self, key: &str, value: &str) {
        let placeholder = format!("{{{key}}}");
        if self.path.contains(&placeholder) {
            self.path = self.path.replace(&placeholder, value);
        }
    }

    /// Set a header, replacing any value under the same case-insensitive name
    pub fn set_header(&mut self, key: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
        self.headers.push((key.to_string(), value.to_string()));
    }

    /// Add a header without removing existing values
    pub fn add_header(&mut self, key: &str, value: &str) {
        self.headers.push((key.to_string(), value.to_string()));
    }

    /// Last value for a case-insensitive header name
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Set the body and its `Content-Type`
    pub fn set_body(&mut self, body: RequestBody) {
        self.set_header("Content-Type", &body.content_type);
        self.body = Some(body.content);
    }

    /// Resolve into the wire request
    ///
    /// Path segments are appended to the base URL one by one, so characters
    /// such as `?`, `#` or `%` in a substituted value stay inside their
    /// segment, percent-encoded.
    ///
    /// # Errors
    /// Returns `TransportError::InvalidUrl` if base URL and path do not form a
    /// valid absolute URL.
    pub fn to_transport(&self) -> Result<TransportRequest, TransportError> {
        let mut url = self.resolve_url()?;

        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        Ok(TransportRequest {
            method: self.method,
            url,
            headers: self.headers.clone(),
            body: self.body.clone(),
        })
    }

    fn resolve_url(&self) -> Result<Url, TransportError> {
        let invalid = |url: &str, message: String| TransportError::InvalidUrl {
            url: url.to_string(),
            message,
        };

        if self.path.starts_with("http://") || self.path.starts_with("https://") {
            return Url::parse(&self.path).map_err(|e| invalid(&self.path, e.to_string()));
        }

        let mut url =
            Url::parse(&self.base_url).map_err(|e| invalid(&self.base_url, e.to_string()))?;
        if self.path.is_empty() {
            return Ok(url);
        }

        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                invalid(&self.base_url, "base URL cannot carry a path".to_string())
            })?;
            segments.pop_if_empty();
            for segment in self.path.trim_start_matches('/').split('/') {
                segments.push(segment);
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn method_parsing() {
        assert_eq!("post".parse::<Method>().unwrap(), Method::Post);
        assert_eq!(" Delete ".parse::<Method>().unwrap(), Method::Delete);
        assert_eq!(
            "FETCH".parse::<Method>(),
            Err(ValidationError::InvalidMethod("FETCH".to_string()))
        );
    }

    #[test]
    fn path_query_is_split() {
        let request = HttpRequest::new(Method::Get, "http://h", "/items?sort=asc&tag=a%20b");
        assert_eq!(request.path(), "/items");
        assert_eq!(
            request.query(),
            &[
                ("sort".to_string(), "asc".to_string()),
                ("tag".to_string(), "a b".to_string())
            ]
        );
    }

    #[test]
    fn substitution_is_literal() {
        let mut request = HttpRequest::new(Method::Get, "http://h", "/a/{id}/b/{id}/{other}");
        request.substitute_path("id", "7");
        assert_eq!(request.path(), "/a/7/b/7/{other}");
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut request = HttpRequest::new(Method::Get, "http://h", "/");
        request.set_header("Accept", "text/plain");
        request.add_header("X-Multi", "1");
        request.add_header("X-Multi", "2");
        request.set_header("accept", "application/json");

        assert_eq!(request.header("ACCEPT"), Some("application/json"));
        assert_eq!(request.header("x-multi"), Some("2"));
        assert_eq!(request.headers().len(), 3);
    }

    #[test]
    fn body_sets_content_type() {
        let mut request = HttpRequest::new(Method::Post, "http://h", "/");
        request.set_body(RequestBody::json(&serde_json::json!({"a": 1})));
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body(), Some(br#"{"a":1}"#.as_slice()));
    }

    #[test]
    fn transport_url_joins_cleanly() {
        let mut request = HttpRequest::new(Method::Get, "https://api.example.com/", "/v1/users");
        request.append_query("page", "2");
        let wire = request.to_transport().unwrap();
        assert_eq!(wire.url.as_str(), "https://api.example.com/v1/users?page=2");
    }

    #[test]
    fn reserved_characters_stay_in_path_segment() {
        let mut request = HttpRequest::new(Method::Get, "http://localhost:8080", "/files/{name}");
        request.substitute_path("name", "what?.txt");
        request.append_query("v", "1");

        let wire = request.to_transport().unwrap();
        assert_eq!(wire.url.path(), "/files/what%3F.txt");
        assert_eq!(wire.url.query(), Some("v=1"));
        assert_eq!(wire.url.fragment(), None);

        let mut request = HttpRequest::new(Method::Get, "http://h/api/", "/tags/{tag}/");
        request.substitute_path("tag", "c#");
        assert_eq!(
            request.to_transport().unwrap().url.as_str(),
            "http://h/api/tags/c%23/"
        );
    }

    #[test]
    fn invalid_url_reported() {
        let request = HttpRequest::new(Method::Get, "not a url", "/x");
        assert!(matches!(
            request.to_transport(),
            Err(TransportError::InvalidUrl { .. })
        ));
    }
}
