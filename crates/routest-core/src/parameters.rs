//! Per-scope parameter stores
//!
//! Each scope owns one [`ParameterStore`] with three ordered lists: query
//! entries, path variables and headers. Export writes them onto an outgoing
//! request; import reads them back from a recorded exchange.

use crate::error::{NotFoundError, ValidationError};
use crate::request::HttpRequest;
use crate::response::ResponseRecord;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which list a parameter lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// URL query pair
    Query,
    /// `{key}` placeholder in the path template
    Path,
    /// HTTP header
    Header,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Query => "query",
            Self::Path => "path",
            Self::Header => "header",
        })
    }
}

/// One key/value entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    /// Entry key; never empty
    pub key: String,
    /// Entry value
    pub value: String,
}

impl Parameter {
    /// Create new parameter
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Entries {
    query: Vec<Parameter>,
    path: Vec<Parameter>,
    header: Vec<Parameter>,
}

impl Entries {
    fn list(&self, kind: ParameterKind) -> &[Parameter] {
        match kind {
            ParameterKind::Query => &self.query,
            ParameterKind::Path => &self.path,
            ParameterKind::Header => &self.header,
        }
    }

    fn list_mut(&mut self, kind: ParameterKind) -> &mut Vec<Parameter> {
        match kind {
            ParameterKind::Query => &mut self.query,
            ParameterKind::Path => &mut self.path,
            ParameterKind::Header => &mut self.header,
        }
    }
}

/// Thread-safe query/path/header lists for one scope
#[derive(Debug, Default)]
pub struct ParameterStore {
    inner: RwLock<Entries>,
}

impl Clone for ParameterStore {
    fn clone(&self) -> Self {
        Self {
            inner: RwLock::new(self.inner.read().clone()),
        }
    }
}

impl ParameterStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the list for `kind`
    ///
    /// # Errors
    /// Returns `ValidationError::EmptyKey` if `key` is empty.
    pub fn register(
        &self,
        kind: ParameterKind,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ValidationError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ValidationError::EmptyKey(kind));
        }

        self.inner
            .write()
            .list_mut(kind)
            .push(Parameter::new(key, value));
        Ok(())
    }

    /// Append a query entry
    ///
    /// # Errors
    /// Returns `ValidationError::EmptyKey` if `key` is empty.
    pub fn register_query(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ValidationError> {
        self.register(ParameterKind::Query, key, value)
    }

    /// Append a path variable
    ///
    /// # Errors
    /// Returns `ValidationError::EmptyKey` if `key` is empty.
    pub fn register_path(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ValidationError> {
        self.register(ParameterKind::Path, key, value)
    }

    /// Append a header
    ///
    /// # Errors
    /// Returns `ValidationError::EmptyKey` if `key` is empty.
    pub fn register_header(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ValidationError> {
        self.register(ParameterKind::Header, key, value)
    }

    /// First entry with `key` in insertion order
    ///
    /// Header keys compare case-insensitively; query and path keys exactly.
    ///
    /// # Errors
    /// Returns `NotFoundError::ParameterKey` if no entry matches.
    pub fn get_by_key(&self, key: &str, kind: ParameterKind) -> Result<Parameter, NotFoundError> {
        let inner = self.inner.read();
        inner
            .list(kind)
            .iter()
            .find(|p| match kind {
                ParameterKind::Header => p.key.eq_ignore_ascii_case(key),
                ParameterKind::Query | ParameterKind::Path => p.key == key,
            })
            .cloned()
            .ok_or_else(|| NotFoundError::ParameterKey {
                kind,
                key: key.to_string(),
            })
    }

    /// Snapshot of query entries
    #[must_use]
    pub fn query_parameters(&self) -> Vec<Parameter> {
        self.inner.read().query.clone()
    }

    /// Snapshot of path variables
    #[must_use]
    pub fn path_variables(&self) -> Vec<Parameter> {
        self.inner.read().path.clone()
    }

    /// Snapshot of headers
    #[must_use]
    pub fn headers(&self) -> Vec<Parameter> {
        self.inner.read().header.clone()
    }

    /// Total entries across all three lists
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.read();
        inner.query.len() + inner.path.len() + inner.header.len()
    }

    /// Check if all three lists are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write entries onto `request`
    ///
    /// Order: query pairs appended, then `{key}` path substitution, then
    /// headers set with last-wins semantics.
    #[must_use]
    pub fn export_to_request(&self, mut request: HttpRequest) -> HttpRequest {
        let entries = self.inner.read().clone();

        for param in &entries.query {
            request.append_query(&param.key, &param.value);
        }
        for param in &entries.path {
            request.substitute_path(&param.key, &param.value);
        }
        for param in &entries.header {
            request.set_header(&param.key, &param.value);
        }

        request
    }

    /// Append the exchange's request query pairs, then its response headers
    ///
    /// Existing entries are kept, so earlier registrations still win lookups.
    pub fn import_from_response(&self, response: &ResponseRecord) {
        let mut inner = self.inner.write();
        inner.query.extend(
            response
                .request_query()
                .iter()
                .map(|(k, v)| Parameter::new(k.as_str(), v.as_str())),
        );
        inner.header.extend(
            response
                .headers()
                .iter()
                .map(|(k, v)| Parameter::new(k.as_str(), v.as_str())),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;
    use crate::transport::RawReply;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn draft(path: &str) -> HttpRequest {
        HttpRequest::new(Method::Get, "http://localhost:8080", path)
    }

    #[test]
    fn empty_key_rejected() {
        let store = ParameterStore::new();
        assert_eq!(
            store.register_path("", "1"),
            Err(ValidationError::EmptyKey(ParameterKind::Path))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn first_match_wins() {
        let store = ParameterStore::new();
        store.register_query("page", "1").unwrap();
        store.register_query("page", "2").unwrap();

        let found = store.get_by_key("page", ParameterKind::Query).unwrap();
        assert_eq!(found.value, "1");
        assert_eq!(
            store.get_by_key("page", ParameterKind::Header),
            Err(NotFoundError::ParameterKey {
                kind: ParameterKind::Header,
                key: "page".to_string()
            })
        );
    }

    #[test]
    fn only_header_keys_ignore_case() {
        let store = ParameterStore::new();
        store.register_header("X-Token", "t1").unwrap();
        store.register_query("Page", "1").unwrap();

        assert_eq!(
            store.get_by_key("x-token", ParameterKind::Header).unwrap().value,
            "t1"
        );
        assert!(store.get_by_key("page", ParameterKind::Query).is_err());
    }

    #[test]
    fn export_applies_all_kinds() {
        let store = ParameterStore::new();
        store.register_query("q", "a b").unwrap();
        store.register_path("id", "42").unwrap();
        store.register_header("X-Token", "t1").unwrap();
        store.register_header("x-token", "t2").unwrap();

        let request = store.export_to_request(draft("/users/{id}"));
        assert_eq!(request.path(), "/users/42");
        assert_eq!(request.query(), &[("q".to_string(), "a b".to_string())]);
        assert_eq!(request.header("X-TOKEN"), Some("t2"));
        assert_eq!(request.headers().len(), 1);

        let wire = request.to_transport().unwrap();
        assert_eq!(wire.url.as_str(), "http://localhost:8080/users/42?q=a+b");
    }

    #[test]
    fn import_appends_without_shadowing() {
        let store = ParameterStore::new();
        store.register_header("X-Trace", "explicit").unwrap();

        let reply = RawReply {
            status: 200,
            status_text: "OK".to_string(),
            headers: vec![("X-Trace".to_string(), "from-server".to_string())],
            body: Vec::new(),
        };
        let record = ResponseRecord::from_reply(
            reply,
            vec![("page".to_string(), "3".to_string())],
        );
        store.import_from_response(&record);

        assert_eq!(store.headers().len(), 2);
        assert_eq!(
            store.get_by_key("x-trace", ParameterKind::Header).unwrap().value,
            "explicit"
        );
        assert_eq!(
            store.get_by_key("page", ParameterKind::Query).unwrap().value,
            "3"
        );
    }

    #[test]
    fn concurrent_registration_loses_nothing() {
        let store = Arc::new(ParameterStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.register_header(format!("h-{t}-{i}"), "v").unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.headers().len(), 800);
    }

    #[test]
    fn clone_is_independent() {
        let store = ParameterStore::new();
        store.register_query("a", "1").unwrap();
        let copy = store.clone();
        copy.register_query("b", "2").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(copy.len(), 2);
    }
}
