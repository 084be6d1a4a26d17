//! Route declarations

use crate::error::ValidationError;
use crate::request::Method;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawInfo {
    name: String,
    description: String,
    path: String,
    method: String,
    request_body_schema: Option<String>,
    response_body_schema: Option<String>,
}

/// Endpoint description a Route is created from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteInfo {
    pub name: String,
    pub description: String,
    /// Path template; may contain `{key}` placeholders
    pub path: String,
    pub method: Method,
    pub request_body_schema: Option<String>,
    pub response_body_schema: Option<String>,
}

impl RouteInfo {
    /// Create new info with name, method and path
    #[must_use]
    pub fn new(name: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            ..Self::default()
        }
    }

    /// Parse YAML with `name, description, path, method, requestBodySchema,
    /// responseBodySchema`
    ///
    /// # Errors
    /// - `ValidationError::MalformedInfo` for invalid YAML or a missing name
    /// - `ValidationError::InvalidMethod` for an unknown method
    pub fn from_yaml(text: &str) -> Result<Self, ValidationError> {
        let raw: RawInfo =
            serde_yaml::from_str(text).map_err(|e| ValidationError::MalformedInfo(e.to_string()))?;

        if raw.name.trim().is_empty() {
            return Err(ValidationError::MalformedInfo(
                "route name is required".to_string(),
            ));
        }

        let method = if raw.method.trim().is_empty() {
            Method::Get
        } else {
            raw.method.parse()?
        };

        Ok(Self {
            name: raw.name,
            description: raw.description,
            path: raw.path,
            method,
            request_body_schema: raw.request_body_schema.filter(|s| !s.trim().is_empty()),
            response_body_schema: raw.response_body_schema.filter(|s| !s.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_request_schema(mut self, schema: impl Into<String>) -> Self {
        self.request_body_schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn with_response_schema(mut self, schema: impl Into<String>) -> Self {
        self.response_body_schema = Some(schema.into());
        self
    }
}
