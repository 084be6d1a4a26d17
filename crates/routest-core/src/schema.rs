//! JSON schema checks for request and response bodies
//!
//! The engine only sees [`SchemaValidator`] and [`CompiledSchema`];
//! [`JsonSchemaValidator`] plugs in the `jsonschema` crate.

use crate::error::SchemaError;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Which body a schema applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyTarget {
    Request,
    Response,
}

impl fmt::Display for BodyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Request => "request",
            Self::Response => "response",
        })
    }
}

/// A schema ready to check values
pub trait CompiledSchema: Send + Sync {
    /// Check `instance`; on failure return one message per violation
    ///
    /// # Errors
    /// Returns the violation messages.
    fn validate(&self, instance: &Value) -> Result<(), Vec<String>>;
}

/// Turns schema text into a [`CompiledSchema`]
pub trait SchemaValidator: Send + Sync {
    /// Compile JSON schema text
    ///
    /// # Errors
    /// Returns `SchemaError::Compile` if the text is not a usable schema.
    fn compile(&self, schema: &str) -> Result<Arc<dyn CompiledSchema>, SchemaError>;
}

/// `jsonschema`-backed validator
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

struct JsonSchemaCompiled {
    schema: JSONSchema,
}

impl CompiledSchema for JsonSchemaCompiled {
    fn validate(&self, instance: &Value) -> Result<(), Vec<String>> {
        self.schema.validate(instance).map_err(|errors| {
            errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{path}: {e}")
                    }
                })
                .collect()
        })
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn compile(&self, schema: &str) -> Result<Arc<dyn CompiledSchema>, SchemaError> {
        let document: Value =
            serde_json::from_str(schema).map_err(|e| SchemaError::Compile(e.to_string()))?;
        let schema =
            JSONSchema::compile(&document).map_err(|e| SchemaError::Compile(e.to_string()))?;
        Ok(Arc::new(JsonSchemaCompiled { schema }))
    }
}

/// Schema text together with its compiled form
#[derive(Clone)]
pub struct BodySchema {
    source: String,
    compiled: Arc<dyn CompiledSchema>,
}

impl fmt::Debug for BodySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodySchema")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl BodySchema {
    /// Compile `source` with `validator`
    ///
    /// # Errors
    /// Returns `SchemaError::Compile` from the validator.
    pub fn compile(validator: &dyn SchemaValidator, source: impl Into<String>) -> Result<Self, SchemaError> {
        let source = source.into();
        let compiled = validator.compile(&source)?;
        Ok(Self { source, compiled })
    }

    /// Original schema text
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check a parsed value
    ///
    /// # Errors
    /// Returns `SchemaError::Violation` listing every violation.
    pub fn validate_value(&self, target: BodyTarget, instance: &Value) -> Result<(), SchemaError> {
        self.compiled
            .validate(instance)
            .map_err(|errors| SchemaError::Violation { target, errors })
    }

    /// Parse raw bytes as JSON, then check
    ///
    /// # Errors
    /// Returns `SchemaError::InvalidJson` if the bytes are not JSON, else as
    /// [`BodySchema::validate_value`].
    pub fn validate_bytes(&self, target: BodyTarget, body: &[u8]) -> Result<(), SchemaError> {
        let instance: Value = serde_json::from_slice(body).map_err(|e| SchemaError::InvalidJson {
            target,
            message: e.to_string(),
        })?;
        self.validate_value(target, &instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER_SCHEMA: &str = r#"{
        "type": "object",
        "required": ["id", "name"],
        "properties": {
            "id": {"type": "integer"},
            "name": {"type": "string"}
        }
    }"#;

    fn schema() -> BodySchema {
        BodySchema::compile(&JsonSchemaValidator, USER_SCHEMA).unwrap()
    }

    #[test]
    fn valid_body_passes() {
        assert!(schema()
            .validate_value(BodyTarget::Response, &json!({"id": 1, "name": "a"}))
            .is_ok());
    }

    #[test]
    fn violations_are_listed() {
        let err = schema()
            .validate_value(BodyTarget::Response, &json!({"id": "x"}))
            .unwrap_err();
        match err {
            SchemaError::Violation { target, errors } => {
                assert_eq!(target, BodyTarget::Response);
                assert_eq!(errors.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_json_body_reported() {
        let err = schema()
            .validate_bytes(BodyTarget::Request, b"<html>")
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidJson {
                target: BodyTarget::Request,
                ..
            }
        ));
    }

    #[test]
    fn bad_schema_fails_compile() {
        assert!(matches!(
            BodySchema::compile(&JsonSchemaValidator, "{not json"),
            Err(SchemaError::Compile(_))
        ));
        assert!(matches!(
            BodySchema::compile(&JsonSchemaValidator, r#"{"type": 12}"#),
            Err(SchemaError::Compile(_))
        ));
    }
}
