//! Configuration loading and storage
//!
//! Provides:
//! - [`ConfigSource`]: loads the mapping for one environment
//! - [`FileConfigSource`]: `<dir>/<env>.json`, `.yaml`/`.yml` or `.env`
//! - [`ConfigSelection`]: picks a file source by which file exists
//! - [`ConfigStore`]: the loaded mapping with dotted-path access

use crate::error::{ConfigError, NotFoundError};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration mapping
pub type ConfigMap = Map<String, Value>;

/// Source of configuration for a named environment
pub trait ConfigSource: Send + Sync {
    /// Load the mapping for `environment`
    ///
    /// # Errors
    /// Returns `ConfigError` if the source cannot be read or parsed.
    fn load(&self, environment: &str) -> Result<ConfigMap, ConfigError>;
}

/// On-disk configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFormat {
    Json,
    Yaml,
    DotEnv,
}

impl ConfigFormat {
    /// Extensions probed, in priority order
    pub const PROBE_ORDER: [(ConfigFormat, &'static str); 4] = [
        (ConfigFormat::Json, "json"),
        (ConfigFormat::Yaml, "yaml"),
        (ConfigFormat::Yaml, "yml"),
        (ConfigFormat::DotEnv, "env"),
    ];
}

/// Reads `<dir>/<environment>.<extension>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfigSource {
    dir: PathBuf,
    format: ConfigFormat,
    extension: String,
}

impl FileConfigSource {
    /// Create new file source
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, format: ConfigFormat, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            format,
            extension: extension.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> ConfigFormat {
        self.format
    }

    /// Path of the file for `environment`
    #[must_use]
    pub fn path_for(&self, environment: &str) -> PathBuf {
        self.dir.join(format!("{environment}.{}", self.extension))
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self, environment: &str) -> Result<ConfigMap, ConfigError> {
        let path = self.path_for(environment);
        tracing::debug!("Loading configuration from {}", path.display());

        match self.format {
            ConfigFormat::Json => {
                let text = fs::read_to_string(&path).map_err(|e| ConfigError::io_error(&path, e))?;
                parse_mapping(&path, serde_json::from_str(&text).map_err(|e| e.to_string()))
            }
            ConfigFormat::Yaml => {
                let text = fs::read_to_string(&path).map_err(|e| ConfigError::io_error(&path, e))?;
                if text.trim().is_empty() {
                    return Ok(ConfigMap::new());
                }
                parse_mapping(&path, serde_yaml::from_str(&text).map_err(|e| e.to_string()))
            }
            ConfigFormat::DotEnv => load_dotenv(&path),
        }
    }
}

fn parse_mapping(path: &Path, parsed: Result<Value, String>) -> Result<ConfigMap, ConfigError> {
    match parsed.map_err(|message| ConfigError::parse_error(path, message))? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(ConfigMap::new()),
        _ => Err(ConfigError::parse_error(
            path,
            "top level must be a mapping",
        )),
    }
}

fn load_dotenv(path: &Path) -> Result<ConfigMap, ConfigError> {
    let entries = dotenvy::from_path_iter(path).map_err(|e| dotenv_error(path, e))?;

    let mut root = Value::Object(ConfigMap::new());
    for entry in entries {
        let (key, value) = entry.map_err(|e| dotenv_error(path, e))?;
        set_path(&mut root, &key, Value::String(value));
    }

    match root {
        Value::Object(map) => Ok(map),
        _ => Ok(ConfigMap::new()),
    }
}

fn dotenv_error(path: &Path, err: dotenvy::Error) -> ConfigError {
    match err {
        dotenvy::Error::Io(source) => ConfigError::io_error(path, source),
        other => ConfigError::parse_error(path, other.to_string()),
    }
}

/// Write `value` at a dotted path, creating intermediate mappings
///
/// A non-mapping value in the way is replaced by a mapping.
pub fn set_path(root: &mut Value, dotted: &str, value: Value) {
    let mut current = root;
    let mut segments = dotted.split('.').peekable();

    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(ConfigMap::new());
        }
        let Value::Object(map) = current else {
            return;
        };

        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(ConfigMap::new()));
    }
}

/// Which environment to load and where to look
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSelection {
    pub environment: String,
    pub search_dir: PathBuf,
}

impl ConfigSelection {
    /// Create new selection
    #[must_use]
    pub fn new(environment: impl Into<String>, search_dir: impl Into<PathBuf>) -> Self {
        Self {
            environment: environment.into(),
            search_dir: search_dir.into(),
        }
    }

    /// First existing `<env>.json`, `.yaml`, `.yml` or `.env` in the directory
    ///
    /// # Errors
    /// Returns `ConfigError::NoSource` if none exists.
    pub fn source(&self) -> Result<FileConfigSource, ConfigError> {
        ConfigFormat::PROBE_ORDER
            .iter()
            .map(|(format, extension)| FileConfigSource::new(&self.search_dir, *format, *extension))
            .find(|source| source.path_for(&self.environment).is_file())
            .ok_or_else(|| ConfigError::NoSource {
                environment: self.environment.clone(),
                dir: self.search_dir.clone(),
            })
    }

    /// Select and load
    ///
    /// # Errors
    /// Returns `ConfigError` from selection or loading.
    pub fn load(&self) -> Result<ConfigMap, ConfigError> {
        let source = self.source()?;
        tracing::info!(
            "Selected {:?} configuration for environment: {}",
            source.format(),
            self.environment
        );
        source.load(&self.environment)
    }
}

/// Loaded configuration behind a read/write lock
#[derive(Debug, Default)]
pub struct ConfigStore {
    root: RwLock<Value>,
}

impl ConfigStore {
    /// Create store from a value; non-mappings start empty
    #[must_use]
    pub fn new(root: Value) -> Self {
        let root = if root.is_object() {
            root
        } else {
            Value::Object(ConfigMap::new())
        };
        Self {
            root: RwLock::new(root),
        }
    }

    /// Create store from a mapping
    #[must_use]
    pub fn from_map(map: ConfigMap) -> Self {
        Self::new(Value::Object(map))
    }

    /// Value at a dotted path
    ///
    /// # Errors
    /// Returns `NotFoundError::ConfigKey` if any segment is missing.
    pub fn get(&self, dotted: &str) -> Result<Value, NotFoundError> {
        let root = self.root.read();
        dotted
            .split('.')
            .try_fold(&*root, |value, segment| value.as_object()?.get(segment))
            .cloned()
            .ok_or_else(|| NotFoundError::ConfigKey(dotted.to_string()))
    }

    /// String at a dotted path
    #[must_use]
    pub fn get_str(&self, dotted: &str) -> Option<String> {
        match self.get(dotted).ok()? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Set a value at a dotted path
    pub fn set(&self, dotted: &str, value: Value) {
        set_path(&mut self.root.write(), dotted, value);
    }

    /// Defensive copy of the whole mapping
    #[must_use]
    pub fn snapshot(&self) -> Value {
        self.root.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn dotted_get_and_set() {
        let store = ConfigStore::new(json!({"host": {"hostname": "a"}}));
        assert_eq!(store.get_str("host.hostname").as_deref(), Some("a"));

        store.set("host.port", json!(8080));
        store.set("auth.token.value", json!("t"));
        assert_eq!(store.get("host.port").unwrap(), json!(8080));
        assert_eq!(store.get("auth").unwrap(), json!({"token": {"value": "t"}}));
    }

    #[test]
    fn missing_key_reported() {
        let store = ConfigStore::new(json!({"host": "plain"}));
        assert_eq!(
            store.get("host.hostname"),
            Err(NotFoundError::ConfigKey("host.hostname".to_string()))
        );
    }

    #[test]
    fn set_path_replaces_scalars() {
        let mut root = json!({"a": 1});
        set_path(&mut root, "a.b", json!(2));
        assert_eq!(root, json!({"a": {"b": 2}}));
    }

    #[test]
    fn non_mapping_root_starts_empty() {
        let store = ConfigStore::new(json!([1, 2]));
        assert_eq!(store.snapshot(), json!({}));
    }
}
