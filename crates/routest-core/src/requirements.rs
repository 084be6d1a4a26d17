//! Requirement table and its YAML source

use crate::error::{NotFoundError, RequirementsError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One traceable requirement
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirement {
    pub summary: String,
    pub priority: String,
    pub links: Vec<String>,
}

/// Requirements keyed by name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Requirements {
    entries: BTreeMap<String, Requirement>,
}

impl Requirements {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace
    pub fn add(&mut self, name: impl Into<String>, requirement: Requirement) {
        self.entries.insert(name.into(), requirement);
    }

    /// Look up by name
    ///
    /// # Errors
    /// Returns `NotFoundError::Requirement` if absent.
    pub fn get(&self, name: &str) -> Result<&Requirement, NotFoundError> {
        self.entries
            .get(name)
            .ok_or_else(|| NotFoundError::Requirement(name.to_string()))
    }

    /// Remove by name, returning the entry if it existed
    pub fn remove(&mut self, name: &str) -> Option<Requirement> {
        self.entries.remove(name)
    }

    /// Names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source of a requirements table
pub trait RequirementsSource: Send + Sync {
    /// Load the table at `path`
    ///
    /// # Errors
    /// Returns `RequirementsError` if the file cannot be read or parsed.
    fn load(&self, path: &Path) -> Result<Requirements, RequirementsError>;
}

/// Reads a YAML mapping `name -> {summary, priority, links}`
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlRequirementsSource;

impl RequirementsSource for YamlRequirementsSource {
    fn load(&self, path: &Path) -> Result<Requirements, RequirementsError> {
        let text = fs::read_to_string(path).map_err(|source| RequirementsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if text.trim().is_empty() {
            return Ok(Requirements::new());
        }

        let requirements: Requirements =
            serde_yaml::from_str(&text).map_err(|e| RequirementsError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        tracing::info!("Loaded {} requirements from {}", requirements.len(), path.display());
        Ok(requirements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn add_get_remove() {
        let mut table = Requirements::new();
        table.add(
            "REQ-1",
            Requirement {
                summary: "Users can log in".to_string(),
                priority: "high".to_string(),
                links: vec![],
            },
        );

        assert_eq!(table.get("REQ-1").unwrap().priority, "high");
        assert!(table.remove("REQ-1").is_some());
        assert_eq!(
            table.get("REQ-1"),
            Err(NotFoundError::Requirement("REQ-1".to_string()))
        );
    }

    #[test]
    fn yaml_source_loads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "REQ-2:\n  summary: Cart totals\n  priority: medium\n  links: [https://tracker/2]\nREQ-1:\n  summary: Login"
        )
        .unwrap();

        let table = YamlRequirementsSource.load(file.path()).unwrap();
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["REQ-1", "REQ-2"]);
        assert_eq!(table.get("REQ-2").unwrap().links, vec!["https://tracker/2"]);
        assert_eq!(table.get("REQ-1").unwrap().priority, "");
    }

    #[test]
    fn yaml_source_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            YamlRequirementsSource.load(&dir.path().join("missing.yaml")),
            Err(RequirementsError::Io { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "- just\n- a list").unwrap();
        assert!(matches!(
            YamlRequirementsSource.load(file.path()),
            Err(RequirementsError::Parse { .. })
        ));
    }
}
