//! Metadata records attached to every scope
//!
//! A [`Meta`] carries ownership, classification and tag information. Child
//! scopes start from a copy of their parent's record and then apply their own
//! declaration on top with [`Meta::override_meta`].

use crate::error::ValidationError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Whether a test is automated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutomationStatus {
    /// Runs unattended
    #[default]
    Automated,
    /// Could be automated but is not yet
    NotAutomated,
    /// Only meaningful as a manual test
    ManualOnly,
}

impl AutomationStatus {
    /// Canonical text form
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Automated => "automated",
            Self::NotAutomated => "not-automated",
            Self::ManualOnly => "manual-only",
        }
    }
}

impl FromStr for AutomationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "automated" => Ok(Self::Automated),
            "not-automated" | "not_automated" => Ok(Self::NotAutomated),
            "manual-only" | "manual_only" => Ok(Self::ManualOnly),
            other => Err(ValidationError::InvalidAutomationStatus(other.to_string())),
        }
    }
}

impl fmt::Display for AutomationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much a failure matters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Importance {
    /// Blocks a release
    Critical,
    /// Must be fixed soon
    High,
    /// Normal priority
    #[default]
    Medium,
    /// Cosmetic
    Low,
}

impl Importance {
    /// Canonical text form
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl FromStr for Importance {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(ValidationError::InvalidImportance(other.to_string())),
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire shape of metadata text before enum validation
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMeta {
    assignee: String,
    automation_status: String,
    component: String,
    importance: String,
    requirements: String,
    requirements_override: String,
    setup: String,
    test_steps: String,
    expected_results: String,
    negative: Option<bool>,
    #[serde(rename = "type")]
    test_type: String,
    tags: String,
}

/// Metadata for one scope
///
/// The parent link is a shared, read-only snapshot of the enclosing scope's
/// record. It is never mutated through the child.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Meta {
    parent: Option<Arc<Meta>>,
    assignee: String,
    automation_status: AutomationStatus,
    component: String,
    importance: Importance,
    requirements: String,
    requirements_override: String,
    setup: String,
    test_steps: String,
    expected_results: String,
    negative: Option<bool>,
    test_type: String,
    tags: String,
}

impl Meta {
    /// Parse metadata from YAML text
    ///
    /// # Errors
    /// - `ValidationError::EmptyMetadata` for blank text
    /// - `ValidationError::MalformedMetadata` for invalid YAML
    /// - `ValidationError::InvalidAutomationStatus` / `InvalidImportance`
    ///   for values outside the enumerations
    pub fn from_yaml(text: &str) -> Result<Self, ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyMetadata);
        }

        let raw: RawMeta = serde_yaml::from_str(text)
            .map_err(|e| ValidationError::MalformedMetadata(e.to_string()))?;

        Ok(Self {
            parent: None,
            automation_status: raw.automation_status.parse()?,
            importance: raw.importance.parse()?,
            assignee: raw.assignee,
            component: raw.component,
            requirements: raw.requirements,
            requirements_override: raw.requirements_override,
            setup: raw.setup,
            test_steps: raw.test_steps,
            expected_results: raw.expected_results,
            negative: raw.negative,
            test_type: raw.test_type,
            tags: raw.tags,
        })
    }

    /// Build a child scope's record
    ///
    /// Copies `parent`, links the copy back to it, and applies `own_text` on
    /// top when it is non-blank.
    ///
    /// # Errors
    /// Returns the parse error of `own_text`.
    pub fn inherit(parent: &Arc<Meta>, own_text: &str) -> Result<Self, ValidationError> {
        let mut meta = parent.copy();
        meta.parent = Some(Arc::clone(parent));

        if !own_text.trim().is_empty() {
            let own = Self::from_yaml(own_text)?;
            meta.override_meta(Some(&own));
        }

        Ok(meta)
    }

    /// Independent value copy; the parent link is shared
    #[inline]
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Apply another record on top of this one
    ///
    /// Non-empty strings, the enums, a specified `negative` flag and a present
    /// parent replace the current values. Tags are appended, comma-joined.
    /// Enum values are typed, so the merged record needs no re-validation.
    pub fn override_meta(&mut self, other: Option<&Meta>) {
        let Some(other) = other else {
            return;
        };

        replace_if_present(&mut self.assignee, &other.assignee);
        replace_if_present(&mut self.component, &other.component);
        replace_if_present(&mut self.requirements, &other.requirements);
        replace_if_present(&mut self.requirements_override, &other.requirements_override);
        replace_if_present(&mut self.setup, &other.setup);
        replace_if_present(&mut self.test_steps, &other.test_steps);
        replace_if_present(&mut self.expected_results, &other.expected_results);
        replace_if_present(&mut self.test_type, &other.test_type);

        self.automation_status = other.automation_status;
        self.importance = other.importance;

        if other.negative.is_some() {
            self.negative = other.negative;
        }

        if let Some(parent) = &other.parent {
            self.parent = Some(Arc::clone(parent));
        }

        if !other.tags.is_empty() {
            if self.tags.is_empty() {
                self.tags.clone_from(&other.tags);
            } else {
                self.tags = format!("{},{}", self.tags, other.tags);
            }
        }
    }

    /// Enclosing scope's record, if linked
    #[inline]
    #[must_use]
    pub fn parent_meta(&self) -> Option<&Arc<Meta>> {
        self.parent.as_ref()
    }

    /// Walk the parent links, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = &Meta> {
        std::iter::successors(self.parent.as_deref(), |meta| meta.parent.as_deref())
    }

    /// Raw comma-joined tags
    #[inline]
    #[must_use]
    pub fn tags(&self) -> &str {
        &self.tags
    }

    /// Trimmed, non-empty tags in declaration order
    #[must_use]
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect()
    }

    /// Check if a tag is present
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_list().contains(&tag.trim())
    }

    #[inline]
    #[must_use]
    pub fn assignee(&self) -> &str {
        &self.assignee
    }

    #[inline]
    #[must_use]
    pub fn automation_status(&self) -> AutomationStatus {
        self.automation_status
    }

    #[inline]
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    #[inline]
    #[must_use]
    pub fn importance(&self) -> Importance {
        self.importance
    }

    #[inline]
    #[must_use]
    pub fn requirements(&self) -> &str {
        &self.requirements
    }

    #[inline]
    #[must_use]
    pub fn requirements_override(&self) -> &str {
        &self.requirements_override
    }

    #[inline]
    #[must_use]
    pub fn setup(&self) -> &str {
        &self.setup
    }

    #[inline]
    #[must_use]
    pub fn test_steps(&self) -> &str {
        &self.test_steps
    }

    #[inline]
    #[must_use]
    pub fn expected_results(&self) -> &str {
        &self.expected_results
    }

    /// Negative test flag; unspecified counts as positive
    #[inline]
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.negative.unwrap_or(false)
    }

    /// Test type (smoke, regression, ...)
    #[inline]
    #[must_use]
    pub fn test_type(&self) -> &str {
        &self.test_type
    }

    /// Replace the assignee
    #[inline]
    #[must_use]
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = assignee.into();
        self
    }

    /// Replace the tags
    #[inline]
    #[must_use]
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }
}

fn replace_if_present(slot: &mut String, value: &str) {
    if !value.is_empty() {
        value.clone_into(slot);
    }
}
