use crate::error::ConfigError;
use crate::pep508::{is_valid_name, normalize_name};
use serde::Serialize;
use std::fmt;

/// A normalized project name that retains the original spelling.
///
/// Equality, ordering, and `Display` all use the normalized form; the
/// as-given spelling is kept only so a reformatted document can reproduce it.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ProjectName {
    normalized: String,
    #[serde(skip)]
    given: String,
}

impl PartialEq for ProjectName {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for ProjectName {}

impl ProjectName {
    /// Normalize and validate a raw project name.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let normalized = normalize_name(raw);
        if !is_valid_name(&normalized) {
            return Err(ConfigError::schema("The value for 'project.name' is invalid."));
        }
        Ok(Self {
            normalized,
            given: raw.to_owned(),
        })
    }

    /// The normalized (PEP 503) spelling, used for equality and lookup.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// The original spelling, used for display and re-serialization.
    pub fn as_given(&self) -> &str {
        &self.given
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_but_keeps_original() {
        let name = ProjectName::parse("My.Project_Name").unwrap();
        assert_eq!(name.as_str(), "my-project-name");
        assert_eq!(name.as_given(), "My.Project_Name");
    }

    #[test]
    fn rejects_invalid_names() {
        let err = ProjectName::parse("???").unwrap_err();
        assert_eq!(err.to_string(), "The value for 'project.name' is invalid.");
    }

    #[test]
    fn equality_uses_normalized_form() {
        let a = ProjectName::parse("Foo_Bar").unwrap();
        let b = ProjectName::parse("foo-bar").unwrap();
        assert_eq!(a.as_str(), b.as_str());
    }
}
