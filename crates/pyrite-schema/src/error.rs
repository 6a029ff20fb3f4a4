use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// One segment of a [`FieldPath`]: a table/key name or an array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Dotted, indexed path to a field in the document, used for diagnostics only.
///
/// Renders as e.g. `project.authors[0].name`. The path never affects parsing
/// semantics; it exists so every error names the exact field that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![PathSegment::Key(name.into())])
    }

    /// Return a new path with `name` appended.
    pub fn key(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(name.into()));
        Self(segments)
    }

    /// Return a new path with array index `idx` appended.
    pub fn index(&self, idx: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(idx));
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

/// Broad classification of a [`ConfigError`], mirroring the split between
/// content-validity errors and data-shape errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structural or semantic violation of the schema.
    Schema,
    /// A value was present but had the wrong shape.
    TypeMismatch,
    /// Filesystem or TOML-syntax failure outside the schema's control.
    Io,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required key was absent and no default applied.
    #[error("The '{path}' field must be provided.")]
    MissingField { path: FieldPath },

    /// Schema-level violation with a prebuilt, path-qualified message.
    #[error("{0}")]
    Schema(String),

    /// A value was present but of the wrong type.
    #[error("Invalid {what} for '{path}': expected {expected}, got {actual}")]
    TypeMismatch {
        path: FieldPath,
        what: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// An array element was of the wrong type.
    #[error("Invalid type for '{path}[{index}]': expected {expected}, got {actual}")]
    IndexedTypeMismatch {
        path: FieldPath,
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },

    /// A file had an extension no content type can be inferred from.
    #[error("Unsupported extension for '{0}'")]
    UnsupportedExtension(String),

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML syntax error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConfigError {
    /// Shorthand for a schema-class error with a free-form message.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField { .. } | Self::Schema(_) => ErrorKind::Schema,
            Self::TypeMismatch { .. }
            | Self::IndexedTypeMismatch { .. }
            | Self::UnsupportedExtension(_) => ErrorKind::TypeMismatch,
            Self::Io { .. } | Self::Toml(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_renders_dotted_and_indexed() {
        let path = FieldPath::root("project").key("authors").index(0).key("name");
        assert_eq!(path.to_string(), "project.authors[0].name");
    }

    #[test]
    fn missing_field_message() {
        let err = ConfigError::MissingField {
            path: FieldPath::root("project").key("name"),
        };
        assert_eq!(err.to_string(), "The 'project.name' field must be provided.");
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn type_mismatch_is_distinct_from_schema() {
        let err = ConfigError::TypeMismatch {
            path: FieldPath::root("project").key("keywords"),
            what: "type",
            expected: "array",
            actual: "string",
        };
        assert_eq!(
            err.to_string(),
            "Invalid type for 'project.keywords': expected array, got string"
        );
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn indexed_mismatch_names_the_index() {
        let err = ConfigError::IndexedTypeMismatch {
            path: FieldPath::root("build-system").key("requires"),
            index: 2,
            expected: "string",
            actual: "integer",
        };
        assert_eq!(
            err.to_string(),
            "Invalid type for 'build-system.requires[2]': expected string, got integer"
        );
    }
}
