//! Whole-document composition: the four top-level tables, loading,
//! re-serialization, and field lookup.

use crate::build_system::{parse_build_system, BuildSystem};
use crate::dependency_groups::{
    dependency_groups_to_toml, parse_dependency_groups, DependencyGroups,
};
use crate::encode::{encode_document, EncodeOptions};
use crate::error::{ConfigError, FieldPath};
use crate::pep508::normalize_name;
use crate::project::{parse_project, Project};
use crate::schema::{assert_table, quote_join, ConvertCx};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level tables the document model understands, in serialization order.
const ALLOWED_TOP_LEVEL: &[&str] = &["build-system", "project", "dependency-groups", "tool"];

/// Hook for validating one `[tool.<name>]` sub-table. The raw table is kept
/// on the document either way; a registered parser only gets to reject it.
pub trait ToolParser {
    fn parse(&self, cx: &ConvertCx<'_>, table: &toml::Table) -> Result<(), ConfigError>;
}

/// Knobs for [`PyProject::load`] and [`PyProject::from_str`].
#[derive(Default)]
pub struct ParseOptions {
    /// Fill absent optional keys with their schema defaults.
    pub set_defaults: bool,
    /// Read and render readme files while parsing.
    pub check_readme: bool,
    /// `[tool]` sub-table validators, keyed by tool name.
    pub tool_parsers: BTreeMap<String, Box<dyn ToolParser>>,
}

/// A parsed `pyproject.toml`.
#[derive(Debug, Clone, PartialEq)]
pub struct PyProject {
    pub build_system: Option<BuildSystem>,
    pub project: Option<Project>,
    pub dependency_groups: Option<DependencyGroups>,
    /// Raw `[tool]` sub-tables, kept as-is.
    pub tool: toml::Table,
    /// Directory relative readme/license paths resolve against.
    dir: PathBuf,
}

/// Result of [`PyProject::reformat`]. Nothing is written to disk; the caller
/// decides what to do with the new text.
#[derive(Debug, Clone)]
pub struct ReformatOutcome {
    pub changed: bool,
    pub original: String,
    pub reformatted: String,
}

fn unexpected_top_level_key(key: &str) -> ConfigError {
    let normalized = normalize_name(key);
    if let Some(meant) = ALLOWED_TOP_LEVEL.iter().find(|k| **k == normalized) {
        ConfigError::schema(format!(
            "Unexpected top-level key '{key}'. Did you mean '{meant}'?"
        ))
    } else {
        ConfigError::schema(format!(
            "Unexpected top-level key '{key}'. Allowed top-level keys are {}.",
            quote_join(ALLOWED_TOP_LEVEL)
        ))
    }
}

impl PyProject {
    /// Parse document text. `dir` is the directory file references inside the
    /// document resolve against, normally the manifest's parent.
    pub fn from_str(text: &str, dir: &Path, opts: &ParseOptions) -> Result<Self, ConfigError> {
        let raw: toml::Table = text.parse()?;

        let mut unexpected: Vec<&str> = raw
            .keys()
            .map(String::as_str)
            .filter(|key| !ALLOWED_TOP_LEVEL.contains(key))
            .collect();
        if !unexpected.is_empty() {
            unexpected.sort_unstable();
            return Err(unexpected_top_level_key(unexpected[0]));
        }

        let cx = ConvertCx {
            dir,
            check_readme: opts.check_readme,
        };

        let build_system = match raw.get("build-system") {
            None => None,
            Some(value) => {
                let table = assert_table(value, &FieldPath::root("build-system"))?;
                Some(parse_build_system(&cx, table, opts.set_defaults)?)
            }
        };

        let project = match raw.get("project") {
            None => None,
            Some(value) => {
                let table = assert_table(value, &FieldPath::root("project"))?;
                Some(parse_project(&cx, table, opts.set_defaults)?)
            }
        };

        let dependency_groups = match raw.get("dependency-groups") {
            None => None,
            Some(value) => {
                let table = assert_table(value, &FieldPath::root("dependency-groups"))?;
                Some(parse_dependency_groups(table)?)
            }
        };

        let tool = match raw.get("tool") {
            None => toml::Table::new(),
            Some(value) => {
                let table = assert_table(value, &FieldPath::root("tool"))?;
                for (name, parser) in &opts.tool_parsers {
                    if let Some(sub) = table.get(name) {
                        let sub = assert_table(sub, &FieldPath::root("tool").key(name))?;
                        parser.parse(&cx, sub)?;
                    }
                }
                table.clone()
            }
        };

        Ok(Self {
            build_system,
            project,
            dependency_groups,
            tool,
            dir: dir.to_path_buf(),
        })
    }

    /// Load and parse a manifest file.
    pub fn load(path: &Path, opts: &ParseOptions) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_str(&text, dir, opts)
    }

    /// Compose the top-level document table in fixed section order.
    ///
    /// With `use_given_name` the project name keeps its original spelling.
    pub fn to_toml(&self, use_given_name: bool) -> toml::Table {
        let mut doc = toml::Table::new();
        if let Some(build_system) = &self.build_system {
            doc.insert(
                "build-system".to_owned(),
                toml::Value::Table(build_system.to_toml()),
            );
        }
        if let Some(project) = &self.project {
            doc.insert(
                "project".to_owned(),
                toml::Value::Table(project.to_toml(use_given_name)),
            );
        }
        if let Some(groups) = &self.dependency_groups {
            doc.insert(
                "dependency-groups".to_owned(),
                toml::Value::Table(dependency_groups_to_toml(groups)),
            );
        }
        if !self.tool.is_empty() {
            doc.insert("tool".to_owned(), toml::Value::Table(self.tool.clone()));
        }
        doc
    }

    /// Serialize back to document text, normalized name, deterministic layout.
    pub fn dumps(&self) -> String {
        encode_document(&self.to_toml(false), &EncodeOptions::default())
    }

    /// Serialize to a file.
    pub fn dump(&self, path: &Path) -> Result<(), ConfigError> {
        fs::write(path, self.dumps()).map_err(|e| ConfigError::io(path, e))
    }

    /// Parse `path` without default-filling and re-serialize it, keeping the
    /// project name's original spelling. The file is not modified.
    pub fn reformat(path: &Path) -> Result<ReformatOutcome, ConfigError> {
        let original = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let doc = Self::from_str(&original, dir, &ParseOptions::default())?;
        let reformatted = encode_document(&doc.to_toml(true), &EncodeOptions::default());
        Ok(ReformatOutcome {
            changed: original != reformatted,
            original,
            reformatted,
        })
    }

    /// Replace readme and license file references with the file contents.
    /// One-way: the file references are dropped.
    pub fn resolve_files(&mut self) -> Result<(), ConfigError> {
        if let Some(project) = &mut self.project {
            if let Some(readme) = &mut project.readme {
                readme.resolve(&self.dir)?;
            }
            if let Some(license) = &mut project.license {
                license.resolve(&self.dir)?;
            }
        }
        Ok(())
    }

    /// Extract the value at a dotted, optionally indexed field path, e.g.
    /// `project.authors[0].name`, as JSON.
    pub fn lookup(&self, field_path: &str) -> Result<serde_json::Value, ConfigError> {
        let document = serde_json::to_value(self.to_toml(false))
            .map_err(|e| ConfigError::schema(e.to_string()))?;
        if field_path.is_empty() {
            return Ok(document);
        }

        let mut current = &document;
        for segment in parse_field_path(field_path)? {
            current = match (&segment, current) {
                (LookupSegment::Key(key), serde_json::Value::Object(map)) => {
                    map.get(key).ok_or_else(|| {
                        ConfigError::schema(format!(
                            "No such field '{field_path}': key '{key}' not found"
                        ))
                    })?
                }
                (LookupSegment::Index(idx), serde_json::Value::Array(items)) => {
                    items.get(*idx).ok_or_else(|| {
                        ConfigError::schema(format!(
                            "No such field '{field_path}': index {idx} out of range"
                        ))
                    })?
                }
                (LookupSegment::Key(key), _) => {
                    return Err(ConfigError::schema(format!(
                        "No such field '{field_path}': '{key}' is not a table key here"
                    )))
                }
                (LookupSegment::Index(idx), _) => {
                    return Err(ConfigError::schema(format!(
                        "No such field '{field_path}': [{idx}] used on a non-array value"
                    )))
                }
            };
        }
        Ok(current.clone())
    }
}

enum LookupSegment {
    Key(String),
    Index(usize),
}

/// Split `a.b[0].c` into key and index segments.
fn parse_field_path(field_path: &str) -> Result<Vec<LookupSegment>, ConfigError> {
    let malformed =
        || ConfigError::schema(format!("Malformed field path '{field_path}'"));

    let mut segments = Vec::new();
    for part in field_path.split('.') {
        let (key, rest) = match part.find('[') {
            Some(pos) => part.split_at(pos),
            None => (part, ""),
        };
        if key.is_empty() {
            return Err(malformed());
        }
        segments.push(LookupSegment::Key(key.to_owned()));

        let mut rest = rest;
        while let Some(stripped) = rest.strip_prefix('[') {
            let Some((index_text, remainder)) = stripped.split_once(']') else {
                return Err(malformed());
            };
            let index: usize = index_text.parse().map_err(|_| malformed())?;
            segments.push(LookupSegment::Index(index));
            rest = remainder;
        }
        if !rest.is_empty() {
            return Err(malformed());
        }
    }
    Ok(segments)
}
