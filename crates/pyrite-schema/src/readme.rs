//! Readme and license sub-records and their file/text projections.
//!
//! Both accept polymorphic raw forms (a path string or a table) and are
//! decoded by exhaustive case analysis. `resolve` reads the referenced file
//! into the inline text; after that, round-tripping back to the original
//! file-reference form is no longer guaranteed.

use crate::error::{ConfigError, FieldPath};
use crate::schema::{value_type_name, ConvertCx};
use std::fmt;
use std::fs;
use std::path::Path;

pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Recognized readme content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Rst,
    Plain,
}

impl ContentType {
    pub fn as_mime(self) -> &'static str {
        match self {
            Self::Markdown => "text/markdown",
            Self::Rst => "text/x-rst",
            Self::Plain => "text/plain",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "text/markdown" => Some(Self::Markdown),
            "text/x-rst" => Some(Self::Rst),
            "text/plain" => Some(Self::Plain),
            _ => None,
        }
    }

    /// Infer the content type from a readme filename's extension.
    pub fn from_path(file: &str) -> Result<Self, ConfigError> {
        let extension = Path::new(file)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        match extension.as_deref() {
            Some("md") => Ok(Self::Markdown),
            Some("rst") => Ok(Self::Rst),
            Some("txt") => Ok(Self::Plain),
            _ => Err(ConfigError::UnsupportedExtension(file.to_owned())),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

/// Validate that a readme file exists and renders.
///
/// Markdown is pushed through the renderer; reStructuredText and plain text
/// have no renderer here, so being readable as text is the whole check.
/// Skipped entirely when the parse options disable readme checking.
fn render_readme(cx: &ConvertCx<'_>, file: &str, content_type: ContentType) -> Result<(), ConfigError> {
    if !cx.check_readme {
        return Ok(());
    }
    let full_path = cx.dir.join(file);
    let content = fs::read_to_string(&full_path).map_err(|e| ConfigError::io(full_path, e))?;
    if content_type == ContentType::Markdown {
        // Drive the parser over the whole document; unbalanced structures are
        // normalized rather than fatal, so this validates readability.
        pulldown_cmark::Parser::new(&content).for_each(drop);
    }
    Ok(())
}

/// The `project.readme` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readme {
    pub content_type: Option<ContentType>,
    pub charset: String,
    pub file: Option<String>,
    pub text: Option<String>,
}

impl Readme {
    pub fn from_file(file: impl Into<String>, charset: impl Into<String>) -> Result<Self, ConfigError> {
        let file = file.into();
        let content_type = ContentType::from_path(&file)?;
        Ok(Self {
            content_type: Some(content_type),
            charset: charset.into(),
            file: Some(file),
            text: None,
        })
    }

    pub fn from_text(text: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            content_type: Some(content_type),
            charset: DEFAULT_CHARSET.to_owned(),
            file: None,
            text: Some(text.into()),
        }
    }

    /// Decode the polymorphic raw `readme` value (path string or table).
    pub fn from_raw(cx: &ConvertCx<'_>, raw: &toml::Value, path: &FieldPath) -> Result<Self, ConfigError> {
        match raw {
            toml::Value::String(file) => {
                let content_type = ContentType::from_path(file)?;
                render_readme(cx, file, content_type)?;
                Ok(Self {
                    content_type: Some(content_type),
                    charset: DEFAULT_CHARSET.to_owned(),
                    file: Some(file.clone()),
                    text: None,
                })
            }
            toml::Value::Table(table) => Self::from_raw_table(cx, table),
            other => Err(ConfigError::TypeMismatch {
                path: path.clone(),
                what: "type",
                expected: "string or table",
                actual: value_type_name(other),
            }),
        }
    }

    fn from_raw_table(cx: &ConvertCx<'_>, table: &toml::Table) -> Result<Self, ConfigError> {
        if table.is_empty() {
            return Err(ConfigError::schema("The 'project.readme' table cannot be empty."));
        }

        let get_str = |key: &str| -> Result<Option<&str>, ConfigError> {
            match table.get(key) {
                None => Ok(None),
                Some(toml::Value::String(s)) => Ok(Some(s)),
                Some(other) => Err(ConfigError::TypeMismatch {
                    path: FieldPath::root("project").key("readme").key(key),
                    what: "type",
                    expected: "string",
                    actual: value_type_name(other),
                }),
            }
        };

        let file = get_str("file")?;
        let text = get_str("text")?;
        let content_type = get_str("content-type")?;
        let charset = get_str("charset")?;

        if file.is_some() && text.is_some() {
            return Err(ConfigError::schema(
                "The 'project.readme.file' and 'project.readme.text' keys are mutually exclusive.",
            ));
        }

        if let Some(unknown) = table
            .keys()
            .find(|k| !matches!(k.as_str(), "file" | "text" | "content-type" | "charset"))
        {
            return Err(ConfigError::schema(format!(
                "Unknown format for 'project.readme': unexpected key '{unknown}'"
            )));
        }

        if let Some(file) = file {
            let charset = charset.unwrap_or(DEFAULT_CHARSET);
            let content_type = match content_type {
                Some(mime) => ContentType::from_mime(mime).ok_or_else(|| {
                    ConfigError::schema(format!(
                        "Unrecognised value for 'project.readme.content-type': '{mime}'"
                    ))
                })?,
                None => ContentType::from_path(file)?,
            };
            render_readme(cx, file, content_type)?;
            return Ok(Self {
                content_type: Some(content_type),
                charset: charset.to_owned(),
                file: Some(file.to_owned()),
                text: None,
            });
        }

        if content_type.is_some() && text.is_none() {
            return Err(ConfigError::schema(
                "The 'project.readme.content-type' key cannot be provided on its own; \
                 Please provide the 'project.readme.text' key too.",
            ));
        }

        if charset.is_some() && text.is_none() {
            return Err(ConfigError::schema(
                "The 'project.readme.charset' key cannot be provided on its own; \
                 Please provide the 'project.readme.text' key too.",
            ));
        }

        if let Some(text) = text {
            let Some(mime) = content_type else {
                return Err(ConfigError::schema(
                    "The 'project.readme.content-type' key must be provided \
                     when 'project.readme.text' is given.",
                ));
            };
            let content_type = ContentType::from_mime(mime).ok_or_else(|| {
                ConfigError::schema(format!(
                    "Unrecognised value for 'project.readme.content-type': '{mime}'"
                ))
            })?;
            if charset.is_some() {
                // Charsets describe on-disk files, not inline text.
                return Err(ConfigError::schema(
                    "The 'project.readme.charset' key cannot be provided \
                     when 'project.readme.text' is given.",
                ));
            }
            return Ok(Self::from_text(text, content_type));
        }

        Err(ConfigError::schema("Unknown format for 'project.readme'"))
    }

    /// Read the referenced file (if any) into the `text` field, dropping the
    /// file reference. One-way.
    pub fn resolve(&mut self, dir: &Path) -> Result<(), ConfigError> {
        if self.text.is_none() {
            if let Some(file) = &self.file {
                let full_path = dir.join(file);
                self.text =
                    Some(fs::read_to_string(&full_path).map_err(|e| ConfigError::io(full_path, e))?);
                self.file = None;
            }
        }
        Ok(())
    }

    /// Project back to the on-disk form: a bare path string when only the file
    /// reference is set (with inferable content type and default charset),
    /// otherwise a table.
    pub fn to_toml_value(&self) -> toml::Value {
        let mut table = toml::Table::new();
        if let Some(content_type) = self.content_type {
            let inferred = self.file.as_deref().and_then(|f| ContentType::from_path(f).ok());
            if inferred != Some(content_type) {
                table.insert("content-type".to_owned(), content_type.as_mime().into());
            }
        }
        if self.charset != DEFAULT_CHARSET {
            table.insert("charset".to_owned(), self.charset.clone().into());
        }
        if let Some(file) = &self.file {
            table.insert("file".to_owned(), file.clone().into());
        } else if let Some(text) = &self.text {
            table.insert("text".to_owned(), text.clone().into());
        }

        if table.len() == 1 && table.contains_key("file") {
            self.file.clone().unwrap_or_default().into()
        } else {
            toml::Value::Table(table)
        }
    }
}

/// The `project.license` record: a file reference xor inline text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct License {
    pub file: Option<String>,
    pub text: Option<String>,
}

impl License {
    /// Decode the raw `license` value. The `file` variant is stat-checked
    /// eagerly; a missing file surfaces as an I/O error, not a schema error.
    pub fn from_raw(cx: &ConvertCx<'_>, raw: &toml::Value, path: &FieldPath) -> Result<Self, ConfigError> {
        let toml::Value::Table(table) = raw else {
            return Err(ConfigError::TypeMismatch {
                path: path.clone(),
                what: "type",
                expected: "table",
                actual: value_type_name(raw),
            });
        };

        let get_str = |key: &str| -> Result<Option<&str>, ConfigError> {
            match table.get(key) {
                None => Ok(None),
                Some(toml::Value::String(s)) => Ok(Some(s)),
                Some(other) => Err(ConfigError::TypeMismatch {
                    path: path.key(key),
                    what: "type",
                    expected: "string",
                    actual: value_type_name(other),
                }),
            }
        };

        let file = get_str("file")?;
        let text = get_str("text")?;

        match (file, text) {
            (Some(_), Some(_)) => Err(ConfigError::schema(
                "The 'project.license.file' and 'project.license.text' keys are mutually exclusive.",
            )),
            (None, Some(text)) => Ok(Self {
                file: None,
                text: Some(text.to_owned()),
            }),
            (Some(file), None) => {
                let full_path = cx.dir.join(file);
                fs::metadata(&full_path).map_err(|e| ConfigError::io(full_path, e))?;
                Ok(Self {
                    file: Some(file.to_owned()),
                    text: None,
                })
            }
            (None, None) => Err(ConfigError::schema(
                "The 'project.license' table should contain one of 'text' or 'file'.",
            )),
        }
    }

    /// Read the referenced file (if any) into the `text` field, dropping the
    /// file reference. One-way.
    pub fn resolve(&mut self, dir: &Path) -> Result<(), ConfigError> {
        if self.text.is_none() {
            if let Some(file) = &self.file {
                let full_path = dir.join(file);
                self.text =
                    Some(fs::read_to_string(&full_path).map_err(|e| ConfigError::io(full_path, e))?);
                self.file = None;
            }
        }
        Ok(())
    }

    /// Project back to the on-disk table; `file` wins if both are set.
    pub fn to_table(&self) -> toml::Table {
        let mut table = toml::Table::new();
        if let Some(file) = &self.file {
            table.insert("file".to_owned(), file.clone().into());
        } else if let Some(text) = &self.text {
            table.insert("text".to_owned(), text.clone().into());
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn cx(dir: &Path) -> ConvertCx<'_> {
        ConvertCx {
            dir,
            check_readme: true,
        }
    }

    fn readme_path() -> FieldPath {
        FieldPath::root("project").key("readme")
    }

    fn parse_readme(dir: &Path, toml_value: &str) -> Result<Readme, ConfigError> {
        let table: toml::Table = format!("readme = {toml_value}").parse().unwrap();
        Readme::from_raw(&cx(dir), &table["readme"], &readme_path())
    }

    #[test]
    fn string_form_infers_content_type() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "# hello\n").unwrap();
        let readme = parse_readme(dir.path(), "\"README.md\"").unwrap();
        assert_eq!(readme.content_type, Some(ContentType::Markdown));
        assert_eq!(readme.file.as_deref(), Some("README.md"));
        assert_eq!(readme.charset, "UTF-8");
    }

    #[test]
    fn unsupported_extension_is_not_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_readme(dir.path(), "\"README.doc\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(err.to_string(), "Unsupported extension for 'README.doc'");
    }

    #[test]
    fn empty_table_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_readme(dir.path(), "{}").unwrap_err();
        assert_eq!(err.to_string(), "The 'project.readme' table cannot be empty.");
    }

    #[test]
    fn file_and_text_are_mutually_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_readme(dir.path(), "{ file = \"x.md\", text = \"y\" }").unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn text_requires_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_readme(dir.path(), "{ text = \"y\" }").unwrap_err();
        assert!(err.to_string().contains("'project.readme.content-type' key must be provided"));
    }

    #[test]
    fn text_rejects_unknown_content_type_and_charset() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_readme(
            dir.path(),
            "{ text = \"y\", content-type = \"application/json\" }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unrecognised value"));

        let err = parse_readme(
            dir.path(),
            "{ text = \"y\", content-type = \"text/plain\", charset = \"latin-1\" }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("charset"));
    }

    #[test]
    fn content_type_alone_and_charset_alone_have_distinct_messages() {
        let dir = tempfile::tempdir().unwrap();
        let ct = parse_readme(dir.path(), "{ content-type = \"text/plain\" }").unwrap_err();
        let cs = parse_readme(dir.path(), "{ charset = \"latin-1\" }").unwrap_err();
        assert!(ct.to_string().contains("'project.readme.content-type' key cannot be provided on its own"));
        assert!(cs.to_string().contains("'project.readme.charset' key cannot be provided on its own"));
    }

    #[test]
    fn file_with_explicit_content_type() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.rst"), "hello\n").unwrap();
        let readme = parse_readme(
            dir.path(),
            "{ file = \"readme.rst\", content-type = \"text/x-rst\", charset = \"latin-1\" }",
        )
        .unwrap();
        assert_eq!(readme.content_type, Some(ContentType::Rst));
        assert_eq!(readme.charset, "latin-1");
    }

    #[test]
    fn projection_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "# hi\n").unwrap();
        let readme = parse_readme(dir.path(), "\"README.md\"").unwrap();
        // Only a file reference with inferable type: back to the bare string.
        assert_eq!(readme.to_toml_value(), toml::Value::String("README.md".into()));

        let inline = Readme::from_text("body", ContentType::Plain);
        let value = inline.to_toml_value();
        let table = value.as_table().unwrap();
        assert_eq!(table["text"].as_str(), Some("body"));
        assert_eq!(table["content-type"].as_str(), Some("text/plain"));
    }

    #[test]
    fn resolve_reads_the_file_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "# hi\n").unwrap();
        let mut readme = parse_readme(dir.path(), "\"README.md\"").unwrap();
        readme.resolve(dir.path()).unwrap();
        assert_eq!(readme.text.as_deref(), Some("# hi\n"));
        assert!(readme.file.is_none());
    }

    #[test]
    fn license_requires_exactly_one_of_file_or_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = FieldPath::root("project").key("license");
        let parse = |v: &str| {
            let table: toml::Table = format!("license = {v}").parse().unwrap();
            License::from_raw(&cx(dir.path()), &table["license"], &path)
        };

        assert!(parse("{}").unwrap_err().to_string().contains("one of 'text' or 'file'"));
        assert!(parse("{ file = \"L\", text = \"t\" }")
            .unwrap_err()
            .to_string()
            .contains("mutually exclusive"));

        let err = parse("{ file = \"MISSING\" }").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);

        fs::write(dir.path().join("LICENSE"), "MIT\n").unwrap();
        let license = parse("{ file = \"LICENSE\" }").unwrap();
        assert_eq!(license.file.as_deref(), Some("LICENSE"));
    }
}
