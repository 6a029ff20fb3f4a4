//! The `[build-system]` table (PEP 517/518).

use crate::error::{ConfigError, FieldPath};
use crate::pep508::{combine_requirements, Requirement};
use crate::schema::{
    assert_indexed_str, assert_sequence_not_str, assert_str, ConvertCx, FieldValue, TableSchema,
};

/// Normalized `[build-system]` record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildSystem {
    /// Build requirements, deduplicated, merged, and sorted.
    pub requires: Vec<Requirement>,
    pub build_backend: Option<String>,
    pub backend_path: Option<Vec<String>>,
}

fn convert_requires(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    let items = assert_sequence_not_str(&table["requires"], path, "type")?;
    let mut requirements = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let spec = assert_indexed_str(item, path, idx)?;
        let requirement: Requirement = spec
            .parse()
            .map_err(|e| ConfigError::schema(format!("Invalid value for '{path}[{idx}]': {e}")))?;
        requirements.push(requirement);
    }
    Ok(FieldValue::Requirements(combine_requirements(requirements)))
}

fn convert_build_backend(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    Ok(FieldValue::Str(
        assert_str(&table["build-backend"], path)?.to_owned(),
    ))
}

fn convert_backend_path(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    let items = assert_sequence_not_str(&table["backend-path"], path, "type")?;
    let mut paths = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        paths.push(assert_indexed_str(item, path, idx)?.to_owned());
    }
    Ok(FieldValue::StrList(paths))
}

fn empty_requirements() -> FieldValue {
    FieldValue::Requirements(Vec::new())
}

pub const BUILD_SYSTEM_SCHEMA: TableSchema = TableSchema {
    table_name: "build-system",
    keys: &["requires", "build-backend", "backend-path"],
    required: &["requires"],
    defaults: &["build-backend", "backend-path"],
    factories: &[("requires", empty_requirements)],
    converters: &[
        ("requires", convert_requires),
        ("build-backend", convert_build_backend),
        ("backend-path", convert_backend_path),
    ],
};

/// Parse the `[build-system]` table, enforcing the cross-field invariant that
/// `backend-path` may not appear without `build-backend`.
pub fn parse_build_system(
    cx: &ConvertCx<'_>,
    table: &toml::Table,
    set_defaults: bool,
) -> Result<BuildSystem, ConfigError> {
    let mut record = BUILD_SYSTEM_SCHEMA.parse(cx, table, set_defaults)?;

    let backend_path = match record.remove("backend-path") {
        Some(FieldValue::StrList(paths)) => Some(paths),
        _ => None,
    };
    let build_backend = match record.remove("build-backend") {
        Some(FieldValue::Str(backend)) => Some(backend),
        _ => None,
    };

    if backend_path.is_some() && build_backend.is_none() {
        return Err(ConfigError::schema(
            "'build-system.backend-path' cannot be specified without \
             also specifying 'build-system.build-backend'",
        ));
    }

    let requires = match record.remove("requires") {
        Some(FieldValue::Requirements(requirements)) => requirements,
        _ => Vec::new(),
    };

    Ok(BuildSystem {
        requires,
        build_backend,
        backend_path,
    })
}

impl BuildSystem {
    /// Re-project to the on-disk table in declared key order.
    pub fn to_toml(&self) -> toml::Table {
        let mut table = toml::Table::new();
        table.insert(
            "requires".to_owned(),
            toml::Value::Array(
                self.requires
                    .iter()
                    .map(|r| toml::Value::String(r.to_string()))
                    .collect(),
            ),
        );
        if let Some(backend) = &self.build_backend {
            table.insert("build-backend".to_owned(), backend.clone().into());
        }
        if let Some(paths) = &self.backend_path {
            table.insert(
                "backend-path".to_owned(),
                toml::Value::Array(paths.iter().map(|p| p.clone().into()).collect()),
            );
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn cx() -> ConvertCx<'static> {
        ConvertCx {
            dir: Path::new("."),
            check_readme: false,
        }
    }

    fn parse(toml_text: &str, set_defaults: bool) -> Result<BuildSystem, ConfigError> {
        let table: toml::Table = toml_text.parse().unwrap();
        parse_build_system(&cx(), &table, set_defaults)
    }

    #[test]
    fn parses_full_table() {
        let bs = parse(
            r#"
requires = ["setuptools >=61", "wheel"]
build-backend = "setuptools.build_meta"
backend-path = ["../backend"]
"#,
            false,
        )
        .unwrap();
        assert_eq!(bs.build_backend.as_deref(), Some("setuptools.build_meta"));
        assert_eq!(bs.backend_path.as_deref(), Some(["../backend".to_owned()].as_slice()));
        assert_eq!(bs.requires[0].to_string(), "setuptools>=61");
        assert_eq!(bs.requires[1].to_string(), "wheel");
    }

    #[test]
    fn requires_is_required_unless_defaulted() {
        let err = parse("build-backend = 'x'", false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The 'build-system.requires' field must be provided."
        );

        let bs = parse("build-backend = 'x'", true).unwrap();
        assert!(bs.requires.is_empty());
    }

    #[test]
    fn requires_merges_duplicates() {
        let bs = parse(r#"requires = ["A>=1", "A<2", "b", "b"]"#, false).unwrap();
        assert_eq!(bs.requires.len(), 2);
        assert_eq!(bs.requires[0].to_string(), "A<2,>=1");
        assert_eq!(bs.requires[1].to_string(), "b");
    }

    #[test]
    fn requires_rejects_non_sequences_and_bad_elements() {
        let err = parse(r#"requires = "not-a-list""#, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid type for 'build-system.requires': expected array, got string"
        );

        let err = parse("requires = [1, 2, 3]", false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid type for 'build-system.requires[0]': expected string, got integer"
        );
    }

    #[test]
    fn backend_path_requires_build_backend() {
        let err = parse(
            r#"
requires = ["x"]
backend-path = ["../y"]
"#,
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot be specified without"));

        let ok = parse(
            r#"
requires = ["x"]
build-backend = "x"
backend-path = ["../y"]
"#,
            false,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn round_trips_through_to_toml() {
        let bs = parse(
            r#"
requires = ["wheel", "setuptools>=61"]
build-backend = "setuptools.build_meta"
"#,
            false,
        )
        .unwrap();
        let table = bs.to_toml();
        let reparsed = parse_build_system(&cx(), &table, false).unwrap();
        assert_eq!(bs, reparsed);
        // Declared key order is preserved in the projection.
        let keys: Vec<&String> = table.keys().collect();
        assert_eq!(keys, ["requires", "build-backend"]);
    }
}
