//! The `[project]` table (PEP 621 package metadata).

use crate::classifiers::validate_classifiers;
use crate::error::{ConfigError, FieldPath};
use crate::name::ProjectName;
use crate::pep440::{SpecifierSet, Version};
use crate::pep508::{combine_requirements, is_valid_extra, normalize_name, Requirement};
use crate::readme::{License, Readme};
use crate::schema::{
    assert_indexed_str, assert_sequence_not_str, assert_str, assert_table, value_type_name,
    ConvertCx, FieldValue, TableSchema,
};
use email_address::EmailAddress;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// An author or maintainer: optional display name, optional validated e-mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Author {
    pub fn to_toml(&self) -> toml::Table {
        let mut table = toml::Table::new();
        if let Some(name) = &self.name {
            table.insert("name".to_owned(), name.clone().into());
        }
        if let Some(email) = &self.email {
            table.insert("email".to_owned(), email.clone().into());
        }
        table
    }
}

/// Normalized `[project]` record.
///
/// `Option` tracks presence in the source document so re-serialization only
/// emits what was written (or injected by defaults).
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub name: ProjectName,
    pub version: Option<Version>,
    pub description: Option<String>,
    pub readme: Option<Readme>,
    pub requires_python: Option<SpecifierSet>,
    pub license: Option<License>,
    pub authors: Option<Vec<Author>>,
    pub maintainers: Option<Vec<Author>>,
    pub keywords: Option<Vec<String>>,
    pub classifiers: Option<Vec<String>>,
    pub urls: Option<BTreeMap<String, String>>,
    pub scripts: Option<BTreeMap<String, String>>,
    pub gui_scripts: Option<BTreeMap<String, String>>,
    pub entry_points: Option<BTreeMap<String, BTreeMap<String, String>>>,
    pub dependencies: Option<Vec<Requirement>>,
    pub optional_dependencies: Option<BTreeMap<String, Vec<Requirement>>>,
    /// Fields deferred to build time. May never contain `name`.
    pub dynamic: Option<Vec<String>>,
}

fn convert_name(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    let raw = assert_str(&table["name"], path)?;
    Ok(FieldValue::Name(ProjectName::parse(raw)?))
}

fn convert_version(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    // TOML numbers are coerced to text first, so `version = 1.0` parses the
    // same as `version = "1.0"`.
    let text = match &table["version"] {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(n) => n.to_string(),
        toml::Value::Float(f) => f.to_string(),
        other => {
            return Err(ConfigError::TypeMismatch {
                path: path.clone(),
                what: "type",
                expected: "string",
                actual: value_type_name(other),
            })
        }
    };
    let version: Version = text.parse().map_err(|e: crate::pep440::VersionError| {
        ConfigError::schema(e.to_string())
    })?;
    Ok(FieldValue::Version(version))
}

fn convert_description(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    let description = assert_str(&table["description"], path)?;
    Ok(FieldValue::Str(description.trim().to_owned()))
}

fn convert_readme(
    cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    Ok(FieldValue::Readme(Readme::from_raw(cx, &table["readme"], path)?))
}

fn convert_requires_python(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    let raw = assert_str(&table["requires-python"], path)?;
    let specifiers: SpecifierSet = raw.parse().map_err(|e: crate::pep440::SpecifierError| {
        ConfigError::schema(e.to_string())
    })?;
    Ok(FieldValue::Specifiers(specifiers))
}

fn convert_license(
    cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    Ok(FieldValue::License(License::from_raw(cx, &table["license"], path)?))
}

fn convert_people(
    table: &toml::Table,
    path: &FieldPath,
    key: &str,
) -> Result<FieldValue, ConfigError> {
    let items = assert_sequence_not_str(&table[key], path, "type")?;
    let mut people = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        let toml::Value::Table(person) = item else {
            return Err(ConfigError::IndexedTypeMismatch {
                path: path.clone(),
                index: idx,
                expected: "table",
                actual: value_type_name(item),
            });
        };

        let name = match person.get("name") {
            None => None,
            Some(value) => {
                let name = assert_str(value, &path.index(idx).key("name"))?;
                if name.contains(',') {
                    // Commas separate entries in the downstream metadata format.
                    return Err(ConfigError::schema(format!(
                        "The '{path}[{idx}].name' key cannot contain commas."
                    )));
                }
                Some(name.to_owned())
            }
        };

        let email = match person.get("email") {
            None => None,
            Some(value) => {
                let email = assert_str(value, &path.index(idx).key("email"))?;
                EmailAddress::from_str(email).map_err(|e| {
                    ConfigError::schema(format!(
                        "Invalid email '{email}' for '{path}[{idx}].email': {e}"
                    ))
                })?;
                Some(email.to_owned())
            }
        };

        people.push(Author { name, email });
    }

    Ok(FieldValue::Authors(people))
}

fn convert_authors(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    convert_people(table, path, "authors")
}

fn convert_maintainers(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    convert_people(table, path, "maintainers")
}

fn string_set(
    table: &toml::Table,
    path: &FieldPath,
    key: &str,
) -> Result<BTreeSet<String>, ConfigError> {
    let items = assert_sequence_not_str(&table[key], path, "type")?;
    let mut set = BTreeSet::new();
    for (idx, item) in items.iter().enumerate() {
        set.insert(assert_indexed_str(item, path, idx)?.to_owned());
    }
    Ok(set)
}

fn convert_keywords(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    let mut keywords: Vec<String> = string_set(table, path, "keywords")?.into_iter().collect();
    keywords.sort_by(|a, b| natord::compare_ignore_case(a, b));
    Ok(FieldValue::StrList(keywords))
}

fn convert_classifiers(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    let set = string_set(table, path, "classifiers")?;
    validate_classifiers(set.iter().map(String::as_str))?;
    let mut classifiers: Vec<String> = set.into_iter().collect();
    classifiers.sort_by(|a, b| natord::compare(a, b));
    Ok(FieldValue::StrList(classifiers))
}

fn convert_urls(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    let urls = assert_table(&table["urls"], path)?;
    let mut normalized = BTreeMap::new();
    for (label, value) in urls {
        let label_path = path.key(label);
        let raw = match value {
            toml::Value::String(s) => s,
            other => {
                return Err(ConfigError::TypeMismatch {
                    path: label_path,
                    what: "value type",
                    expected: "string",
                    actual: value_type_name(other),
                })
            }
        };
        let url = url::Url::parse(raw)
            .map_err(|e| ConfigError::schema(format!("Invalid URL for '{label_path}': {e}")))?;
        normalized.insert(label.clone(), url.to_string());
    }
    Ok(FieldValue::StrMap(normalized))
}

fn convert_script_table(
    table: &toml::Table,
    path: &FieldPath,
    key: &str,
) -> Result<FieldValue, ConfigError> {
    let scripts = assert_table(&table[key], path)?;
    let mut map = BTreeMap::new();
    for (name, value) in scripts {
        match value {
            toml::Value::String(reference) => {
                map.insert(name.clone(), reference.clone());
            }
            other => {
                return Err(ConfigError::TypeMismatch {
                    path: path.key(name),
                    what: "value type",
                    expected: "string",
                    actual: value_type_name(other),
                })
            }
        }
    }
    Ok(FieldValue::StrMap(map))
}

fn convert_scripts(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    convert_script_table(table, path, "scripts")
}

fn convert_gui_scripts(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    convert_script_table(table, path, "gui-scripts")
}

fn convert_entry_points(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    let entry_points = assert_table(&table["entry-points"], path)?;
    let mut groups = BTreeMap::new();
    for (group, sub_table) in entry_points {
        // Script groups have dedicated keys; match case/separator-insensitively
        // so "console_scripts" and "Console-Scripts" are both redirected.
        let redirect = match normalize_name(group).as_str() {
            "console-scripts" => Some("scripts"),
            "gui-scripts" => Some("gui-scripts"),
            _ => None,
        };
        if let Some(target) = redirect {
            return Err(ConfigError::schema(format!(
                "The '{path}.{group}' group is reserved; \
                 define these entry points in '[project.{target}]' instead."
            )));
        }

        let group_path = path.key(group);
        let toml::Value::Table(entries) = sub_table else {
            return Err(ConfigError::TypeMismatch {
                path: group_path,
                what: "value type",
                expected: "table",
                actual: value_type_name(sub_table),
            });
        };
        let mut group_map = BTreeMap::new();
        for (name, reference) in entries {
            match reference {
                toml::Value::String(reference) => {
                    group_map.insert(name.clone(), reference.clone());
                }
                other => {
                    return Err(ConfigError::TypeMismatch {
                        path: group_path.key(name),
                        what: "value type",
                        expected: "string",
                        actual: value_type_name(other),
                    })
                }
            }
        }
        groups.insert(group.clone(), group_map);
    }
    Ok(FieldValue::EntryPoints(groups))
}

fn convert_dependencies(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    let items = assert_sequence_not_str(&table["dependencies"], path, "type")?;
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

fn convert_optional_dependencies(
    _cx: &ConvertCx<'_>,
    table: &toml::Table,
    path: &FieldPath,
) -> Result<FieldValue, ConfigError> {
    let optional = assert_table(&table["optional-dependencies"], path)?;
    let mut extras = BTreeMap::new();
    for (extra, deps) in optional {
        if !is_valid_extra(extra) {
            return Err(ConfigError::schema(format!(
                "Invalid extra name '{extra}' in '{path}'"
            )));
        }
        let extra_path = path.key(extra);
        let items = assert_sequence_not_str(deps, &extra_path, "value type")?;
        let mut requirements = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let spec = assert_indexed_str(item, &extra_path, idx)?;
            let requirement: Requirement = spec.parse().map_err(|e| {
                ConfigError::schema(format!("Invalid value for '{extra_path}[{idx}]': {e}"))
            })?;
            requirements.push(requirement);
        }
        extras.insert(extra.clone(), combine_requirements(requirements));
    }
    Ok(FieldValue::Extras(extras))
}

fn empty_authors() -> FieldValue {
    FieldValue::Authors(Vec::new())
}

fn empty_str_list() -> FieldValue {
    FieldValue::StrList(Vec::new())
}

fn empty_str_map() -> FieldValue {
    FieldValue::StrMap(BTreeMap::new())
}

fn empty_entry_points() -> FieldValue {
    FieldValue::EntryPoints(BTreeMap::new())
}

fn empty_requirements() -> FieldValue {
    FieldValue::Requirements(Vec::new())
}

fn empty_extras() -> FieldValue {
    FieldValue::Extras(BTreeMap::new())
}

pub const PROJECT_SCHEMA: TableSchema = TableSchema {
    table_name: "project",
    keys: &[
        "name",
        "version",
        "description",
        "readme",
        "requires-python",
        "license",
        "authors",
        "maintainers",
        "keywords",
        "classifiers",
        "urls",
        "scripts",
        "gui-scripts",
        "entry-points",
        "dependencies",
        "optional-dependencies",
    ],
    required: &["name"],
    defaults: &["version", "description", "readme", "requires-python", "license"],
    factories: &[
        ("authors", empty_authors),
        ("maintainers", empty_authors),
        ("keywords", empty_str_list),
        ("classifiers", empty_str_list),
        ("urls", empty_str_map),
        ("scripts", empty_str_map),
        ("gui-scripts", empty_str_map),
        ("entry-points", empty_entry_points),
        ("dependencies", empty_requirements),
        ("optional-dependencies", empty_extras),
    ],
    converters: &[
        ("name", convert_name),
        ("version", convert_version),
        ("description", convert_description),
        ("readme", convert_readme),
        ("requires-python", convert_requires_python),
        ("license", convert_license),
        ("authors", convert_authors),
        ("maintainers", convert_maintainers),
        ("keywords", convert_keywords),
        ("classifiers", convert_classifiers),
        ("urls", convert_urls),
        ("scripts", convert_scripts),
        ("gui-scripts", convert_gui_scripts),
        ("entry-points", convert_entry_points),
        ("dependencies", convert_dependencies),
        ("optional-dependencies", convert_optional_dependencies),
    ],
};

/// Parse the `[project]` table.
///
/// `dynamic` is extracted and validated before the generic parse so the
/// "name may not be dynamic" rule fires ahead of any per-key conversion.
pub fn parse_project(
    cx: &ConvertCx<'_>,
    table: &toml::Table,
    set_defaults: bool,
) -> Result<Project, ConfigError> {
    let dynamic = match table.get("dynamic") {
        None => None,
        Some(value) => {
            let path = FieldPath::root("project").key("dynamic");
            let items = assert_sequence_not_str(value, &path, "type")?;
            let mut fields = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                fields.push(assert_indexed_str(item, &path, idx)?.to_owned());
            }
            Some(fields)
        }
    };

    if dynamic.as_ref().is_some_and(|d| d.iter().any(|f| f == "name")) {
        return Err(ConfigError::schema("The 'project.name' field may not be dynamic."));
    }

    let mut record = PROJECT_SCHEMA.parse(cx, table, set_defaults)?;

    let mut take = |key: &str| record.remove(key);
    let name = match take("name") {
        Some(FieldValue::Name(name)) => name,
        _ => unreachable!("'name' is required and has no default"),
    };

    macro_rules! field {
        ($key:literal, $variant:ident) => {
            match take($key) {
                Some(FieldValue::$variant(value)) => Some(value),
                _ => None,
            }
        };
    }

    Ok(Project {
        name,
        version: field!("version", Version),
        description: field!("description", Str),
        readme: field!("readme", Readme),
        requires_python: field!("requires-python", Specifiers),
        license: field!("license", License),
        authors: field!("authors", Authors),
        maintainers: field!("maintainers", Authors),
        keywords: field!("keywords", StrList),
        classifiers: field!("classifiers", StrList),
        urls: field!("urls", StrMap),
        scripts: field!("scripts", StrMap),
        gui_scripts: field!("gui-scripts", StrMap),
        entry_points: field!("entry-points", EntryPoints),
        dependencies: field!("dependencies", Requirements),
        optional_dependencies: field!("optional-dependencies", Extras),
        dynamic,
    })
}

fn str_map_to_toml(map: &BTreeMap<String, String>) -> toml::Table {
    map.iter()
        .map(|(k, v)| (k.clone(), toml::Value::String(v.clone())))
        .collect()
}

fn requirement_array(requirements: &[Requirement]) -> toml::Value {
    toml::Value::Array(
        requirements
            .iter()
            .map(|r| toml::Value::String(r.to_string()))
            .collect(),
    )
}

impl Project {
    /// Re-project to the on-disk table in declared key order.
    ///
    /// With `use_given_name`, the name is emitted in its original spelling;
    /// reformatting uses this so normalization never rewrites the author's
    /// chosen capitalization.
    pub fn to_toml(&self, use_given_name: bool) -> toml::Table {
        let mut table = toml::Table::new();
        let name = if use_given_name {
            self.name.as_given()
        } else {
            self.name.as_str()
        };
        table.insert("name".to_owned(), name.to_owned().into());

        if let Some(version) = &self.version {
            table.insert("version".to_owned(), version.to_string().into());
        }
        if let Some(description) = &self.description {
            table.insert("description".to_owned(), description.clone().into());
        }
        if let Some(readme) = &self.readme {
            table.insert("readme".to_owned(), readme.to_toml_value());
        }
        if let Some(requires_python) = &self.requires_python {
            table.insert("requires-python".to_owned(), requires_python.to_string().into());
        }
        if let Some(license) = &self.license {
            table.insert("license".to_owned(), toml::Value::Table(license.to_table()));
        }
        if let Some(authors) = &self.authors {
            table.insert(
                "authors".to_owned(),
                toml::Value::Array(
                    authors.iter().map(|a| toml::Value::Table(a.to_toml())).collect(),
                ),
            );
        }
        if let Some(maintainers) = &self.maintainers {
            table.insert(
                "maintainers".to_owned(),
                toml::Value::Array(
                    maintainers.iter().map(|a| toml::Value::Table(a.to_toml())).collect(),
                ),
            );
        }
        if let Some(keywords) = &self.keywords {
            table.insert(
                "keywords".to_owned(),
                toml::Value::Array(keywords.iter().map(|k| k.clone().into()).collect()),
            );
        }
        if let Some(classifiers) = &self.classifiers {
            table.insert(
                "classifiers".to_owned(),
                toml::Value::Array(classifiers.iter().map(|c| c.clone().into()).collect()),
            );
        }
        if let Some(urls) = &self.urls {
            table.insert("urls".to_owned(), toml::Value::Table(str_map_to_toml(urls)));
        }
        if let Some(scripts) = &self.scripts {
            table.insert("scripts".to_owned(), toml::Value::Table(str_map_to_toml(scripts)));
        }
        if let Some(gui_scripts) = &self.gui_scripts {
            table.insert(
                "gui-scripts".to_owned(),
                toml::Value::Table(str_map_to_toml(gui_scripts)),
            );
        }
        if let Some(entry_points) = &self.entry_points {
            let groups: toml::Table = entry_points
                .iter()
                .map(|(group, entries)| {
                    (group.clone(), toml::Value::Table(str_map_to_toml(entries)))
                })
                .collect();
            table.insert("entry-points".to_owned(), toml::Value::Table(groups));
        }
        if let Some(dependencies) = &self.dependencies {
            table.insert("dependencies".to_owned(), requirement_array(dependencies));
        }
        if let Some(optional_dependencies) = &self.optional_dependencies {
            let extras: toml::Table = optional_dependencies
                .iter()
                .map(|(extra, deps)| (extra.clone(), requirement_array(deps)))
                .collect();
            table.insert("optional-dependencies".to_owned(), toml::Value::Table(extras));
        }
        if let Some(dynamic) = &self.dynamic {
            table.insert(
                "dynamic".to_owned(),
                toml::Value::Array(dynamic.iter().map(|d| d.clone().into()).collect()),
            );
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::path::Path;

    fn cx() -> ConvertCx<'static> {
        ConvertCx {
            dir: Path::new("."),
            check_readme: false,
        }
    }

    fn parse(toml_text: &str, set_defaults: bool) -> Result<Project, ConfigError> {
        let table: toml::Table = toml_text.parse().unwrap();
        parse_project(&cx(), &table, set_defaults)
    }

    #[test]
    fn name_is_required() {
        let err = parse("", false).unwrap_err();
        assert_eq!(err.to_string(), "The 'project.name' field must be provided.");
        // name has no default, so set_defaults cannot satisfy it either.
        assert!(parse("", true).is_err());
    }

    #[test]
    fn name_is_normalized_with_original_retained() {
        let project = parse("name = 'My.Project_Name'", false).unwrap();
        assert_eq!(project.name.as_str(), "my-project-name");
        assert_eq!(project.name.as_given(), "My.Project_Name");
    }

    #[test]
    fn invalid_name_is_a_schema_error() {
        let err = parse("name = '???'", false).unwrap_err();
        assert_eq!(err.to_string(), "The value for 'project.name' is invalid.");
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn name_may_not_be_dynamic() {
        let err = parse("name = 'x'\ndynamic = ['name']", false).unwrap_err();
        assert_eq!(err.to_string(), "The 'project.name' field may not be dynamic.");

        let project = parse("name = 'x'\ndynamic = ['version']", false).unwrap();
        assert_eq!(project.dynamic.as_deref(), Some(["version".to_owned()].as_slice()));
    }

    #[test]
    fn version_parses_and_canonicalizes() {
        let project = parse("name = 'x'\nversion = '1.0.ALPHA1'", false).unwrap();
        assert_eq!(project.version.unwrap().to_string(), "1.0a1");

        let err = parse("name = 'x'\nversion = 'not-a-version'", false).unwrap_err();
        assert_eq!(err.to_string(), "Invalid version: 'not-a-version'");
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn description_is_stripped() {
        let project = parse("name = 'x'\ndescription = '  hi  '", false).unwrap();
        assert_eq!(project.description.as_deref(), Some("hi"));
    }

    #[test]
    fn requires_python_rejects_bad_specifiers() {
        let project = parse("name = 'x'\nrequires-python = '>=3.8'", false).unwrap();
        assert_eq!(project.requires_python.unwrap().to_string(), ">=3.8");

        let err = parse("name = 'x'\nrequires-python = '3.8'", false).unwrap_err();
        assert_eq!(err.to_string(), "Invalid specifier: '3.8'");
    }

    #[test]
    fn author_names_may_not_contain_commas() {
        let err = parse(
            "name = 'x'\nauthors = [{name = 'Last, First'}]",
            false,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The 'project.authors[0].name' key cannot contain commas."
        );
    }

    #[test]
    fn author_emails_are_validated_with_the_index_in_the_message() {
        let project = parse(
            "name = 'x'\nauthors = [{name = 'A', email = 'a@example.com'}]",
            false,
        )
        .unwrap();
        let authors = project.authors.unwrap();
        assert_eq!(authors[0].email.as_deref(), Some("a@example.com"));

        let err = parse(
            "name = 'x'\nmaintainers = [{name = 'A'}, {email = 'not-an-email'}]",
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("'project.maintainers[1].email'"));
    }

    #[test]
    fn non_table_author_entries_are_indexed_type_errors() {
        let err = parse("name = 'x'\nauthors = ['oops']", false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid type for 'project.authors[0]': expected table, got string"
        );
    }

    #[test]
    fn keywords_deduplicate_and_sort_naturally() {
        let project = parse(
            "name = 'x'\nkeywords = ['zeta', 'item10', 'item2', 'Alpha', 'zeta']",
            false,
        )
        .unwrap();
        assert_eq!(
            project.keywords.unwrap(),
            ["Alpha", "item2", "item10", "zeta"]
        );
    }

    #[test]
    fn classifiers_are_validated_and_sorted() {
        let project = parse(
            "name = 'x'\nclassifiers = [\n  'Programming Language :: Python :: 3.10',\n  'Programming Language :: Python :: 3.9',\n]",
            false,
        )
        .unwrap();
        assert_eq!(
            project.classifiers.unwrap(),
            [
                "Programming Language :: Python :: 3.9",
                "Programming Language :: Python :: 3.10"
            ]
        );

        let err = parse("name = 'x'\nclassifiers = ['Made :: Up']", false).unwrap_err();
        assert_eq!(err.to_string(), "Unknown classifier 'Made :: Up'");
    }

    #[test]
    fn urls_are_normalized() {
        let project = parse(
            "name = 'x'\n[urls]\nHomepage = 'https://example.com'",
            false,
        )
        .unwrap();
        assert_eq!(
            project.urls.unwrap()["Homepage"],
            "https://example.com/"
        );

        let err = parse("name = 'x'\n[urls]\nHomepage = 'not a url'", false).unwrap_err();
        assert!(err.to_string().contains("Invalid URL for 'project.urls.Homepage'"));
    }

    #[test]
    fn entry_points_redirect_reserved_groups() {
        for group in ["console_scripts", "console-scripts", "gui_scripts", "Gui-Scripts"] {
            let err = parse(
                &format!("name = 'x'\n[entry-points.\"{group}\"]\ntool = 'pkg:fn'"),
                false,
            )
            .unwrap_err();
            assert!(err.to_string().contains("is reserved"), "{group}: {err}");
        }

        let project = parse(
            "name = 'x'\n[entry-points.'pytest11']\nplug = 'pkg.plugin:entry'",
            false,
        )
        .unwrap();
        assert_eq!(
            project.entry_points.unwrap()["pytest11"]["plug"],
            "pkg.plugin:entry"
        );
    }

    #[test]
    fn dependencies_merge_and_sort() {
        let project = parse(
            "name = 'x'\ndependencies = ['zeta', 'A>=1', 'A<2']",
            false,
        )
        .unwrap();
        let deps = project.dependencies.unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].to_string(), "A<2,>=1");
        assert_eq!(deps[1].to_string(), "zeta");
    }

    #[test]
    fn optional_dependencies_have_distinct_shape_errors() {
        let err = parse("name = 'x'\noptional-dependencies = 'oops'", false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid type for 'project.optional-dependencies': expected table, got string"
        );

        let err = parse(
            "name = 'x'\n[optional-dependencies]\ntest = 'oops'",
            false,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value type for 'project.optional-dependencies.test': expected array, got string"
        );

        let err = parse(
            "name = 'x'\n[optional-dependencies]\ntest = [1]",
            false,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid type for 'project.optional-dependencies.test[0]': expected string, got integer"
        );

        let err = parse(
            "name = 'x'\n[optional-dependencies]\n'bad extra!' = []",
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid extra name"));
    }

    #[test]
    fn defaults_fill_optional_keys() {
        let bare = parse("name = 'x'", false).unwrap();
        assert!(bare.authors.is_none());
        assert!(bare.dependencies.is_none());

        let defaulted = parse("name = 'x'", true).unwrap();
        assert_eq!(defaulted.authors.as_deref(), Some([].as_slice()));
        assert_eq!(defaulted.dependencies.as_deref(), Some([].as_slice()));
        assert!(defaulted.version.is_none());
    }

    #[test]
    fn to_toml_uses_declared_key_order() {
        let project = parse(
            "name = 'My.Proj'\nversion = '1.0'\ndependencies = ['requests']\nkeywords = ['k']",
            false,
        )
        .unwrap();
        let table = project.to_toml(false);
        let keys: Vec<&String> = table.keys().collect();
        assert_eq!(keys, ["name", "version", "keywords", "dependencies"]);
        assert_eq!(table["name"].as_str(), Some("my-proj"));

        let given = project.to_toml(true);
        assert_eq!(given["name"].as_str(), Some("My.Proj"));
    }
}
