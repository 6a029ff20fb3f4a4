//! The `[dependency-groups]` table (PEP 735).
//!
//! Each group maps to a list whose entries are either dependency-specifier
//! strings or `{include-group = "other"}` tables. Includes must name a
//! declared group; group names follow the extra-name token rule and are
//! matched after normalization.

use crate::error::{ConfigError, FieldPath};
use crate::pep508::{combine_requirements, is_valid_extra, normalize_name, Requirement};
use crate::schema::{assert_sequence_not_str, value_type_name};
use std::collections::BTreeMap;

/// One entry in a dependency group.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupEntry {
    Requirement(Requirement),
    /// Reference to another group, stored as given.
    Include(String),
}

/// Normalized dependency groups: name -> entries, includes first (sorted by
/// target), then merged requirements in sorted order.
pub type DependencyGroups = BTreeMap<String, Vec<GroupEntry>>;

pub fn parse_dependency_groups(table: &toml::Table) -> Result<DependencyGroups, ConfigError> {
    let root = FieldPath::root("dependency-groups");
    let mut groups = DependencyGroups::new();

    for (group_name, raw_entries) in table {
        if !is_valid_extra(group_name) {
            return Err(ConfigError::schema(format!(
                "Invalid dependency group name '{group_name}'"
            )));
        }
        let group_path = root.key(group_name);
        let entries = assert_sequence_not_str(raw_entries, &group_path, "type")?;

        let mut includes = Vec::new();
        let mut requirements = Vec::new();
        for (idx, entry) in entries.iter().enumerate() {
            match entry {
                toml::Value::String(spec) => {
                    let requirement: Requirement = spec.parse().map_err(|e| {
                        ConfigError::schema(format!("Invalid value for '{group_path}[{idx}]': {e}"))
                    })?;
                    requirements.push(requirement);
                }
                toml::Value::Table(entry_table) => {
                    let keys: Vec<&String> = entry_table.keys().collect();
                    if keys.len() != 1 || keys[0] != "include-group" {
                        return Err(ConfigError::schema(format!(
                            "Invalid table in '{group_path}[{idx}]': \
                             only the 'include-group' key is allowed"
                        )));
                    }
                    match &entry_table["include-group"] {
                        toml::Value::String(target) => includes.push(target.clone()),
                        other => {
                            return Err(ConfigError::TypeMismatch {
                                path: group_path.index(idx).key("include-group"),
                                what: "type",
                                expected: "string",
                                actual: value_type_name(other),
                            })
                        }
                    }
                }
                other => {
                    return Err(ConfigError::IndexedTypeMismatch {
                        path: group_path.clone(),
                        index: idx,
                        expected: "string or table",
                        actual: value_type_name(other),
                    })
                }
            }
        }

        includes.sort();
        includes.dedup();
        let mut group: Vec<GroupEntry> = includes.into_iter().map(GroupEntry::Include).collect();
        group.extend(
            combine_requirements(requirements)
                .into_iter()
                .map(GroupEntry::Requirement),
        );
        groups.insert(group_name.clone(), group);
    }

    // Includes may be declared before their target, so resolve after the
    // whole table is collected.
    let declared: Vec<String> = groups.keys().map(|name| normalize_name(name)).collect();
    for (group_name, entries) in &groups {
        for entry in entries {
            if let GroupEntry::Include(target) = entry {
                if !declared.contains(&normalize_name(target)) {
                    return Err(ConfigError::schema(format!(
                        "Dependency group '{group_name}' includes undeclared group '{target}'"
                    )));
                }
            }
        }
    }

    Ok(groups)
}

/// Re-project to the on-disk table form.
pub fn dependency_groups_to_toml(groups: &DependencyGroups) -> toml::Table {
    let mut table = toml::Table::new();
    for (name, entries) in groups {
        let values = entries
            .iter()
            .map(|entry| match entry {
                GroupEntry::Requirement(requirement) => {
                    toml::Value::String(requirement.to_string())
                }
                GroupEntry::Include(target) => {
                    let mut include = toml::Table::new();
                    include.insert("include-group".to_owned(), target.clone().into());
                    toml::Value::Table(include)
                }
            })
            .collect();
        table.insert(name.clone(), toml::Value::Array(values));
    }
    table
}
