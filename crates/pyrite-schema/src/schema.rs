//! The declarative required-keys table-parser engine.
//!
//! A [`TableSchema`] names the keys a table understands, which of them are
//! required, which receive defaults, and a converter per key. [`TableSchema::parse`]
//! enforces required-key presence and dispatches converters; keys the schema
//! does not recognize are deliberately ignored here so partially-understood
//! documents keep parsing. The strict unknown-key rejection is a separate,
//! caller-level check ([`TableSchema::check_unknown_keys`]) against the raw table.

use crate::error::{ConfigError, FieldPath};
use crate::name::ProjectName;
use crate::pep440::{SpecifierSet, Version};
use crate::pep508::Requirement;
use crate::project::Author;
use crate::readme::{License, Readme};
use std::collections::BTreeMap;
use std::path::Path;

/// Ambient context for converters: the directory file references resolve
/// against, and whether readme rendering checks run. Replaces both
/// chdir-style ambient state and environment-variable toggles.
#[derive(Debug, Clone, Copy)]
pub struct ConvertCx<'a> {
    pub dir: &'a Path,
    pub check_readme: bool,
}

/// A normalized field value produced by a converter.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// An injected null default for an absent optional key.
    None,
    Str(String),
    Name(ProjectName),
    Version(Version),
    Specifiers(SpecifierSet),
    Requirements(Vec<Requirement>),
    StrList(Vec<String>),
    StrMap(BTreeMap<String, String>),
    EntryPoints(BTreeMap<String, BTreeMap<String, String>>),
    Extras(BTreeMap<String, Vec<Requirement>>),
    Authors(Vec<Author>),
    Readme(Readme),
    License(License),
    /// Pass-through for keys without a converter.
    Raw(toml::Value),
}

/// The result of a successful parse: recognized key -> normalized value.
/// Ordering is not meaningful at this layer; serialization re-imposes the
/// schema's declared key order.
pub type Record = BTreeMap<String, FieldValue>;

/// Per-key conversion function.
pub type Converter = fn(&ConvertCx<'_>, &toml::Table, &FieldPath) -> Result<FieldValue, ConfigError>;

/// Zero-argument constructor for container defaults; invoked per parse so a
/// default is never shared between documents.
pub type Factory = fn() -> FieldValue;

/// Declarative schema for one table.
///
/// Invariants: `required ⊆ keys`; every key in `defaults` and `factories` is
/// also in `keys`.
pub struct TableSchema {
    pub table_name: &'static str,
    /// Recognized keys, in declared (serialization) order.
    pub keys: &'static [&'static str],
    /// Keys that must be present unless `set_defaults` supplies them.
    pub required: &'static [&'static str],
    /// Keys defaulting to a null value when absent and `set_defaults` is on.
    pub defaults: &'static [&'static str],
    /// Keys defaulting to a fresh container when absent and `set_defaults` is on.
    pub factories: &'static [(&'static str, Factory)],
    /// Key -> converter; keys without one pass through unmodified.
    pub converters: &'static [(&'static str, Converter)],
}

impl TableSchema {
    fn factory_for(&self, key: &str) -> Option<Factory> {
        self.factories
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, factory)| *factory)
    }

    fn converter_for(&self, key: &str) -> Option<Converter> {
        self.converters
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, converter)| *converter)
    }

    /// Parse a raw table into a [`Record`].
    ///
    /// With `set_defaults`, absent optional keys are filled from `defaults`
    /// and `factories`, and a required key with a default need not be present.
    pub fn parse(
        &self,
        cx: &ConvertCx<'_>,
        table: &toml::Table,
        set_defaults: bool,
    ) -> Result<Record, ConfigError> {
        for key in self.required {
            if table.contains_key(*key) {
                continue;
            }
            let has_default =
                self.defaults.contains(key) || self.factory_for(key).is_some();
            if !(set_defaults && has_default) {
                return Err(ConfigError::MissingField {
                    path: FieldPath::root(self.table_name).key(*key),
                });
            }
        }

        let mut record = Record::new();
        for key in self.keys {
            if table.contains_key(*key) {
                let path = FieldPath::root(self.table_name).key(*key);
                let value = match self.converter_for(key) {
                    Some(converter) => converter(cx, table, &path)?,
                    None => FieldValue::Raw(table[*key].clone()),
                };
                record.insert((*key).to_owned(), value);
            } else if set_defaults {
                if self.defaults.contains(key) {
                    record.insert((*key).to_owned(), FieldValue::None);
                } else if let Some(factory) = self.factory_for(key) {
                    record.insert((*key).to_owned(), factory());
                }
            }
        }

        Ok(record)
    }

    /// Strict unknown-key rejection against the raw, pre-parse table.
    ///
    /// Kept out of [`parse`] on purpose: the engine stays forward-compatible
    /// while callers that want strictness opt in here.
    pub fn check_unknown_keys(
        &self,
        table: &toml::Table,
        extra_allowed: &[&str],
    ) -> Result<(), ConfigError> {
        let mut unknown: Vec<&str> = table
            .keys()
            .map(String::as_str)
            .filter(|k| !self.keys.contains(k) && !extra_allowed.contains(k))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort_unstable();
        let noun = if unknown.len() == 1 { "key" } else { "keys" };
        Err(ConfigError::schema(format!(
            "Unknown {noun} in '[{}]': {}",
            self.table_name,
            quote_join(&unknown)
        )))
    }
}

/// Join quoted items with commas and a final "and": `'a', 'b' and 'c'`.
pub(crate) fn quote_join(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => format!("'{only}'"),
        [init @ .., last] => {
            let quoted: Vec<String> = init.iter().map(|i| format!("'{i}'")).collect();
            format!("{} and '{last}'", quoted.join(", "))
        }
    }
}

/// Human-readable name for a raw TOML value's type, for diagnostics.
pub fn value_type_name(value: &toml::Value) -> &'static str {
    match value {
        toml::Value::String(_) => "string",
        toml::Value::Integer(_) => "integer",
        toml::Value::Float(_) => "float",
        toml::Value::Boolean(_) => "boolean",
        toml::Value::Datetime(_) => "datetime",
        toml::Value::Array(_) => "array",
        toml::Value::Table(_) => "table",
    }
}

/// Assert `value` is an array and not a string.
///
/// The string rejection is explicit: text is iterable character-by-character
/// in the source language of most build backends, so a bare string would
/// otherwise satisfy a naive sequence check and silently mean something else.
pub fn assert_sequence_not_str<'v>(
    value: &'v toml::Value,
    path: &FieldPath,
    what: &'static str,
) -> Result<&'v [toml::Value], ConfigError> {
    match value {
        toml::Value::Array(items) => Ok(items),
        other => Err(ConfigError::TypeMismatch {
            path: path.clone(),
            what,
            expected: "array",
            actual: value_type_name(other),
        }),
    }
}

/// Assert `value` is a string.
pub fn assert_str<'v>(value: &'v toml::Value, path: &FieldPath) -> Result<&'v str, ConfigError> {
    match value {
        toml::Value::String(s) => Ok(s),
        other => Err(ConfigError::TypeMismatch {
            path: path.clone(),
            what: "type",
            expected: "string",
            actual: value_type_name(other),
        }),
    }
}

/// Assert `value` is a table.
pub fn assert_table<'v>(
    value: &'v toml::Value,
    path: &FieldPath,
) -> Result<&'v toml::Table, ConfigError> {
    match value {
        toml::Value::Table(table) => Ok(table),
        other => Err(ConfigError::TypeMismatch {
            path: path.clone(),
            what: "type",
            expected: "table",
            actual: value_type_name(other),
        }),
    }
}

/// Assert the `idx`-th element of an array is a string.
pub fn assert_indexed_str<'v>(
    value: &'v toml::Value,
    path: &FieldPath,
    idx: usize,
) -> Result<&'v str, ConfigError> {
    match value {
        toml::Value::String(s) => Ok(s),
        other => Err(ConfigError::IndexedTypeMismatch {
            path: path.clone(),
            index: idx,
            expected: "string",
            actual: value_type_name(other),
        }),
    }
}
