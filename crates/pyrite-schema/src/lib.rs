//! Schema engine for `pyproject.toml` manifests.
//!
//! This crate defines the core layer: the diagnostic model (`ConfigError`,
//! `FieldPath`), dependency-specifier and version grammars (`Requirement`,
//! `Version`, `SpecifierSet`), the declarative table-parser engine
//! (`TableSchema`), the `[build-system]` and `[project]` schemas, and
//! whole-document composition with deterministic re-serialization
//! (`PyProject`).

pub mod build_system;
pub mod classifiers;
pub mod dependency_groups;
pub mod document;
pub mod encode;
pub mod error;
pub mod name;
pub mod pep440;
pub mod pep508;
pub mod project;
pub mod readme;
pub mod schema;

pub use build_system::{parse_build_system, BuildSystem, BUILD_SYSTEM_SCHEMA};
pub use classifiers::{validate_classifier, validate_classifiers};
pub use dependency_groups::{parse_dependency_groups, DependencyGroups, GroupEntry};
pub use document::{ParseOptions, PyProject, ReformatOutcome, ToolParser};
pub use encode::{encode_document, EncodeOptions};
pub use error::{ConfigError, ErrorKind, FieldPath, PathSegment};
pub use name::ProjectName;
pub use pep440::{Operator, SpecifierSet, Version, VersionSpecifier};
pub use pep508::{combine_requirements, normalize_name, Requirement};
pub use project::{parse_project, Author, Project, PROJECT_SCHEMA};
pub use readme::{ContentType, License, Readme};
pub use schema::{ConvertCx, FieldValue, Record, TableSchema};
