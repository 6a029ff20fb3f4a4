//! Trove classifier validation.
//!
//! Classifiers are `::`-separated paths rooted in a fixed top-level
//! vocabulary. Validation here is structural: the root segment must be one of
//! the known categories and the path shape must be well-formed, which catches
//! the misspelling class of errors without carrying the full tag list.

use crate::error::ConfigError;

/// Top-level classifier categories.
const ROOT_SEGMENTS: &[&str] = &[
    "Development Status",
    "Environment",
    "Framework",
    "Intended Audience",
    "License",
    "Natural Language",
    "Operating System",
    "Programming Language",
    "Topic",
    "Typing",
];

/// Segment separator mandated by the classifier grammar.
const SEPARATOR: &str = " :: ";

/// Validate one classifier tag.
pub fn validate_classifier(classifier: &str) -> Result<(), ConfigError> {
    let err = || ConfigError::schema(format!("Unknown classifier '{classifier}'"));

    let mut segments = classifier.split(SEPARATOR);
    let root = segments.next().ok_or_else(err)?;
    if !ROOT_SEGMENTS.contains(&root) {
        return Err(err());
    }
    // Single-segment classifiers exist only for "Typing"-style leaves; every
    // listed root except those requires at least one sub-segment.
    let mut rest = segments.peekable();
    if rest.peek().is_none() && root != "Typing" {
        return Err(err());
    }
    for segment in rest {
        if segment.trim() != segment || segment.is_empty() {
            return Err(err());
        }
    }
    Ok(())
}

/// Validate a collection of classifier tags, failing on the first unknown one.
pub fn validate_classifiers<'a>(
    classifiers: impl IntoIterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    for classifier in classifiers {
        validate_classifier(classifier)?;
    }
    Ok(())
}
