//! PEP 508 dependency specifiers and PEP 503 name normalization.
//!
//! A [`Requirement`] is a package name plus optional extras, version
//! constraints, a direct-reference URL, and an environment marker. Markers are
//! captured verbatim and re-emitted; they are never evaluated here.

use crate::pep440::SpecifierSet;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid requirement: '{input}' ({reason})")]
pub struct RequirementError {
    pub input: String,
    pub reason: String,
}

/// Fold case and collapse runs of `.`, `_`, `-` into a single `-` (PEP 503).
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for c in name.chars() {
        if matches!(c, '.' | '_' | '-') {
            if !last_was_sep {
                out.push('-');
            }
            last_was_sep = true;
        } else {
            out.extend(c.to_lowercase());
            last_was_sep = false;
        }
    }
    out
}

/// Check a name against the core-metadata pattern: alphanumeric at both ends,
/// `.`/`_`/`-` permitted in between (case-insensitive).
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphanumeric() {
        return false;
    }
    let rest: Vec<char> = chars.collect();
    match rest.last() {
        None => true,
        Some(last) => {
            last.is_ascii_alphanumeric()
                && rest
                    .iter()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        }
    }
}

/// Extra names follow the same token rule as project names (PEP 685).
pub fn is_valid_extra(extra: &str) -> bool {
    is_valid_name(extra)
}

/// A parsed dependency specifier.
#[derive(Debug, Clone)]
pub struct Requirement {
    name: String,
    extras: Vec<String>,
    specifiers: SpecifierSet,
    url: Option<String>,
    marker: Option<String>,
}

impl Requirement {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn extras(&self) -> &[String] {
        &self.extras
    }

    pub fn specifiers(&self) -> &SpecifierSet {
        &self.specifiers
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    fn merge_from(&mut self, other: &Requirement) {
        for extra in &other.extras {
            if !self.extras.contains(extra) {
                self.extras.push(extra.clone());
            }
        }
        self.extras.sort();
        self.specifiers.merge(&other.specifiers);
        if self.url.is_none() {
            self.url.clone_from(&other.url);
        }
        if self.marker.is_none() {
            self.marker.clone_from(&other.marker);
        }
    }
}

impl FromStr for Requirement {
    type Err = RequirementError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let err = |reason: &str| RequirementError {
            input: input.trim().to_owned(),
            reason: reason.to_owned(),
        };

        let mut s = input.trim();
        if s.is_empty() {
            return Err(err("empty specifier"));
        }

        // Name: the longest leading run of name characters.
        let name_end = s
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
            .unwrap_or(s.len());
        let name = &s[..name_end];
        if !is_valid_name(name) {
            return Err(err("invalid package name"));
        }
        s = s[name_end..].trim_start();

        let mut extras = Vec::new();
        if let Some(rest) = s.strip_prefix('[') {
            let Some((extras_str, after)) = rest.split_once(']') else {
                return Err(err("unclosed extras bracket"));
            };
            for extra in extras_str.split(',') {
                let extra = extra.trim();
                if extra.is_empty() {
                    continue;
                }
                if !is_valid_extra(extra) {
                    return Err(err("invalid extra name"));
                }
                if !extras.contains(&extra.to_owned()) {
                    extras.push(extra.to_owned());
                }
            }
            extras.sort();
            s = after.trim_start();
        }

        // Split off the environment marker first; a URL may not contain an
        // unquoted ';' per the grammar.
        let mut marker = None;
        if let Some((before, marker_str)) = s.split_once(';') {
            let marker_str = marker_str.trim();
            if marker_str.is_empty() {
                return Err(err("empty environment marker"));
            }
            marker = Some(marker_str.to_owned());
            s = before.trim_end();
        }

        let mut url = None;
        let mut specifiers = SpecifierSet::default();
        if let Some(url_str) = s.strip_prefix('@') {
            let url_str = url_str.trim();
            if url_str.is_empty() {
                return Err(err("empty URL"));
            }
            url = Some(url_str.to_owned());
        } else if !s.is_empty() {
            let s = s.trim().trim_start_matches('(').trim_end_matches(')');
            specifiers = s
                .parse()
                .map_err(|e: crate::pep440::SpecifierError| err(&e.to_string()))?;
        }

        Ok(Self {
            name: name.to_owned(),
            extras,
            specifiers,
            url,
            marker,
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        if let Some(url) = &self.url {
            write!(f, "@ {url}")?;
        } else if !self.specifiers.is_empty() {
            write!(f, "{}", self.specifiers)?;
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for Requirement {}

impl Requirement {
    fn sort_key(&self) -> (String, String, &[String], Option<&String>, Option<&String>) {
        (
            self.normalized_name(),
            self.specifiers.to_string(),
            &self.extras,
            self.url.as_ref(),
            self.marker.as_ref(),
        )
    }
}

impl PartialOrd for Requirement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Requirement {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Merge requirements naming the same package by intersecting their constraint
/// sets (union of specifiers) and unioning extras; returns the merged set
/// sorted by normalized name then constraint text.
pub fn combine_requirements(requirements: Vec<Requirement>) -> Vec<Requirement> {
    let mut combined: Vec<Requirement> = Vec::new();
    for requirement in requirements {
        match combined
            .iter_mut()
            .find(|r| r.normalized_name() == requirement.normalized_name())
        {
            Some(existing) => existing.merge_from(&requirement),
            None => combined.push(requirement),
        }
    }
    combined.sort();
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(s: &str) -> Requirement {
        s.parse().unwrap()
    }

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize_name("My.Project_Name"), "my-project-name");
        assert_eq!(normalize_name("foo--bar"), "foo-bar");
        assert_eq!(normalize_name("Django"), "django");
    }

    #[test]
    fn validates_names() {
        assert!(is_valid_name("a"));
        assert!(is_valid_name("my-project.name_2"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("-leading"));
        assert!(!is_valid_name("trailing-"));
        assert!(!is_valid_name("???"));
    }

    #[test]
    fn parses_bare_and_constrained() {
        let r = req("requests");
        assert_eq!(r.name(), "requests");
        assert!(r.specifiers().is_empty());

        let r = req("requests >=2.0, <3");
        assert_eq!(r.to_string(), "requests<3,>=2.0");
    }

    #[test]
    fn parses_extras_url_and_marker() {
        let r = req("foo[b, a]>=1 ; python_version < \"3.10\"");
        assert_eq!(r.extras(), ["a", "b"]);
        assert_eq!(r.to_string(), "foo[a,b]>=1; python_version < \"3.10\"");

        let r = req("pip @ https://example.com/pip.whl");
        assert_eq!(r.url(), Some("https://example.com/pip.whl"));
        assert_eq!(r.to_string(), "pip@ https://example.com/pip.whl");
    }

    #[test]
    fn rejects_malformed() {
        assert!("".parse::<Requirement>().is_err());
        assert!("foo[".parse::<Requirement>().is_err());
        assert!("foo >=x".parse::<Requirement>().is_err());
        assert!("-bad-name".parse::<Requirement>().is_err());
    }

    #[test]
    fn combine_merges_same_package() {
        let merged = combine_requirements(vec![req("A>=1"), req("A<2")]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].to_string(), "A<2,>=1");
    }

    #[test]
    fn combine_deduplicates_identical() {
        let merged = combine_requirements(vec![req("A"), req("A")]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].to_string(), "A");
    }

    #[test]
    fn combine_unions_extras_and_sorts_by_name() {
        let merged = combine_requirements(vec![req("zeta"), req("foo[a]>=1"), req("foo[b]<2")]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].to_string(), "foo[a,b]<2,>=1");
        assert_eq!(merged[1].to_string(), "zeta");
    }
}
