//! PEP 440 version and version-specifier grammar.
//!
//! Comparison and equality follow the scheme's own rules rather than string
//! comparison: `1.0` equals `1.0.0`, `1.0.dev1` sorts before `1.0a1`, and an
//! epoch dominates everything after it. Display always produces the canonical
//! spelling.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid version: '{0}'")]
pub struct VersionError(pub String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid specifier: '{0}'")]
pub struct SpecifierError(pub String);

/// Pre-release tag, ordered `a < b < rc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreTag {
    Alpha,
    Beta,
    Rc,
}

impl PreTag {
    fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "a",
            Self::Beta => "b",
            Self::Rc => "rc",
        }
    }
}

/// Local version segment; numeric segments compare greater than alphanumeric
/// ones, so the variant order here carries the ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum LocalSegment {
    Alpha(String),
    Num(u64),
}

/// A parsed PEP 440 version.
#[derive(Debug, Clone)]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<(PreTag, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Vec<LocalSegment>,
}

impl Version {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// Release segments with trailing zeros removed, for comparison.
    fn trimmed_release(&self) -> &[u64] {
        let mut end = self.release.len();
        while end > 1 && self.release[end - 1] == 0 {
            end -= 1;
        }
        &self.release[..end]
    }

    #[allow(clippy::type_complexity)]
    fn cmp_key(&self) -> (u64, &[u64], (u8, u8, u64), (u8, u64), (u8, u64), &[LocalSegment]) {
        // A dev release with no pre/post segment sorts before any pre-release
        // of the same release; a final release sorts after all pre-releases.
        let pre = match self.pre {
            None if self.post.is_none() && self.dev.is_some() => (0, 0, 0),
            None => (2, 0, 0),
            Some((tag, n)) => (1, tag as u8, n),
        };
        let post = match self.post {
            None => (0, 0),
            Some(n) => (1, n),
        };
        let dev = match self.dev {
            Some(n) => (0, n),
            None => (1, 0),
        };
        (self.epoch, self.trimmed_release(), pre, post, dev, &self.local)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_key() == other.cmp_key()
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_key().cmp(&other.cmp_key())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        f.write_str(&release.join("."))?;
        if let Some((tag, n)) = self.pre {
            write!(f, "{}{n}", tag.as_str())?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{n}")?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{n}")?;
        }
        if !self.local.is_empty() {
            let segments: Vec<String> = self
                .local
                .iter()
                .map(|s| match s {
                    LocalSegment::Alpha(a) => a.clone(),
                    LocalSegment::Num(n) => n.to_string(),
                })
                .collect();
            write!(f, "+{}", segments.join("."))?;
        }
        Ok(())
    }
}

fn take_digits(s: &str) -> Option<(u64, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let n = s[..end].parse().ok()?;
    Some((n, &s[end..]))
}

fn take_separator(s: &str) -> &str {
    s.strip_prefix(['.', '-', '_']).unwrap_or(s)
}

fn take_tag<'a>(s: &'a str, spellings: &[(&str, PreTag)]) -> Option<(PreTag, &'a str)> {
    for (spelling, tag) in spellings {
        if let Some(rest) = s.strip_prefix(spelling) {
            return Some((*tag, rest));
        }
    }
    None
}

// Longer spellings first so "alpha" is not consumed as "a" + garbage.
const PRE_TAGS: &[(&str, PreTag)] = &[
    ("alpha", PreTag::Alpha),
    ("a", PreTag::Alpha),
    ("beta", PreTag::Beta),
    ("b", PreTag::Beta),
    ("preview", PreTag::Rc),
    ("pre", PreTag::Rc),
    ("rc", PreTag::Rc),
    ("c", PreTag::Rc),
];

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let original = input.trim();
        let err = || VersionError(original.to_owned());

        let lowered = original.to_ascii_lowercase();
        let mut s = lowered.as_str();
        s = s.strip_prefix('v').unwrap_or(s);

        let epoch = match s.split_once('!') {
            Some((epoch_str, rest)) => {
                s = rest;
                epoch_str.parse().map_err(|_| err())?
            }
            None => 0,
        };

        let mut release = Vec::new();
        let (first, mut rest) = take_digits(s).ok_or_else(err)?;
        release.push(first);
        while rest.starts_with('.') && rest[1..].starts_with(|c: char| c.is_ascii_digit()) {
            let (n, r) = take_digits(&rest[1..]).ok_or_else(err)?;
            release.push(n);
            rest = r;
        }
        s = rest;

        let mut pre = None;
        if let Some((tag, after_tag)) = take_tag(take_separator(s), PRE_TAGS) {
            let after_sep = take_separator(after_tag);
            match take_digits(after_sep) {
                Some((n, r)) => {
                    pre = Some((tag, n));
                    s = r;
                }
                None => {
                    pre = Some((tag, 0));
                    s = after_tag;
                }
            }
        }

        let mut post = None;
        if let Some(implicit) = s.strip_prefix('-') {
            // Implicit post release: "1.0-1".
            if let Some((n, r)) = take_digits(implicit) {
                post = Some(n);
                s = r;
            }
        }
        if post.is_none() {
            let t = take_separator(s);
            let tagged = t
                .strip_prefix("post")
                .or_else(|| t.strip_prefix("rev"))
                .or_else(|| t.strip_prefix('r'));
            if let Some(after_tag) = tagged {
                let after_sep = take_separator(after_tag);
                match take_digits(after_sep) {
                    Some((n, r)) => {
                        post = Some(n);
                        s = r;
                    }
                    None => {
                        post = Some(0);
                        s = after_tag;
                    }
                }
            }
        }

        let mut dev = None;
        if let Some(after_tag) = take_separator(s).strip_prefix("dev") {
            let after_sep = take_separator(after_tag);
            match take_digits(after_sep) {
                Some((n, r)) => {
                    dev = Some(n);
                    s = r;
                }
                None => {
                    dev = Some(0);
                    s = after_tag;
                }
            }
        }

        let mut local = Vec::new();
        if let Some(local_str) = s.strip_prefix('+') {
            if local_str.is_empty() {
                return Err(err());
            }
            for segment in local_str.split(['.', '-', '_']) {
                if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(err());
                }
                match segment.parse() {
                    Ok(n) => local.push(LocalSegment::Num(n)),
                    Err(_) => local.push(LocalSegment::Alpha(segment.to_owned())),
                }
            }
            s = "";
        }

        if !s.is_empty() {
            return Err(err());
        }

        Ok(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }
}

/// Comparison operator of a version specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    TildeEq,
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    ArbitraryEq,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TildeEq => "~=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::ArbitraryEq => "===",
        }
    }
}

/// A single version constraint, e.g. `>=1.0` or `==2.*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionSpecifier {
    op: Operator,
    version: String,
}

impl VersionSpecifier {
    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn version_text(&self) -> &str {
        &self.version
    }
}

impl FromStr for VersionSpecifier {
    type Err = SpecifierError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        let err = || SpecifierError(s.to_owned());

        // Longest operators first so "==" is not consumed as two "="-less probes.
        let (op, version_str) = if let Some(rest) = s.strip_prefix("===") {
            (Operator::ArbitraryEq, rest)
        } else if let Some(rest) = s.strip_prefix("==") {
            (Operator::Eq, rest)
        } else if let Some(rest) = s.strip_prefix("!=") {
            (Operator::Ne, rest)
        } else if let Some(rest) = s.strip_prefix("<=") {
            (Operator::Le, rest)
        } else if let Some(rest) = s.strip_prefix(">=") {
            (Operator::Ge, rest)
        } else if let Some(rest) = s.strip_prefix("~=") {
            (Operator::TildeEq, rest)
        } else if let Some(rest) = s.strip_prefix('<') {
            (Operator::Lt, rest)
        } else if let Some(rest) = s.strip_prefix('>') {
            (Operator::Gt, rest)
        } else {
            return Err(err());
        };

        let version_str = version_str.trim();
        if version_str.is_empty() {
            return Err(err());
        }

        let version = match op {
            // Arbitrary equality compares the raw string; anything goes.
            Operator::ArbitraryEq => version_str.to_owned(),
            Operator::Eq | Operator::Ne => {
                if let Some(prefix) = version_str.strip_suffix(".*") {
                    let parsed: Version = prefix.parse().map_err(|_| err())?;
                    format!("{parsed}.*")
                } else {
                    version_str.parse::<Version>().map_err(|_| err())?.to_string()
                }
            }
            Operator::TildeEq => {
                let parsed: Version = version_str.parse().map_err(|_| err())?;
                if parsed.release().len() < 2 {
                    return Err(err());
                }
                parsed.to_string()
            }
            _ => version_str.parse::<Version>().map_err(|_| err())?.to_string(),
        };

        Ok(Self { op, version })
    }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)
    }
}

/// A combinable set of version constraints, e.g. `>=1.0,<2.0`.
///
/// Displays as the comma-joined constraints in sorted (string) order, which is
/// also the equality key, so `">=1, <2"` and `"<2.0,>=1.0"` compare equal.
#[derive(Debug, Clone, Default)]
pub struct SpecifierSet(Vec<VersionSpecifier>);

impl SpecifierSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionSpecifier> {
        self.0.iter()
    }

    fn sorted_texts(&self) -> Vec<String> {
        let mut texts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        texts.sort();
        texts.dedup();
        texts
    }

    /// Intersect with `other` by taking the union of the constraints.
    pub fn merge(&mut self, other: &Self) {
        for spec in &other.0 {
            if !self.0.iter().any(|s| s == spec) {
                self.0.push(spec.clone());
            }
        }
    }
}

impl FromStr for SpecifierSet {
    type Err = SpecifierError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let mut specifiers = Vec::new();
        for part in trimmed.split(',') {
            specifiers.push(part.parse()?);
        }
        Ok(Self(specifiers))
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sorted_texts().join(","))
    }
}

impl PartialEq for SpecifierSet {
    fn eq(&self, other: &Self) -> bool {
        self.sorted_texts() == other.sorted_texts()
    }
}

impl Eq for SpecifierSet {}
