//! Known solver shortcomings, keyed by `(solver, io, problem)`.
//!
//! Three tables are kept: problems a solver is expected to get wrong, problems
//! that are skipped outright, and problems where a solver does not report some
//! suffixes. Every entry applies to a range of solver versions.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::SuiteError;
use crate::problems::{Suffix, SuffixExclusions};
use crate::solvers::{Io, Version};

/// Versions from `min` (inclusive) up to `below` (exclusive) and `max`
/// (inclusive); an unset side is open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionRange {
    pub min: Option<Version>,
    pub below: Option<Version>,
    pub max: Option<Version>,
}

impl VersionRange {
    pub const ALL: VersionRange = VersionRange {
        min: None,
        below: None,
        max: None,
    };

    pub fn contains(&self, version: Version) -> bool {
        self.min.is_none_or(|min| version >= min)
            && self.below.is_none_or(|below| version < below)
            && self.max.is_none_or(|max| version <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaseKey {
    pub solver: String,
    pub io: Io,
    pub problem: String,
}

impl CaseKey {
    pub fn new(solver: impl Into<String>, io: Io, problem: impl Into<String>) -> Self {
        Self {
            solver: solver.into(),
            io,
            problem: problem.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    solver: String,
    io: Io,
    problem: String,
    #[serde(default)]
    min_version: Option<Version>,
    #[serde(default)]
    below_version: Option<Version>,
    #[serde(default)]
    max_version: Option<Version>,
    reason: String,
    /// Only read for `[[missing_suffix]]` entries
    #[serde(default)]
    suffixes: BTreeMap<Suffix, RawSuffix>,
}

impl RawEntry {
    fn key(&self) -> CaseKey {
        CaseKey::new(self.solver.clone(), self.io, self.problem.clone())
    }

    fn versions(&self) -> VersionRange {
        VersionRange {
            min: self.min_version,
            below: self.below_version,
            max: self.max_version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSuffix {
    #[serde(default)]
    enforce: bool,
    #[serde(default)]
    names: BTreeSet<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExpectations {
    #[serde(default)]
    expected_failure: Vec<RawEntry>,
    #[serde(default)]
    skip: Vec<RawEntry>,
    #[serde(default)]
    missing_suffix: Vec<RawEntry>,
}

fn unexpected_suffixes(origin: &str, table: &str, entry: &RawEntry) -> SuiteError {
    SuiteError::Expectations {
        path: origin.to_string(),
        message: format!(
            "[[{}]] entry for {}/{}/{} cannot list suffixes",
            table, entry.solver, entry.io, entry.problem
        ),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub versions: VersionRange,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissingSuffixEntry {
    pub versions: VersionRange,
    pub reason: String,
    pub suffixes: SuffixExclusions,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expectations {
    failures: BTreeMap<CaseKey, Entry>,
    skips: BTreeMap<CaseKey, Entry>,
    missing_suffixes: BTreeMap<CaseKey, MissingSuffixEntry>,
}

impl Expectations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expectations for the built-in solver cases. The simplex cases
    /// currently handle every problem, so the tables start empty.
    pub fn builtin() -> Self {
        Self::new()
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SuiteError> {
        Self::parse(text, "<string>")
    }

    pub fn load(path: &Path) -> Result<Self, SuiteError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SuiteError::Io(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text, &path.display().to_string())
    }

    fn parse(text: &str, origin: &str) -> Result<Self, SuiteError> {
        let raw: RawExpectations = toml::from_str(text).map_err(|e| SuiteError::Expectations {
            path: origin.to_string(),
            message: e.to_string(),
        })?;

        let mut expectations = Self::new();
        for e in raw.expected_failure {
            if !e.suffixes.is_empty() {
                return Err(unexpected_suffixes(origin, "expected_failure", &e));
            }
            expectations.expect_failure(e.key(), e.versions(), e.reason);
        }
        for e in raw.skip {
            if !e.suffixes.is_empty() {
                return Err(unexpected_suffixes(origin, "skip", &e));
            }
            expectations.skip(e.key(), e.versions(), e.reason);
        }
        for e in raw.missing_suffix {
            if e.suffixes.is_empty() {
                return Err(SuiteError::Expectations {
                    path: origin.to_string(),
                    message: format!(
                        "[[missing_suffix]] entry for {}/{}/{} lists no suffixes",
                        e.solver, e.io, e.problem
                    ),
                });
            }
            let (key, versions) = (e.key(), e.versions());
            let suffixes = e
                .suffixes
                .into_iter()
                .map(|(suffix, s)| (suffix, (s.enforce, s.names)))
                .collect();
            expectations.missing_suffix(key, versions, suffixes, e.reason);
        }
        Ok(expectations)
    }

    pub fn expect_failure(&mut self, key: CaseKey, versions: VersionRange, reason: impl Into<String>) {
        self.failures.insert(
            key,
            Entry {
                versions,
                reason: reason.into(),
            },
        );
    }

    pub fn skip(&mut self, key: CaseKey, versions: VersionRange, reason: impl Into<String>) {
        self.skips.insert(
            key,
            Entry {
                versions,
                reason: reason.into(),
            },
        );
    }

    pub fn missing_suffix(
        &mut self,
        key: CaseKey,
        versions: VersionRange,
        suffixes: SuffixExclusions,
        reason: impl Into<String>,
    ) {
        self.missing_suffixes.insert(
            key,
            MissingSuffixEntry {
                versions,
                reason: reason.into(),
                suffixes,
            },
        );
    }

    /// Add every entry of `other`, replacing entries with the same key.
    pub fn extend(&mut self, other: Expectations) {
        self.failures.extend(other.failures);
        self.skips.extend(other.skips);
        self.missing_suffixes.extend(other.missing_suffixes);
    }

    pub fn failure_for(&self, key: &CaseKey, version: Version) -> Option<&Entry> {
        self.failures.get(key).filter(|e| e.versions.contains(version))
    }

    pub fn skip_for(&self, key: &CaseKey, version: Version) -> Option<&Entry> {
        self.skips.get(key).filter(|e| e.versions.contains(version))
    }

    pub fn missing_suffix_for(&self, key: &CaseKey, version: Version) -> Option<&MissingSuffixEntry> {
        self.missing_suffixes.get(key).filter(|e| e.versions.contains(version))
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty() && self.skips.is_empty() && self.missing_suffixes.is_empty()
    }
}
