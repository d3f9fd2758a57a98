//! Versioned snapshots of the student's stance and principle.
//!
//! Histories are append-only; the "current" value is always derived from
//! the last element, so it can never drift from the history.

use serde::{Deserialize, Serialize};

/// A snapshot that carries a 1-based version number.
pub trait Versioned {
    fn version(&self) -> u32;
}

/// Snapshot of the student's claimed position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StanceVersion {
    pub version: u32,
    pub position: String,
    pub reason: String,
}

impl Versioned for StanceVersion {
    fn version(&self) -> u32 {
        self.version
    }
}

/// How strongly a principle generalizes.
///
/// Extreme principles must be pressure-tested with a case before they
/// can be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrincipleClassification {
    Moderate,
    Extreme,
    #[default]
    Undetermined,
}

impl PrincipleClassification {
    pub const LABELS: [&'static str; 3] = ["MODERATE", "EXTREME", "UNDETERMINED"];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipleClassification::Moderate => "MODERATE",
            PrincipleClassification::Extreme => "EXTREME",
            PrincipleClassification::Undetermined => "UNDETERMINED",
        }
    }
}

/// Snapshot of the generalized principle the student derives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipleVersion {
    pub version: u32,
    pub statement: String,
    pub classification: PrincipleClassification,
}

impl Versioned for PrincipleVersion {
    fn version(&self) -> u32 {
        self.version
    }
}

/// Append-only history of versioned snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionHistory<T> {
    versions: Vec<T>,
}

impl<T> Default for VersionHistory<T> {
    fn default() -> Self {
        Self {
            versions: Vec::new(),
        }
    }
}

impl<T: Versioned> VersionHistory<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Version number the next appended snapshot must carry.
    pub fn next_version(&self) -> u32 {
        self.latest().map_or(1, |v| v.version() + 1)
    }

    /// Appends a snapshot built from the next version number.
    pub fn append_with(&mut self, build: impl FnOnce(u32) -> T) -> &T {
        let next = build(self.next_version());
        self.versions.push(next);
        &self.versions[self.versions.len() - 1]
    }

    pub fn latest(&self) -> Option<&T> {
        self.versions.last()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.versions.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.versions
    }

    /// True when versions run 1, 2, 3, ... without gaps.
    pub fn is_contiguous(&self) -> bool {
        self.versions
            .iter()
            .enumerate()
            .all(|(i, v)| v.version() as usize == i + 1)
    }
}

impl VersionHistory<StanceVersion> {
    pub fn append(&mut self, position: impl Into<String>, reason: impl Into<String>) -> &StanceVersion {
        let (position, reason) = (position.into(), reason.into());
        self.append_with(|version| StanceVersion {
            version,
            position,
            reason,
        })
    }
}

impl VersionHistory<PrincipleVersion> {
    pub fn append(
        &mut self,
        statement: impl Into<String>,
        classification: PrincipleClassification,
    ) -> &PrincipleVersion {
        let statement = statement.into();
        self.append_with(|version| PrincipleVersion {
            version,
            statement,
            classification,
        })
    }
}
