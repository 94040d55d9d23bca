//! Schema versions and the linear version chain.
//!
//! Every store file conforms to exactly one [`SchemaVersion`]. Versions form
//! a single linear chain from oldest to newest; the last entry is the version
//! the current build writes, and every other version has exactly one
//! successor.

use std::fmt;

/// A named, ordered point in the evolution of the store layout.
///
/// The name doubles as the stem of the bundled schema resource
/// (e.g. `accounts_v2` loads `accounts_v2.toml`).
///
/// # Examples
///
/// ```
/// use strongbox_core::SchemaVersion;
///
/// let v1 = SchemaVersion::new(1, "accounts_v1");
/// let v2 = SchemaVersion::new(2, "accounts_v2");
/// assert!(v1 < v2);
/// assert_eq!(v1.name(), "accounts_v1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaVersion {
    ordinal: u16,
    name: &'static str,
}

impl SchemaVersion {
    /// Create a schema version with its chain ordinal and resource name.
    pub const fn new(ordinal: u16, name: &'static str) -> Self {
        SchemaVersion { ordinal, name }
    }

    /// Position of this version in the chain (1-based, strictly increasing).
    pub fn ordinal(&self) -> u16 {
        self.ordinal
    }

    /// Resource name of this version's schema descriptor.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The total order over all known schema versions.
///
/// The chain is constructed once, in code, and is the single source of truth
/// for which upgrades exist and in which order they run. Ordinals must be
/// strictly increasing; the constructor enforces this because a mis-ordered
/// chain is a build defect, not a runtime condition.
#[derive(Debug, Clone)]
pub struct VersionChain {
    versions: Vec<SchemaVersion>,
}

impl VersionChain {
    /// Build a chain from versions listed oldest to newest.
    ///
    /// # Panics
    ///
    /// Panics if `versions` is empty or ordinals are not strictly increasing.
    pub fn new(versions: Vec<SchemaVersion>) -> Self {
        assert!(!versions.is_empty(), "version chain cannot be empty");
        for pair in versions.windows(2) {
            assert!(
                pair[0].ordinal() < pair[1].ordinal(),
                "version ordinals must be strictly increasing: {} then {}",
                pair[0],
                pair[1]
            );
        }
        VersionChain { versions }
    }

    /// All versions, oldest first.
    pub fn versions(&self) -> &[SchemaVersion] {
        &self.versions
    }

    /// The version the current build reads and writes (last in the chain).
    pub fn target(&self) -> SchemaVersion {
        *self.versions.last().expect("chain is never empty")
    }

    /// The immediate successor of `version`, or `None` at the target.
    ///
    /// Also returns `None` for versions that are not part of this chain.
    pub fn successor(&self, version: SchemaVersion) -> Option<SchemaVersion> {
        let idx = self.versions.iter().position(|v| *v == version)?;
        self.versions.get(idx + 1).copied()
    }

    /// Whether `version` belongs to this chain.
    pub fn contains(&self, version: SchemaVersion) -> bool {
        self.versions.contains(&version)
    }

    /// Number of migration steps between `from` and the target.
    pub fn steps_remaining(&self, from: SchemaVersion) -> Option<usize> {
        let idx = self.versions.iter().position(|v| *v == from)?;
        Some(self.versions.len() - 1 - idx)
    }
}
