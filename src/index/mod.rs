//! Package index adapter
//!
//! Normalizes one or more index documents into a `name -> versions -> deps`
//! lookup. Versions keep the index's newest-first order.

pub mod client;
pub mod document;

use crate::core::{OctpkgError, OctpkgResult};
use crate::suggest;
use octpkg_core::package::{DependencyConstraint, PackageId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub use client::IndexClient;

/// Shape of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Exposes per-version dependency lists; the resolver solves dependencies.
    #[default]
    Packages,
    /// Flat name/version lookup; dependency solving is skipped.
    Forge,
}

/// One installable version of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: PackageId,
    pub url: String,
    pub checksum: String,
    pub dependencies: Vec<DependencyConstraint>,
}

/// Normalized, validated package index.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    kind: IndexKind,
    packages: BTreeMap<String, Vec<IndexEntry>>,
}

impl PackageIndex {
    /// Build an index from entries grouped by name. Fails with a lookup
    /// error when one checksum maps to two different ids.
    pub fn new(kind: IndexKind, packages: BTreeMap<String, Vec<IndexEntry>>) -> OctpkgResult<Self> {
        let index = Self { kind, packages };
        index.check_checksums()?;
        Ok(index)
    }

    /// Parse a JSON index document
    pub fn from_json(kind: IndexKind, content: &str) -> OctpkgResult<Self> {
        let raw = document::parse(content)?;
        let mut packages = BTreeMap::new();

        for (name, package) in raw {
            let name = name.to_lowercase();
            let mut entries = Vec::with_capacity(package.versions.len());
            for version in package.versions {
                let id = if version.id.contains('@') {
                    PackageId::parse(&version.id)?
                } else {
                    PackageId::new(name.as_str(), version.id.as_str())
                };
                if id.name != name {
                    return Err(OctpkgError::Lookup(format!(
                        "Index entry '{}' is listed under package '{}'",
                        id, name
                    )));
                }
                let dependencies = version
                    .depends
                    .iter()
                    .map(|d| d.to_constraint())
                    .collect::<OctpkgResult<Vec<_>>>()
                    .map_err(|e| OctpkgError::Lookup(format!("{}: {}", id, e)))?;
                entries.push(IndexEntry {
                    id,
                    url: version.url,
                    checksum: version.sha256.to_lowercase(),
                    dependencies,
                });
            }
            packages.insert(name, entries);
        }

        Self::new(kind, packages)
    }

    /// Merge indices in priority order: the first index listing a name owns
    /// it. The result exposes dependencies if any part does.
    pub fn merge(indices: Vec<PackageIndex>) -> OctpkgResult<Self> {
        let kind = if indices.iter().any(|i| i.kind == IndexKind::Packages) {
            IndexKind::Packages
        } else {
            IndexKind::Forge
        };
        let mut packages = BTreeMap::new();
        for index in indices {
            for (name, entries) in index.packages {
                packages.entry(name).or_insert(entries);
            }
        }
        Self::new(kind, packages)
    }

    fn check_checksums(&self) -> OctpkgResult<()> {
        let mut seen: HashMap<&str, &PackageId> = HashMap::new();
        for entry in self.packages.values().flatten() {
            if entry.checksum.is_empty() {
                continue;
            }
            if let Some(previous) = seen.insert(entry.checksum.as_str(), &entry.id) {
                if *previous != entry.id {
                    return Err(OctpkgError::Lookup(format!(
                        "Checksum {} is shared by {} and {}",
                        entry.checksum, previous, entry.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Whether the resolver should solve dependencies against this index
    pub fn exposes_dependencies(&self) -> bool {
        self.kind == IndexKind::Packages
    }

    /// All versions of a package, newest first
    pub fn lookup_versions(&self, name: &str) -> &[IndexEntry] {
        self.packages
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Every package name, sorted
    pub fn list_names(&self) -> Vec<&str> {
        self.packages.keys().map(String::as_str).collect()
    }

    /// Newest version of a package
    pub fn newest(&self, name: &str) -> Option<&IndexEntry> {
        self.lookup_versions(name).first()
    }

    /// Entry for an exact `name@version` id
    pub fn entry(&self, id: &PackageId) -> Option<&IndexEntry> {
        self.lookup_versions(&id.name).iter().find(|e| e.id == *id)
    }

    /// Entries matching any of the non-empty `checksum`, `url` or `id`
    /// (union, each entry at most once).
    pub fn find_matches(&self, checksum: &str, url: &str, id: &str) -> Vec<&IndexEntry> {
        let checksum = checksum.to_lowercase();
        self.packages
            .values()
            .flatten()
            .filter(|entry| {
                (!checksum.is_empty() && entry.checksum == checksum)
                    || (!url.is_empty() && entry.url == url)
                    || (!id.is_empty() && entry.id.to_string() == id)
            })
            .collect()
    }

    /// Closest known package name, for "did you mean" hints
    pub fn suggest(&self, name: &str) -> Option<String> {
        suggest::correct(name, self.packages.keys().map(String::as_str))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use octpkg_core::package::DependencyConstraint;

    /// Build an entry with a synthetic url and checksum
    pub fn entry(name: &str, version: &str, deps: &[DependencyConstraint]) -> IndexEntry {
        IndexEntry {
            id: PackageId::new(name, version),
            url: format!("https://example.org/{}-{}.tar.gz", name, version),
            checksum: format!("sum-{}-{}", name, version),
            dependencies: deps.to_vec(),
        }
    }

    /// Build a packages-kind index from entries listed newest first per name
    pub fn index(entries: Vec<IndexEntry>) -> PackageIndex {
        let mut packages: BTreeMap<String, Vec<IndexEntry>> = BTreeMap::new();
        for e in entries {
            packages.entry(e.id.name.clone()).or_default().push(e);
        }
        PackageIndex::new(IndexKind::Packages, packages).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{entry, index};
    use super::*;

    const DOC: &str = r#"{
        "io": {"versions": [
            {"id": "2.6.3", "url": "https://x/io-2.6.3.tar.gz", "sha256": "AA"},
            {"id": "2.6.2", "url": "https://x/io-2.6.2.tar.gz", "sha256": "bb"}
        ]},
        "Signal": {"versions": [
            {"id": "1.0.0", "url": "https://x/signal-1.0.0.tar.gz", "sha256": "cc",
             "depends": [{"name": "control", "operator": ">=", "version": "2.0.0"}]}
        ]}
    }"#;

    #[test]
    fn test_from_json_normalizes() {
        let index = PackageIndex::from_json(IndexKind::Packages, DOC).unwrap();
        assert_eq!(index.list_names(), vec!["io", "signal"]);
        assert_eq!(index.lookup_versions("io").len(), 2);
        assert_eq!(index.newest("io").unwrap().id.to_string(), "io@2.6.3");
        // Checksums are lowercased
        assert_eq!(index.newest("io").unwrap().checksum, "aa");
        assert_eq!(
            index.newest("signal").unwrap().dependencies[0].to_string(),
            "control >= 2.0.0"
        );
        assert!(index.lookup_versions("missing").is_empty());
    }

    #[test]
    fn test_checksum_collision_is_lookup_error() {
        let doc = r#"{
            "a": {"versions": [{"id": "1.0", "sha256": "same"}]},
            "b": {"versions": [{"id": "1.0", "sha256": "same"}]}
        }"#;
        let err = PackageIndex::from_json(IndexKind::Packages, doc).unwrap_err();
        assert!(matches!(err, OctpkgError::Lookup(_)));
        assert!(err.to_string().contains("a@1.0"));
    }

    #[test]
    fn test_mismatched_full_id_is_rejected() {
        let doc = r#"{"a": {"versions": [{"id": "b@1.0"}]}}"#;
        assert!(PackageIndex::from_json(IndexKind::Forge, doc).is_err());
    }

    #[test]
    fn test_find_matches_is_union() {
        let index = PackageIndex::from_json(IndexKind::Packages, DOC).unwrap();

        let by_id = index.find_matches("", "", "io@2.6.2");
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].checksum, "bb");

        let by_sum = index.find_matches("AA", "", "");
        assert_eq!(by_sum[0].id.to_string(), "io@2.6.3");

        // Checksum of one row, url of another: two matches
        let both = index.find_matches("aa", "https://x/io-2.6.2.tar.gz", "");
        assert_eq!(both.len(), 2);

        // Same row by several keys counts once
        let same = index.find_matches("aa", "https://x/io-2.6.3.tar.gz", "io@2.6.3");
        assert_eq!(same.len(), 1);

        assert!(index.find_matches("", "", "").is_empty());
    }

    #[test]
    fn test_merge_first_index_owns_name() {
        let first = index(vec![entry("io", "2.6.3", &[])]);
        let second = PackageIndex::new(
            IndexKind::Forge,
            BTreeMap::from([
                ("io".to_string(), vec![entry("io", "9.9.9", &[])]),
                ("control".to_string(), vec![entry("control", "2.1.0", &[])]),
            ]),
        )
        .unwrap();

        let merged = PackageIndex::merge(vec![first, second]).unwrap();
        assert_eq!(merged.kind(), IndexKind::Packages);
        assert_eq!(merged.newest("io").unwrap().id.version, "2.6.3");
        assert!(merged.contains("control"));
    }

    #[test]
    fn test_merge_detects_cross_index_collision() {
        let mut a = entry("a", "1.0", &[]);
        a.checksum = "dup".to_string();
        let mut b = entry("b", "1.0", &[]);
        b.checksum = "dup".to_string();
        let result = PackageIndex::merge(vec![index(vec![a]), index(vec![b])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_suggest_close_name() {
        let index = PackageIndex::from_json(IndexKind::Packages, DOC).unwrap();
        assert_eq!(index.suggest("sigal"), Some("signal".to_string()));
        assert_eq!(index.suggest("zzzzzzzz"), None);
    }
}
