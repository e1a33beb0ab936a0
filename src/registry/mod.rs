//! Installed-package registry
//!
//! One ordered record collection per scope, persisted as JSON next to the
//! scope's install prefix. Every write goes to a temporary file that is then
//! renamed over the registry, and the in-memory view only changes after the
//! rename succeeded.

pub mod order;
pub mod rebuild;

use crate::core::path::registry_file;
use crate::core::{OctpkgError, OctpkgResult};
use crate::loader::SearchPath;
use octpkg_core::package::{DependencyConstraint, PackageId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub use order::order_dependencies_first;

/// Installation partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Per-user
    #[default]
    Local,
    /// System-wide
    Global,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Local => f.write_str("local"),
            Scope::Global => f.write_str("global"),
        }
    }
}

/// A package installed in one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledRecord {
    pub name: String,
    pub version: String,
    /// Architecture-independent files
    pub dir: PathBuf,
    /// Compiled artifacts for the current architecture
    pub archdir: PathBuf,
    pub archprefix: PathBuf,
    #[serde(default)]
    pub dependencies: Vec<DependencyConstraint>,
    /// One-line title from the package DESCRIPTION
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub autoload: bool,
    /// Derived from the current search path; never persisted
    #[serde(skip)]
    pub loaded: bool,
}

impl InstalledRecord {
    pub fn id(&self) -> PackageId {
        PackageId::new(self.name.as_str(), self.version.as_str())
    }

    /// Directories this package contributes to the search path
    pub fn load_dirs(&self) -> Vec<&Path> {
        let mut dirs = vec![self.dir.as_path()];
        if self.archdir != self.dir && self.archdir.is_dir() {
            dirs.insert(0, self.archdir.as_path());
        }
        dirs
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default = "default_format")]
    format: u32,
    #[serde(default)]
    packages: Vec<InstalledRecord>,
}

fn default_format() -> u32 {
    1
}

/// The records of one scope together with their backing file.
#[derive(Debug, Clone)]
pub struct Registry {
    scope: Scope,
    path: PathBuf,
    records: Vec<InstalledRecord>,
}

impl Registry {
    /// An empty registry that will persist to `path`
    pub fn empty(scope: Scope, path: PathBuf) -> Self {
        Self {
            scope,
            path,
            records: Vec::new(),
        }
    }

    /// Load the registry of a scope prefix (empty if the file is missing)
    pub fn load_prefix(scope: Scope, prefix: &Path) -> OctpkgResult<Self> {
        Self::load(scope, registry_file(prefix))
    }

    /// Load a registry file (empty if missing). Repeated `name@version`
    /// entries are dropped, first wins.
    pub fn load(scope: Scope, path: PathBuf) -> OctpkgResult<Self> {
        if !path.exists() {
            return Ok(Self::empty(scope, path));
        }

        let content = fs::read_to_string(&path)?;
        let file: RegistryFile = serde_json::from_str(&content).map_err(|e| {
            OctpkgError::Package(format!(
                "Corrupt {} registry {}: {}",
                scope,
                path.display(),
                e
            ))
        })?;

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(file.packages.len());
        for record in file.packages {
            if seen.insert(record.id()) {
                records.push(record);
            } else {
                tracing::warn!(
                    "Dropping duplicate {} registry entry {}",
                    scope,
                    record.id()
                );
            }
        }

        Ok(Self {
            scope,
            path,
            records,
        })
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records in persisted order
    pub fn list(&self) -> &[InstalledRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a record, replacing any record with the same name in this scope.
    /// Returns the replaced record.
    pub fn add(&mut self, record: InstalledRecord) -> OctpkgResult<Option<InstalledRecord>> {
        let mut next = self.records.clone();
        let replaced = next
            .iter()
            .position(|r| r.name == record.name)
            .map(|i| next.remove(i));
        next.push(record);
        self.commit(next)?;
        Ok(replaced)
    }

    /// Remove every record matching `predicate`; returns the removed records
    pub fn remove<P>(&mut self, predicate: P) -> OctpkgResult<Vec<InstalledRecord>>
    where
        P: Fn(&InstalledRecord) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.records.iter().cloned().partition(|r| predicate(r));
        if removed.is_empty() {
            return Ok(removed);
        }
        self.commit(kept)?;
        Ok(removed)
    }

    /// Replace the whole collection
    pub fn replace_all(&mut self, records: Vec<InstalledRecord>) -> OctpkgResult<()> {
        self.commit(records)
    }

    /// Persist `records` (dependency-first) and only then adopt them
    fn commit(&mut self, records: Vec<InstalledRecord>) -> OctpkgResult<()> {
        let ordered = order_dependencies_first(records);
        persist(&self.path, &ordered)?;
        self.records = ordered;
        Ok(())
    }
}

fn persistence_error(path: &Path, reason: impl fmt::Display) -> OctpkgError {
    OctpkgError::Persistence {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Write-new-then-rename
fn persist(path: &Path, records: &[InstalledRecord]) -> OctpkgResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| persistence_error(path, e))?;
    }

    let file = RegistryFile {
        format: default_format(),
        packages: records.to_vec(),
    };
    let content = serde_json::to_string_pretty(&file).map_err(|e| persistence_error(path, e))?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    if let Err(e) = fs::write(&tmp, content) {
        let _ = fs::remove_file(&tmp);
        return Err(persistence_error(path, e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(persistence_error(path, e));
    }
    Ok(())
}

/// Merged view: local records first, then global records whose name is not
/// already present. First-seen wins.
pub fn merge(local: &[InstalledRecord], global: &[InstalledRecord]) -> Vec<InstalledRecord> {
    let mut seen = HashSet::new();
    local
        .iter()
        .chain(global.iter())
        .filter(|r| seen.insert(r.name.clone()))
        .cloned()
        .collect()
}

/// Whether a record's directories are on the search path
pub fn is_loaded(record: &InstalledRecord, search_path: &SearchPath) -> bool {
    search_path.contains(&record.dir)
        || (record.archdir != record.dir && search_path.contains(&record.archdir))
}

/// Set the transient `loaded` flag of every record
pub fn mark_loaded(records: &mut [InstalledRecord], search_path: &SearchPath) {
    for record in records.iter_mut() {
        record.loaded = is_loaded(record, search_path);
    }
}

/// Both scope registries.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    local: Registry,
    global: Registry,
}

impl RegistryStore {
    pub fn new(local: Registry, global: Registry) -> Self {
        Self { local, global }
    }

    /// Load both registries from their prefixes
    pub fn load(local_prefix: &Path, global_prefix: &Path) -> OctpkgResult<Self> {
        Ok(Self {
            local: Registry::load_prefix(Scope::Local, local_prefix)?,
            global: Registry::load_prefix(Scope::Global, global_prefix)?,
        })
    }

    pub fn registry(&self, scope: Scope) -> &Registry {
        match scope {
            Scope::Local => &self.local,
            Scope::Global => &self.global,
        }
    }

    pub fn registry_mut(&mut self, scope: Scope) -> &mut Registry {
        match scope {
            Scope::Local => &mut self.local,
            Scope::Global => &mut self.global,
        }
    }

    pub fn list(&self, scope: Scope) -> &[InstalledRecord] {
        self.registry(scope).list()
    }

    /// Local records shadowing global ones
    pub fn merged(&self) -> Vec<InstalledRecord> {
        merge(self.local.list(), self.global.list())
    }

    pub fn add(&mut self, record: InstalledRecord, scope: Scope) -> OctpkgResult<Option<InstalledRecord>> {
        self.registry_mut(scope).add(record)
    }

    pub fn remove<P>(&mut self, predicate: P, scope: Scope) -> OctpkgResult<Vec<InstalledRecord>>
    where
        P: Fn(&InstalledRecord) -> bool,
    {
        self.registry_mut(scope).remove(predicate)
    }

    /// Whether an exact id is installed in the merged view
    pub fn is_installed(&self, id: &PackageId) -> bool {
        self.merged().iter().any(|r| r.id() == *id)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;
    use tempfile::TempDir;

    fn names(records: &[InstalledRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::load_prefix(Scope::Local, temp.path()).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.path(), temp.path().join("registry.json"));
    }

    #[test]
    fn test_add_persists_and_roundtrips_order() {
        let temp = TempDir::new().unwrap();
        let mut registry = Registry::load_prefix(Scope::Local, temp.path()).unwrap();
        registry.add(record("b", "1.0", &[])).unwrap();
        registry.add(record("a", "1.0", &[])).unwrap();
        registry.add(record("c", "1.0", &[])).unwrap();

        let reloaded = Registry::load_prefix(Scope::Local, temp.path()).unwrap();
        assert_eq!(names(reloaded.list()), vec!["b", "a", "c"]);
        assert!(!temp.path().join("registry.json.tmp").exists());
    }

    #[test]
    fn test_add_replaces_same_name() {
        let temp = TempDir::new().unwrap();
        let mut registry = Registry::load_prefix(Scope::Local, temp.path()).unwrap();
        registry.add(record("io", "2.6.2", &[])).unwrap();
        let replaced = registry.add(record("io", "2.6.3", &[])).unwrap();

        assert_eq!(replaced.unwrap().version, "2.6.2");
        assert_eq!(registry.list().len(), 1);
        assert_eq!(registry.list()[0].version, "2.6.3");
    }

    #[test]
    fn test_writes_are_dependency_first() {
        let temp = TempDir::new().unwrap();
        let mut registry = Registry::load_prefix(Scope::Local, temp.path()).unwrap();
        registry.add(record("signal", "1.0", &["control"])).unwrap();
        registry.add(record("control", "2.1", &[])).unwrap();

        assert_eq!(names(registry.list()), vec!["control", "signal"]);
        let reloaded = Registry::load_prefix(Scope::Local, temp.path()).unwrap();
        assert_eq!(names(reloaded.list()), vec!["control", "signal"]);
    }

    #[test]
    fn test_remove_by_predicate() {
        let temp = TempDir::new().unwrap();
        let mut registry = Registry::load_prefix(Scope::Global, temp.path()).unwrap();
        registry.add(record("io", "2.6.3", &[])).unwrap();
        registry.add(record("control", "2.1", &[])).unwrap();

        let removed = registry.remove(|r| r.name == "io").unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(names(registry.list()), vec!["control"]);

        let none = registry.remove(|r| r.name == "missing").unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_persistence_failure_keeps_memory_view() {
        let temp = TempDir::new().unwrap();
        // The "prefix" is a regular file, so nothing can be written below it
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"not a dir").unwrap();

        let mut registry = Registry::empty(Scope::Local, blocker.join("registry.json"));
        let err = registry.add(record("io", "2.6.3", &[])).unwrap_err();

        assert!(matches!(err, OctpkgError::Persistence { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_drops_duplicate_ids() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("registry.json");
        let file = RegistryFile {
            format: 1,
            packages: vec![
                record("io", "2.6.3", &[]),
                record("io", "2.6.3", &[]),
                record("io", "2.6.2", &[]),
            ],
        };
        fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        let registry = Registry::load(Scope::Local, path).unwrap();
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn test_loaded_flag_not_persisted() {
        let temp = TempDir::new().unwrap();
        let mut registry = Registry::load_prefix(Scope::Local, temp.path()).unwrap();
        let mut io = record("io", "2.6.3", &[]);
        io.loaded = true;
        registry.add(io).unwrap();

        let content = fs::read_to_string(registry.path()).unwrap();
        assert!(!content.contains("loaded"));
        let reloaded = Registry::load(Scope::Local, registry.path().to_path_buf()).unwrap();
        assert!(!reloaded.list()[0].loaded);
    }

    #[test]
    fn test_merge_local_shadows_global() {
        let local = vec![record("io", "2.6.3", &[]), record("signal", "1.0", &[])];
        let global = vec![record("io", "2.5.0", &[]), record("control", "2.1", &[])];

        let merged = merge(&local, &global);
        assert_eq!(names(&merged), vec!["io", "signal", "control"]);
        assert_eq!(merged[0].version, "2.6.3");

        let mut seen = HashSet::new();
        assert!(merged.iter().all(|r| seen.insert(r.name.clone())));
    }

    #[test]
    fn test_is_loaded_uses_search_path() {
        let io = record("io", "2.6.3", &[]);
        let mut path = SearchPath::default();
        assert!(!is_loaded(&io, &path));
        path.prepend([io.dir.clone()]);
        assert!(is_loaded(&io, &path));

        let mut records = vec![io, record("control", "2.1", &[])];
        mark_loaded(&mut records, &path);
        assert!(records[0].loaded);
        assert!(!records[1].loaded);
    }

    #[test]
    fn test_store_scopes_are_independent() {
        let temp = TempDir::new().unwrap();
        let mut store =
            RegistryStore::load(&temp.path().join("local"), &temp.path().join("global")).unwrap();
        store.add(record("io", "2.6.3", &[]), Scope::Global).unwrap();
        store.add(record("io", "2.6.4", &[]), Scope::Local).unwrap();

        assert_eq!(store.list(Scope::Local).len(), 1);
        assert_eq!(store.list(Scope::Global).len(), 1);
        assert_eq!(store.merged().len(), 1);
        assert!(store.is_installed(&PackageId::new("io", "2.6.4")));
        assert!(!store.is_installed(&PackageId::new("io", "2.6.3")));
    }
}
