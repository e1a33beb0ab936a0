//! Index-based dependency resolver
//!
//! Turns raw requests into a dependency-ordered install plan in two phases:
//! normalization against the index, then a bounded fixed point that satisfies
//! dependencies from what is installed, from the request itself, or by
//! pulling in new index versions.

use super::dependency_graph::{stabilize_order, DependencyGraph};
use super::item::{PlanItem, ResolutionItem};
use crate::core::{OctpkgError, OctpkgResult};
use crate::index::{IndexEntry, PackageIndex};
use crate::registry::InstalledRecord;
use octpkg_core::package::{DependencyConstraint, PackageId, BOOTSTRAP_DEPENDENCY, HOST_RUNTIME};
use std::collections::HashSet;

/// Upper bound on dependency rounds
pub const MAX_ROUNDS: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Reinstall installed ids; circular dependencies become warnings
    pub force: bool,
    /// Do not pull in dependencies; unmet ones become warnings
    pub nodeps: bool,
}

/// Outcome of a resolve call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Dependency-ordered plan
    Complete(Vec<PlanItem>),
    /// Inputs that matched nothing in the index
    Unresolved(Vec<String>),
    /// A cycle was found under `force`; the items finished so far
    Incomplete(Vec<PlanItem>),
}

/// Resolves requests against one (merged) index and the installed set.
pub struct DependencyResolver<'a> {
    index: &'a PackageIndex,
    installed: &'a [InstalledRecord],
    host_version: String,
}

impl<'a> DependencyResolver<'a> {
    /// `installed` is the merged registry view
    pub fn new(index: &'a PackageIndex, installed: &'a [InstalledRecord], host_version: impl Into<String>) -> Self {
        Self {
            index,
            installed,
            host_version: host_version.into(),
        }
    }

    pub fn resolve(&self, items: Vec<ResolutionItem>, options: ResolveOptions) -> OctpkgResult<Resolution> {
        let mut normalized = Vec::with_capacity(items.len());
        for item in items {
            normalized.push(self.normalize(item)?);
        }

        let unresolved: Vec<String> = normalized
            .iter()
            .filter(|i| i.url.is_empty())
            .map(|i| i.input.clone())
            .collect();
        if !unresolved.is_empty() {
            return Ok(Resolution::Unresolved(unresolved));
        }

        if !self.index.exposes_dependencies() {
            return Ok(Resolution::Complete(dedup_by_id(normalized).into_iter().map(PlanItem::from).collect()));
        }

        let (identified, url_only): (Vec<_>, Vec<_>) =
            normalized.into_iter().partition(|i| !i.id.is_empty());

        let resolution = self.solve(identified, options)?;
        Ok(match resolution {
            Resolution::Complete(mut plan) => {
                plan.extend(url_only.into_iter().map(PlanItem::from));
                Resolution::Complete(plan)
            }
            other => other,
        })
    }

    /// Phase A: match one item against the index and fill its fields
    fn normalize(&self, mut item: ResolutionItem) -> OctpkgResult<ResolutionItem> {
        if !item.id.is_empty() && !item.id.contains('@') {
            if let Some(newest) = self.index.newest(&item.id) {
                item.id = newest.id.to_string();
            }
        }

        let url_key = if item.local_path.is_some() { "" } else { item.url.as_str() };
        let mut matches = self.index.find_matches(&item.checksum, url_key, &item.id);
        let mut seen = HashSet::new();
        matches.retain(|e| seen.insert(e.id.clone()));

        match matches.as_slice() {
            [] => {
                if item.url.is_empty() {
                    tracing::debug!("No index entry matches '{}'", item.input);
                }
                Ok(item)
            }
            [entry] => Ok(fill_from_entry(item, entry)),
            many => Err(OctpkgError::AmbiguousInput {
                input: item.input.clone(),
                matches: many.iter().map(|e| e.id.to_string()).collect(),
            }),
        }
    }

    /// Phase B: the dependency fixed point
    fn solve(&self, items: Vec<ResolutionItem>, options: ResolveOptions) -> OctpkgResult<Resolution> {
        let mut items = dedup_by_id(items);

        if !options.force {
            items.retain(|item| {
                let installed = self.is_installed(&item.id);
                if installed {
                    tracing::info!("{} is already installed", item.id);
                }
                !installed
            });
        }

        for item in items.iter_mut() {
            item.deps = self.direct_dependencies(&item.id);
        }

        for round in 0..MAX_ROUNDS {
            tracing::debug!("Resolve round {} with {} item(s)", round + 1, items.len());

            let mut progress = self.satisfy(&mut items);

            if let Err(e) = DependencyGraph::from_items(&items).detect_circular_dependencies() {
                if !options.force {
                    return Err(e);
                }
                tracing::warn!("{}; the install plan is incomplete", e);
                let finished = items
                    .into_iter()
                    .filter(ResolutionItem::is_finished)
                    .map(PlanItem::from)
                    .collect();
                return Ok(Resolution::Incomplete(finished));
            }

            progress |= stabilize_order(&mut items);

            if items.iter().all(|i| i.deps.is_empty()) {
                return Ok(Resolution::Complete(items.into_iter().map(PlanItem::from).collect()));
            }

            if !options.nodeps {
                progress |= self.synthesize(&mut items);
            }

            if !progress {
                break;
            }
        }

        let unmet: Vec<String> = items
            .iter()
            .filter(|i| !i.deps.is_empty())
            .map(|i| {
                let wanted: Vec<String> = i.deps.iter().map(|d| d.to_string()).collect();
                format!("{} needs {}", i.id, wanted.join(", "))
            })
            .collect();

        if options.force || options.nodeps {
            for line in &unmet {
                tracing::warn!("{}", line);
            }
            let plan = items
                .into_iter()
                .map(|mut i| {
                    i.deps.clear();
                    PlanItem::from(i)
                })
                .collect();
            return Ok(Resolution::Complete(plan));
        }

        Err(OctpkgError::UnsatisfiedDependency(unmet))
    }

    /// Step (a): drop constraints met by the installed snapshot, the host
    /// runtime or another item, recording `needed_by` edges for the latter.
    fn satisfy(&self, items: &mut [ResolutionItem]) -> bool {
        let mut progress = false;

        for i in 0..items.len() {
            let deps = std::mem::take(&mut items[i].deps);
            let before = deps.len();
            let mut remaining = Vec::with_capacity(before);

            for dep in deps {
                if self.satisfied_by_snapshot(&dep) {
                    continue;
                }
                let prefix = PackageId::prefix_for(&dep.package);
                let provider = (0..items.len()).find(|&j| j != i && items[j].id.starts_with(&prefix));
                match provider {
                    Some(j) => {
                        let needer = items[i].id.clone();
                        if !items[j].needed_by.contains(&needer) {
                            items[j].needed_by.push(needer);
                        }
                    }
                    None => remaining.push(dep),
                }
            }

            progress |= remaining.len() != before;
            items[i].deps = remaining;
        }

        progress
    }

    /// Step (e): add one index version per outstanding dependency name
    fn synthesize(&self, items: &mut Vec<ResolutionItem>) -> bool {
        let mut considered = HashSet::new();
        let outstanding: Vec<DependencyConstraint> =
            items.iter().flat_map(|i| i.deps.iter().cloned()).collect();
        let mut added = Vec::new();

        for dep in &outstanding {
            if !considered.insert(dep.package.clone()) {
                continue;
            }
            if !self.index.contains(&dep.package) {
                continue;
            }

            let on_name: Vec<&DependencyConstraint> =
                outstanding.iter().filter(|d| d.package == dep.package).collect();
            let feasible = self
                .index
                .lookup_versions(&dep.package)
                .iter()
                .find(|entry| on_name.iter().all(|c| c.is_satisfied_by(&entry.id.version)));

            match feasible {
                Some(entry) => {
                    tracing::debug!("Adding {} to satisfy {}", entry.id, dep);
                    let mut item = fill_from_entry(ResolutionItem::default(), entry);
                    item.input = entry.id.to_string();
                    item.deps = self.direct_dependencies(&item.id);
                    added.push(item);
                }
                None => tracing::debug!("No version of {} satisfies every constraint", dep.package),
            }
        }

        let progress = !added.is_empty();
        for item in added.into_iter().rev() {
            items.insert(0, item);
        }
        progress
    }

    fn satisfied_by_snapshot(&self, dep: &DependencyConstraint) -> bool {
        if dep.package == HOST_RUNTIME {
            return dep.is_satisfied_by(&self.host_version);
        }
        self.installed
            .iter()
            .any(|r| r.name == dep.package && dep.is_satisfied_by(&r.version))
    }

    fn is_installed(&self, id: &str) -> bool {
        self.installed.iter().any(|r| r.id().to_string() == id)
    }

    /// Dependencies declared by the index entry of `id`, minus `pkg`
    fn direct_dependencies(&self, id: &str) -> Vec<DependencyConstraint> {
        let Ok(id) = PackageId::parse(id) else {
            return Vec::new();
        };
        self.index
            .entry(&id)
            .map(|entry| {
                entry
                    .dependencies
                    .iter()
                    .filter(|d| d.package != BOOTSTRAP_DEPENDENCY)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn fill_from_entry(mut item: ResolutionItem, entry: &IndexEntry) -> ResolutionItem {
    let entry_id = entry.id.to_string();

    if !item.id.is_empty() && item.id != entry_id {
        tracing::warn!(
            "Inconsistent input '{}': id {} does not match index id {}",
            item.input,
            item.id,
            entry_id
        );
    }
    if item.local_path.is_none() && !item.url.is_empty() && item.url != entry.url {
        tracing::warn!(
            "Inconsistent input '{}': url {} does not match index url {}",
            item.input,
            item.url,
            entry.url
        );
    }
    if !item.checksum.is_empty() && !item.checksum.eq_ignore_ascii_case(&entry.checksum) {
        tracing::warn!(
            "Inconsistent input '{}': checksum {} does not match index checksum {}",
            item.input,
            item.checksum,
            entry.checksum
        );
    }

    item.id = entry_id;
    // A local archive stays the source of bytes; only its id comes from the index
    if item.local_path.is_none() {
        item.url = entry.url.clone();
    }
    item.checksum = entry.checksum.clone();
    item
}

/// Keep the first item of every id; items without an id are kept as is
fn dedup_by_id(items: Vec<ResolutionItem>) -> Vec<ResolutionItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|i| i.id.is_empty() || seen.insert(i.id.clone()))
        .collect()
}
