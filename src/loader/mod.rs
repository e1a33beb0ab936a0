//! Load-order engine
//!
//! Decides which installed records join the interpreter search path, and in
//! which order, and which loaded records block an unload.

pub mod search_path;

use crate::core::{OctpkgError, OctpkgResult};
use crate::registry::InstalledRecord;
use octpkg_core::package::HOST_RUNTIME;
use std::collections::HashSet;

pub use search_path::SearchPath;

/// Compute the indices of `records` to load for the `requested` indices.
///
/// Records already loaded are skipped, and so is everything below them.
/// With `handle_deps` each record's dependencies (resolved by name to the
/// first record carrying it) are placed ahead of it, so every dependency
/// precedes every dependent in the returned order. Otherwise requested
/// records keep their request order.
pub fn compute_load_order(
    records: &[InstalledRecord],
    requested: &[usize],
    handle_deps: bool,
) -> Vec<usize> {
    let mut placed = vec![false; records.len()];
    let mut entered = vec![false; records.len()];
    let mut order = Vec::new();

    for &root in requested {
        if root >= records.len() || records[root].loaded || entered[root] {
            continue;
        }

        // Frames are (record, next dependency to visit)
        let mut worklist = vec![(root, 0usize)];
        entered[root] = true;

        while let Some(frame) = worklist.last_mut() {
            let (current, cursor) = *frame;
            let deps = &records[current].dependencies;

            if handle_deps && cursor < deps.len() {
                frame.1 += 1;
                let name = deps[cursor].package.as_str();
                if name == HOST_RUNTIME {
                    continue;
                }
                let Some(next) = records.iter().position(|r| r.name == name) else {
                    tracing::debug!("{} depends on {}, which is not installed", records[current].name, name);
                    continue;
                };
                if !records[next].loaded && !entered[next] {
                    entered[next] = true;
                    worklist.push((next, 0));
                }
            } else {
                worklist.pop();
                if !placed[current] {
                    placed[current] = true;
                    order.push(current);
                }
            }
        }
    }

    order
}

/// Loaded records that would lose a dependency if `targets` were unloaded.
///
/// Collects, transitively, every loaded non-target record depending on a
/// target. A non-empty result is an error unless `nodeps`, in which case the
/// blockers are logged and returned.
pub fn compute_unload_safety(
    records: &[InstalledRecord],
    targets: &[usize],
    nodeps: bool,
) -> OctpkgResult<Vec<usize>> {
    let target_set: HashSet<usize> = targets.iter().copied().collect();
    let mut blockers = Vec::new();
    let mut lines = Vec::new();
    let mut seen = HashSet::new();
    let mut worklist: Vec<usize> = targets.to_vec();

    while let Some(current) = worklist.pop() {
        let name = records[current].name.as_str();
        for (i, record) in records.iter().enumerate() {
            if !record.loaded || target_set.contains(&i) || seen.contains(&i) {
                continue;
            }
            if record.dependencies.iter().any(|d| d.package == name) {
                seen.insert(i);
                blockers.push(i);
                lines.push(format!("{} depends on {}", record.id(), name));
                worklist.push(i);
            }
        }
    }

    if blockers.is_empty() {
        return Ok(blockers);
    }

    if nodeps {
        for line in &lines {
            tracing::warn!("{}", line);
        }
        Ok(blockers)
    } else {
        Err(OctpkgError::UnsatisfiedDependency(lines))
    }
}
