//! Dependency-first ordering of installed records.

use super::InstalledRecord;
use octpkg_core::package::HOST_RUNTIME;
use std::collections::HashMap;

/// Reorder `records` so every record follows the records it depends on.
///
/// Stable: records without ordering constraints keep their relative order.
/// Dependencies are matched by name within the collection; unknown names
/// and the host runtime are ignored, and cycles are broken where they are
/// first met.
pub fn order_dependencies_first(records: Vec<InstalledRecord>) -> Vec<InstalledRecord> {
    let mut by_name: HashMap<&str, usize> = HashMap::new();
    for (i, r) in records.iter().enumerate() {
        by_name.entry(r.name.as_str()).or_insert(i);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; records.len()];
    let mut order = Vec::with_capacity(records.len());

    for root in 0..records.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        // (record index, next dependency to look at)
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::InProgress;

        while let Some(top) = stack.last_mut() {
            let (current, cursor) = *top;
            let deps = &records[current].dependencies;
            if cursor < deps.len() {
                top.1 += 1;
                let dep = &deps[cursor];
                if dep.package == HOST_RUNTIME {
                    continue;
                }
                if let Some(&next) = by_name.get(dep.package.as_str()) {
                    if marks[next] == Mark::Unvisited {
                        marks[next] = Mark::InProgress;
                        stack.push((next, 0));
                    }
                }
            } else {
                marks[current] = Mark::Done;
                order.push(current);
                stack.pop();
            }
        }
    }

    let mut slots: Vec<Option<InstalledRecord>> = records.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}
