//! `needed_by` graph over the items of one resolve call

use super::item::ResolutionItem;
use crate::core::{OctpkgError, OctpkgResult};
use std::collections::{HashMap, HashSet};

/// Back-edges "X needs Y", stored on Y, keyed by item id.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    needed_by: HashMap<String, Vec<String>>,
    /// Item ids in plan order
    order: Vec<String>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the `needed_by` edges of `items`
    pub fn from_items(items: &[ResolutionItem]) -> Self {
        let mut graph = Self::new();
        for item in items {
            graph.add_node(item.id.clone());
            for needer in &item.needed_by {
                graph.add_needed_by(&item.id, needer.clone());
            }
        }
        graph
    }

    pub fn add_node(&mut self, id: String) {
        if !self.needed_by.contains_key(&id) {
            self.order.push(id.clone());
            self.needed_by.insert(id, Vec::new());
        }
    }

    /// Record that `needer` depends on `id`
    pub fn add_needed_by(&mut self, id: &str, needer: String) {
        if let Some(edges) = self.needed_by.get_mut(id) {
            if !edges.contains(&needer) {
                edges.push(needer);
            }
        }
    }

    pub fn needers(&self, id: &str) -> &[String] {
        self.needed_by.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Detect circular dependencies using depth-first search from every
    /// item. The error names the item revisited on the current path.
    pub fn detect_circular_dependencies(&self) -> OctpkgResult<()> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();

        for id in &self.order {
            if !visited.contains(id.as_str()) {
                self.detect_cycle_dfs(id, &mut visited, &mut rec_stack)?;
            }
        }

        Ok(())
    }

    fn detect_cycle_dfs<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut HashSet<&'a str>,
    ) -> OctpkgResult<()> {
        visited.insert(node);
        rec_stack.insert(node);

        for next in self.needers(node) {
            let next = next.as_str();
            if rec_stack.contains(next) {
                return Err(OctpkgError::CircularDependency(next.to_string()));
            }
            if !visited.contains(next) {
                self.detect_cycle_dfs(next, visited, rec_stack)?;
            }
        }

        rec_stack.remove(node);
        Ok(())
    }
}

/// Move items ahead of the items that need them.
///
/// At most one pass per item; each pass moves any item whose earliest needer
/// sits before it to just before that needer, and a pass without moves ends
/// the loop. Returns whether anything moved.
pub fn stabilize_order(items: &mut Vec<ResolutionItem>) -> bool {
    let mut moved_any = false;

    for _ in 0..items.len() {
        let mut moved = false;
        let mut pos = 0;
        while pos < items.len() {
            let earliest = items[pos]
                .needed_by
                .iter()
                .filter_map(|needer| items.iter().position(|i| i.id == *needer))
                .min();
            match earliest {
                Some(needer) if needer < pos => {
                    let item = items.remove(pos);
                    items.insert(needer, item);
                    moved = true;
                }
                _ => {}
            }
            pos += 1;
        }
        if !moved {
            break;
        }
        moved_any = true;
    }

    moved_any
}
