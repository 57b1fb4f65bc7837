use super::types::Module;
use crate::error::{PlacementError, Result};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Directed dependency edge between two application modules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEdge {
    pub source: String,
    pub destination: String,
}

/// Module-level view of an application: which module feeds which, plus the
/// modules that receive sensor traffic directly.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppGraph {
    pub edges: Vec<AppEdge>,
    /// Modules fed by a sensor, in the order their sensor edges were declared
    pub entry_modules: Vec<String>,
}

impl AppGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_edge(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.edges.push(AppEdge {
            source: source.into(),
            destination: destination.into(),
        });
        self
    }

    pub fn with_entry(mut self, module: impl Into<String>) -> Self {
        self.entry_modules.push(module.into());
        self
    }

    fn adjacency(&self) -> IndexMap<&str, Vec<&str>> {
        let mut adjacency: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for edge in &self.edges {
            adjacency
                .entry(edge.source.as_str())
                .or_default()
                .push(edge.destination.as_str());
        }
        adjacency
    }

    /// Every module reachable from `module`, upstream modules first.
    pub fn closure(&self, module: &str) -> Vec<String> {
        let adjacency = self.adjacency();
        let mut order = IndexSet::new();
        collect_post_order(&adjacency, module, &mut order);
        order.iter().rev().map(|m| m.to_string()).collect()
    }

    /// Placement column order: the post-order walks from each entry module
    /// concatenated, without duplicates.
    pub fn module_order(&self) -> Vec<String> {
        let adjacency = self.adjacency();
        let mut order = IndexSet::new();
        for entry in &self.entry_modules {
            collect_post_order(&adjacency, entry, &mut order);
        }
        order.iter().map(|m| m.to_string()).collect()
    }

    /// Sort `modules` into [`module_order`](Self::module_order). Modules the
    /// graph never reaches keep their relative order after the ordered ones.
    pub fn order_modules(&self, mut modules: Vec<Module>) -> Vec<Module> {
        let order: IndexSet<String> = self.module_order().into_iter().collect();
        modules.sort_by_key(|m| order.get_index_of(m.name.as_str()).unwrap_or(order.len()));
        modules
    }

    /// Report the first module found on a dependency cycle.
    pub fn detect_cycles(&self) -> Result<()> {
        let mut names: IndexSet<&str> = IndexSet::new();
        for edge in &self.edges {
            names.insert(edge.source.as_str());
            names.insert(edge.destination.as_str());
        }

        let mut graph: Vec<Vec<usize>> = vec![Vec::new(); names.len()];
        for edge in &self.edges {
            let src = names.get_index_of(edge.source.as_str());
            let dst = names.get_index_of(edge.destination.as_str());
            if let (Some(src), Some(dst)) = (src, dst) {
                graph[src].push(dst);
            }
        }

        // 0 = unvisited, 1 = on the current path, 2 = finished
        let mut state = vec![0u8; names.len()];
        for root in 0..names.len() {
            if state[root] != 0 {
                continue;
            }
            let mut stack = vec![(root, 0usize)];
            state[root] = 1;
            while let Some((node, next)) = stack.last_mut() {
                let node = *node;
                if let Some(&neighbor) = graph[node].get(*next) {
                    *next += 1;
                    match state[neighbor] {
                        0 => {
                            state[neighbor] = 1;
                            stack.push((neighbor, 0));
                        }
                        1 => return Err(PlacementError::CyclicGraph(names[neighbor].to_string())),
                        _ => {}
                    }
                } else {
                    state[node] = 2;
                    stack.pop();
                }
            }
        }

        Ok(())
    }
}

/// Post-order walk from `start`, appending modules not yet in `out`.
///
/// Uses an explicit stack; a module already in `out` (or on the stack) is
/// never expanded again, so cycles terminate.
fn collect_post_order<'a>(
    adjacency: &IndexMap<&'a str, Vec<&'a str>>,
    start: &'a str,
    out: &mut IndexSet<&'a str>,
) {
    if out.contains(start) {
        return;
    }

    let mut on_stack: HashSet<&str> = HashSet::from([start]);
    let mut stack: Vec<(&str, usize)> = vec![(start, 0)];

    while let Some((module, next_edge)) = stack.last_mut() {
        let successors = adjacency.get(*module).map(Vec::as_slice).unwrap_or(&[]);
        let pending = successors
            .iter()
            .enumerate()
            .skip(*next_edge)
            .find(|&(_, succ)| !out.contains(*succ) && !on_stack.contains(*succ));

        match pending {
            Some((index, &succ)) => {
                *next_edge = index + 1;
                on_stack.insert(succ);
                stack.push((succ, 0));
            }
            None => {
                if let Some((done, _)) = stack.pop() {
                    on_stack.remove(done);
                    out.insert(done);
                }
            }
        }
    }
}
