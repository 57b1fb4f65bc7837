//! Diagnostics computed from a finished placement.
//!
//! None of this feeds back into the search; it mirrors what the surrounding
//! simulation reports per node and per request path.

use crate::core::{AssignmentMatrix, Module, Node, ResourceMatrix};
use crate::error::{PlacementError, Result};
use serde::Serialize;

/// Per-node load summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeUsage {
    pub node: String,
    /// Distance from the deepest level of the hierarchy
    pub hop_count: u32,
    /// Sum of the MIPS demanded by the modules placed here
    pub cpu_usage: f64,
    pub cpu_total: f64,
    pub num_services: usize,
}

fn check_shape(assignment: &AssignmentMatrix, nodes: usize, modules: usize) -> Result<()> {
    if assignment.num_nodes() != nodes || assignment.num_modules() != modules {
        return Err(PlacementError::DimensionMismatch {
            rows: assignment.num_nodes(),
            cols: assignment.num_modules(),
            nodes,
            modules,
        });
    }
    Ok(())
}

pub fn node_usage(
    nodes: &[Node],
    modules: &[Module],
    assignment: &AssignmentMatrix,
) -> Result<Vec<NodeUsage>> {
    check_shape(assignment, nodes.len(), modules.len())?;
    let max_level = nodes.iter().map(|n| n.level).max().unwrap_or(0);

    Ok(nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let placed: Vec<usize> = assignment.modules_on(i).collect();
            NodeUsage {
                node: node.name.clone(),
                hop_count: max_level - node.level,
                cpu_usage: placed.iter().map(|&j| modules[j].mips).sum(),
                cpu_total: node.mips,
                num_services: placed.len(),
            }
        })
        .collect())
}

/// Resource weight consumed on each node.
pub fn resource_usage(resources: &ResourceMatrix, assignment: &AssignmentMatrix) -> Result<Vec<f64>> {
    check_shape(assignment, resources.num_nodes(), resources.num_modules())?;
    Ok((0..resources.num_nodes())
        .map(|i| assignment.modules_on(i).map(|j| resources.get(i, j)).sum())
        .collect())
}

/// Hops a request entering at node `from` travels up the hierarchy before
/// reaching a node that hosts `module`. Stops at the first level-0 node.
pub fn hop_count(
    nodes: &[Node],
    assignment: &AssignmentMatrix,
    from: usize,
    module: usize,
) -> Result<u32> {
    if from >= nodes.len() {
        return Err(PlacementError::UnknownNode(format!("#{from}")));
    }
    if assignment.num_nodes() != nodes.len() || module >= assignment.num_modules() {
        return Err(PlacementError::DimensionMismatch {
            rows: assignment.num_nodes(),
            cols: assignment.num_modules(),
            nodes: nodes.len(),
            modules: module + 1,
        });
    }

    let mut current = from;
    let mut hops = 0u32;
    loop {
        let node = &nodes[current];
        if node.level == 0 || assignment.is_set(current, module) {
            return Ok(hops);
        }
        match node.parent {
            Some(parent) if parent < nodes.len() => {
                current = parent;
                hops += 1;
            }
            Some(parent) => return Err(PlacementError::UnknownNode(format!("#{parent}"))),
            None => return Ok(hops),
        }
        if hops as usize > nodes.len() {
            return Err(PlacementError::Config(format!(
                "parent chain starting at '{}' does not reach the root",
                nodes[from].name
            )));
        }
    }
}

/// A stream of requests entering the network at `gateway` and consumed by
/// `module` at `rate` requests per time unit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RequestSource {
    pub gateway: usize,
    pub module: usize,
    pub rate: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HopCountSummary {
    pub average: f64,
    /// Average weighted by each source's request rate
    pub weighted_average: f64,
    pub evaluations: usize,
}

pub fn hop_count_summary(
    nodes: &[Node],
    assignment: &AssignmentMatrix,
    sources: &[RequestSource],
) -> Result<HopCountSummary> {
    let mut hops_total = 0.0;
    let mut weighted_total = 0.0;
    let mut rate_total = 0.0;

    for source in sources {
        let hops = f64::from(hop_count(nodes, assignment, source.gateway, source.module)?);
        hops_total += hops;
        weighted_total += source.rate * hops;
        rate_total += source.rate;
    }

    if sources.is_empty() {
        return Ok(HopCountSummary::default());
    }

    Ok(HopCountSummary {
        average: hops_total / sources.len() as f64,
        weighted_average: if rate_total > 0.0 { weighted_total / rate_total } else { 0.0 },
        evaluations: sources.len(),
    })
}
