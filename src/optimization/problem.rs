use super::fitness;
use super::solvers::traits::Problem;
use crate::core::{AssignmentMatrix, CostMatrix, Module, Node, ResourceMatrix};
use crate::error::{PlacementError, Result};
use std::collections::HashSet;

/// Nodes, modules and the matrices derived from them for one placement run.
#[derive(Clone, Debug)]
pub struct PlacementProblem {
    nodes: Vec<Node>,
    modules: Vec<Module>,
    cost: CostMatrix,
    resources: Option<ResourceMatrix>,
}

impl PlacementProblem {
    pub fn new(nodes: Vec<Node>, modules: Vec<Module>, cost: CostMatrix) -> Result<Self> {
        if nodes.is_empty() {
            return Err(PlacementError::NoNodes);
        }
        if modules.is_empty() {
            return Err(PlacementError::NoModules);
        }
        check_unique("node", nodes.iter().map(|n| n.name.as_str()))?;
        check_unique("module", modules.iter().map(|m| m.name.as_str()))?;
        Self::check_dims(&nodes, &modules, cost.num_nodes(), cost.num_modules())?;

        Ok(Self {
            nodes,
            modules,
            cost,
            resources: None,
        })
    }

    /// Derive the cost and RAM matrices from node capacities and module demands.
    pub fn from_topology(nodes: Vec<Node>, modules: Vec<Module>) -> Result<Self> {
        let cost = CostMatrix::from_topology(&nodes, &modules)?;
        let resources = ResourceMatrix::from_topology(&nodes, &modules)?;
        Self::new(nodes, modules, cost)?.with_resources(resources)
    }

    pub fn with_resources(mut self, resources: ResourceMatrix) -> Result<Self> {
        Self::check_dims(
            &self.nodes,
            &self.modules,
            resources.num_nodes(),
            resources.num_modules(),
        )?;
        self.resources = Some(resources);
        Ok(self)
    }

    fn check_dims(nodes: &[Node], modules: &[Module], rows: usize, cols: usize) -> Result<()> {
        if rows != nodes.len() || cols != modules.len() {
            return Err(PlacementError::DimensionMismatch {
                rows,
                cols,
                nodes: nodes.len(),
                modules: modules.len(),
            });
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn cost(&self) -> &CostMatrix {
        &self.cost
    }

    pub fn resources(&self) -> Option<&ResourceMatrix> {
        self.resources.as_ref()
    }
}

/// Placements are keyed by name; fails on the first repeated one.
fn check_unique<'a>(kind: &'static str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(PlacementError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

impl Problem for PlacementProblem {
    fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn num_modules(&self) -> usize {
        self.modules.len()
    }

    fn fitness(&self, assignment: &AssignmentMatrix) -> f64 {
        fitness::evaluate(&self.cost, assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_cost_matrix() {
        let nodes = vec![Node::new("a", 100.0, 1.0), Node::new("b", 100.0, 1.0)];
        let modules = vec![Module::new("m", 10.0)];
        let cost = CostMatrix::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();

        assert!(matches!(
            PlacementProblem::new(nodes, modules, cost),
            Err(PlacementError::DimensionMismatch { rows: 2, cols: 2, nodes: 2, modules: 1 })
        ));
    }

    #[test]
    fn refuses_empty_inputs() {
        let cost = CostMatrix::new(vec![vec![1.0]]).unwrap();
        assert!(matches!(
            PlacementProblem::new(vec![], vec![Module::new("m", 1.0)], cost.clone()),
            Err(PlacementError::NoNodes)
        ));
        assert!(matches!(
            PlacementProblem::new(vec![Node::new("n", 1.0, 0.0)], vec![], cost),
            Err(PlacementError::NoModules)
        ));
        assert!(matches!(
            PlacementProblem::from_topology(vec![], vec![Module::new("m", 1.0)]),
            Err(PlacementError::NoNodes)
        ));
    }

    #[test]
    fn rejects_duplicate_names() {
        let nodes = vec![Node::new("gw", 1000.0, 2.0), Node::new("gw", 500.0, 4.0)];
        let modules = vec![Module::new("a", 100.0), Module::new("b", 100.0)];
        assert!(matches!(
            PlacementProblem::from_topology(nodes, modules),
            Err(PlacementError::DuplicateName { kind: "node", ref name }) if name == "gw"
        ));

        let nodes = vec![Node::new("gw", 1000.0, 2.0), Node::new("cloud", 4000.0, 100.0)];
        let modules = vec![Module::new("a", 100.0), Module::new("a", 200.0)];
        assert!(matches!(
            PlacementProblem::from_topology(nodes, modules),
            Err(PlacementError::DuplicateName { kind: "module", ref name }) if name == "a"
        ));
    }

    #[test]
    fn from_topology_carries_resources() {
        let nodes = vec![Node::new("cloud", 4000.0, 100.0).with_ram(40000.0)];
        let modules = vec![Module::new("a", 400.0), Module::new("b", 800.0)];
        let problem = PlacementProblem::from_topology(nodes, modules).unwrap();

        assert_eq!(problem.resources().unwrap().get(0, 1), 40000.0);
        let both = AssignmentMatrix::from_rows(vec![vec![1, 1]]).unwrap();
        assert!((problem.fitness(&both) - 200.3).abs() < 1e-9);
    }
}
