use crate::core::{AssignmentMatrix, CostMatrix};

/// Sum of the costs of the modules placed on each node.
pub fn node_loads(cost: &CostMatrix, assignment: &AssignmentMatrix) -> Vec<f64> {
    (0..cost.num_nodes())
        .map(|i| {
            assignment
                .modules_on(i)
                .map(|j| cost.get(i, j))
                .sum::<f64>()
        })
        .collect()
}

/// Bottleneck load: the largest per-node total. Lower is better.
pub fn evaluate(cost: &CostMatrix, assignment: &AssignmentMatrix) -> f64 {
    node_loads(cost, assignment)
        .into_iter()
        .fold(0.0, f64::max)
}
