use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlacementError>;

/// Errors raised before or around a placement run.
///
/// The search itself never fails: a suboptimal placement is still a result.
/// Everything here is either bad input or a broken structural invariant.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("no candidate nodes supplied")]
    NoNodes,

    #[error("no modules to place")]
    NoModules,

    #[error("matrix shape {rows}x{cols} does not match {nodes} nodes x {modules} modules")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        nodes: usize,
        modules: usize,
    },

    #[error("cost[{node}][{module}] = {value} is not a finite non-negative number")]
    InvalidCost { node: usize, module: usize, value: f64 },

    #[error("node '{name}' has non-positive capacity {mips}")]
    InvalidCapacity { name: String, mips: f64 },

    #[error("module column {column} is assigned to {count} nodes (expected exactly 1)")]
    InvalidAssignment { column: usize, count: usize },

    #[error("invalid solver configuration: {0}")]
    Config(String),

    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("unknown node '{0}'")]
    UnknownNode(String),

    #[error("cyclic dependency detected involving module '{0}'")]
    CyclicGraph(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}
