pub mod graph;
pub mod matrix;
pub mod types;

pub use graph::{AppEdge, AppGraph};
pub use matrix::{AssignedColumns, AssignmentMatrix, CostMatrix, ResourceMatrix, VelocityField};
pub use types::{Module, Node};
