//! Node x module matrices used by the placement search.
//!
//! Every matrix is indexed `[node][module]`: rows follow the node order the
//! solver was given and columns follow the module order.

use super::types::{Module, Node};
use crate::error::{PlacementError, Result};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, de};

fn check_shape<T>(rows: &[Vec<T>]) -> Result<(usize, usize)> {
    let m = rows.len();
    if m == 0 {
        return Err(PlacementError::NoNodes);
    }
    let n = rows[0].len();
    if n == 0 {
        return Err(PlacementError::NoModules);
    }
    if let Some(bad) = rows.iter().find(|r| r.len() != n) {
        return Err(PlacementError::DimensionMismatch {
            rows: m,
            cols: bad.len(),
            nodes: m,
            modules: n,
        });
    }
    Ok((m, n))
}

/// Wire shape shared by every matrix: `{"rows": [[...], ...]}`.
#[derive(Deserialize)]
struct Rows<T> {
    rows: Vec<Vec<T>>,
}

impl<T> Rows<T> {
    fn read<'de, D>(deserializer: D) -> std::result::Result<Vec<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Self::deserialize(deserializer)?.rows)
    }
}

// ===== COST =====

/// Estimated time for each module on each node. Read-only during a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CostMatrix {
    rows: Vec<Vec<f64>>,
}

impl CostMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        check_shape(&rows)?;
        for (i, row) in rows.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(PlacementError::InvalidCost {
                        node: i,
                        module: j,
                        value,
                    });
                }
            }
        }
        Ok(Self { rows })
    }

    /// Processing time (`module.mips / node.mips`) plus the node's uplink latency.
    pub fn from_topology(nodes: &[Node], modules: &[Module]) -> Result<Self> {
        if nodes.is_empty() {
            return Err(PlacementError::NoNodes);
        }
        if modules.is_empty() {
            return Err(PlacementError::NoModules);
        }

        let mut rows = Vec::with_capacity(nodes.len());
        for node in nodes {
            if !(node.mips > 0.0) {
                return Err(PlacementError::InvalidCapacity {
                    name: node.name.clone(),
                    mips: node.mips,
                });
            }
            let row = modules
                .iter()
                .map(|module| module.mips / node.mips + node.uplink_latency)
                .collect();
            rows.push(row);
        }
        Self::new(rows)
    }

    pub fn num_nodes(&self) -> usize {
        self.rows.len()
    }

    pub fn num_modules(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    #[inline]
    pub fn get(&self, node: usize, module: usize) -> f64 {
        self.rows[node][module]
    }

    pub fn row(&self, node: usize) -> &[f64] {
        &self.rows[node]
    }
}

impl<'de> Deserialize<'de> for CostMatrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Self::new(Rows::read(deserializer)?).map_err(de::Error::custom)
    }
}

// ===== RESOURCES =====

/// Per-(node, module) resource weight. Reported, never optimized against.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceMatrix {
    rows: Vec<Vec<f64>>,
}

impl ResourceMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        check_shape(&rows)?;
        Ok(Self { rows })
    }

    /// Each cell carries the RAM of the hosting node.
    pub fn from_topology(nodes: &[Node], modules: &[Module]) -> Result<Self> {
        if modules.is_empty() {
            return Err(PlacementError::NoModules);
        }
        let rows = nodes.iter().map(|node| vec![node.ram; modules.len()]).collect();
        Self::new(rows)
    }

    pub fn num_nodes(&self) -> usize {
        self.rows.len()
    }

    pub fn num_modules(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    #[inline]
    pub fn get(&self, node: usize, module: usize) -> f64 {
        self.rows[node][module]
    }
}

impl<'de> Deserialize<'de> for ResourceMatrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Self::new(Rows::read(deserializer)?).map_err(de::Error::custom)
    }
}

// ===== COLUMN TRACKING =====

/// Per-column "already placed in this pass" flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignedColumns(Vec<bool>);

impl AssignedColumns {
    pub fn new(n_modules: usize) -> Self {
        Self(vec![false; n_modules])
    }

    #[inline]
    pub fn is_assigned(&self, column: usize) -> bool {
        self.0[column]
    }

    #[inline]
    pub fn mark(&mut self, column: usize) {
        self.0[column] = true;
    }

    pub fn unassigned(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, assigned)| !**assigned)
            .map(|(j, _)| j)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ===== ASSIGNMENT =====

/// Binary placement: `cell(i, j)` is set iff module `j` runs on node `i`.
///
/// Outside an update step every column holds exactly one set cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssignmentMatrix {
    rows: Vec<Vec<u8>>,
}

impl AssignmentMatrix {
    pub fn zeros(n_nodes: usize, n_modules: usize) -> Self {
        Self {
            rows: vec![vec![0; n_modules]; n_nodes],
        }
    }

    /// Build from explicit rows, rejecting anything that is not a valid placement.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self> {
        check_shape(&rows)?;
        let matrix = Self { rows };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Coin-flip scan in row-major order. A column stops drawing after its
    /// first success, so no column ever receives two ones; columns that never
    /// succeed stay empty and are reported as unassigned.
    pub fn random<R: Rng + ?Sized>(
        n_nodes: usize,
        n_modules: usize,
        rng: &mut R,
    ) -> (Self, AssignedColumns) {
        let mut matrix = Self::zeros(n_nodes, n_modules);
        let mut assigned = AssignedColumns::new(n_modules);

        for i in 0..n_nodes {
            for j in 0..n_modules {
                if !assigned.is_assigned(j) && rng.gen_range(0..2u8) == 1 {
                    matrix.rows[i][j] = 1;
                    assigned.mark(j);
                }
            }
        }

        (matrix, assigned)
    }

    /// Random scan followed by repair; always satisfies the invariant.
    pub fn random_valid<R: Rng + ?Sized>(n_nodes: usize, n_modules: usize, rng: &mut R) -> Self {
        let (mut matrix, assigned) = Self::random(n_nodes, n_modules, rng);
        matrix.repair(&assigned, rng);
        matrix
    }

    /// Place every column not marked in `assigned` on a uniformly drawn node.
    pub fn repair<R: Rng + ?Sized>(&mut self, assigned: &AssignedColumns, rng: &mut R) {
        let n_nodes = self.rows.len();
        for j in assigned.unassigned() {
            let i = rng.gen_range(0..n_nodes);
            self.rows[i][j] = 1;
        }
        debug_assert!(self.is_valid(), "repair left a column without exactly one node");
    }

    pub fn num_nodes(&self) -> usize {
        self.rows.len()
    }

    pub fn num_modules(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    #[inline]
    pub fn is_set(&self, node: usize, module: usize) -> bool {
        self.rows[node][module] == 1
    }

    #[inline]
    pub(crate) fn set(&mut self, node: usize, module: usize, on: bool) {
        self.rows[node][module] = u8::from(on);
    }

    /// Signed cell value, as used in the velocity equation.
    #[inline]
    pub(crate) fn value(&self, node: usize, module: usize) -> f64 {
        f64::from(self.rows[node][module])
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    /// Node hosting `module`, if any.
    pub fn node_of(&self, module: usize) -> Option<usize> {
        (0..self.rows.len()).find(|&i| self.rows[i][module] == 1)
    }

    /// Module indices placed on `node`.
    pub fn modules_on(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.rows[node]
            .iter()
            .enumerate()
            .filter(|(_, bit)| **bit == 1)
            .map(|(j, _)| j)
    }

    pub fn validate(&self) -> Result<()> {
        for j in 0..self.num_modules() {
            let mut count = 0;
            for row in &self.rows {
                match row[j] {
                    0 => {}
                    1 => count += 1,
                    _ => return Err(PlacementError::InvalidAssignment { column: j, count }),
                }
            }
            if count != 1 {
                return Err(PlacementError::InvalidAssignment { column: j, count });
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl<'de> Deserialize<'de> for AssignmentMatrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Self::from_rows(Rows::read(deserializer)?).map_err(de::Error::custom)
    }
}

// ===== VELOCITY =====

/// Continuous per-cell propensity, clamped to [0, 1].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VelocityField {
    rows: Vec<Vec<f64>>,
}

impl VelocityField {
    pub fn zeros(n_nodes: usize, n_modules: usize) -> Self {
        Self {
            rows: vec![vec![0.0; n_modules]; n_nodes],
        }
    }

    /// Same coin-flip scan as [`AssignmentMatrix::random`], without repair.
    pub fn random<R: Rng + ?Sized>(n_nodes: usize, n_modules: usize, rng: &mut R) -> Self {
        let mut field = Self::zeros(n_nodes, n_modules);
        let mut assigned = AssignedColumns::new(n_modules);

        for i in 0..n_nodes {
            for j in 0..n_modules {
                if !assigned.is_assigned(j) && rng.gen_range(0..2u8) == 1 {
                    field.rows[i][j] = 1.0;
                    assigned.mark(j);
                }
            }
        }

        field
    }

    #[inline]
    pub fn get(&self, node: usize, module: usize) -> f64 {
        self.rows[node][module]
    }

    #[inline]
    pub(crate) fn set(&mut self, node: usize, module: usize, value: f64) {
        self.rows[node][module] = value.clamp(0.0, 1.0);
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn repair_places_every_empty_column_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut matrix = AssignmentMatrix::zeros(4, 6);
        matrix.repair(&AssignedColumns::new(6), &mut rng);

        assert!(matrix.is_valid());
        for j in 0..6 {
            assert!(matrix.node_of(j).is_some());
        }
    }

    #[test]
    fn repair_spreads_columns_across_rows() {
        let mut rng = StdRng::seed_from_u64(11);
        let trials = 4000;
        let mut hits = [0usize; 4];

        for _ in 0..trials {
            let mut matrix = AssignmentMatrix::zeros(4, 1);
            matrix.repair(&AssignedColumns::new(1), &mut rng);
            hits[matrix.node_of(0).unwrap()] += 1;
        }

        // Expected 1000 per row; allow a generous band.
        for count in hits {
            assert!((850..=1150).contains(&count), "skewed repair distribution: {hits:?}");
        }
    }

    #[test]
    fn repair_keeps_already_assigned_columns() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut matrix = AssignmentMatrix::zeros(3, 2);
        matrix.set(2, 0, true);
        let mut assigned = AssignedColumns::new(2);
        assigned.mark(0);

        matrix.repair(&assigned, &mut rng);

        assert_eq!(matrix.node_of(0), Some(2));
        assert!(matrix.is_valid());
    }

    #[test]
    fn random_scan_never_double_assigns() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let (matrix, assigned) = AssignmentMatrix::random(6, 8, &mut rng);
            for j in 0..8 {
                let count = (0..6).filter(|&i| matrix.is_set(i, j)).count();
                assert!(count <= 1);
                assert_eq!(count == 1, assigned.is_assigned(j));
            }
        }
    }

    #[test]
    fn random_velocity_has_at_most_one_hot_cell_per_column() {
        let mut rng = StdRng::seed_from_u64(9);
        let field = VelocityField::random(5, 7, &mut rng);
        for j in 0..7 {
            let hot = (0..5).filter(|&i| field.get(i, j) == 1.0).count();
            assert!(hot <= 1);
        }
    }

    #[test]
    fn from_rows_rejects_split_and_missing_columns() {
        let split = AssignmentMatrix::from_rows(vec![vec![1, 0], vec![1, 1]]);
        assert!(matches!(
            split,
            Err(PlacementError::InvalidAssignment { column: 0, count: 2 })
        ));

        let missing = AssignmentMatrix::from_rows(vec![vec![1, 0], vec![0, 0]]);
        assert!(matches!(
            missing,
            Err(PlacementError::InvalidAssignment { column: 1, count: 0 })
        ));
    }

    #[test]
    fn cost_matrix_from_topology_adds_latency() {
        let nodes = vec![Node::new("cloud", 1000.0, 100.0), Node::new("gw", 250.0, 4.0)];
        let modules = vec![Module::new("client", 500.0), Module::new("processor", 1000.0)];
        let cost = CostMatrix::from_topology(&nodes, &modules).unwrap();

        assert!((cost.get(0, 0) - 100.5).abs() < 1e-12);
        assert!((cost.get(1, 1) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn cost_matrix_rejects_bad_input() {
        assert!(matches!(CostMatrix::new(vec![]), Err(PlacementError::NoNodes)));
        assert!(matches!(
            CostMatrix::new(vec![vec![]]),
            Err(PlacementError::NoModules)
        ));
        assert!(matches!(
            CostMatrix::new(vec![vec![1.0, 2.0], vec![1.0]]),
            Err(PlacementError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            CostMatrix::new(vec![vec![1.0, f64::NAN]]),
            Err(PlacementError::InvalidCost { node: 0, module: 1, .. })
        ));

        let nodes = vec![Node::new("dead", 0.0, 1.0)];
        let modules = vec![Module::new("m", 1.0)];
        assert!(matches!(
            CostMatrix::from_topology(&nodes, &modules),
            Err(PlacementError::InvalidCapacity { .. })
        ));
    }

    #[test]
    fn deserializing_goes_through_validation() {
        let cost: CostMatrix = serde_json::from_str(r#"{"rows":[[1.5,2.0],[0.0,4.0]]}"#).unwrap();
        assert_eq!(cost.get(1, 1), 4.0);
        assert!(serde_json::from_str::<CostMatrix>(r#"{"rows":[[-5.0]]}"#).is_err());
        assert!(serde_json::from_str::<CostMatrix>(r#"{"rows":[]}"#).is_err());
        assert!(serde_json::from_str::<CostMatrix>(r#"{"rows":[[1.0],[1.0,2.0]]}"#).is_err());

        assert!(serde_json::from_str::<ResourceMatrix>(r#"{"rows":[[]]}"#).is_err());

        let placed: AssignmentMatrix = serde_json::from_str(r#"{"rows":[[0],[1]]}"#).unwrap();
        assert_eq!(placed.node_of(0), Some(1));
        assert!(serde_json::from_str::<AssignmentMatrix>(r#"{"rows":[[1],[1]]}"#).is_err());
        assert!(serde_json::from_str::<AssignmentMatrix>(r#"{"rows":[[0],[0]]}"#).is_err());
        assert!(serde_json::from_str::<AssignmentMatrix>(r#"{"rows":[]}"#).is_err());
    }

    #[test]
    fn serialized_matrices_read_back() {
        let cost = CostMatrix::new(vec![vec![3.0, 1.0]]).unwrap();
        let json = serde_json::to_string(&cost).unwrap();
        assert_eq!(serde_json::from_str::<CostMatrix>(&json).unwrap(), cost);
    }
}
