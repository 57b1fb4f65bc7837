use serde::{Deserialize, Serialize};

// ===== TOPOLOGY =====

/// A candidate execution location in the fog hierarchy.
///
/// `level` is the depth in the hierarchy as the topology builder assigns it
/// (the cloud sits at level 0). `parent` indexes into the same node slice the
/// solver receives; only the reporting functions follow it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Total processing capacity in MIPS
    pub mips: f64,
    /// Latency of the link towards the parent node
    pub uplink_latency: f64,
    #[serde(default)]
    pub ram: f64,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub parent: Option<usize>,
}

impl Node {
    pub fn new(name: impl Into<String>, mips: f64, uplink_latency: f64) -> Self {
        Self {
            name: name.into(),
            mips,
            uplink_latency,
            ram: 0.0,
            level: 0,
            parent: None,
        }
    }

    pub fn with_ram(mut self, ram: f64) -> Self {
        self.ram = ram;
        self
    }

    pub fn with_parent(mut self, parent: usize, level: u32) -> Self {
        self.parent = Some(parent);
        self.level = level;
        self
    }
}

// ===== APPLICATION =====

/// A deployable unit of the application graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    /// Processing demand in MIPS
    pub mips: f64,
}

impl Module {
    pub fn new(name: impl Into<String>, mips: f64) -> Self {
        Self {
            name: name.into(),
            mips,
        }
    }
}
