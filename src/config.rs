use crate::error::{Error, Result};

pub const DEFAULT_MAX_PREFIX_PER_NODE: usize = 10;

/// Order in which a node keeps (and therefore visits) its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildOrder {
    /// Children stay in the order they were created.
    #[default]
    Insertion,
    /// Children are kept sorted by first byte, so walks yield keys in
    /// lexicographic byte order.
    Sorted,
}

/// Configuration for a [`Trie`](crate::Trie).
///
/// Read when nodes are built. Changing the prefix bound never re-chunks
/// nodes that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Longest prefix a single node may hold. Longer keys are chained
    /// across several nodes and compaction never merges past this bound.
    pub max_prefix_per_node: usize,
    /// How siblings are ordered; see [`ChildOrder`].
    pub child_order: ChildOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_prefix_per_node: DEFAULT_MAX_PREFIX_PER_NODE,
            child_order: ChildOrder::Insertion,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.max_prefix_per_node == 0 {
            return Err(Error::InvalidConfig {
                field: "max_prefix_per_node",
                value: self.max_prefix_per_node,
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}
