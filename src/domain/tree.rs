//! Assembled value tree: owned nodes, traversal and level statistics.

use serde::Serialize;
use termtree::Tree;
use tracing::instrument;

use crate::domain::entities::{BusinessContext, Node, NodeLevel};

/// A catalog node placed in an assembled tree, owning its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueTreeNode {
    pub node: Node,
    /// Sorted ascending by `node_id`.
    pub children: Vec<ValueTreeNode>,
}

impl ValueTreeNode {
    pub fn new(node: Node) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node.node_id
    }

    pub fn name(&self) -> &str {
        &self.node.node_name
    }

    pub fn level(&self) -> NodeLevel {
        self.node.node_level
    }

    pub fn description(&self) -> &str {
        &self.node.description
    }

    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ValueTreeNode::depth)
            .max()
            .unwrap_or(0)
    }
}

/// Inputs echoed back with an assembled tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyContext {
    #[serde(flatten)]
    pub business: BusinessContext,
    /// Accepted as given, no clamping to 1..=5.
    pub threshold: i64,
}

/// Result of one assembly call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueTree {
    /// Lever nodes only, sorted ascending by `node_id`.
    pub roots: Vec<ValueTreeNode>,
    pub context: AssemblyContext,
    /// Size of the included set, which can exceed the nodes reachable from `roots`.
    pub node_count: usize,
    /// Included node ids not reachable from any root, sorted.
    pub detached_node_ids: Vec<String>,
}

impl ValueTree {
    pub fn empty(context: AssemblyContext) -> Self {
        Self {
            roots: Vec::new(),
            context,
            node_count: 0,
            detached_node_ids: Vec::new(),
        }
    }

    /// No displayable roots. A normal outcome, not a load failure.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Pre-order, left-to-right traversal over all rooted nodes.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn find(&self, node_id: &str) -> Option<&ValueTreeNode> {
        self.iter().find(|t| t.node_id() == node_id)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(ValueTreeNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Ids of nodes without children, in pre-order.
    pub fn leaf_nodes(&self) -> Vec<&str> {
        self.iter()
            .filter(|t| t.children.is_empty())
            .map(ValueTreeNode::node_id)
            .collect()
    }

    /// Count rooted nodes per level.
    pub fn statistics(&self) -> TreeStatistics {
        let mut stats = TreeStatistics::default();
        for tree_node in self.iter() {
            stats.record(tree_node.level());
        }
        stats
    }
}

pub struct TreeIterator<'a> {
    stack: Vec<&'a ValueTreeNode>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a ValueTree) -> Self {
        Self {
            stack: tree.roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = &'a ValueTreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // reverse push keeps left-to-right order
        self.stack.extend(current.children.iter().rev());
        Some(current)
    }
}

/// Per-level counts over the rooted tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStatistics {
    /// Nodes reachable from the roots.
    pub total: usize,
    pub levers: usize,
    pub business_objectives: usize,
    pub value_drivers: usize,
    pub kpis: usize,
}

impl TreeStatistics {
    fn record(&mut self, level: NodeLevel) {
        self.total += 1;
        match level {
            NodeLevel::Lever => self.levers += 1,
            NodeLevel::BusinessObjective => self.business_objectives += 1,
            NodeLevel::ValueDriver => self.value_drivers += 1,
            NodeLevel::Kpi => self.kpis += 1,
        }
    }

    pub fn count(&self, level: NodeLevel) -> usize {
        match level {
            NodeLevel::Lever => self.levers,
            NodeLevel::BusinessObjective => self.business_objectives,
            NodeLevel::ValueDriver => self.value_drivers,
            NodeLevel::Kpi => self.kpis,
        }
    }
}

/// Conversion into a printable `termtree::Tree`.
pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for ValueTreeNode {
    fn to_tree_string(&self) -> Tree<String> {
        let label = format!("{} [{}] {}", self.node_id(), self.level(), self.name());
        let leaves: Vec<_> = self.children.iter().map(|c| c.to_tree_string()).collect();
        Tree::new(label).with_leaves(leaves)
    }
}

impl TreeNodeConvert for ValueTree {
    fn to_tree_string(&self) -> Tree<String> {
        let leaves: Vec<_> = self.roots.iter().map(|r| r.to_tree_string()).collect();
        Tree::new(self.context.business.to_string()).with_leaves(leaves)
    }
}
