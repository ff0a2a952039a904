//! Value tree assembly over an immutable catalog.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, instrument};

use crate::domain::{
    AssemblyContext, BusinessContext, Catalog, Node, NodeLevel, TreeStatistics, ValueTree,
    ValueTreeNode,
};

/// Builds value trees from a loaded catalog.
///
/// Holds only a shared borrow, so any number of assemblers can run against
/// the same snapshot at once. Every call returns a freshly built tree.
pub struct Assembler<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: Catalog + ?Sized> Assembler<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Assemble the tree for one context and threshold.
    ///
    /// `threshold` is not clamped: values below 1 admit every matching rule,
    /// values above 5 admit none.
    pub fn assemble(
        &self,
        value_intent: &str,
        industry: &str,
        function: &str,
        threshold: i64,
    ) -> ValueTree {
        self.assemble_context(BusinessContext::new(value_intent, industry, function), threshold)
    }

    #[instrument(level = "debug", skip(self), fields(context = %business))]
    pub fn assemble_context(&self, business: BusinessContext, threshold: i64) -> ValueTree {
        let context = AssemblyContext {
            business,
            threshold,
        };

        let catalog: &'a C = self.catalog;
        let rules = catalog.rules_matching(&context.business);
        debug!("step 1: {} matching rules", rules.len());

        let eligible: Vec<&str> = rules
            .iter()
            .filter(|r| i64::from(r.applicability_weight) >= threshold)
            .map(|r| r.node_id.as_str())
            .collect();
        debug!("step 2: {} rules at or above threshold", eligible.len());

        let seeds: Vec<&Node> = eligible
            .into_iter()
            .filter_map(|id| catalog.node_by_id(id))
            .filter(|n| n.is_active())
            .collect();
        debug!("step 3: {} active eligible nodes", seeds.len());

        let included = self.close_over_ancestors(&seeds);
        debug!("step 4: {} nodes after ancestor closure", included.len());
        if included.is_empty() {
            return ValueTree::empty(context);
        }

        let roots = build_hierarchy(&included);
        let mut reachable: HashSet<&str> = HashSet::with_capacity(included.len());
        let mut stack: Vec<&ValueTreeNode> = roots.iter().collect();
        while let Some(tree_node) = stack.pop() {
            reachable.insert(tree_node.node_id());
            stack.extend(tree_node.children.iter());
        }
        let detached_node_ids: Vec<String> = included
            .keys()
            .filter(|id| !reachable.contains(*id))
            .map(|id| id.to_string())
            .collect();
        if !detached_node_ids.is_empty() {
            debug!("{} included nodes not reachable from a Lever root", detached_node_ids.len());
        }

        ValueTree {
            roots,
            context,
            node_count: included.len(),
            detached_node_ids,
        }
    }

    /// Per-level counts over the rooted part of `tree`.
    pub fn statistics(&self, tree: &ValueTree) -> TreeStatistics {
        tree.statistics()
    }

    /// Seeds plus every active ancestor, cutting each walk at the first
    /// missing or inactive parent. Keyed by id, so sorted and deduplicated.
    fn close_over_ancestors(&self, seeds: &[&'a Node]) -> BTreeMap<&'a str, &'a Node> {
        let catalog: &'a C = self.catalog;
        let mut included: BTreeMap<&str, &Node> = BTreeMap::new();
        for &seed in seeds {
            if included.insert(seed.node_id.as_str(), seed).is_some() {
                continue;
            }
            let mut current = seed;
            while let Some(parent_id) = current.parent_node_id.as_deref() {
                // already included means its chain was walked
                if included.contains_key(parent_id) {
                    break;
                }
                match catalog.node_by_id(parent_id) {
                    Some(parent) if parent.is_active() => {
                        included.insert(parent.node_id.as_str(), parent);
                        current = parent;
                    }
                    _ => break,
                }
            }
        }
        included
    }
}

/// Link included nodes to included parents; only Lever nodes become roots.
fn build_hierarchy(included: &BTreeMap<&str, &Node>) -> Vec<ValueTreeNode> {
    let mut children: BTreeMap<&str, Vec<&Node>> = BTreeMap::new();
    let mut roots: Vec<&Node> = Vec::new();
    // BTreeMap iteration is ascending by id, so every list comes out sorted
    for (&id, &node) in included {
        match node.parent_node_id.as_deref() {
            Some(parent_id) if parent_id != id && included.contains_key(parent_id) => {
                children.entry(parent_id).or_default().push(node);
            }
            _ if node.node_level == NodeLevel::Lever => roots.push(node),
            _ => {}
        }
    }
    roots
        .into_iter()
        .map(|root| attach_children(root, &children))
        .collect()
}

fn attach_children(node: &Node, children: &BTreeMap<&str, Vec<&Node>>) -> ValueTreeNode {
    let mut tree_node = ValueTreeNode::new(node.clone());
    if let Some(kids) = children.get(node.node_id.as_str()) {
        tree_node.children = kids
            .iter()
            .map(|child| attach_children(child, children))
            .collect();
    }
    tree_node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::Dataset;
    use crate::domain::{ApplicabilityRule, NodeStatus};

    fn node(id: &str, level: NodeLevel, parent: Option<&str>) -> Node {
        Node {
            node_id: id.into(),
            node_name: id.into(),
            node_level: level,
            parent_node_id: parent.map(str::to_string),
            description: String::new(),
            is_leaf: false,
            status: NodeStatus::Active,
        }
    }

    fn rule(node_id: &str, weight: u8) -> ApplicabilityRule {
        ApplicabilityRule {
            applicability_id: None,
            node_id: node_id.into(),
            value_intent: Some("X".into()),
            industry: Some("X".into()),
            function: Some("X".into()),
            applicability_weight: weight,
            mandatory_flag: false,
            notes: String::new(),
        }
    }

    fn chain() -> Vec<Node> {
        vec![
            node("L1", NodeLevel::Lever, None),
            node("BO1", NodeLevel::BusinessObjective, Some("L1")),
            node("VD1", NodeLevel::ValueDriver, Some("BO1")),
            node("K1", NodeLevel::Kpi, Some("VD1")),
        ]
    }

    #[test]
    fn given_kpi_rule_when_assembling_then_pulls_in_full_chain() {
        let dataset = Dataset::from_records(chain(), vec![rule("K1", 4)]);
        let tree = Assembler::new(&dataset).assemble("X", "X", "X", 3);
        let ids: Vec<_> = tree.iter().map(|t| t.node_id()).collect();
        assert_eq!(ids, vec!["L1", "BO1", "VD1", "K1"]);
        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.node_count, 4);
        assert_eq!(tree.context.threshold, 3);
    }

    #[test]
    fn given_inactive_intermediate_when_assembling_then_chain_is_cut_and_detached() {
        let mut nodes = chain();
        nodes[1].status = NodeStatus::Deprecated;
        let dataset = Dataset::from_records(nodes, vec![rule("K1", 5)]);
        let tree = Assembler::new(&dataset).assemble("X", "X", "X", 1);
        assert!(tree.is_empty());
        assert_eq!(tree.node_count, 2);
        assert_eq!(tree.detached_node_ids, vec!["K1", "VD1"]);
        assert_eq!(tree.statistics().total, 0);
    }

    #[test]
    fn given_overlapping_chains_when_assembling_then_siblings_sorted_and_deduplicated() {
        let mut nodes = chain();
        nodes.push(node("K0", NodeLevel::Kpi, Some("VD1")));
        nodes.push(node("BO0", NodeLevel::BusinessObjective, Some("L1")));
        let dataset = Dataset::from_records(
            nodes,
            vec![rule("K1", 4), rule("K0", 4), rule("BO0", 3), rule("K1", 5)],
        );
        let tree = Assembler::new(&dataset).assemble("X", "X", "X", 3);
        let ids: Vec<_> = tree.iter().map(|t| t.node_id()).collect();
        assert_eq!(ids, vec!["L1", "BO0", "BO1", "VD1", "K0", "K1"]);
        assert_eq!(tree.node_count, 6);
        assert!(tree.detached_node_ids.is_empty());
    }

    #[test]
    fn given_unmatched_context_when_assembling_then_empty_tree() {
        let dataset = Dataset::from_records(chain(), vec![rule("K1", 4)]);
        let tree = Assembler::new(&dataset).assemble("X", "x", "X", 1);
        assert!(tree.is_empty());
        assert_eq!(tree.node_count, 0);
    }

    #[test]
    fn given_threshold_outside_range_when_assembling_then_accepted_as_is() {
        let dataset = Dataset::from_records(chain(), vec![rule("K1", 1)]);
        let assembler = Assembler::new(&dataset);
        assert_eq!(assembler.assemble("X", "X", "X", -10).node_count, 4);
        assert_eq!(assembler.assemble("X", "X", "X", 99).node_count, 0);
    }

    #[test]
    fn given_dyn_catalog_when_assembling_then_works_through_trait_object() {
        let dataset = Dataset::from_records(chain(), vec![rule("VD1", 2)]);
        let catalog: &dyn Catalog = &dataset;
        let tree = Assembler::new(catalog).assemble("X", "X", "X", 2);
        assert_eq!(Assembler::new(catalog).statistics(&tree).value_drivers, 1);
        assert_eq!(tree.leaf_nodes(), vec!["VD1"]);
    }
}
