//! Accessor contract between a loaded dataset and the assembler.

use crate::domain::entities::{ApplicabilityRule, BusinessContext, Node};

/// Read-only view over a validated node catalog and its applicability rules.
///
/// Implementations must be immutable snapshots: the same calls return the
/// same data for the lifetime of the value.
pub trait Catalog: Send + Sync {
    /// All catalog nodes, including non-active ones.
    fn nodes(&self) -> &[Node];

    /// Lookup by `node_id`.
    fn node_by_id(&self, node_id: &str) -> Option<&Node>;

    /// Rules whose three context fields equal `context` exactly.
    fn rules_matching(&self, context: &BusinessContext) -> Vec<&ApplicabilityRule>;
}
