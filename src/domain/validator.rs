//! Structural validation of the node catalog and the applicability rules.
//!
//! Runs before any typed record is built. Four stages, each a gate for the
//! next: sheets present, required columns present, catalog integrity, rule
//! integrity. Within a stage all violations are collected.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::entities::{columns, parse_flag, parse_weight, NodeLevel};
use crate::domain::error::DomainError;
use crate::domain::table::{Table, Workbook};

/// Names of the sheets the loader reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SheetNames {
    pub node_master: String,
    pub context_applicability: String,
    /// Optional sheet mapping `Value_Intent` to a description.
    pub value_intent_summary: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            node_master: "Node_Master".into(),
            context_applicability: "Context_Applicability".into(),
            value_intent_summary: "Value_Intent_Summary".into(),
        }
    }
}

/// Outcome of validation. Only `errors` block a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    /// Hygiene findings, e.g. a KPI whose parent is a Lever.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn extend(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Run all validation stages over a workbook.
#[instrument(level = "debug", skip_all)]
pub fn validate_workbook(workbook: &Workbook, sheets: &SheetNames) -> ValidationReport {
    let mut report = ValidationReport::default();

    // 1. sheets
    report.errors = validate_sheets_exist(&workbook.sheet_names(), sheets);
    let (Some(node_master), Some(context)) = (
        workbook.sheet(&sheets.node_master),
        workbook.sheet(&sheets.context_applicability),
    ) else {
        return report;
    };
    if !report.is_valid() {
        return report;
    }

    // 2. columns
    report
        .errors
        .extend(validate_required_columns(node_master, columns::NODE_MASTER_REQUIRED));
    report.errors.extend(validate_required_columns(
        context,
        columns::CONTEXT_APPLICABILITY_REQUIRED,
    ));
    if !report.is_valid() {
        return report;
    }

    // 3. catalog
    report.extend(validate_node_master(node_master));
    if !report.is_valid() {
        debug!("catalog integrity failed with {} errors", report.errors.len());
        return report;
    }

    // 4. rules
    let node_ids: HashSet<&str> = node_master
        .rows()
        .filter_map(|r| r.get(columns::NODE_ID))
        .collect();
    report.extend(validate_context_applicability(context, &node_ids));
    debug!(
        "validation finished: {} errors, {} warnings",
        report.errors.len(),
        report.warnings.len()
    );
    report
}

/// Report every required sheet that is absent.
pub fn validate_sheets_exist(present: &[&str], sheets: &SheetNames) -> Vec<String> {
    [&sheets.node_master, &sheets.context_applicability]
        .into_iter()
        .filter(|name| !present.contains(&name.as_str()))
        .map(|name| format!("Missing required sheet: '{}'", name))
        .collect()
}

pub fn validate_required_columns(table: &Table, required: &[&str]) -> Vec<String> {
    let missing = table.missing_columns(required);
    if missing.is_empty() {
        return Vec::new();
    }
    vec![format!(
        "Sheet '{}' is missing required columns: {:?}",
        table.name(),
        missing
    )]
}

/// Catalog integrity: ID presence and uniqueness, level values, parent links, cycles.
#[instrument(level = "debug", skip_all, fields(rows = table.len()))]
pub fn validate_node_master(table: &Table) -> ValidationReport {
    let mut report = ValidationReport::default();

    for row in table.rows() {
        if row.get(columns::NODE_ID).is_none() {
            report.errors.push(format!(
                "{} row {} is missing Node_ID",
                table.name(),
                row.sheet_row()
            ));
        }
    }

    let ids: Vec<&str> = table
        .rows()
        .filter_map(|r| r.get(columns::NODE_ID))
        .collect();
    let counts = ids.iter().copied().counts();
    let duplicated: Vec<&str> = ids
        .iter()
        .copied()
        .filter(|id| counts.get(id).copied().unwrap_or(0) > 1)
        .unique()
        .collect();
    if !duplicated.is_empty() {
        report
            .errors
            .push(format!("Duplicate Node_IDs found: {:?}", duplicated));
    }

    let id_set: HashSet<&str> = ids.iter().copied().collect();
    let mut levels: HashMap<&str, NodeLevel> = HashMap::new();
    for row in table.rows() {
        if let (Some(id), Some(level)) = (row.get(columns::NODE_ID), row.get(columns::NODE_LEVEL)) {
            if let Ok(level) = NodeLevel::parse(level) {
                levels.entry(id).or_insert(level);
            }
        }
    }

    for row in table.rows() {
        let Some(node_id) = row.get(columns::NODE_ID) else {
            continue;
        };
        let parent_id = row.get(columns::PARENT_NODE_ID);
        let level = match row.get(columns::NODE_LEVEL).map(NodeLevel::parse) {
            Some(Ok(level)) => level,
            Some(Err(_)) | None => {
                report.errors.push(format!(
                    "Node '{}' has invalid Node_Level '{}'",
                    node_id,
                    row.get(columns::NODE_LEVEL).unwrap_or_default()
                ));
                continue;
            }
        };

        match (level, parent_id) {
            (NodeLevel::Lever, Some(_)) => report
                .errors
                .push(format!("Lever node '{}' should not have a Parent_Node_ID", node_id)),
            (NodeLevel::Lever, None) => {}
            (_, None) => report
                .errors
                .push(format!("Non-Lever node '{}' is missing Parent_Node_ID", node_id)),
            (_, Some(parent)) if !id_set.contains(parent) => report.errors.push(format!(
                "Node '{}' references non-existent parent '{}'",
                node_id, parent
            )),
            (_, Some(parent)) => {
                if let Some(parent_level) = levels.get(parent) {
                    if parent_level.depth() + 1 != level.depth() {
                        report.warnings.push(format!(
                            "Node '{}' ({}) has parent '{}' at level {}",
                            node_id, level, parent, parent_level
                        ));
                    }
                }
            }
        }
    }

    report.errors.extend(check_circular_dependencies(table));

    let parents: HashSet<&str> = table
        .rows()
        .filter_map(|r| r.get(columns::PARENT_NODE_ID))
        .collect();
    for row in table.rows() {
        if let Some(node_id) = row.get(columns::NODE_ID) {
            if parse_flag(row.get(columns::IS_LEAF)) && parents.contains(node_id) {
                report.warnings.push(format!(
                    "Node '{}' is marked Is_Leaf but has child nodes",
                    node_id
                ));
            }
        }
    }

    report
}

/// Walk every parent chain; a revisited node before reaching a parentless
/// node is a cycle. Each walk is bounded by the number of distinct nodes.
pub fn check_circular_dependencies(table: &Table) -> Vec<String> {
    let mut parent_lookup: HashMap<&str, &str> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for row in table.rows() {
        if let (Some(id), Some(parent)) = (row.get(columns::NODE_ID), row.get(columns::PARENT_NODE_ID)) {
            if parent_lookup.insert(id, parent).is_none() {
                order.push(id);
            }
        }
    }

    let mut errors = Vec::new();
    for start in order {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = start;
        while let Some(&parent) = parent_lookup.get(current) {
            if !visited.insert(current) {
                errors.push(format!(
                    "Circular dependency detected involving node '{}'",
                    start
                ));
                break;
            }
            current = parent;
        }
    }
    errors
}

/// Rule integrity: node references and weights.
#[instrument(level = "debug", skip_all, fields(rows = table.len()))]
pub fn validate_context_applicability(table: &Table, node_ids: &HashSet<&str>) -> ValidationReport {
    let mut report = ValidationReport::default();
    let sheet = table.name();

    for row in table.rows() {
        match row.get(columns::NODE_ID) {
            None => report.errors.push(format!(
                "{} row {} is missing Node_ID",
                sheet,
                row.sheet_row()
            )),
            Some(node_id) if !node_ids.contains(node_id) => report.errors.push(format!(
                "{} row {} references non-existent Node_ID '{}'",
                sheet,
                row.sheet_row(),
                node_id
            )),
            Some(_) => {}
        }
    }

    for row in table.rows() {
        let n = row.sheet_row();
        match row.get(columns::APPLICABILITY_WEIGHT).map(parse_weight) {
            None => report
                .errors
                .push(format!("{} row {}: missing Applicability_Weight", sheet, n)),
            Some(Ok(_)) => {}
            Some(Err(DomainError::WeightOutOfRange(value))) => report.errors.push(format!(
                "{} row {}: Applicability_Weight must be between 1 and 5, got {}",
                sheet, n, value
            )),
            Some(Err(_)) => report.errors.push(format!(
                "{} row {}: Invalid Applicability_Weight value '{}'",
                sheet,
                n,
                row.get(columns::APPLICABILITY_WEIGHT).unwrap_or_default()
            )),
        }
    }

    let duplicated_ids: Vec<&str> = table
        .rows()
        .filter_map(|r| r.get(columns::APPLICABILITY_ID))
        .duplicates()
        .collect();
    if !duplicated_ids.is_empty() {
        report.warnings.push(format!(
            "Duplicate Applicability_IDs found: {:?}",
            duplicated_ids
        ));
    }

    report
}
