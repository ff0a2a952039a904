//! Immutable, validated snapshot of one workbook load.

use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use tracing::{debug, instrument, warn};

use crate::application::LoadError;
use crate::domain::{
    columns, validate_workbook, ApplicabilityRule, BusinessContext, Catalog, Node, SheetNames,
    Table, Workbook,
};

/// Typed records of a successfully validated workbook.
///
/// Never mutated after construction; share it behind an `Arc` and build a new
/// one to reload.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    rules: Vec<ApplicabilityRule>,
    intent_descriptions: BTreeMap<String, String>,
    warnings: Vec<String>,
}

impl Dataset {
    /// Validate `workbook` and convert its rows into typed records.
    #[instrument(level = "debug", skip_all)]
    pub fn from_workbook(workbook: &Workbook, sheets: &SheetNames) -> Result<Self, LoadError> {
        let report = validate_workbook(workbook, sheets);
        for warning in &report.warnings {
            warn!("{}", warning);
        }
        if !report.is_valid() {
            return Err(LoadError::new(report.errors));
        }

        let (Some(node_master), Some(context)) = (
            workbook.sheet(&sheets.node_master),
            workbook.sheet(&sheets.context_applicability),
        ) else {
            return Err(LoadError::single("required sheets vanished after validation"));
        };

        let nodes = node_master
            .rows()
            .map(|row| Node::from_row(&row, node_master.name()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LoadError::single(e.to_string()))?;
        let rules = context
            .rows()
            .map(|row| ApplicabilityRule::from_row(&row, context.name()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LoadError::single(e.to_string()))?;

        let mut warnings = report.warnings;
        let intent_descriptions = match workbook.sheet(&sheets.value_intent_summary) {
            Some(summary) => read_intent_descriptions(summary, &mut warnings),
            None => BTreeMap::new(),
        };

        debug!(
            "dataset: {} nodes, {} rules, {} intent descriptions",
            nodes.len(),
            rules.len(),
            intent_descriptions.len()
        );
        Ok(Self::from_records(nodes, rules)
            .with_intent_descriptions(intent_descriptions)
            .with_warnings(warnings))
    }

    /// Build directly from typed records, skipping validation.
    pub fn from_records(nodes: Vec<Node>, rules: Vec<ApplicabilityRule>) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            index.entry(node.node_id.clone()).or_insert(i);
        }
        Self {
            nodes,
            index,
            rules,
            intent_descriptions: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_intent_descriptions(mut self, descriptions: BTreeMap<String, String>) -> Self {
        self.intent_descriptions = descriptions;
        self
    }

    fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn rules(&self) -> &[ApplicabilityRule] {
        &self.rules
    }

    /// Hygiene warnings raised while validating this snapshot.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn distinct_value_intents(&self) -> Vec<String> {
        distinct(self.rules.iter().map(|r| r.value_intent.as_deref()))
    }

    pub fn distinct_industries(&self) -> Vec<String> {
        distinct(self.rules.iter().map(|r| r.industry.as_deref()))
    }

    pub fn distinct_functions(&self) -> Vec<String> {
        distinct(self.rules.iter().map(|r| r.function.as_deref()))
    }

    /// Display text for a value intent from the optional summary sheet.
    pub fn value_intent_description(&self, value_intent: &str) -> Option<&str> {
        self.intent_descriptions.get(value_intent).map(String::as_str)
    }
}

impl Catalog for Dataset {
    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn node_by_id(&self, node_id: &str) -> Option<&Node> {
        self.index.get(node_id).map(|&i| &self.nodes[i])
    }

    fn rules_matching(&self, context: &BusinessContext) -> Vec<&ApplicabilityRule> {
        self.rules.iter().filter(|r| r.matches(context)).collect()
    }
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    values
        .flatten()
        .unique()
        .sorted()
        .map(str::to_string)
        .collect()
}

fn read_intent_descriptions(summary: &Table, warnings: &mut Vec<String>) -> BTreeMap<String, String> {
    let missing = summary.missing_columns(&[columns::VALUE_INTENT, columns::DESCRIPTION]);
    if !missing.is_empty() {
        let message = format!(
            "Sheet '{}' is missing columns {:?}; value intent descriptions ignored",
            summary.name(),
            missing
        );
        warn!("{}", message);
        warnings.push(message);
        return BTreeMap::new();
    }

    let mut descriptions = BTreeMap::new();
    for row in summary.rows() {
        if let (Some(intent), Some(description)) =
            (row.get(columns::VALUE_INTENT), row.get(columns::DESCRIPTION))
        {
            descriptions
                .entry(intent.to_string())
                .or_insert_with(|| description.to_string());
        }
    }
    descriptions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::sample_workbook;

    #[test]
    fn given_valid_workbook_when_loading_then_exposes_typed_records() {
        let dataset = Dataset::from_workbook(&sample_workbook(), &SheetNames::default()).unwrap();
        assert_eq!(dataset.nodes().len(), 4);
        assert_eq!(dataset.node_by_id("VD1").map(|n| n.node_name.as_str()), Some("VD1 name"));
        assert!(dataset.node_by_id("nope").is_none());
        assert_eq!(dataset.distinct_value_intents(), vec!["X"]);
    }

    #[test]
    fn given_rules_with_nulls_when_listing_distinct_values_then_nulls_excluded_and_sorted() {
        let rule = |intent: Option<&str>, industry: Option<&str>| ApplicabilityRule {
            applicability_id: None,
            node_id: "K1".into(),
            value_intent: intent.map(str::to_string),
            industry: industry.map(str::to_string),
            function: Some("F".into()),
            applicability_weight: 3,
            mandatory_flag: false,
            notes: String::new(),
        };
        let dataset = Dataset::from_records(
            Vec::new(),
            vec![
                rule(Some("b"), None),
                rule(Some("a"), Some("Retail")),
                rule(None, Some("Banking")),
                rule(Some("b"), Some("Retail")),
            ],
        );
        assert_eq!(dataset.distinct_value_intents(), vec!["a", "b"]);
        assert_eq!(dataset.distinct_industries(), vec!["Banking", "Retail"]);
        assert_eq!(dataset.distinct_functions(), vec!["F"]);
    }

    #[test]
    fn given_summary_sheet_when_loading_then_describes_intents() {
        let workbook = sample_workbook().with_table(Table::from_strs(
            "Value_Intent_Summary",
            &["Value_Intent", "Description"],
            &[&["X", "Grow the business"], &["Y", ""]],
        ));
        let dataset = Dataset::from_workbook(&workbook, &SheetNames::default()).unwrap();
        assert_eq!(dataset.value_intent_description("X"), Some("Grow the business"));
        assert_eq!(dataset.value_intent_description("Y"), None);
    }

    #[test]
    fn given_invalid_workbook_when_loading_then_returns_error_list() {
        let err = Dataset::from_workbook(&Workbook::new(), &SheetNames::default()).unwrap_err();
        assert_eq!(err.errors.len(), 2);
    }
}
