//! Test bootstrap and workbook fixtures.

use std::env;
use std::sync::Once;
use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{columns, Table, Workbook};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "trace");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Builds the two required sheets row by row.
///
/// Every row carries all columns; empty strings are empty cells.
#[derive(Debug, Clone, Default)]
pub struct WorkbookBuilder {
    nodes: Vec<[String; 7]>,
    rules: Vec<[String; 8]>,
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active node, `parent` empty for none.
    pub fn node(self, id: &str, level: &str, parent: &str) -> Self {
        self.node_with_status(id, level, parent, "Active")
    }

    pub fn node_with_status(mut self, id: &str, level: &str, parent: &str, status: &str) -> Self {
        self.nodes.push([
            id.into(),
            format!("{id} name"),
            level.into(),
            parent.into(),
            String::new(),
            "false".into(),
            status.into(),
        ]);
        self
    }

    /// Rule for `node_id` in context `(intent, industry, function)`.
    pub fn rule(mut self, node_id: &str, context: (&str, &str, &str), weight: &str) -> Self {
        let id = format!("AP{}", self.rules.len() + 1);
        self.rules.push([
            id,
            node_id.into(),
            context.0.into(),
            context.1.into(),
            context.2.into(),
            weight.into(),
            "false".into(),
            String::new(),
        ]);
        self
    }

    pub fn node_table(&self) -> Table {
        let rows: Vec<Vec<&str>> = self
            .nodes
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect();
        let rows: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
        Table::from_strs("Node_Master", columns::NODE_MASTER_REQUIRED, &rows)
    }

    pub fn rule_table(&self) -> Table {
        let header: Vec<&str> = columns::CONTEXT_APPLICABILITY_REQUIRED
            .iter()
            .copied()
            .chain([columns::MANDATORY_FLAG, columns::NOTES])
            .collect();
        let rows: Vec<Vec<&str>> = self
            .rules
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect();
        let rows: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
        Table::from_strs("Context_Applicability", &header, &rows)
    }

    pub fn build(&self) -> Workbook {
        Workbook::new()
            .with_table(self.node_table())
            .with_table(self.rule_table())
    }
}

/// The single-chain catalog L1 > BO1 > VD1 > K1 with one rule on K1
/// (context X/X/X, weight 4).
pub fn sample_builder() -> WorkbookBuilder {
    WorkbookBuilder::new()
        .node("L1", "Lever", "")
        .node("BO1", "Business_Objective", "L1")
        .node("VD1", "Value_Driver", "BO1")
        .node("K1", "KPI", "VD1")
        .rule("K1", ("X", "X", "X"), "4")
}

pub fn sample_workbook() -> Workbook {
    sample_builder().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
    }

    #[test]
    fn given_builder_when_building_then_rule_ids_are_sequential() {
        let table = sample_builder().rule("VD1", ("X", "X", "X"), "2").rule_table();
        let ids: Vec<_> = table
            .rows()
            .filter_map(|r| r.get(columns::APPLICABILITY_ID))
            .collect();
        assert_eq!(ids, vec!["AP1", "AP2"]);
    }
}
