//! Domain entities: catalog nodes, applicability rules and the business context

use std::fmt;

use serde::{Serialize, Serializer};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::table::Row;

/// Column names of the two required sheets and the optional summary sheet.
pub mod columns {
    pub const NODE_ID: &str = "Node_ID";
    pub const NODE_NAME: &str = "Node_Name";
    pub const NODE_LEVEL: &str = "Node_Level";
    pub const PARENT_NODE_ID: &str = "Parent_Node_ID";
    pub const DESCRIPTION: &str = "Description";
    pub const IS_LEAF: &str = "Is_Leaf";
    pub const STATUS: &str = "Status";

    pub const APPLICABILITY_ID: &str = "Applicability_ID";
    pub const VALUE_INTENT: &str = "Value_Intent";
    pub const INDUSTRY: &str = "Industry";
    pub const FUNCTION: &str = "Function";
    pub const APPLICABILITY_WEIGHT: &str = "Applicability_Weight";
    pub const MANDATORY_FLAG: &str = "Mandatory_Flag";
    pub const NOTES: &str = "Notes";

    pub const NODE_MASTER_REQUIRED: &[&str] = &[
        NODE_ID,
        NODE_NAME,
        NODE_LEVEL,
        PARENT_NODE_ID,
        DESCRIPTION,
        IS_LEAF,
        STATUS,
    ];

    pub const CONTEXT_APPLICABILITY_REQUIRED: &[&str] = &[
        APPLICABILITY_ID,
        NODE_ID,
        VALUE_INTENT,
        INDUSTRY,
        FUNCTION,
        APPLICABILITY_WEIGHT,
    ];
}

pub const MIN_WEIGHT: i64 = 1;
pub const MAX_WEIGHT: i64 = 5;

/// The four fixed hierarchy levels, root to leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NodeLevel {
    Lever,
    #[serde(rename = "Business_Objective")]
    BusinessObjective,
    #[serde(rename = "Value_Driver")]
    ValueDriver,
    #[serde(rename = "KPI")]
    Kpi,
}

impl NodeLevel {
    pub const ALL: [NodeLevel; 4] = [
        NodeLevel::Lever,
        NodeLevel::BusinessObjective,
        NodeLevel::ValueDriver,
        NodeLevel::Kpi,
    ];

    /// Lever = 0 … KPI = 3.
    pub fn depth(self) -> usize {
        match self {
            NodeLevel::Lever => 0,
            NodeLevel::BusinessObjective => 1,
            NodeLevel::ValueDriver => 2,
            NodeLevel::Kpi => 3,
        }
    }

    /// Parse the literal sheet value (`Lever`, `Business_Objective`, `Value_Driver`, `KPI`).
    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim() {
            "Lever" => Ok(NodeLevel::Lever),
            "Business_Objective" => Ok(NodeLevel::BusinessObjective),
            "Value_Driver" => Ok(NodeLevel::ValueDriver),
            "KPI" => Ok(NodeLevel::Kpi),
            other => Err(DomainError::UnknownLevel(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeLevel::Lever => "Lever",
            NodeLevel::BusinessObjective => "Business_Objective",
            NodeLevel::ValueDriver => "Value_Driver",
            NodeLevel::Kpi => "KPI",
        }
    }

    /// Human label for display.
    pub fn label(self) -> &'static str {
        match self {
            NodeLevel::Lever => "Lever",
            NodeLevel::BusinessObjective => "Business Objective",
            NodeLevel::ValueDriver => "Value Driver",
            NodeLevel::Kpi => "KPI",
        }
    }
}

impl fmt::Display for NodeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a catalog node. Only `Active` nodes are assembled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    Active,
    Deprecated,
    Other(String),
}

impl NodeStatus {
    /// Empty cells count as `Active`.
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(str::trim) {
            None | Some("") | Some("Active") => NodeStatus::Active,
            Some("Deprecated") => NodeStatus::Deprecated,
            Some(other) => NodeStatus::Other(other.to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, NodeStatus::Active)
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeStatus::Active => "Active",
            NodeStatus::Deprecated => "Deprecated",
            NodeStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One entry of the node catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub node_id: String,
    pub node_name: String,
    pub node_level: NodeLevel,
    pub parent_node_id: Option<String>,
    pub description: String,
    /// Informational only; tree shape comes from parent links.
    pub is_leaf: bool,
    pub status: NodeStatus,
}

impl Node {
    /// Build a node from a validated catalog row.
    pub fn from_row(row: &Row<'_>, sheet: &str) -> DomainResult<Self> {
        let node_id = required(row, sheet, columns::NODE_ID)?;
        let node_level = NodeLevel::parse(required(row, sheet, columns::NODE_LEVEL)?)?;
        Ok(Self {
            node_id: node_id.to_string(),
            node_name: row.get(columns::NODE_NAME).unwrap_or_default().to_string(),
            node_level,
            parent_node_id: row.get(columns::PARENT_NODE_ID).map(str::to_string),
            description: row.get(columns::DESCRIPTION).unwrap_or_default().to_string(),
            is_leaf: parse_flag(row.get(columns::IS_LEAF)),
            status: NodeStatus::parse(row.get(columns::STATUS)),
        })
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// One context-specific applicability score for a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicabilityRule {
    pub applicability_id: Option<String>,
    pub node_id: String,
    pub value_intent: Option<String>,
    pub industry: Option<String>,
    pub function: Option<String>,
    /// 1..=5, higher is more applicable.
    pub applicability_weight: u8,
    /// Informational, not consumed by assembly.
    pub mandatory_flag: bool,
    pub notes: String,
}

impl ApplicabilityRule {
    /// Build a rule from a validated applicability row.
    pub fn from_row(row: &Row<'_>, sheet: &str) -> DomainResult<Self> {
        let node_id = required(row, sheet, columns::NODE_ID)?;
        let weight = parse_weight(required(row, sheet, columns::APPLICABILITY_WEIGHT)?)?;
        Ok(Self {
            applicability_id: row.get(columns::APPLICABILITY_ID).map(str::to_string),
            node_id: node_id.to_string(),
            value_intent: row.get(columns::VALUE_INTENT).map(str::to_string),
            industry: row.get(columns::INDUSTRY).map(str::to_string),
            function: row.get(columns::FUNCTION).map(str::to_string),
            applicability_weight: weight,
            mandatory_flag: parse_flag(row.get(columns::MANDATORY_FLAG)),
            notes: row.get(columns::NOTES).unwrap_or_default().to_string(),
        })
    }

    /// Exact, case-sensitive match on all three context fields.
    pub fn matches(&self, context: &BusinessContext) -> bool {
        self.value_intent.as_deref() == Some(context.value_intent.as_str())
            && self.industry.as_deref() == Some(context.industry.as_str())
            && self.function.as_deref() == Some(context.function.as_str())
    }
}

/// The (value intent, industry, function) triple used to filter rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BusinessContext {
    pub value_intent: String,
    pub industry: String,
    pub function: String,
}

impl BusinessContext {
    pub fn new(
        value_intent: impl Into<String>,
        industry: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            value_intent: value_intent.into(),
            industry: industry.into(),
            function: function.into(),
        }
    }
}

impl fmt::Display for BusinessContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.value_intent, self.industry, self.function)
    }
}

fn required<'a>(row: &Row<'a>, sheet: &str, column: &str) -> DomainResult<&'a str> {
    row.get(column).ok_or_else(|| DomainError::MissingCell {
        sheet: sheet.to_string(),
        row: row.sheet_row(),
        column: column.to_string(),
    })
}

/// Parse a weight cell: integral text only (`"4"`, `"4.0"`), range 1..=5.
pub fn parse_weight(s: &str) -> DomainResult<u8> {
    let trimmed = s.trim();
    let value = match trimmed.parse::<i64>() {
        Ok(v) => v,
        Err(_) => match trimmed.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&f) => {
                f as i64
            }
            _ => return Err(DomainError::InvalidWeight(s.to_string())),
        },
    };
    if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&value) {
        return Err(DomainError::WeightOutOfRange(value));
    }
    u8::try_from(value).map_err(|_| DomainError::WeightOutOfRange(value))
}

/// Boolean cells: true/yes/y/1 (any case) are true, everything else false.
pub fn parse_flag(s: Option<&str>) -> bool {
    matches!(
        s.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "yes" | "y" | "1")
    )
}
