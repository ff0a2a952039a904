//! Domain layer: entities, validation and tree assembly types
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod catalog;
pub mod entities;
pub mod error;
pub mod table;
pub mod tree;
pub mod validator;

pub use catalog::Catalog;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use table::{Row, Table, Workbook};
pub use tree::{AssemblyContext, TreeNodeConvert, TreeStatistics, ValueTree, ValueTreeNode};
pub use validator::{validate_workbook, SheetNames, ValidationReport};
