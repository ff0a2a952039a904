//! valtree: assemble value trees (Lever, Business Objective, Value Driver, KPI)
//! from a node catalog and context-conditioned applicability rules.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
