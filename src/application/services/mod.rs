//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the `WorkbookSource` boundary trait but are
//! themselves concrete structs, not traits.

mod assembler;
mod loader;
mod snapshot;

pub use assembler::Assembler;
pub use loader::DataLoader;
pub use snapshot::{LoadStatus, SnapshotStore};
