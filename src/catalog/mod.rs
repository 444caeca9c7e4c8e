//! Step catalog for pipeline operations
//!
//! Resolves an operation's declared step list from its `pipeline.parset`,
//! keeping only the steps that represent visible progress.

pub mod parset;
pub mod steps;

pub use parset::Parset;
pub use steps::{StepCatalog, StepKind};
