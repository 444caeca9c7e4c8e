//! checkfactor - progress checker for Factor directions
//!
//! Factor writes its progress as files: a saved state per direction, a
//! statefile per operation run, parsets, mapfiles and logs. This crate reads
//! those artifacts and reports where each direction stands, without any
//! channel to the running pipeline.

pub mod artifact;
pub mod catalog;
pub mod daemon;
pub mod direction;
pub mod error;
pub mod gate;
pub mod products;
pub mod status;
pub mod tracker;

pub use error::{CheckError, Result};
