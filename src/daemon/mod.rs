//! Poll loop - periodic re-evaluation of every direction
//!
//! The watcher re-reads all artifacts each cycle and publishes a snapshot:
//! - once at startup
//! - on every interval tick
//! - whenever a refresh is requested through the handle

pub mod poll;
pub mod tick;

pub use poll::*;
pub use tick::*;
