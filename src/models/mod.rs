//! Data models for the offline sync engine.
//!
//! Catalog snapshots, persisted settings and the read-only views exposed to
//! the presentation layer.

mod course;
mod settings;
mod storage;
mod tree;

pub use course::*;
pub use settings::*;
pub use storage::*;
pub use tree::*;
