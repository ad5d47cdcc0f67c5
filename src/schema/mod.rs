//! Schema module - Configuration, genome and result types for a search run.

mod config;
mod evolution;

pub use config::*;
pub use evolution::*;
