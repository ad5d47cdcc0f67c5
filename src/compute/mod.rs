//! Compute module - Image preparation and evolutionary search.

mod density;
mod grid;
mod intensity;

pub mod evolution;
pub mod pgm;

pub use density::*;
pub use grid::*;
pub use intensity::*;
