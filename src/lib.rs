//! Density gradient approximation by evolving arithmetic operator strings.
//!
//! A raster of counts is block-summed into a smaller matrix and mapped to an
//! 8-bit brightness gradient. A small genetic search then evolves strings
//! over `+ - * /` whose decoded value at each pixel `(x, y)` approximates
//! that gradient.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, genome and result types
//! - `compute`: Image preparation, fitness scoring and the search itself
//!
//! # Example
//!
//! ```rust,no_run
//! use density_gp::{
//!     compute::{evolution::EvolutionEngine, prepare_target},
//!     schema::PipelineConfig,
//! };
//!
//! let config = PipelineConfig::default();
//! let target = prepare_target(&config).unwrap();
//!
//! let mut engine = EvolutionEngine::new(config.evolution, target.image).unwrap();
//! let result = engine.run();
//!
//! println!("Best genome {} scores {}", result.best.genome, result.best.score);
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{EvolutionEngine, FitnessEvaluator, ResultArchive};
pub use compute::{Grid, PrepareError, prepare_target};
pub use schema::{EvolutionConfig, Genome, Operator, PipelineConfig, ScoredGenome};
