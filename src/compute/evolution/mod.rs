//! Evolutionary search for operator strings that approximate an image.
//!
//! # Overview
//!
//! - **Genome Operations** (`genome`): decoding, the mating table, random
//!   generation and prefix mutation
//! - **Fitness** (`fitness`): summed absolute pixel error and visualization
//! - **Search** (`search`): rank, truncation selection and reproduction
//! - **Result Archive** (`archive`): per-generation best images on disk
//!
//! # Example
//!
//! ```rust,no_run
//! use density_gp::compute::Grid;
//! use density_gp::compute::evolution::EvolutionEngine;
//! use density_gp::schema::EvolutionConfig;
//!
//! let target = Grid::filled(512, 512, 128u8);
//! let mut engine = EvolutionEngine::new(EvolutionConfig::default(), target).unwrap();
//!
//! let report = engine.cycle();
//! println!("Generation {}: best {} ({})",
//!     report.generation, report.best.score, report.best.genome);
//! ```

mod archive;
mod fitness;
mod genome;
mod search;

pub use archive::{ArchivedResult, ResultArchive, ResultExport, load_result};
pub use fitness::{FitnessEvaluator, render, score, visualize};
pub use genome::{GenomeRng, MATE_TABLE, SATURATION, decode, mate, mate_operator};
pub use search::EvolutionEngine;
