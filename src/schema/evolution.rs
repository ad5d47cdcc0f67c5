//! Evolution configuration and result types for the operator-string search.
//!
//! A genome is a fixed-length string over the four arithmetic symbols
//! `+ - * /`. It decodes to an integer function of pixel coordinates, and the
//! search looks for the genome whose decoded image is closest to the target.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the evolutionary search.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionConfig {
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Genome shape and mutation settings.
    #[serde(default)]
    pub genome: GenomeConfig,
    /// Where per-generation best results are written.
    #[serde(default)]
    pub archive: ArchiveConfig,
    /// Random seed for reproducibility. `None` seeds from entropy once.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

/// Population and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals in the population. Must be even.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Maximum number of generations.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    /// Stop once the best score is at or below this error.
    #[serde(default)]
    pub target_score: Option<u64>,
    /// Stagnation limit: stop if no improvement for N generations.
    #[serde(default)]
    pub stagnation_limit: Option<usize>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: default_max_generations(),
            target_score: None,
            stagnation_limit: None,
        }
    }
}

fn default_population_size() -> usize {
    30
}
fn default_max_generations() -> usize {
    1
}

/// Genome shape and mutation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenomeConfig {
    /// Number of symbols in every genome.
    #[serde(default = "default_genome_length")]
    pub length: usize,
    /// Number of leading symbols overwritten by mutation.
    #[serde(default = "default_mutate_prefix")]
    pub mutate_prefix: usize,
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            length: default_genome_length(),
            mutate_prefix: default_mutate_prefix(),
        }
    }
}

fn default_genome_length() -> usize {
    32
}
fn default_mutate_prefix() -> usize {
    3
}

/// Output settings for best-result files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Directory receiving `best_<score>` files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Write every generation's best, not just the final one.
    #[serde(default = "default_save_every_generation")]
    pub save_every_generation: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            save_every_generation: default_save_every_generation(),
        }
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}
fn default_save_every_generation() -> bool {
    true
}

// ============================================================================
// Genome Representation
// ============================================================================

/// One symbol of a genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl Operator {
    /// All operators in table order.
    pub const ALL: [Operator; 4] = [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div];

    /// Position of this operator in `ALL`.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Printable symbol.
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
        }
    }

    /// Parse a single symbol.
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Ordered operator sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Genome {
    ops: Vec<Operator>,
}

impl Genome {
    pub fn new(ops: Vec<Operator>) -> Self {
        Self { ops }
    }

    /// Genome of `len` copies of one operator.
    pub fn uniform(op: Operator, len: usize) -> Self {
        Self { ops: vec![op; len] }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[Operator] {
        &self.ops
    }

    pub fn ops_mut(&mut self) -> &mut [Operator] {
        &mut self.ops
    }

    pub fn iter(&self) -> impl Iterator<Item = Operator> + '_ {
        self.ops.iter().copied()
    }
}

impl FromIterator<Operator> for Genome {
    fn from_iter<I: IntoIterator<Item = Operator>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            write!(f, "{}", op.symbol())?;
        }
        Ok(())
    }
}

/// Error parsing a genome string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid genome symbol {symbol:?} at position {position}")]
pub struct GenomeParseError {
    pub symbol: char,
    pub position: usize,
}

impl FromStr for Genome {
    type Err = GenomeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .enumerate()
            .map(|(position, symbol)| {
                Operator::from_symbol(symbol).ok_or(GenomeParseError { symbol, position })
            })
            .collect()
    }
}

impl Serialize for Genome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Genome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let repr = String::deserialize(deserializer)?;
        repr.parse().map_err(serde::de::Error::custom)
    }
}

/// A genome paired with its summed absolute pixel error. Lower is fitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScoredGenome {
    pub score: u64,
    pub genome: Genome,
}

// ============================================================================
// Progress and Result Types
// ============================================================================

/// Outcome of one rank/select/reproduce cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Generation number this cycle ranked (0 for the initial population).
    pub generation: usize,
    /// Fittest individual of the ranked population.
    pub best: ScoredGenome,
    /// Mean score of the ranked population.
    pub mean_score: f64,
    /// Worst score of the ranked population.
    pub worst_score: u64,
}

/// Progress update passed to run callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Report of the cycle that just finished.
    pub report: GenerationReport,
    /// Total generations planned.
    pub total_generations: usize,
    /// Best score seen so far.
    pub best_score: u64,
    /// Generations since last improvement.
    pub stagnation_count: usize,
}

/// Evolution history for plotting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionHistory {
    /// Best score per generation.
    pub best_score: Vec<u64>,
    /// Mean score per generation.
    pub mean_score: Vec<f64>,
}

/// Final result of an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Best individual found.
    pub best: ScoredGenome,
    /// Statistics from the run.
    pub stats: EvolutionStats,
    /// Full history for analysis.
    pub history: EvolutionHistory,
}

/// Statistics from an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Total generations run.
    pub generations: usize,
    /// Total genome evaluations performed.
    pub total_evaluations: u64,
    /// Best score achieved.
    pub best_score: u64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Evaluations per second.
    pub evaluations_per_second: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason evolution stopped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached maximum generations.
    MaxGenerations,
    /// Reached target score.
    TargetReached,
    /// Stagnation limit hit.
    Stagnation,
    /// User cancelled.
    Cancelled,
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionConfigError {
    #[error("Population size must be at least 2")]
    PopulationTooSmall,
    #[error("Population size must be even, got {0}")]
    OddPopulation(usize),
    #[error("Genome length must be non-zero")]
    EmptyGenome,
    #[error("Mutation prefix {prefix} exceeds genome length {length}")]
    MutatePrefixTooLong { prefix: usize, length: usize },
    #[error("Population has {found} genomes, expected {expected}")]
    PopulationSizeMismatch { expected: usize, found: usize },
    #[error("Genome {index} has length {found}, expected {expected}")]
    GenomeLengthMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
}

impl EvolutionConfig {
    /// Validate evolution configuration.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        if self.population.size < 2 {
            return Err(EvolutionConfigError::PopulationTooSmall);
        }
        if self.population.size % 2 != 0 {
            return Err(EvolutionConfigError::OddPopulation(self.population.size));
        }
        if self.genome.length == 0 {
            return Err(EvolutionConfigError::EmptyGenome);
        }
        if self.genome.mutate_prefix > self.genome.length {
            return Err(EvolutionConfigError::MutatePrefixTooLong {
                prefix: self.genome.mutate_prefix,
                length: self.genome.length,
            });
        }
        Ok(())
    }
}
