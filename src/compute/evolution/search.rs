//! Truncation-selection search over operator genomes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::compute::Grid;
use crate::schema::{
    EvolutionConfig, EvolutionConfigError, EvolutionHistory, EvolutionProgress, EvolutionResult,
    EvolutionStats, GenerationReport, Genome, ScoredGenome, StopReason,
};

use super::fitness::FitnessEvaluator;
use super::genome::{GenomeRng, mate};

/// Evolution engine that runs the search.
///
/// Each [`cycle`](Self::cycle) ranks the population, keeps the better half
/// unchanged, and refills the other half with mutated children of adjacent
/// ranked pairs.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    rng: GenomeRng,
    evaluator: FitnessEvaluator,
    population: Vec<Genome>,
    history: EvolutionHistory,
    generation: usize,
    best: Option<ScoredGenome>,
    stagnation_count: usize,
    evaluations: u64,
    cancelled: Arc<AtomicBool>,
}

impl EvolutionEngine {
    /// Create a new evolution engine scoring against `target`.
    pub fn new(config: EvolutionConfig, target: Grid<u8>) -> Result<Self, EvolutionConfigError> {
        config.validate()?;

        let seed = config.random_seed.unwrap_or_else(rand::random);
        log::debug!("Evolution seed: {}", seed);

        Ok(Self {
            config,
            rng: GenomeRng::new(seed),
            evaluator: FitnessEvaluator::new(target),
            population: Vec::new(),
            history: EvolutionHistory::default(),
            generation: 0,
            best: None,
            stagnation_count: 0,
            evaluations: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start from an explicit population instead of random genomes.
    ///
    /// The population must match the configured size and every genome the
    /// configured length.
    pub fn with_population(mut self, population: Vec<Genome>) -> Result<Self, EvolutionConfigError> {
        let expected = self.config.population.size;
        if population.len() != expected {
            return Err(EvolutionConfigError::PopulationSizeMismatch {
                expected,
                found: population.len(),
            });
        }

        let length = self.config.genome.length;
        if let Some((index, genome)) = population
            .iter()
            .enumerate()
            .find(|(_, g)| g.len() != length)
        {
            return Err(EvolutionConfigError::GenomeLengthMismatch {
                index,
                expected: length,
                found: genome.len(),
            });
        }

        self.population = population;
        Ok(self)
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Fill the population with random genomes.
    pub fn initialize(&mut self) {
        let length = self.config.genome.length;
        self.population = (0..self.config.population.size)
            .map(|_| self.rng.random_genome(length))
            .collect();
        self.generation = 0;
    }

    /// Current population, in the order the last cycle produced it.
    pub fn population(&self) -> &[Genome] {
        &self.population
    }

    /// Number of completed cycles.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Best individual seen so far, if any cycle has run.
    pub fn best(&self) -> Option<&ScoredGenome> {
        self.best.as_ref()
    }

    pub fn evaluator(&self) -> &FitnessEvaluator {
        &self.evaluator
    }

    /// Score every genome and sort ascending by score.
    ///
    /// The sort is stable, so equal scores keep population order.
    pub fn rank(&mut self) -> Vec<ScoredGenome> {
        let evaluator = &self.evaluator;
        let mut ranked: Vec<ScoredGenome> = self
            .population
            .par_iter()
            .map(|genome| ScoredGenome {
                score: evaluator.evaluate(genome),
                genome: genome.clone(),
            })
            .collect();

        ranked.sort_by_key(|s| s.score);
        self.evaluations += ranked.len() as u64;
        ranked
    }

    /// Run one rank, select and reproduce pass.
    ///
    /// Initializes the population first if it is empty.
    pub fn cycle(&mut self) -> GenerationReport {
        if self.population.is_empty() {
            self.initialize();
        }

        let ranked = self.rank();
        let size = ranked.len();
        let elite = size / 2;
        let prefix = self.config.genome.mutate_prefix;

        let mut next_gen: Vec<Genome> = Vec::with_capacity(size);
        next_gen.extend(ranked[..elite].iter().map(|s| s.genome.clone()));

        for i in 0..size - elite {
            let partner = (i + 1).min(size - 1);
            let mut child = mate(&ranked[i].genome, &ranked[partner].genome);
            self.rng.mutate(&mut child, prefix);
            next_gen.push(child);
        }

        let mean_score = ranked.iter().map(|s| s.score as f64).sum::<f64>() / size as f64;
        let worst_score = ranked.last().map(|s| s.score).unwrap_or(0);
        let best = ranked.into_iter().next().unwrap_or_default();

        self.population = next_gen;
        self.record(&best, mean_score);

        let report = GenerationReport {
            generation: self.generation,
            best,
            mean_score,
            worst_score,
        };
        self.generation += 1;

        log::debug!(
            "Generation {}: best={} mean={:.1} worst={} genome={}",
            report.generation,
            report.best.score,
            report.mean_score,
            report.worst_score,
            report.best.genome
        );

        report
    }

    /// Track best score, stagnation and history.
    fn record(&mut self, gen_best: &ScoredGenome, mean_score: f64) {
        let improved = self
            .best
            .as_ref()
            .is_none_or(|best| gen_best.score < best.score);
        if improved {
            self.best = Some(gen_best.clone());
            self.stagnation_count = 0;
        } else {
            self.stagnation_count += 1;
        }

        self.history.best_score.push(gen_best.score);
        self.history.mean_score.push(mean_score);
    }

    /// Render a genome at the target's resolution.
    pub fn visualize(&self, genome: &Genome) -> Grid<u8> {
        self.evaluator.visualize(genome)
    }

    fn progress(&self, report: GenerationReport) -> EvolutionProgress {
        EvolutionProgress {
            best_score: self
                .best
                .as_ref()
                .map_or(report.best.score, |b| b.score),
            report,
            total_generations: self.config.population.max_generations,
            stagnation_count: self.stagnation_count,
        }
    }

    /// Check if evolution should stop.
    fn should_stop(&self) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if let (Some(target), Some(best)) = (self.config.population.target_score, &self.best)
            && best.score <= target
        {
            return Some(StopReason::TargetReached);
        }

        if self.generation >= self.config.population.max_generations {
            return Some(StopReason::MaxGenerations);
        }

        if let Some(limit) = self.config.population.stagnation_limit
            && self.stagnation_count >= limit
        {
            return Some(StopReason::Stagnation);
        }

        None
    }

    /// Run cycles until a stop condition holds, reporting after each one.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> EvolutionResult
    where
        F: FnMut(&EvolutionProgress),
    {
        let start_time = Instant::now();
        let start_generation = self.generation;

        if self.population.is_empty() {
            self.initialize();
        }

        let stop_reason = loop {
            if let Some(reason) = self.should_stop() {
                break reason;
            }

            let report = self.cycle();
            callback(&self.progress(report));
        };

        // No cycle ran: rank once so the result still names a best genome.
        let best = match &self.best {
            Some(best) => best.clone(),
            None => self.rank().into_iter().next().unwrap_or_default(),
        };

        let elapsed = start_time.elapsed().as_secs_f64();

        EvolutionResult {
            stats: EvolutionStats {
                generations: self.generation - start_generation,
                total_evaluations: self.evaluations,
                best_score: best.score,
                elapsed_seconds: elapsed,
                evaluations_per_second: if elapsed > 0.0 {
                    self.evaluations as f64 / elapsed
                } else {
                    0.0
                },
                stop_reason,
            },
            best,
            history: self.history.clone(),
        }
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> EvolutionResult {
        self.run_with_callback(|_| {})
    }
}
