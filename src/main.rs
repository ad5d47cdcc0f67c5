//! Density gradient search CLI - Prepare the target and evolve genomes.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use density_gp::{
    compute::{
        evolution::{EvolutionEngine, ResultArchive, visualize},
        prepare_target,
    },
    schema::{GenerationReport, PipelineConfig},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.get(1).is_some_and(|a| a == "--example") {
        print_example_config();
        return;
    }

    if args.get(1).is_some_and(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: {} [config.json] [generations]", args[0]);
        eprintln!();
        eprintln!("Prepare the density gradient and evolve operator strings against it.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to run configuration (default: built-in defaults)");
        eprintln!("  generations  Number of generations (default: from config)");
        eprintln!();
        eprintln!("Example configuration is printed with the --example flag.");
        std::process::exit(1);
    }

    // Load configuration
    let mut config: PipelineConfig = match args.get(1) {
        Some(path) => {
            let config_path = PathBuf::from(path);
            let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
                eprintln!("Error reading config file: {}", e);
                std::process::exit(1);
            });
            serde_json::from_str(&config_str).unwrap_or_else(|e| {
                eprintln!("Error parsing config: {}", e);
                std::process::exit(1);
            })
        }
        None => PipelineConfig::default(),
    };

    if let Some(arg) = args.get(2) {
        config.evolution.population.max_generations = arg.parse().unwrap_or_else(|e| {
            eprintln!("Invalid generation count {:?}: {}", arg, e);
            std::process::exit(1);
        });
    }

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    println!("Density Gradient Search");
    println!("=======================");
    println!("Input: {} ({:?})", config.input.path, config.input.kind);
    println!(
        "Population: {} genomes of length {}",
        config.evolution.population.size, config.evolution.genome.length
    );
    println!("Generations: {}", config.evolution.population.max_generations);
    println!();

    // Prepare target
    let start = Instant::now();
    let target = prepare_target(&config).unwrap_or_else(|e| {
        eprintln!("Error preparing target: {}", e);
        std::process::exit(1);
    });
    let (width, height) = (target.image.width, target.image.height);

    println!("Target: {}x{}", width, height);
    if let Some(summary) = target.summary {
        println!("  Density sum: {}", summary.sum);
        println!("  Peak ratio: {:.6}", summary.peak_ratio);
    }
    println!("  Prepared in {:.2}s", start.elapsed().as_secs_f32());
    println!();

    let mut archive = ResultArchive::from_config(&config.evolution.archive).unwrap_or_else(|e| {
        eprintln!("Error creating output directory: {}", e);
        std::process::exit(1);
    });
    let save_every_generation = config.evolution.archive.save_every_generation;

    let mut engine = EvolutionEngine::new(config.evolution, target.image).unwrap_or_else(|e| {
        eprintln!("Invalid evolution config: {}", e);
        std::process::exit(1);
    });

    // Run evolution
    println!("Running evolution...");
    let mut best_report: Option<GenerationReport> = None;
    let result = engine.run_with_callback(|progress| {
        let report = &progress.report;
        println!(
            "  Generation {}/{}: best={} mean={:.1} genome={}",
            report.generation + 1,
            progress.total_generations,
            report.best.score,
            report.mean_score,
            report.best.genome
        );

        if save_every_generation {
            let image = visualize(&report.best.genome, width, height);
            if let Err(e) = archive.save(report, &image) {
                eprintln!("Error saving result: {}", e);
            }
        }
        if best_report
            .as_ref()
            .is_none_or(|best| report.best.score < best.best.score)
        {
            best_report = Some(report.clone());
        }
    });

    // The overall best is always written, even when per-generation saving is off.
    if !save_every_generation && let Some(report) = &best_report {
        let image = engine.visualize(&report.best.genome);
        if let Err(e) = archive.save(report, &image) {
            eprintln!("Error saving result: {}", e);
            std::process::exit(1);
        }
    }

    println!();
    println!("Final result:");
    println!("  Best score: {}", result.best.score);
    println!("  Best genome: {}", result.best.genome);
    println!("  Stop reason: {:?}", result.stats.stop_reason);
    println!(
        "  Time: {:.2}s ({} evaluations, {:.1} evals/s)",
        result.stats.elapsed_seconds,
        result.stats.total_evaluations,
        result.stats.evaluations_per_second
    );
    if let Some(best) = archive.best() {
        println!("  Saved: {}", best.image_path.display());
    }
}

fn print_example_config() {
    let config = PipelineConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            std::process::exit(1);
        }
    }
}
