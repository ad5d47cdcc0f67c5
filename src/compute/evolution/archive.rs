//! Best-result archive: visualization images and metadata on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::compute::Grid;
use crate::compute::pgm::write_pgm;
use crate::schema::{ArchiveConfig, GenerationReport, Genome};

/// Writes each reported best individual as `best_<score>.pgm` plus a JSON
/// sidecar.
#[derive(Debug)]
pub struct ResultArchive {
    output_dir: PathBuf,
    saved: Vec<ArchivedResult>,
}

/// A result that has been written to disk.
#[derive(Debug, Clone)]
pub struct ArchivedResult {
    /// Generation the result was ranked in.
    pub generation: usize,
    /// Fitness score.
    pub score: u64,
    /// Visualization image path.
    pub image_path: PathBuf,
    /// Metadata path.
    pub metadata_path: PathBuf,
}

/// Exported result metadata.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResultExport {
    pub generation: usize,
    pub score: u64,
    pub genome: Genome,
    pub mean_score: f64,
    /// Visualization width.
    pub width: usize,
    /// Visualization height.
    pub height: usize,
}

impl ResultArchive {
    /// Create an archive writing into `dir`, creating it if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let output_dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            saved: Vec::new(),
        })
    }

    /// Create from configuration.
    pub fn from_config(config: &ArchiveConfig) -> io::Result<Self> {
        Self::new(&config.output_dir)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write a generation's best individual and its visualization.
    ///
    /// A later result with the same score replaces the earlier files.
    pub fn save(&mut self, report: &GenerationReport, image: &Grid<u8>) -> io::Result<ArchivedResult> {
        let stem = format!("best_{}", report.best.score);
        let image_path = self.output_dir.join(format!("{stem}.pgm"));
        let metadata_path = self.output_dir.join(format!("{stem}.json"));

        write_pgm(image, &image_path)?;

        let export = ResultExport {
            generation: report.generation,
            score: report.best.score,
            genome: report.best.genome.clone(),
            mean_score: report.mean_score,
            width: image.width,
            height: image.height,
        };
        let json = serde_json::to_string_pretty(&export)?;
        fs::write(&metadata_path, json)?;

        log::info!(
            "Saved generation {} best (score {}) to {}",
            report.generation,
            report.best.score,
            image_path.display()
        );

        let result = ArchivedResult {
            generation: report.generation,
            score: report.best.score,
            image_path,
            metadata_path,
        };
        self.saved.retain(|r| r.score != result.score);
        self.saved.push(result.clone());
        Ok(result)
    }

    /// All results written so far.
    pub fn saved(&self) -> &[ArchivedResult] {
        &self.saved
    }

    /// Lowest-scoring saved result.
    pub fn best(&self) -> Option<&ArchivedResult> {
        self.saved.iter().min_by_key(|r| r.score)
    }

    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }
}

/// Load result metadata from file.
pub fn load_result<P: AsRef<Path>>(path: P) -> io::Result<ResultExport> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
