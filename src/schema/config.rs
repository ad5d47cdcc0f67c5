//! Configuration types for the preparation pipeline and a full run.

use serde::{Deserialize, Serialize};

use super::{EvolutionConfig, EvolutionConfigError};

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Where the target comes from.
    #[serde(default)]
    pub input: InputConfig,
    /// Density-to-intensity mapping.
    #[serde(default)]
    pub gradient: GradientConfig,
    /// File the prepared gradient image is written to.
    #[serde(default = "default_gradient_output")]
    pub gradient_output: String,
    /// Search settings.
    #[serde(default)]
    pub evolution: EvolutionConfig,
}

fn default_gradient_output() -> String {
    "image.ppm".to_string()
}

/// Kind of input file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum InputKind {
    /// Raw text density matrix; runs the full preparation pipeline.
    #[default]
    RawDensity,
    /// Previously written `P2` gradient image, used as the target directly.
    Gradient,
}

/// Input file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path of the input file.
    #[serde(default = "default_input_path")]
    pub path: String,
    /// Side length of the raw density matrix.
    #[serde(default = "default_raw_size")]
    pub raw_size: usize,
    /// Side length of the square blocks summed during downsampling.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    #[serde(default)]
    pub kind: InputKind,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            raw_size: default_raw_size(),
            block_size: default_block_size(),
            kind: InputKind::default(),
        }
    }
}

fn default_input_path() -> String {
    "anti_histogram.txt".to_string()
}
fn default_raw_size() -> usize {
    4096
}
fn default_block_size() -> usize {
    8
}

impl InputConfig {
    /// Side length of the compressed matrix.
    #[inline]
    pub fn compressed_size(&self) -> usize {
        self.raw_size / self.block_size.max(1)
    }
}

/// Intensity mapping used to build the target gradient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientConfig {
    /// Upper bound of the mapped range as a fraction of the peak ratio.
    #[serde(default = "default_upper_fraction")]
    pub upper_fraction: f32,
    /// Whether values above the range map to full brightness.
    #[serde(default = "default_saturate_above")]
    pub saturate_above: bool,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            upper_fraction: default_upper_fraction(),
            saturate_above: default_saturate_above(),
        }
    }
}

fn default_upper_fraction() -> f32 {
    0.008
}
fn default_saturate_above() -> bool {
    true
}

impl PipelineConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.kind == InputKind::RawDensity {
            if self.input.raw_size == 0 || self.input.block_size == 0 {
                return Err(ConfigError::InvalidDimensions);
            }
            if self.input.raw_size % self.input.block_size != 0 {
                return Err(ConfigError::BlockMismatch {
                    size: self.input.raw_size,
                    block: self.input.block_size,
                });
            }
        }
        if !(self.gradient.upper_fraction > 0.0) {
            return Err(ConfigError::InvalidUpperFraction(
                self.gradient.upper_fraction,
            ));
        }
        self.evolution.validate()?;
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Raw size and block size must be non-zero")]
    InvalidDimensions,
    #[error("Raw size {size} is not a multiple of block size {block}")]
    BlockMismatch { size: usize, block: usize },
    #[error("Gradient upper fraction must be positive, got {0}")]
    InvalidUpperFraction(f32),
    #[error("Evolution config validation failed: {0}")]
    Evolution(#[from] EvolutionConfigError),
}
