//! Density matrix preparation.
//!
//! Turns a raw text matrix of counts into the target gradient image:
//! load, block-sum downsample, summarize, then map each cell through the
//! intensity function.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use super::grid::Grid;
use super::intensity::{intensity, to_byte};
use super::pgm::{read_pgm, write_pgm};
use crate::schema::{GradientConfig, InputKind, PipelineConfig};

/// Errors raised while preparing the target image.
#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid density value {token:?} at position {index}")]
    Parse { index: usize, token: String },

    #[error("Density matrix truncated: expected {expected} values, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("Matrix size {size} is not a multiple of block size {block}")]
    BlockMismatch { size: usize, block: usize },

    #[error("Degenerate image, cannot compute density gradient")]
    DegenerateImage,
}

/// Summary statistics of a compressed density matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensitySummary {
    /// Sum of all cells.
    pub sum: f32,
    /// Largest single-cell share of the total, `max(cell) / sum`.
    pub peak_ratio: f32,
}

/// Read a `side` x `side` matrix of whitespace-separated counts, row-major.
///
/// Tokens past the first `side * side` are ignored.
pub fn read_density_matrix<R: BufRead>(r: R, side: usize) -> Result<Grid<u64>, PrepareError> {
    let expected = side * side;
    let mut data = Vec::with_capacity(expected);

    'lines: for line in r.lines() {
        let line = line?;
        for token in line.split_whitespace() {
            if data.len() == expected {
                break 'lines;
            }
            let value = token.parse::<u64>().map_err(|_| PrepareError::Parse {
                index: data.len(),
                token: token.to_string(),
            })?;
            data.push(value);
        }
    }

    // The loop stops at `expected`, so a length mismatch means too few values.
    let found = data.len();
    Grid::from_vec(side, side, data).ok_or(PrepareError::Truncated { expected, found })
}

/// Load the raw density matrix from a file.
pub fn load_density_matrix<P: AsRef<Path>>(path: P, side: usize) -> Result<Grid<u64>, PrepareError> {
    let path = path.as_ref();
    log::info!("Reading {}x{} density matrix from {}", side, side, path.display());
    let file = File::open(path)?;
    let matrix = read_density_matrix(BufReader::new(file), side)?;
    log::info!("Reading done");
    Ok(matrix)
}

/// Sum non-overlapping `block` x `block` tiles into a smaller matrix.
pub fn downsample(raw: &Grid<u64>, block: usize) -> Result<Grid<u64>, PrepareError> {
    for size in [raw.width, raw.height] {
        if block == 0 || size % block != 0 {
            return Err(PrepareError::BlockMismatch { size, block });
        }
    }

    log::info!("Compressing by {}x{} blocks", block, block);

    let width = raw.width / block;
    let height = raw.height / block;
    let mut compressed = Grid::filled(width, height, 0u64);

    for (y, row) in raw.rows().enumerate() {
        let out_y = y / block;
        for (x, &cell) in row.iter().enumerate() {
            let slot = &mut compressed[(x / block, out_y)];
            *slot = slot.saturating_add(cell);
        }
    }

    log::info!("Compressing done: {}x{}", width, height);
    Ok(compressed)
}

/// Compute the total and peak ratio of a compressed matrix.
pub fn summarize(matrix: &Grid<u64>) -> Result<DensitySummary, PrepareError> {
    let total = matrix
        .as_slice()
        .iter()
        .fold(0u64, |acc, &v| acc.saturating_add(v));
    if total == 0 {
        return Err(PrepareError::DegenerateImage);
    }

    let sum = total as f32;
    let peak_ratio = matrix
        .as_slice()
        .iter()
        .map(|&cell| cell as f32 / sum)
        .fold(0.0f32, f32::max);

    Ok(DensitySummary { sum, peak_ratio })
}

/// Map each cell's share of the total onto a byte intensity.
///
/// The mapped range is `[0, peak_ratio * upper_fraction]`.
pub fn gradient(
    matrix: &Grid<u64>,
    summary: &DensitySummary,
    config: &GradientConfig,
) -> Result<Grid<u8>, PrepareError> {
    let upper = summary.peak_ratio * config.upper_fraction;
    if summary.sum <= 0.0 || !(upper > 0.0) {
        return Err(PrepareError::DegenerateImage);
    }

    Ok(matrix.map(|&cell| {
        let value = cell as f32 / summary.sum;
        to_byte(intensity(value, 0.0, upper, config.saturate_above))
    }))
}

/// The fitness target together with how it was obtained.
#[derive(Debug, Clone)]
pub struct PreparedTarget {
    /// Target gradient image.
    pub image: Grid<u8>,
    /// Summary of the compressed matrix, absent when loaded from a gradient file.
    pub summary: Option<DensitySummary>,
}

/// Run the configured preparation pipeline.
///
/// For raw density input the gradient is also written to
/// `config.gradient_output`.
pub fn prepare_target(config: &PipelineConfig) -> Result<PreparedTarget, PrepareError> {
    match config.input.kind {
        InputKind::RawDensity => {
            let raw = load_density_matrix(&config.input.path, config.input.raw_size)?;
            let compressed = downsample(&raw, config.input.block_size)?;
            drop(raw);

            let summary = summarize(&compressed)?;
            log::info!(
                "Density sum={} peak_ratio={:.6}",
                summary.sum,
                summary.peak_ratio
            );

            let image = gradient(&compressed, &summary, &config.gradient)?;

            log::info!("Writing gradient to {}", config.gradient_output);
            write_pgm(&image, &config.gradient_output)?;
            log::info!("Writing done");

            Ok(PreparedTarget {
                image,
                summary: Some(summary),
            })
        }
        InputKind::Gradient => {
            log::info!("Reading gradient image from {}", config.input.path);
            let image = read_pgm(&config.input.path)?;
            Ok(PreparedTarget {
                image,
                summary: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::InputConfig;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_read_matrix() {
        let text = "1 2\n3\n4 99";
        let grid = read_density_matrix(text.as_bytes(), 2).unwrap();
        assert_eq!(grid.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_read_matrix_truncated() {
        let err = read_density_matrix("1 2 3".as_bytes(), 2).unwrap_err();
        assert!(matches!(
            err,
            PrepareError::Truncated {
                expected: 4,
                found: 3
            }
        ));

        let err = read_density_matrix("".as_bytes(), 3).unwrap_err();
        assert!(matches!(
            err,
            PrepareError::Truncated {
                expected: 9,
                found: 0
            }
        ));
    }

    #[test]
    fn test_read_matrix_non_numeric() {
        let err = read_density_matrix("1 x 3 4".as_bytes(), 2).unwrap_err();
        match err {
            PrepareError::Parse { index, token } => {
                assert_eq!(index, 1);
                assert_eq!(token, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(read_density_matrix("1 -2 3 4".as_bytes(), 2).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_density_matrix(dir.path().join("missing.txt"), 2).unwrap_err();
        assert!(matches!(err, PrepareError::Io(_)));
    }

    #[test]
    fn test_downsample_block_sums() {
        // 4x4 of ones, plus a marker in the bottom-right block
        let mut raw = Grid::filled(4, 4, 1u64);
        raw[(3, 3)] = 10;

        let compressed = downsample(&raw, 2).unwrap();
        assert_eq!(compressed.width, 2);
        assert_eq!(compressed.height, 2);
        assert_eq!(compressed.as_slice(), &[4, 4, 4, 13]);
    }

    #[test]
    fn test_downsample_rejects_mismatch() {
        let raw = Grid::filled(6, 6, 0u64);
        assert!(matches!(
            downsample(&raw, 4),
            Err(PrepareError::BlockMismatch { size: 6, block: 4 })
        ));
        assert!(downsample(&raw, 0).is_err());
    }

    #[test]
    fn test_summarize() {
        let matrix = Grid::from_vec(2, 2, vec![1, 1, 2, 4]).unwrap();
        let summary = summarize(&matrix).unwrap();
        assert_eq!(summary.sum, 8.0);
        assert!((summary.peak_ratio - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_summarize_degenerate() {
        let matrix = Grid::filled(3, 3, 0u64);
        assert!(matches!(
            summarize(&matrix),
            Err(PrepareError::DegenerateImage)
        ));
    }

    #[test]
    fn test_gradient_saturates_above_range() {
        let matrix = Grid::from_vec(2, 2, vec![0, 10, 20, 1000]).unwrap();
        let summary = summarize(&matrix).unwrap();
        let config = GradientConfig {
            upper_fraction: 0.008,
            saturate_above: true,
        };

        let image = gradient(&matrix, &summary, &config).unwrap();
        // Anything above 0.8% of the peak share is fully bright.
        assert_eq!(image.as_slice(), &[0, 255, 255, 255]);

        let full_range = GradientConfig {
            upper_fraction: 1.0,
            saturate_above: true,
        };
        let image = gradient(&matrix, &summary, &full_range).unwrap();
        assert_eq!(image[(0, 0)], 0);
        assert_eq!(image[(1, 1)], 255);
        // Shares of 1% and 2% of the peak, truncated
        assert_eq!(image[(1, 0)], 2);
        assert_eq!(image[(0, 1)], 5);
    }

    #[test]
    fn test_gradient_degenerate_summary() {
        let matrix = Grid::filled(2, 2, 0u64);
        let summary = DensitySummary {
            sum: 0.0,
            peak_ratio: 0.0,
        };
        assert!(matches!(
            gradient(&matrix, &summary, &GradientConfig::default()),
            Err(PrepareError::DegenerateImage)
        ));
    }

    #[test]
    fn test_prepare_target_pipeline() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("density.txt");
        let output = dir.path().join("image.ppm");

        // 4x4 raw matrix, 2x2 blocks
        let values: Vec<String> = (0..16).map(|i| (i % 3).to_string()).collect();
        fs::write(&input, values.join(" ")).unwrap();

        let config = PipelineConfig {
            input: InputConfig {
                path: input.to_string_lossy().into_owned(),
                raw_size: 4,
                block_size: 2,
                kind: InputKind::RawDensity,
            },
            gradient: GradientConfig {
                upper_fraction: 1.0,
                saturate_above: true,
            },
            gradient_output: output.to_string_lossy().into_owned(),
            ..Default::default()
        };

        let prepared = prepare_target(&config).unwrap();
        assert_eq!(prepared.image.width, 2);
        assert!(prepared.summary.is_some());

        let written = read_pgm(&output).unwrap();
        assert_eq!(written, prepared.image);

        // The written gradient can be reloaded as the target directly.
        let reload = PipelineConfig {
            input: InputConfig {
                path: output.to_string_lossy().into_owned(),
                kind: InputKind::Gradient,
                ..config.input.clone()
            },
            ..config
        };
        let reloaded = prepare_target(&reload).unwrap();
        assert_eq!(reloaded.image, prepared.image);
        assert!(reloaded.summary.is_none());
    }
}
