//! Fitness scoring of genomes against the target gradient image.

use crate::compute::Grid;
use crate::schema::Genome;

use super::genome::decode;

/// Summed absolute error between a genome's decoded image and `target`.
///
/// Pixel `(x, y)` is compared against `target[(x, y)]`, where `x` is the
/// column and `y` the row. Zero means an exact reproduction.
pub fn score(genome: &Genome, target: &Grid<u8>) -> u64 {
    let mut total = 0u64;
    for (y, row) in target.rows().enumerate() {
        for (x, &expected) in row.iter().enumerate() {
            let value = decode(x as u32, y as u32, genome);
            total = total.saturating_add((value - i64::from(expected)).unsigned_abs());
        }
    }
    total
}

/// Decode a genome at every pixel of a `width` x `height` grid.
pub fn render(genome: &Genome, width: usize, height: usize) -> Grid<i64> {
    Grid::from_fn(width, height, |x, y| decode(x as u32, y as u32, genome))
}

/// Render a genome as a grayscale image normalized to its own maximum.
///
/// Each pixel is `value / max * 255`, truncated. An image whose maximum is
/// 0 comes back all black.
pub fn visualize(genome: &Genome, width: usize, height: usize) -> Grid<u8> {
    let values = render(genome, width, height);
    let max = values.as_slice().iter().copied().max().unwrap_or(0);

    if max <= 0 {
        log::warn!("Genome {} decodes to all zeros; visualization is blank", genome);
        return Grid::filled(width, height, 0);
    }

    let max = max as f64;
    values.map(|&v| (v as f64 / max * 255.0) as u8)
}

/// Scores genomes against a fixed target image.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    target: Grid<u8>,
}

impl FitnessEvaluator {
    /// Create a new fitness evaluator.
    pub fn new(target: Grid<u8>) -> Self {
        Self { target }
    }

    /// The image genomes are scored against.
    pub fn target(&self) -> &Grid<u8> {
        &self.target
    }

    /// Score a genome. Lower is better.
    pub fn evaluate(&self, genome: &Genome) -> u64 {
        score(genome, &self.target)
    }

    /// Visualization at the target's resolution.
    pub fn visualize(&self, genome: &Genome) -> Grid<u8> {
        visualize(genome, self.target.width, self.target.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Operator;
    use proptest::prelude::*;

    fn genome(s: &str) -> Genome {
        s.parse().unwrap()
    }

    #[test]
    fn test_constant_target_closed_form() {
        const SIZE: usize = 512;
        let target = Grid::filled(SIZE, SIZE, 128u8);

        // "+++" decodes to 2x + 2y.
        let actual = score(&genome("+++"), &target);

        // Pixels with x + y = s number s + 1 below the anti-diagonal and
        // 2 * SIZE - 1 - s from it onward.
        let expected: u64 = (0..2 * SIZE - 1)
            .map(|s| {
                let count = if s < SIZE { s + 1 } else { 2 * SIZE - 1 - s };
                count as u64 * (2 * s as i64 - 128).unsigned_abs()
            })
            .sum();

        assert_eq!(expected, 234_539_776);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_exact_reproduction_scores_zero() {
        // "+" decodes to x + y; build the target from it directly.
        let target = Grid::from_fn(16, 16, |x, y| (x + y) as u8);
        assert_eq!(score(&genome("+"), &target), 0);
        assert!(score(&genome("-"), &target) > 0);
    }

    #[test]
    fn test_coordinate_orientation() {
        // "-" decodes to x - y clamped at 0: only the column drives it above y.
        let mut target = Grid::filled(3, 2, 0u8);
        target[(2, 0)] = 2;
        target[(1, 0)] = 1;
        target[(2, 1)] = 1;
        assert_eq!(score(&genome("-"), &target), 0);
    }

    #[test]
    fn test_visualize_normalizes_to_max() {
        // x + y on a 2x2 grid: 0, 1, 1, 2
        let image = visualize(&genome("+"), 2, 2);
        assert_eq!(image.as_slice(), &[0, 127, 127, 255]);
    }

    #[test]
    fn test_visualize_all_zero() {
        // x - y clamped, then minus x: always 0
        let image = visualize(&genome("--"), 4, 4);
        assert!(image.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_evaluator_matches_free_function() {
        let target = Grid::from_fn(8, 8, |x, y| (x * y) as u8);
        let evaluator = FitnessEvaluator::new(target.clone());
        let g = genome("*+-/");
        assert_eq!(evaluator.evaluate(&g), score(&g, &target));
        assert_eq!(evaluator.visualize(&g).width, 8);
    }

    proptest! {
        #[test]
        fn prop_score_zero_iff_exact(
            // Division by a zero coordinate saturates, so keep to + - *
            ops in prop::collection::vec(0usize..3, 0..8),
            noise in 0u8..=255,
        ) {
            let g: Genome = ops.into_iter().map(|i| Operator::ALL[i]).collect();
            let rendered = render(&g, 8, 8);

            // Only representable when every decoded pixel fits a byte.
            prop_assume!(rendered.as_slice().iter().all(|&v| (0..=255).contains(&v)));
            let exact = rendered.map(|&v| v as u8);
            prop_assert_eq!(score(&g, &exact), 0);

            let mut perturbed = exact.clone();
            let original = perturbed[(3, 5)];
            perturbed[(3, 5)] = noise;
            let expected = u64::from(original.abs_diff(noise));
            prop_assert_eq!(score(&g, &perturbed), expected);
        }
    }
}
