//! Flat row-major 2D grid.
//!
//! All matrices in the pipeline (raw densities, compressed densities, target
//! and rendered images) share this layout: `data[y * width + x]`.

use std::ops::{Index, IndexMut};

/// A rectangular grid stored as a single contiguous buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    /// Grid width (X dimension).
    pub width: usize,
    /// Grid height (Y dimension).
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Create a grid filled with `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T> Grid<T> {
    /// Wrap an existing row-major buffer.
    ///
    /// Returns `None` if the buffer length does not match `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Build a grid by evaluating `f(x, y)` for every cell in row-major order.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Convert (x, y) coordinates to flat index.
    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check whether width equals height.
    #[inline]
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Get a cell, or `None` when out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x < self.width && y < self.height {
            self.data.get(self.idx(x, y))
        } else {
            None
        }
    }

    /// Row-major view of the cells.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks() panics on 0, and an empty grid has no rows anyway
        self.data.chunks(self.width.max(1))
    }

    /// Apply `f` to each cell, producing a grid of the same shape.
    pub fn map<U, F>(&self, f: F) -> Grid<U>
    where
        F: FnMut(&T) -> U,
    {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Consume the grid, returning the row-major buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &T {
        &self.data[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        &mut self.data[y * self.width + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_row_major() {
        let grid = Grid::from_fn(3, 2, |x, y| x + 10 * y);
        assert_eq!(grid.as_slice(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(grid[(2, 1)], 12);
        assert_eq!(grid.get(3, 0), None);
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        assert!(Grid::from_vec(2, 2, vec![1, 2, 3]).is_none());
        assert!(Grid::from_vec(2, 2, vec![1, 2, 3, 4]).is_some());
    }

    #[test]
    fn test_rows_and_map() {
        let mut grid = Grid::filled(2, 2, 1u32);
        grid[(1, 1)] = 5;

        let rows: Vec<&[u32]> = grid.rows().collect();
        assert_eq!(rows, vec![&[1, 1][..], &[1, 5][..]]);

        let doubled = grid.map(|v| v * 2);
        assert_eq!(doubled[(1, 1)], 10);
        assert!(doubled.is_square());
    }
}
