use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::Position;

/// Errors from grid cell access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("coordinates ({x}, {y}) are out of bounds for grid size ({width}, {height})")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

/// A 2D grid of cells stored row-major in a flat vector.
///
/// Used as `Grid<Tile>` for the level layout and `Grid<Decal>` for the
/// background decal layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a grid of the given dimensions filled with default values.
    pub fn new(width: usize, height: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = width.checked_mul(height).expect("grid size overflow");
        Grid {
            width,
            height,
            cells: vec![T::default(); size],
        }
    }

    /// Creates a grid filled by calling `f(x, y)` for every cell, row-major.
    ///
    /// The visiting order is part of the contract: generators that consume a
    /// random stream rely on it.
    pub fn from_generator<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let size = width.checked_mul(height).expect("grid size overflow");
        let mut cells = Vec::with_capacity(size);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Grid {
            width,
            height,
            cells,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Checks whether the coordinates fall inside the grid.
    #[inline]
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    fn coords_to_index(&self, x: usize, y: usize) -> Option<usize> {
        if self.is_valid(x, y) {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Gets the cell at the given coordinates, or `None` when out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        let index = self.coords_to_index(x, y)?;
        self.cells.get(index)
    }

    /// Sets the cell at the given coordinates.
    pub fn set(&mut self, x: usize, y: usize, value: T) -> Result<(), GridError> {
        let index = self.coords_to_index(x, y).ok_or(GridError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })?;
        self.cells[index] = value;
        Ok(())
    }

    /// Iterates `((x, y), &T)` over all cells in row-major order.
    pub fn enumerate(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let y = index / width;
            let x = index % width;
            ((x, y), cell)
        })
    }
}

impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, pos: Position) -> &Self::Output {
        match self.coords_to_index(pos.x, pos.y) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "grid index ({}, {}) out of bounds for grid size ({}, {})",
                pos.x, pos.y, self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, pos: Position) -> &mut Self::Output {
        let width = self.width;
        let height = self.height;
        match self.coords_to_index(pos.x, pos.y) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "grid index ({}, {}) out of bounds for grid size ({}, {})",
                pos.x, pos.y, width, height
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let mut grid: Grid<u8> = Grid::new(4, 3);
        grid.set(2, 1, 7).unwrap();
        assert_eq!(grid.get(2, 1), Some(&7));
        assert_eq!(grid[Position::new(2, 1)], 7);
    }

    #[test]
    fn out_of_bounds_set_is_an_error() {
        let mut grid: Grid<u8> = Grid::new(4, 3);
        assert_eq!(
            grid.set(4, 0, 1),
            Err(GridError::OutOfBounds {
                x: 4,
                y: 0,
                width: 4,
                height: 3,
            })
        );
        assert_eq!(grid.get(0, 3), None);
    }

    #[test]
    fn enumerate_is_row_major() {
        let grid = Grid::from_generator(3, 2, |x, y| (x, y));
        let order: Vec<(usize, usize)> = grid.enumerate().map(|(coords, _)| coords).collect();
        assert_eq!(
            order,
            vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]
        );
        for ((x, y), cell) in grid.enumerate() {
            assert_eq!(*cell, (x, y));
        }
    }
}
