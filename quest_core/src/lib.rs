use serde::{Deserialize, Serialize};

pub mod game;
pub mod level;
pub mod map;

/// Grid width in cells, fixed for the process lifetime.
pub const GRID_WIDTH: usize = 20;
/// Grid height in cells.
pub const GRID_HEIGHT: usize = 15;
/// Side length of one grid cell in pixels.
pub const CELL_SIZE: usize = 50;

/// Seed driving both level generation and the background decal layer.
pub const DEFAULT_SEED: u64 = 123_456;

/// A 2D grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Converts grid coordinates to pixel coordinates (top-left anchor).
    pub fn screen_coords(self) -> (usize, usize) {
        (self.x * CELL_SIZE, self.y * CELL_SIZE)
    }

    /// The neighboring coordinate one step in `dir`, or `None` if the step
    /// would underflow the coordinate space.
    pub fn step(self, dir: Direction) -> Option<Position> {
        let (dx, dy) = dir.delta();
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Position { x, y })
    }
}

/// The four cardinal movement directions. Diagonal input never occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The (dx, dy) offset of a single step, with y growing downward.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_coords_scale_by_cell_size() {
        assert_eq!(Position::new(0, 0).screen_coords(), (0, 0));
        assert_eq!(Position::new(3, 7).screen_coords(), (150, 350));
    }

    #[test]
    fn step_stays_in_coordinate_space() {
        let pos = Position::new(1, 1);
        assert_eq!(pos.step(Direction::Left), Some(Position::new(0, 1)));
        assert_eq!(pos.step(Direction::Up), Some(Position::new(1, 0)));
        assert_eq!(Position::new(0, 0).step(Direction::Left), None);
        assert_eq!(Position::new(0, 0).step(Direction::Up), None);
    }
}
