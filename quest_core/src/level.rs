use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{GRID_HEIGHT, GRID_WIDTH, Position, map::Grid};

/// Keys the player has to collect before the door unlocks.
pub const KEY_COUNT: usize = 3;
/// Guards patrolling the level.
pub const GUARD_COUNT: usize = 2;

const WALL_DENSITY: f64 = 0.2;
const MAX_PLACE_ATTEMPTS: usize = 10_000;

/// Static contents of one level cell.
///
/// Entity occupancy (player, keys, guards) is tracked by the game state, not
/// baked into the grid; only the door is a permanent cell feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Floor,
    Wall,
    Door,
}

/// Cosmetic overlay drawn on floor cells by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decal {
    #[default]
    None,
    Crack1,
    Crack2,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LevelError {
    /// The wall scatter left too few free interior cells to place every
    /// entity; rejection sampling gave up after `attempts` draws.
    #[error("no free cell found after {attempts} placement attempts")]
    PlacementExhausted { attempts: usize },
}

/// A freshly generated round: wall layout plus initial entity placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub grid: Grid<Tile>,
    pub player_start: Position,
    pub keys: Vec<Position>,
    pub guards: Vec<Position>,
    pub door: Position,
}

impl Level {
    /// Generates a level from `seed`.
    ///
    /// Fully deterministic: the wall scatter consumes one sample per cell in
    /// row-major order, then player, keys, guards and the door are placed in
    /// that fixed order from the same continuing stream. The same seed
    /// always yields the same layout and placements.
    pub fn generate(seed: u64) -> Result<Level, LevelError> {
        Self::generate_avoiding(seed, &[])
    }

    /// Generates a level from `seed` with the `claimed` cells treated as
    /// already taken.
    ///
    /// The wall layout depends only on the seed, but claimed cells reject
    /// the replayed placement draws, shifting every subsequent sample. A
    /// restarted round passes the cells used in earlier rounds here, which
    /// keeps the walls identical while re-randomizing entity placement.
    pub fn generate_avoiding(seed: u64, claimed: &[Position]) -> Result<Level, LevelError> {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut grid = Grid::from_generator(GRID_WIDTH, GRID_HEIGHT, |_, _| {
            if rng.random::<f64>() < WALL_DENSITY {
                Tile::Wall
            } else {
                Tile::Floor
            }
        });

        // The border ring is wall regardless of the scatter outcome.
        for x in 0..GRID_WIDTH {
            grid[Position::new(x, 0)] = Tile::Wall;
            grid[Position::new(x, GRID_HEIGHT - 1)] = Tile::Wall;
        }
        for y in 0..GRID_HEIGHT {
            grid[Position::new(0, y)] = Tile::Wall;
            grid[Position::new(GRID_WIDTH - 1, y)] = Tile::Wall;
        }

        let mut occupied: Vec<Position> = claimed.to_vec();

        let player_start = place(&grid, &occupied, &mut rng)?;
        occupied.push(player_start);

        let mut keys = Vec::with_capacity(KEY_COUNT);
        for _ in 0..KEY_COUNT {
            let pos = place(&grid, &occupied, &mut rng)?;
            occupied.push(pos);
            keys.push(pos);
        }

        let mut guards = Vec::with_capacity(GUARD_COUNT);
        for _ in 0..GUARD_COUNT {
            let pos = place(&grid, &occupied, &mut rng)?;
            occupied.push(pos);
            guards.push(pos);
        }

        let door = place(&grid, &occupied, &mut rng)?;
        grid[door] = Tile::Door;

        Ok(Level {
            grid,
            player_start,
            keys,
            guards,
            door,
        })
    }
}

/// Rejection-samples an interior floor cell not claimed by a prior placement.
fn place(
    grid: &Grid<Tile>,
    occupied: &[Position],
    rng: &mut StdRng,
) -> Result<Position, LevelError> {
    for _ in 0..MAX_PLACE_ATTEMPTS {
        let x = rng.random_range(1..=GRID_WIDTH - 2);
        let y = rng.random_range(1..=GRID_HEIGHT - 2);
        let pos = Position::new(x, y);
        if grid[pos] == Tile::Floor && !occupied.contains(&pos) {
            return Ok(pos);
        }
    }
    Err(LevelError::PlacementExhausted {
        attempts: MAX_PLACE_ATTEMPTS,
    })
}

/// Background decal layer: a fresh stream seeded with the same constant as
/// generation, consumed row-major, independent of the gameplay stream.
///
/// Per cell one sample in `0..100`: below 5 a first-tier crack, below 10 a
/// second-tier one.
pub fn floor_decals(seed: u64) -> Grid<Decal> {
    let mut rng = StdRng::seed_from_u64(seed);
    Grid::from_generator(GRID_WIDTH, GRID_HEIGHT, |_, _| {
        let n: u32 = rng.random_range(0..100);
        if n < 5 {
            Decal::Crack1
        } else if n < 10 {
            Decal::Crack2
        } else {
            Decal::None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_SEED;

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = Level::generate(DEFAULT_SEED).unwrap();
        let b = Level::generate(DEFAULT_SEED).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn border_ring_is_always_wall() {
        for seed in [DEFAULT_SEED, 0, 1, 42, u64::MAX] {
            let level = Level::generate(seed).unwrap();
            for x in 0..GRID_WIDTH {
                assert_eq!(level.grid[Position::new(x, 0)], Tile::Wall);
                assert_eq!(level.grid[Position::new(x, GRID_HEIGHT - 1)], Tile::Wall);
            }
            for y in 0..GRID_HEIGHT {
                assert_eq!(level.grid[Position::new(0, y)], Tile::Wall);
                assert_eq!(level.grid[Position::new(GRID_WIDTH - 1, y)], Tile::Wall);
            }
        }
    }

    #[test]
    fn top_and_bottom_rows_for_default_seed() {
        let level = Level::generate(123_456).unwrap();
        let wall_row = |y: usize| (0..GRID_WIDTH).all(|x| level.grid[Position::new(x, y)] == Tile::Wall);
        assert!(wall_row(0));
        assert!(wall_row(14));
    }

    #[test]
    fn placements_are_distinct_interior_cells() {
        let level = Level::generate(DEFAULT_SEED).unwrap();
        let mut all = vec![level.player_start];
        all.extend_from_slice(&level.keys);
        all.extend_from_slice(&level.guards);
        all.push(level.door);

        assert_eq!(level.keys.len(), KEY_COUNT);
        assert_eq!(level.guards.len(), GUARD_COUNT);
        for (i, pos) in all.iter().enumerate() {
            assert!(pos.x >= 1 && pos.x <= GRID_WIDTH - 2, "{pos:?} on border");
            assert!(pos.y >= 1 && pos.y <= GRID_HEIGHT - 2, "{pos:?} on border");
            for other in &all[i + 1..] {
                assert_ne!(pos, other, "two placements share a cell");
            }
        }
        // Entities sit on floor; the door cell carries the door tile.
        for pos in &all[..all.len() - 1] {
            assert_eq!(level.grid[*pos], Tile::Floor);
        }
        assert_eq!(level.grid[level.door], Tile::Door);
    }

    #[test]
    fn claimed_cells_shift_the_placement_draws() {
        let fresh = Level::generate(DEFAULT_SEED).unwrap();
        let mut claimed = vec![fresh.player_start];
        claimed.extend_from_slice(&fresh.keys);
        claimed.extend_from_slice(&fresh.guards);
        claimed.push(fresh.door);

        let next = Level::generate_avoiding(DEFAULT_SEED, &claimed).unwrap();
        // Walls depend only on the seed.
        let wall = |level: &Level, pos: Position| level.grid[pos] == Tile::Wall;
        for y in 0..GRID_HEIGHT {
            for x in 0..GRID_WIDTH {
                let pos = Position::new(x, y);
                assert_eq!(wall(&fresh, pos), wall(&next, pos));
            }
        }
        // The replayed first draw hits the claimed player cell, so every
        // placement lands elsewhere.
        assert_ne!(next.player_start, fresh.player_start);
        let mut placed = vec![next.player_start];
        placed.extend_from_slice(&next.keys);
        placed.extend_from_slice(&next.guards);
        placed.push(next.door);
        for pos in &placed {
            assert!(!claimed.contains(pos), "{pos:?} reused a claimed cell");
        }
    }

    #[test]
    fn placement_gives_up_on_a_full_grid() {
        let grid = Grid::from_generator(GRID_WIDTH, GRID_HEIGHT, |_, _| Tile::Wall);
        let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
        assert_eq!(
            place(&grid, &[], &mut rng),
            Err(LevelError::PlacementExhausted {
                attempts: MAX_PLACE_ATTEMPTS,
            })
        );
    }

    #[test]
    fn decal_layer_is_deterministic_and_sparse() {
        let a = floor_decals(DEFAULT_SEED);
        let b = floor_decals(DEFAULT_SEED);
        assert_eq!(a, b);

        let cracked = a
            .enumerate()
            .filter(|(_, decal)| **decal != Decal::None)
            .count();
        // ~10% of 300 cells; loose bounds, the stream is fixed anyway.
        assert!(cracked < GRID_WIDTH * GRID_HEIGHT / 3);
    }
}
