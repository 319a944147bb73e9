use serde::{Deserialize, Serialize};

use crate::{
    Direction, Position,
    level::{Level, LevelError, Tile},
    map::Grid,
};

/// Round lifecycle: `Playing` until a capture or a door exit ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Playing,
    Over { won: bool },
}

/// Outcome of a single requested player step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    /// The round is already over; the request was dropped.
    Ignored,
    /// Wall ahead, or the door is still locked.
    Blocked,
    Moved,
    Won,
    Lost,
}

/// One round of the game: level layout, entity positions and the phase.
///
/// Owned by the caller and mutated only through the movement rules, so it can
/// be driven and inspected without a live window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    seed: u64,
    /// Every cell a placement has landed on in this and earlier rounds.
    /// Restarted rounds avoid them, which re-randomizes placement while the
    /// seed keeps the wall layout fixed.
    claimed: Vec<Position>,
    grid: Grid<Tile>,
    door: Position,
    player: Position,
    /// Keys still on the floor, in placement order.
    keys: Vec<Position>,
    /// Guard positions, in placement order.
    guards: Vec<Position>,
    phase: Phase,
}

impl GameState {
    /// Starts a fresh round generated from `seed`.
    pub fn new(seed: u64) -> Result<Self, LevelError> {
        Self::from_round(seed, &[])
    }

    fn from_round(seed: u64, prior: &[Position]) -> Result<Self, LevelError> {
        let level = Level::generate_avoiding(seed, prior)?;
        let mut claimed = prior.to_vec();
        claimed.push(level.player_start);
        claimed.extend_from_slice(&level.keys);
        claimed.extend_from_slice(&level.guards);
        claimed.push(level.door);
        Ok(GameState {
            seed,
            claimed,
            grid: level.grid,
            door: level.door,
            player: level.player_start,
            keys: level.keys,
            guards: level.guards,
            phase: Phase::Playing,
        })
    }

    /// Starts the next round from the stored seed. The wall layout comes
    /// back identical, but cells claimed by earlier rounds stay off-limits,
    /// so entity placement lands somewhere new.
    pub fn restart(&mut self) -> Result<(), LevelError> {
        *self = Self::from_round(self.seed, &self.claimed)?;
        Ok(())
    }

    pub fn grid(&self) -> &Grid<Tile> {
        &self.grid
    }

    pub fn door(&self) -> Position {
        self.door
    }

    pub fn player(&self) -> Position {
        self.player
    }

    /// Keys not yet collected, in placement order.
    pub fn keys(&self) -> &[Position] {
        &self.keys
    }

    pub fn guards(&self) -> &[Position] {
        &self.guards
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::Over { .. })
    }

    /// The door is passable only once every key has been picked up.
    pub fn door_unlocked(&self) -> bool {
        self.keys.is_empty()
    }

    /// Attempts one player step.
    ///
    /// Walls and the locked door reject the move without any state change.
    /// Stepping onto the unlocked door wins the round; stepping onto a key
    /// collects it; stepping onto a guard loses the round.
    pub fn move_player(&mut self, dir: Direction) -> MoveResult {
        if self.phase != Phase::Playing {
            return MoveResult::Ignored;
        }
        let Some(target) = self.player.step(dir) else {
            return MoveResult::Blocked;
        };
        match self.grid[target] {
            Tile::Wall => return MoveResult::Blocked,
            Tile::Door => {
                if !self.keys.is_empty() {
                    return MoveResult::Blocked;
                }
                self.player = target;
                self.phase = Phase::Over { won: true };
                return MoveResult::Won;
            }
            Tile::Floor => {}
        }
        self.player = target;
        if let Some(idx) = self.keys.iter().position(|key| *key == target) {
            // At most one key per cell by construction.
            self.keys.remove(idx);
        }
        if self.guards.contains(&target) {
            self.phase = Phase::Over { won: false };
            return MoveResult::Lost;
        }
        MoveResult::Moved
    }

    /// Advances every guard one greedy step toward the player, in placement
    /// order against the live player position. A guard landing on (or already
    /// pinning) the player's cell ends the round immediately.
    pub fn move_guards(&mut self) {
        if self.phase != Phase::Playing {
            return;
        }
        for i in 0..self.guards.len() {
            let next = chase_step(&self.grid, self.guards[i], self.player);
            self.guards[i] = next;
            if next == self.player {
                self.phase = Phase::Over { won: false };
                return;
            }
        }
    }
}

/// One greedy chase step: horizontal axis first, then vertical; no movement
/// when blocked on the preferred axis and aligned on the other.
///
/// Guards ignore each other and pass through door and key cells; only walls
/// block them. Intentionally not pathfinding: a guard can pin itself against
/// a wall forever.
fn chase_step(grid: &Grid<Tile>, guard: Position, player: Position) -> Position {
    let mut next = guard;
    if player.x > guard.x && grid[Position::new(guard.x + 1, guard.y)] != Tile::Wall {
        next.x += 1;
    } else if player.x < guard.x && grid[Position::new(guard.x - 1, guard.y)] != Tile::Wall {
        next.x -= 1;
    } else if player.y > guard.y && grid[Position::new(guard.x, guard.y + 1)] != Tile::Wall {
        next.y += 1;
    } else if player.y < guard.y && grid[Position::new(guard.x, guard.y - 1)] != Tile::Wall {
        next.y -= 1;
    }
    next
}
