/// Hen AI: wandering walkers.
///
/// Hens never stop to think mid-tile. Only when aligned on both axes do
/// they look at the directions the tiles support and pick one:
///
/// ```text
///   open  | choice
///   ------+-------------------------------------------------------------
///     0   | stay put
///     1   | take it
///     2   | keep going straight if possible, else random
///    3+   | never double back; coming off a ladder, keep the horizontal
///         | heading held before the ladder; random among what is left
/// ```
///
/// Grain one tile ahead (at foot height) is eaten on the spot: the Hen
/// stands still for `EAT_FRAMES` updates, then walks on the way it faced.
///
/// Each Hen owns its RNG so several Hens never move in lockstep.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::entity::{Body, Direction, EntityKind, EntitySnapshot, HenState, Moves};
use super::geometry::TileSize;
use super::movement::supported_directions;
use super::tile::ContentTag;
use super::tile_map::TileMap;

/// Updates spent eating before walking on.
pub const EAT_FRAMES: u32 = 4;

/// Walking animation cycle length.
const WALK_FRAMES: u32 = 4;

#[derive(Clone, Debug)]
pub struct Hen<R = ChaCha8Rng> {
    pub body: Body,
    pub state: HenState,
    /// Last direction before the current one; drives the after-ladder bias.
    pub previous: Direction,
    step_x: i32,
    step_y: i32,
    rng: R,
}

impl Hen<ChaCha8Rng> {
    /// Spawn with feet-tile convention handled by the caller: `(tx, ty)` is
    /// the top-left tile of the two-tile body.
    pub fn new(ts: TileSize, tx: i32, ty: i32, facing: Direction, step_x: i32, step_y: i32, seed: u64) -> Self {
        Hen::with_rng(ts, tx, ty, facing, step_x, step_y, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Hen<R> {
    pub fn with_rng(
        ts: TileSize,
        tx: i32,
        ty: i32,
        facing: Direction,
        step_x: i32,
        step_y: i32,
        rng: R,
    ) -> Self {
        let mut hen = Hen {
            body: Body::at_tile(ts, tx, ty, 2, facing),
            state: HenState::Walking,
            previous: facing,
            step_x,
            step_y,
            rng,
        };
        hen.head(facing);
        hen
    }

    /// Set direction and velocity, remembering the old direction on change.
    fn head(&mut self, dir: Direction) {
        if dir != self.body.direction {
            self.previous = self.body.direction;
        }
        self.body.direction = dir;
        let (dx, dy) = match dir {
            Direction::Up => (0, -self.step_y),
            Direction::Down => (0, self.step_y),
            Direction::Left => (-self.step_x, 0),
            Direction::Right => (self.step_x, 0),
        };
        self.body.dx = dx;
        self.body.dy = dy;
    }

    /// Uniform pick among the open directions.
    fn pick(&mut self, moves: &Moves) -> Option<Direction> {
        let open = moves.open();
        if open.is_empty() {
            return None;
        }
        let i = self.rng.gen_range(0..open.len());
        Some(open[i])
    }

    fn choose(&mut self, mut moves: Moves) -> Option<Direction> {
        let travel = self.body.travel();
        match moves.count() {
            0 => None,
            1 => moves.open().first().copied(),
            2 => match travel {
                Some(dir) if moves.allows(dir) => Some(dir),
                _ => self.pick(&moves),
            },
            _ => {
                if let Some(dir) = travel {
                    moves.set(dir.opposite(), false);
                }
                if moves.count() > 1 && self.body.dy != 0 {
                    for side in [Direction::Left, Direction::Right] {
                        if moves.allows(side) && self.previous == side {
                            moves.set(side.opposite(), false);
                        }
                    }
                }
                self.pick(&moves)
            }
        }
    }

    /// Advance one AI step. Returns the grain tile eaten this step, if any;
    /// the caller owns the map and does the removal.
    pub fn update(&mut self, map: &TileMap, ts: TileSize) -> Option<(i32, i32)> {
        if self.state == HenState::Eating {
            if self.body.frame + 1 >= EAT_FRAMES {
                self.state = HenState::Walking;
                self.body.frame = 0;
                let facing = if self.body.direction == Direction::Left {
                    Direction::Left
                } else {
                    Direction::Right
                };
                self.head(facing);
            } else {
                self.body.frame += 1;
            }
            return None;
        }

        self.body.frame = (self.body.frame + 1) % WALK_FRAMES;

        if !self.body.is_aligned(ts) {
            self.body.apply_velocity();
            return None;
        }

        let moves = supported_directions(map, ts, &self.body);
        let dir = self.choose(moves)?;
        self.head(dir);

        if self.body.dx != 0 {
            let (tx, ty) = self.body.tile(ts);
            let ahead = if self.body.dx < 0 { tx - 1 } else { tx + 1 };
            if map.tile_at(ahead, ty) == ContentTag::Grain {
                debug!(tx = ahead, ty, "hen eating grain");
                self.body.stop();
                self.state = HenState::Eating;
                self.body.frame = 0;
                return Some((ahead, ty));
            }
        }

        self.body.apply_velocity();
        None
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot::of(EntityKind::Hen(self.state), &self.body)
    }
}
