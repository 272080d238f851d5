/// Shared entity shape: Body, directions, behavioral states.
/// Harry, Hens and Lifts each own a `Body` and add only their own fields.

use super::geometry::{Rect, TileSize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Fixed order used whenever a set of directions is enumerated.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Which of the four directions are open from the current tile.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Moves {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Moves {
    pub fn allows(&self, dir: Direction) -> bool {
        match dir {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn set(&mut self, dir: Direction, open: bool) {
        match dir {
            Direction::Up => self.up = open,
            Direction::Down => self.down = open,
            Direction::Left => self.left = open,
            Direction::Right => self.right = open,
        }
    }

    pub fn count(&self) -> usize {
        Direction::ALL.iter().filter(|&&d| self.allows(d)).count()
    }

    /// Open directions in `Direction::ALL` order.
    pub fn open(&self) -> Vec<Direction> {
        Direction::ALL.iter().copied().filter(|&d| self.allows(d)).collect()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HarryState {
    Still,
    Walking,
    Jumping,
    Falling,
    Splat,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HenState {
    Walking,
    Eating,
}

/// Position, velocity and facing shared by every mover.
///
/// `(x, y)` is the top-left of the bounding box in pixels. The entity's
/// "tile" is the centre-lower tile of that box, which for the two-tile
/// tall Harry and Hens is the tile their feet occupy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Body {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub dx: i32,
    pub dy: i32,
    pub direction: Direction,
    pub frame: u32,
}

impl Body {
    /// Spawn with the top-left at tile `(tx, ty)`, `tiles_high` tiles tall.
    pub fn at_tile(ts: TileSize, tx: i32, ty: i32, tiles_high: i32, direction: Direction) -> Self {
        let (x, y) = ts.tile_to_pixel(tx, ty);
        Body {
            x,
            y,
            w: ts.width,
            h: ts.height * tiles_high,
            dx: 0,
            dy: 0,
            direction,
            frame: 0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    pub fn center_x(&self) -> i32 {
        self.x + self.w / 2
    }

    pub fn center_y(&self) -> i32 {
        self.y + self.h / 2
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Centre-lower tile.
    pub fn tile(&self, ts: TileSize) -> (i32, i32) {
        ts.pixel_to_tile(self.center_x(), self.center_y())
    }

    pub fn is_aligned(&self, ts: TileSize) -> bool {
        ts.is_col_aligned(self.x) && ts.is_row_aligned(self.y)
    }

    pub fn going_left(&self) -> bool {
        self.dx < 0
    }

    pub fn going_right(&self) -> bool {
        self.dx > 0
    }

    pub fn going_up(&self) -> bool {
        self.dy < 0
    }

    pub fn going_down(&self) -> bool {
        self.dy > 0
    }

    /// Direction of current travel, if moving.
    pub fn travel(&self) -> Option<Direction> {
        if self.dx < 0 {
            Some(Direction::Left)
        } else if self.dx > 0 {
            Some(Direction::Right)
        } else if self.dy < 0 {
            Some(Direction::Up)
        } else if self.dy > 0 {
            Some(Direction::Down)
        } else {
            None
        }
    }

    pub fn stop(&mut self) {
        self.dx = 0;
        self.dy = 0;
    }

    pub fn apply_velocity(&mut self) {
        self.x += self.dx;
        self.y += self.dy;
    }
}

/// Sound cues raised by movers; played fire-and-forget by the driver.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SoundEvent {
    Step,
    Jump,
    Fall,
    Egg,
    Grain,
    Ladder,
    Splat,
}

/// Per-tick input, already decoded from whatever devices the driver polls.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct InputSnapshot {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub jump: bool,
    pub paused: bool,
}

/// What kind of mover a snapshot describes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntityKind {
    Harry(HarryState),
    Hen(HenState),
    Lift,
}

/// Read-only view handed to the renderer each tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EntitySnapshot {
    pub kind: EntityKind,
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub frame: u32,
}

impl EntitySnapshot {
    pub fn of(kind: EntityKind, body: &Body) -> Self {
        EntitySnapshot {
            kind,
            x: body.x,
            y: body.y,
            direction: body.direction,
            frame: body.frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: TileSize = TileSize::new(52, 32);

    #[test]
    fn tile_is_centre_lower_tile() {
        let b = Body::at_tile(TS, 5, 9, 2, Direction::Right);
        assert_eq!((b.x, b.y), (260, 288));
        assert_eq!(b.tile(TS), (5, 10));

        let lift = Body::at_tile(TS, 3, 4, 1, Direction::Left);
        assert_eq!(lift.tile(TS), (3, 4));
    }

    #[test]
    fn tile_switches_halfway_across() {
        let mut b = Body::at_tile(TS, 2, 0, 2, Direction::Right);
        b.x += 13;
        assert_eq!(b.tile(TS).0, 2);
        b.x += 13;
        assert_eq!(b.tile(TS).0, 3);
    }

    #[test]
    fn moves_enumerate_in_fixed_order() {
        let m = Moves { up: true, down: false, left: true, right: true };
        assert_eq!(m.count(), 3);
        assert_eq!(m.open(), vec![Direction::Up, Direction::Left, Direction::Right]);
    }

    #[test]
    fn travel_prefers_horizontal() {
        let mut b = Body::at_tile(TS, 0, 0, 2, Direction::Left);
        assert_eq!(b.travel(), None);
        b.dy = -16;
        assert_eq!(b.travel(), Some(Direction::Up));
        b.dx = 13;
        assert_eq!(b.travel(), Some(Direction::Right));
    }
}
