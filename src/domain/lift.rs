/// Lift: a one-tile platform rising at a constant speed.
/// When it passes the disappear line near the top it reappears at the
/// bottom. Riders are never carried through the wrap; they have to notice
/// the lift is gone themselves.

use super::entity::{Body, Direction, EntityKind, EntitySnapshot};
use super::geometry::{Rect, TileSize};

#[derive(Clone, Debug)]
pub struct Lift {
    pub body: Body,
    /// Pixel y below which the lift vanishes.
    pub disappear_y: i32,
    /// Pixel y the lift restarts from.
    pub reappear_y: i32,
}

impl Lift {
    /// `direction` is cosmetic (which way the platform's lip points).
    pub fn new(
        ts: TileSize,
        tx: i32,
        ty: i32,
        direction: Direction,
        velocity: i32,
        disappear_row: i32,
        reappear_row: i32,
    ) -> Self {
        let mut body = Body::at_tile(ts, tx, ty, 1, direction);
        body.dy = velocity;
        let disappear_y = disappear_row * ts.height;
        let reappear_y = (reappear_row * ts.height).max(disappear_y);
        body.y = body.y.clamp(disappear_y, reappear_y);
        Lift { body, disappear_y, reappear_y }
    }

    pub fn tick(&mut self) {
        self.body.y += self.body.dy;
        if self.body.y < self.disappear_y {
            self.body.y = self.reappear_y;
        } else if self.body.y > self.reappear_y {
            self.body.y = self.disappear_y;
        }
        self.body.frame = self.body.frame.wrapping_add(1);
    }

    pub fn rect(&self) -> Rect {
        self.body.rect()
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot::of(EntityKind::Lift, &self.body)
    }
}
