/// Harry: the player state machine.
///
/// ## States
///
/// ```text
///   Still ──(move)──> Walking ──(edge)──> Falling ──(floor)──> Still
///     │                  │
///     └──(jump)──> Jumping ──(floor / lift / ladder grab)──> Still
///
///   any ──(outside play area)──> Splat   (terminal for this life)
/// ```
///
/// ## Per-tick order
///
///   1. controls (skipped while falling; ignored while jumping)
///   2. ride the lift, if on one
///   3. dispatch on state: fall / jump / walk-or-climb
///   4. boundary check
///   5. pickup probe (feet, then head)
///
/// Jump is edge-triggered: a held jump key launches once and must be
/// released before it can launch again.

use tracing::{debug, info};

use crate::config::{GridConfig, PhysicsConfig};

use super::entity::{Body, Direction, EntityKind, EntitySnapshot, HarryState, InputSnapshot, SoundEvent};
use super::geometry::TileSize;
use super::lift::Lift;
use super::movement::{element_below, possible_directions};
use super::tile_map::TileMap;

/// Everything Harry reads but does not own.
pub struct Ctx<'a> {
    pub map: &'a TileMap,
    pub lifts: &'a [Lift],
    pub grid: &'a GridConfig,
    pub physics: &'a PhysicsConfig,
}

impl Ctx<'_> {
    fn ts(&self) -> TileSize {
        self.grid.tile
    }

    /// Largest legal x for Harry's left edge.
    fn max_x(&self) -> i32 {
        (self.grid.cols - 1) * self.grid.tile.width
    }
}

#[derive(Clone, Debug)]
pub struct Harry {
    pub body: Body,
    pub state: HarryState,
    pub on_lift: bool,
    /// Accumulated vertical velocity of the current jump.
    pub y_velocity: i32,
    /// Set on launch, cleared once the jump key is released.
    jump_latched: bool,
}

impl Harry {
    /// `(tx, ty)` is the top-left tile of the two-tile body.
    pub fn new(ts: TileSize, tx: i32, ty: i32, facing: Direction) -> Self {
        Harry {
            body: Body::at_tile(ts, tx, ty, 2, facing),
            state: HarryState::Still,
            on_lift: false,
            y_velocity: 0,
            jump_latched: false,
        }
    }

    pub fn is_airborne(&self) -> bool {
        matches!(self.state, HarryState::Jumping | HarryState::Falling)
    }

    pub fn is_splat(&self) -> bool {
        self.state == HarryState::Splat
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot::of(EntityKind::Harry(self.state), &self.body)
    }

    /// Advance one tick. Returns the tile of an egg or grain Harry is now
    /// touching; the caller owns the map and does the consuming.
    pub fn update(&mut self, input: &InputSnapshot, ctx: &Ctx, sounds: &mut Vec<SoundEvent>) -> Option<(i32, i32)> {
        if self.state == HarryState::Splat {
            return None;
        }
        if !input.jump {
            self.jump_latched = false;
        }

        if self.state != HarryState::Falling {
            self.apply_controls(input, ctx, sounds);
        }

        if self.body.dx == 0 && self.body.dy == 0 && !self.on_lift && !self.is_airborne() {
            return None;
        }

        if self.on_lift {
            self.body.y += ctx.physics.lift_velocity;
        }

        match self.state {
            HarryState::Falling => self.process_fall(ctx),
            HarryState::Jumping => self.process_jump(input, ctx),
            _ => self.process_move(ctx, sounds),
        }
        self.body.frame = self.body.frame.wrapping_add(1);

        if self.outside_play_area(ctx) {
            info!(x = self.body.x, y = self.body.y, "harry went splat");
            self.state = HarryState::Splat;
            self.body.stop();
            sounds.push(SoundEvent::Splat);
            return None;
        }

        self.touching_consumable(ctx)
    }

    // ══════════════════════════════════════════════════════════════
    // Controls
    // ══════════════════════════════════════════════════════════════

    fn apply_controls(&mut self, input: &InputSnapshot, ctx: &Ctx, sounds: &mut Vec<SoundEvent>) {
        if self.state == HarryState::Jumping {
            return;
        }
        let physics = ctx.physics;
        let carry_dx = self.finish_dx(ctx);
        let carry_dy = self.finish_dy(ctx);

        self.body.stop();

        if input.left {
            self.body.direction = Direction::Left;
            self.body.dx = -physics.harry_step_x;
        }
        if input.right {
            self.body.direction = Direction::Right;
            self.body.dx = physics.harry_step_x;
        }
        if !self.on_lift {
            if input.up {
                self.body.direction = Direction::Up;
                self.body.dy = -physics.harry_step_y;
            }
            if input.down {
                self.body.direction = Direction::Down;
                self.body.dy = physics.harry_step_y;
            }
        }

        // A released key never strands Harry between tiles.
        if !input.left && !input.right {
            self.body.dx = carry_dx;
        }
        if !self.on_lift && !input.up && !input.down {
            self.body.dy = carry_dy;
        }

        if input.jump && !self.jump_latched {
            debug!(x = self.body.x, y = self.body.y, on_lift = self.on_lift, "jump");
            self.jump_latched = true;
            self.state = HarryState::Jumping;
            self.y_velocity = physics.jump_velocity;
            self.body.dy = self.y_velocity;
            sounds.push(SoundEvent::Jump);
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Falling
    // ══════════════════════════════════════════════════════════════

    fn process_fall(&mut self, ctx: &Ctx) {
        let ts = ctx.ts();
        self.body.dy = self.body.dy.min(ctx.physics.max_fall_velocity);
        self.body.y += self.body.dy;

        let (tx, ty) = self.body.tile(ts);
        if self.lands_on(ctx, tx, ty + 1) {
            self.stand_on_row(ctx, ty + 1);
        }
    }

    /// Floor, or a landable ladder when that leniency is on.
    fn lands_on(&self, ctx: &Ctx, tx: i32, ty: i32) -> bool {
        ctx.map.tile_at(tx, ty).is_floor()
            || (ctx.physics.land_on_ladders && ctx.map.is_landable_ladder(tx, ty))
    }

    /// Snap so the feet rest on top of tile row `row`.
    fn stand_on_row(&mut self, ctx: &Ctx, row: i32) {
        self.body.y = row * ctx.ts().height - self.body.h;
        self.settle(ctx);
        debug!(x = self.body.x, y = self.body.y, "landed");
    }

    /// Come to rest vertically. A landing between columns keeps walking
    /// to the next one.
    fn settle(&mut self, ctx: &Ctx) {
        self.state = HarryState::Still;
        self.y_velocity = 0;
        self.body.dx = self.finish_dx(ctx);
        self.body.dy = 0;
    }

    /// Horizontal velocity that finishes a part-taken step; zero on a column.
    fn finish_dx(&self, ctx: &Ctx) -> i32 {
        let facing = match self.body.direction {
            Direction::Left => -1,
            Direction::Right => 1,
            _ => 0,
        };
        finish_step(self.body.x, ctx.ts().width, self.body.dx, facing, ctx.physics.harry_step_x)
    }

    /// Vertical counterpart of `finish_dx`, for a climb stopped mid-row.
    fn finish_dy(&self, ctx: &Ctx) -> i32 {
        let facing = match self.body.direction {
            Direction::Up => -1,
            Direction::Down => 1,
            _ => 0,
        };
        finish_step(self.body.y, ctx.ts().height, self.body.dy, facing, ctx.physics.harry_step_y)
    }

    fn start_fall(&mut self, physics: &PhysicsConfig, sounds: &mut Vec<SoundEvent>) {
        debug!(x = self.body.x, y = self.body.y, "falling");
        self.state = HarryState::Falling;
        self.body.dx = 0;
        self.body.dy = physics.fall_velocity.min(physics.max_fall_velocity);
        sounds.push(SoundEvent::Fall);
    }

    // ══════════════════════════════════════════════════════════════
    // Jumping
    // ══════════════════════════════════════════════════════════════

    fn process_jump(&mut self, input: &InputSnapshot, ctx: &Ctx) {
        let ts = ctx.ts();
        let physics = ctx.physics;

        self.y_velocity += physics.gravity;
        let mut dy = self.y_velocity;
        if self.on_lift {
            dy += physics.lift_jump_boost;
            self.on_lift = false;
        }
        dy = dy.min(physics.max_fall_velocity);
        self.body.dy = dy;

        let dx = self.body.dx;
        let next_x = self.body.x + dx;

        // (a) screen edge: bounce
        if next_x < 0 || next_x > ctx.max_x() {
            self.body.dx = -dx;
            return;
        }

        let cx = self.body.center_x() + dx;

        // Descending into the side of a floor tile: bounce
        let (bx, by) = ts.pixel_to_tile(cx, self.body.center_y() + dy);
        if self.body.going_down() && ctx.map.tile_at(bx, by).is_floor() {
            self.body.dx = -dx;
            return;
        }

        let foot_y = self.body.bottom() + dy;
        let (fx, fy) = ts.pixel_to_tile(cx, foot_y);

        if self.body.going_down() {
            // (b) floor under the projected feet
            if ctx.map.tile_at(fx, fy).is_floor() {
                self.body.x = next_x;
                self.stand_on_row(ctx, fy);
                return;
            }

            // (c) lift under the projected feet
            if let Some(lift) = ctx.lifts.iter().find(|l| l.rect().contains(cx, foot_y)) {
                debug!(x = self.body.x, lift_y = lift.body.y, "boarded lift");
                self.body.y = lift.body.y - self.body.h;
                self.on_lift = true;
                self.settle(ctx);
                return;
            }

            if ctx.physics.land_on_ladders && ctx.map.is_landable_ladder(fx, fy) {
                self.body.x = next_x;
                self.stand_on_row(ctx, fy);
                return;
            }
        }

        // (d) ladder grab, only while steering up or down
        if (input.up || input.down) && ts.is_col_aligned(next_x) {
            let (hx, hy) = ts.pixel_to_tile(cx, self.body.y + dy);
            if ctx.map.tile_at(fx, fy).is_ladder() {
                let (lx, ly) = ts.tile_to_pixel(fx, fy);
                self.body.x = lx;
                self.body.y = ly - self.body.h;
                self.settle(ctx);
                debug!(tx = fx, ty = fy, "grabbed ladder at feet");
                return;
            }
            if ctx.map.tile_at(hx, hy).is_ladder() {
                let (lx, ly) = ts.tile_to_pixel(hx, hy);
                self.body.x = lx;
                self.body.y = ly;
                self.settle(ctx);
                debug!(tx = hx, ty = hy, "grabbed ladder at head");
                return;
            }
        }

        // (e) still airborne
        self.body.apply_velocity();
    }

    // ══════════════════════════════════════════════════════════════
    // Walking and climbing
    // ══════════════════════════════════════════════════════════════

    fn process_move(&mut self, ctx: &Ctx, sounds: &mut Vec<SoundEvent>) {
        let dx = self.body.dx;
        if dx != 0 {
            let legal = if self.on_lift {
                self.inside_columns(ctx, self.body.x + dx)
            } else {
                self.can_move_sideways(ctx)
            };
            if legal {
                self.state = HarryState::Walking;
                self.body.x += dx;
                sounds.push(SoundEvent::Step);
            } else {
                self.state = HarryState::Still;
                self.body.dx = 0;
            }

            if self.on_lift {
                self.check_lift_fall(ctx, sounds);
            } else {
                self.check_edge_fall(ctx, sounds);
            }
        }

        if self.body.dy != 0 && !self.on_lift && !self.is_airborne() {
            if self.can_move_up_down(ctx) {
                self.state = HarryState::Walking;
                self.body.y += self.body.dy;
                sounds.push(SoundEvent::Ladder);
            } else {
                self.state = HarryState::Still;
                self.body.dy = 0;
            }
        }
    }

    fn inside_columns(&self, ctx: &Ctx, x: i32) -> bool {
        x >= 0 && x <= ctx.max_x()
    }

    /// Sideways step legality.
    ///
    /// Blocked at the screen edge. Mid-tile moves always finish. At a tile
    /// corner the tile rules decide; anywhere else (mid-climb) is refused.
    pub fn can_move_sideways(&self, ctx: &Ctx) -> bool {
        let ts = ctx.ts();
        if !self.inside_columns(ctx, self.body.x + self.body.dx) {
            return false;
        }
        if !ts.is_col_aligned(self.body.x) {
            return true;
        }
        if !ts.is_row_aligned(self.body.y) {
            return false;
        }
        let moves = possible_directions(ctx.map, ts, &self.body);
        (self.body.going_left() && moves.left) || (self.body.going_right() && moves.right)
    }

    /// Climb legality: mid-row climbs always finish; otherwise Harry must be
    /// lined up with the column and have a ladder to use.
    pub fn can_move_up_down(&self, ctx: &Ctx) -> bool {
        let ts = ctx.ts();
        if !ts.is_row_aligned(self.body.y) {
            return true;
        }
        if !ts.is_col_aligned(self.body.x) {
            return false;
        }
        let moves = possible_directions(ctx.map, ts, &self.body);
        (self.body.going_up() && moves.up) || (self.body.going_down() && moves.down)
    }

    /// Walked off the lift's platform: drop straight down the column the
    /// feet are over.
    fn check_lift_fall(&mut self, ctx: &Ctx, sounds: &mut Vec<SoundEvent>) {
        let fx = self.body.center_x();
        let fy = self.body.bottom() + 1;
        if !ctx.lifts.iter().any(|l| l.rect().contains(fx, fy)) {
            let ts = ctx.ts();
            let (col, _) = ts.pixel_to_tile(fx, fy);
            self.body.x = col * ts.width;
            self.on_lift = false;
            self.start_fall(ctx.physics, sounds);
        }
    }

    /// Walked past the end of a floor: drop once squarely over the gap.
    fn check_edge_fall(&mut self, ctx: &Ctx, sounds: &mut Vec<SoundEvent>) {
        let ts = ctx.ts();
        if !ts.is_col_aligned(self.body.x) {
            return;
        }
        if !element_below(ctx.map, ts, &self.body, 1).is_support() {
            self.start_fall(ctx.physics, sounds);
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Boundary and pickups
    // ══════════════════════════════════════════════════════════════

    fn outside_play_area(&self, ctx: &Ctx) -> bool {
        let th = ctx.grid.tile.height;
        let top = -ctx.grid.headroom_rows * th;
        let bottom = ctx.grid.rows * th;
        self.body.x < 0 || self.body.x > ctx.max_x() || self.body.y < top || self.body.y > bottom
    }

    /// Egg or grain at the feet, else at the head.
    fn touching_consumable(&self, ctx: &Ctx) -> Option<(i32, i32)> {
        let (tx, ty) = self.body.tile(ctx.ts());
        [(tx, ty), (tx, ty - 1)]
            .into_iter()
            .find(|&(x, y)| ctx.map.tile_at(x, y).is_consumable())
    }
}

/// Velocity along one axis that carries `pos` on to the next multiple of
/// `size`. Keeps the current heading, else the facing, else the nearer edge.
fn finish_step(pos: i32, size: i32, velocity: i32, facing: i32, step: i32) -> i32 {
    let offset = pos.rem_euclid(size);
    if offset == 0 {
        return 0;
    }
    let sign = if velocity != 0 {
        velocity.signum()
    } else if facing != 0 {
        facing
    } else if offset * 2 < size {
        -1
    } else {
        1
    };
    sign * step
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::ContentTag;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const TS: TileSize = TileSize::new(52, 32);

    fn grid_for(map: &TileMap) -> GridConfig {
        GridConfig { tile: TS, cols: map.cols(), rows: map.rows(), headroom_rows: 4 }
    }

    /// Harry whose feet are in tile (tx, ty).
    fn harry_at(tx: i32, ty: i32) -> Harry {
        Harry::new(TS, tx, ty - 1, Direction::Right)
    }

    fn press(f: impl FnOnce(&mut InputSnapshot)) -> InputSnapshot {
        let mut i = InputSnapshot::default();
        f(&mut i);
        i
    }

    /// Run one Harry tick against a map and lifts.
    fn step(h: &mut Harry, map: &TileMap, lifts: &[Lift], input: InputSnapshot) -> (Option<(i32, i32)>, Vec<SoundEvent>) {
        step_with(h, map, lifts, input, &PhysicsConfig::default())
    }

    fn step_with(
        h: &mut Harry,
        map: &TileMap,
        lifts: &[Lift],
        input: InputSnapshot,
        physics: &PhysicsConfig,
    ) -> (Option<(i32, i32)>, Vec<SoundEvent>) {
        let grid = grid_for(map);
        let ctx = Ctx { map, lifts, grid: &grid, physics };
        let mut sounds = vec![];
        let got = h.update(&input, &ctx, &mut sounds);
        (got, sounds)
    }

    fn flat(cols: usize, rows: usize, floor_row: usize) -> TileMap {
        let blank = " ".repeat(cols);
        let floor = "=".repeat(cols);
        let lines: Vec<&str> = (0..rows)
            .map(|r| if r == floor_row { floor.as_str() } else { blank.as_str() })
            .collect();
        TileMap::from_rows(&lines)
    }

    // ── Falling ──

    #[test]
    fn falling_lands_on_floor_below() {
        let mut map = flat(8, 14, 13);
        map.set(5, 11, ContentTag::Floor).unwrap();
        let mut h = harry_at(5, 10);
        h.state = HarryState::Falling;
        h.body.dy = 16;
        step(&mut h, &map, &[], InputSnapshot::default());
        assert_eq!(h.state, HarryState::Still);
        assert_eq!(h.body.bottom(), 11 * 32);
        assert_eq!((h.body.dx, h.body.dy), (0, 0));
    }

    #[test]
    fn fall_speed_is_clamped() {
        let map = flat(4, 40, 39);
        let mut h = harry_at(1, 3);
        h.state = HarryState::Falling;
        h.body.dy = 90;
        for _ in 0..20 {
            step(&mut h, &map, &[], InputSnapshot::default());
            assert!(h.body.dy <= 16);
        }
    }

    #[test]
    fn jump_descent_is_clamped() {
        let map = flat(4, 60, 59);
        let mut h = harry_at(1, 20);
        let jump = press(|i| i.jump = true);
        for _ in 0..30 {
            step(&mut h, &map, &[], jump);
            assert!(h.body.dy <= 16, "dy {}", h.body.dy);
        }
    }

    // ── Walking ──

    #[test]
    fn wall_at_feet_blocks() {
        let map = TileMap::from_rows(&["    ", "  = ", "===="]);
        let mut h = harry_at(1, 1);
        let (_, sounds) = step(&mut h, &map, &[], press(|i| i.right = true));
        assert_eq!(h.body.x, 52);
        assert_eq!(h.state, HarryState::Still);
        assert!(sounds.is_empty());
    }

    #[test]
    fn walking_off_edge_starts_fall() {
        let map = TileMap::from_rows(&[
            "      ",
            "      ",
            "===   ",
            "      ",
            "======",
        ]);
        let mut h = harry_at(2, 1);
        let right = press(|i| i.right = true);
        for _ in 0..3 {
            step(&mut h, &map, &[], right);
            assert_eq!(h.state, HarryState::Walking);
        }
        let (_, sounds) = step(&mut h, &map, &[], right);
        assert_eq!(h.body.x, 156);
        assert_eq!(h.state, HarryState::Falling);
        assert!(sounds.contains(&SoundEvent::Fall));

        for _ in 0..4 {
            step(&mut h, &map, &[], InputSnapshot::default());
        }
        assert_eq!(h.state, HarryState::Still);
        assert_eq!(h.body.bottom(), 4 * 32);
    }

    #[test]
    fn released_key_finishes_the_step() {
        let map = flat(6, 12, 10);
        let mut h = harry_at(1, 9);
        step(&mut h, &map, &[], press(|i| i.right = true));
        assert_eq!(h.body.x, 65);
        for _ in 0..5 {
            step(&mut h, &map, &[], InputSnapshot::default());
        }
        assert_eq!(h.body.x, 104);
        assert_eq!(h.body.dx, 0);
    }

    #[test]
    fn released_climb_finishes_the_row() {
        let map = TileMap::from_rows(&[
            "   ",
            " H ",
            " H ",
            "=H=",
            " H ",
            " H ",
            " H ",
            "===",
        ]);
        let mut h = harry_at(1, 6);
        step(&mut h, &map, &[], press(|i| i.up = true));
        assert_eq!(h.body.y, 160 - 16);
        step(&mut h, &map, &[], InputSnapshot::default());
        assert_eq!((h.body.y, h.body.dy), (128, -16));
        step(&mut h, &map, &[], InputSnapshot::default());
        assert_eq!((h.body.y, h.body.dy), (128, 0));
    }

    #[test]
    fn stopped_axis_is_always_on_the_grid() {
        let map = TileMap::from_rows(&[
            "            ",
            "            ",
            "     H      ",
            "     H      ",
            "==   H==== =",
            "     H      ",
            "     H      ",
            "     H      ",
            "     H      ",
            "============",
        ]);
        let ts = TS;
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut h = harry_at(1, 8);
            for tick in 0..400 {
                let input = InputSnapshot {
                    left: rng.gen_bool(0.3),
                    right: rng.gen_bool(0.3),
                    up: rng.gen_bool(0.3),
                    down: rng.gen_bool(0.3),
                    jump: rng.gen_bool(0.1),
                    ..Default::default()
                };
                step(&mut h, &map, &[], input);
                assert!(!h.is_splat(), "seed {seed} tick {tick}");
                if h.body.dx == 0 {
                    assert!(ts.is_col_aligned(h.body.x), "seed {seed} tick {tick}: {:?}", h.body);
                }
                if h.body.dy == 0 {
                    assert!(ts.is_row_aligned(h.body.y), "seed {seed} tick {tick}: {:?}", h.body);
                }
            }
        }
    }

    #[test]
    fn climbs_to_top_then_steps_off() {
        let map = TileMap::from_rows(&[
            "   ",
            " H ",
            " H ",
            "=H=",
            " H ",
            " H ",
            " H ",
            "===",
        ]);
        let mut h = harry_at(1, 6);
        let up = press(|i| i.up = true);
        let (_, sounds) = step(&mut h, &map, &[], up);
        assert_eq!(sounds, vec![SoundEvent::Ladder]);
        for _ in 0..9 {
            step(&mut h, &map, &[], up);
        }
        assert_eq!(h.body.y, 32);
        assert_eq!(h.state, HarryState::Still);

        let right = press(|i| i.right = true);
        for _ in 0..4 {
            step(&mut h, &map, &[], right);
        }
        assert_eq!(h.body.x, 104);
        assert_ne!(h.state, HarryState::Falling);
    }

    #[test]
    fn no_sideways_mid_climb() {
        let map = TileMap::from_rows(&[
            "   ",
            " H ",
            " H ",
            "=H=",
            " H ",
            " H ",
            " H ",
            "===",
        ]);
        let mut h = harry_at(1, 6);
        step(&mut h, &map, &[], press(|i| i.up = true));
        let (_, sounds) = step(&mut h, &map, &[], press(|i| i.left = true));
        assert_eq!(h.body.x, 52);
        assert!(!sounds.contains(&SoundEvent::Step));
    }

    // ── Jumping ──

    #[test]
    fn held_jump_launches_once() {
        let map = flat(5, 12, 10);
        let mut h = harry_at(2, 9);
        let jump = press(|i| i.jump = true);
        let mut launches = 0;
        for _ in 0..30 {
            let (_, sounds) = step(&mut h, &map, &[], jump);
            launches += sounds.iter().filter(|&&s| s == SoundEvent::Jump).count();
        }
        assert_eq!(launches, 1);
        assert_eq!(h.state, HarryState::Still);
        assert_eq!(h.body.y, 256);

        step(&mut h, &map, &[], InputSnapshot::default());
        let (_, sounds) = step(&mut h, &map, &[], jump);
        assert!(sounds.contains(&SoundEvent::Jump));
    }

    #[test]
    fn jump_arc_returns_to_floor() {
        let map = flat(5, 12, 10);
        let mut h = harry_at(2, 9);
        step(&mut h, &map, &[], press(|i| i.jump = true));
        assert_eq!(h.state, HarryState::Jumping);
        assert_eq!(h.body.y, 256 - 13);
        for _ in 0..7 {
            step(&mut h, &map, &[], InputSnapshot::default());
        }
        assert_eq!(h.state, HarryState::Still);
        assert_eq!(h.body.y, 256);
    }

    #[test]
    fn grabs_ladder_at_head_mid_jump() {
        let map = TileMap::from_rows(&[
            "     ",
            "     ",
            "     ",
            "  H  ",
            "  H  ",
            "  H  ",
            "  H  ",
            "  H  ",
            "     ",
            "     ",
            "=====",
        ]);
        let mut h = harry_at(2, 7);
        h.body.y = 200;
        h.state = HarryState::Jumping;
        h.y_velocity = -9;
        h.body.dy = -9;
        step(&mut h, &map, &[], press(|i| i.up = true));
        assert_eq!((h.body.x, h.body.y), (104, 6 * 32));
        assert_eq!(h.state, HarryState::Still);
        assert_eq!((h.body.dx, h.body.dy, h.y_velocity), (0, 0, 0));
    }

    #[test]
    fn no_ladder_grab_without_steering() {
        let map = TileMap::from_rows(&[
            "     ", "     ", "     ", "  H  ", "  H  ", "  H  ",
            "  H  ", "  H  ", "     ", "     ", "=====",
        ]);
        let mut h = harry_at(2, 7);
        h.body.y = 200;
        h.state = HarryState::Jumping;
        h.y_velocity = -9;
        step(&mut h, &map, &[], InputSnapshot::default());
        assert_eq!(h.state, HarryState::Jumping);
        assert_eq!(h.body.y, 195);
    }

    #[test]
    fn grabs_ladder_at_feet_mid_jump() {
        let map = TileMap::from_rows(&[
            "     ", "     ", "     ", "     ", "  H  ",
            "  H  ", "  H  ", "=====",
        ]);
        let mut h = harry_at(2, 6);
        h.body.y = 70;
        h.state = HarryState::Jumping;
        h.y_velocity = -5;
        step(&mut h, &map, &[], press(|i| i.down = true));
        assert_eq!((h.body.x, h.body.y), (104, 4 * 32 - 64));
        assert_eq!(h.state, HarryState::Still);
        assert_eq!((h.body.dx, h.body.dy), (0, 0));
    }

    #[test]
    fn descending_into_floor_side_bounces() {
        let map = TileMap::from_rows(&["     ", "     ", "     ", "  =  ", "====="]);
        let mut h = harry_at(1, 3);
        h.body.x = 65;
        h.body.y = 60;
        h.body.dx = 13;
        h.state = HarryState::Jumping;
        h.y_velocity = 4;
        step(&mut h, &map, &[], InputSnapshot::default());
        assert_eq!(h.body.dx, -13);
        assert_eq!((h.body.x, h.body.y), (65, 60));
        assert_eq!(h.state, HarryState::Jumping);
    }

    #[test]
    fn jump_lands_between_columns_then_walks_on() {
        let map = flat(6, 12, 10);
        let mut h = harry_at(1, 9);
        step(&mut h, &map, &[], press(|i| i.right = true));
        step(&mut h, &map, &[], press(|i| i.jump = true));
        assert_eq!(h.state, HarryState::Jumping);
        for _ in 0..7 {
            step(&mut h, &map, &[], InputSnapshot::default());
        }
        assert_eq!(h.state, HarryState::Still);
        assert_eq!((h.body.x, h.body.y), (65 + 8 * 13, 256));
        assert_eq!(h.body.dx, 13);
        for _ in 0..4 {
            step(&mut h, &map, &[], InputSnapshot::default());
        }
        assert_eq!((h.body.x, h.body.dx), (208, 0));
    }

    #[test]
    fn bounces_off_screen_edge() {
        let map = flat(5, 12, 10);
        let mut h = harry_at(0, 9);
        h.body.dx = -13;
        h.state = HarryState::Jumping;
        h.y_velocity = -17;
        step(&mut h, &map, &[], InputSnapshot::default());
        assert_eq!(h.body.dx, 13);
        assert_eq!((h.body.x, h.body.y), (0, 256));
    }

    // ── Lifts ──

    #[test]
    fn lands_on_lift_and_rides_it() {
        let map = flat(5, 22, 21);
        let mut lift = Lift::new(TS, 2, 10, Direction::Left, -5, 2, 21);
        let mut h = harry_at(2, 9);
        h.body.y = 246;
        h.state = HarryState::Jumping;
        h.y_velocity = 8;
        step(&mut h, &map, std::slice::from_ref(&lift), InputSnapshot::default());
        assert!(h.on_lift);
        assert_eq!(h.state, HarryState::Still);
        assert_eq!(h.body.bottom(), lift.body.y);

        lift.tick();
        step(&mut h, &map, std::slice::from_ref(&lift), InputSnapshot::default());
        assert_eq!(h.body.bottom(), lift.body.y);
    }

    #[test]
    fn walking_off_lift_falls() {
        let map = flat(5, 22, 21);
        let mut lift = Lift::new(TS, 2, 10, Direction::Left, -5, 2, 21);
        let mut h = harry_at(2, 9);
        h.on_lift = true;
        let right = press(|i| i.right = true);

        lift.tick();
        step(&mut h, &map, std::slice::from_ref(&lift), right);
        assert!(h.on_lift);
        assert_eq!(h.body.x, 117);

        lift.tick();
        let (_, sounds) = step(&mut h, &map, std::slice::from_ref(&lift), right);
        assert!(!h.on_lift);
        assert_eq!(h.state, HarryState::Falling);
        assert!(sounds.contains(&SoundEvent::Fall));
        assert_eq!(h.body.x, 156);

        for _ in 0..40 {
            lift.tick();
            step(&mut h, &map, std::slice::from_ref(&lift), InputSnapshot::default());
        }
        assert_eq!(h.state, HarryState::Still);
        assert_eq!((h.body.x, h.body.dx), (156, 0));
        assert_eq!(h.body.bottom(), 21 * 32);
    }

    #[test]
    fn jumping_off_lift_gets_boost() {
        let map = flat(5, 22, 21);
        let lift = Lift::new(TS, 2, 10, Direction::Left, -5, 2, 21);
        let mut h = harry_at(2, 9);
        h.on_lift = true;
        step(&mut h, &map, std::slice::from_ref(&lift), press(|i| i.jump = true));
        assert!(!h.on_lift);
        assert_eq!(h.body.dy, -17 + 4 - 25);
        assert_eq!(h.body.y, 256 - 5 - 38);
    }

    // ── Landable ladders ──

    fn ladder_in_floor() -> TileMap {
        TileMap::from_rows(&["   ", "   ", "   ", "   ", "=H=", " H ", "==="])
    }

    fn fall_until_still(h: &mut Harry, map: &TileMap, physics: &PhysicsConfig) {
        for _ in 0..20 {
            step_with(h, map, &[], InputSnapshot::default(), physics);
            if h.state == HarryState::Still {
                break;
            }
        }
    }

    #[test]
    fn falling_lands_on_ladder_in_floor() {
        let map = ladder_in_floor();
        let mut h = harry_at(1, 1);
        h.state = HarryState::Falling;
        h.body.dy = 16;
        fall_until_still(&mut h, &map, &PhysicsConfig::default());
        assert_eq!(h.state, HarryState::Still);
        assert_eq!(h.body.bottom(), 4 * 32);
    }

    #[test]
    fn strict_ladders_let_a_fall_through() {
        let map = ladder_in_floor();
        let physics = PhysicsConfig { land_on_ladders: false, ..PhysicsConfig::default() };
        let mut h = harry_at(1, 1);
        h.state = HarryState::Falling;
        h.body.dy = 16;
        fall_until_still(&mut h, &map, &physics);
        assert_eq!(h.state, HarryState::Still);
        assert_eq!(h.body.bottom(), 6 * 32);
    }

    #[test]
    fn jump_lands_on_ladder_in_floor() {
        let map = ladder_in_floor();
        let jumping = || {
            let mut h = harry_at(1, 1);
            h.body.y = 54;
            h.state = HarryState::Jumping;
            h.y_velocity = 8;
            h
        };

        let mut h = jumping();
        step(&mut h, &map, &[], InputSnapshot::default());
        assert_eq!(h.state, HarryState::Still);
        assert_eq!(h.body.bottom(), 4 * 32);

        let physics = PhysicsConfig { land_on_ladders: false, ..PhysicsConfig::default() };
        let mut h = jumping();
        step_with(&mut h, &map, &[], InputSnapshot::default(), &physics);
        assert_eq!(h.state, HarryState::Jumping);
        assert_eq!(h.body.y, 66);
    }

    // ── Boundary and pickups ──

    #[test]
    fn falling_out_of_the_bottom_is_splat() {
        let map = flat(4, 4, 99);
        let mut h = harry_at(1, 3);
        h.body.y = 120;
        h.state = HarryState::Falling;
        h.body.dy = 16;
        let (_, sounds) = step(&mut h, &map, &[], InputSnapshot::default());
        assert!(h.is_splat());
        assert_eq!(sounds, vec![SoundEvent::Splat]);

        let before = h.body.clone();
        step(&mut h, &map, &[], press(|i| i.left = true));
        assert_eq!(h.body, before);
    }

    #[test]
    fn walks_into_egg_at_feet() {
        let mut map = flat(12, 12, 10);
        map.set(8, 9, ContentTag::Egg).unwrap();
        let mut h = harry_at(7, 9);
        let right = press(|i| i.right = true);
        let (got, _) = step(&mut h, &map, &[], right);
        assert_eq!(got, None);
        let (got, _) = step(&mut h, &map, &[], right);
        assert_eq!(got, Some((8, 9)));
    }

    #[test]
    fn grain_at_head_height_is_found() {
        let mut map = flat(6, 12, 10);
        map.set(2, 8, ContentTag::Grain).unwrap();
        let mut h = harry_at(1, 9);
        let right = press(|i| i.right = true);
        step(&mut h, &map, &[], right);
        let (got, _) = step(&mut h, &map, &[], right);
        assert_eq!(got, Some((2, 8)));
    }
}
