/// One playable level: the map, the movers and the egg count.
///
/// Processing order per tick:
///   1. Pause gate (nothing moves while paused)
///   2. Hens (every `hen_every` ticks), eating grain as they go
///   3. Lifts
///   4. Harry
///   5. Consume whatever Harry is touching
///   6. Death check: splat, lift squish, hen collision, time up
///   7. Win check
///
/// The Level never owns score, time or lives; it reports into a
/// `StatusSink` and asks it whether time is up.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::{GameConfig, GridConfig, PhysicsConfig, RulesConfig};
use crate::domain::entity::{EntitySnapshot, InputSnapshot, SoundEvent};
use crate::domain::geometry::TileSize;
use crate::domain::harry::{Ctx, Harry};
use crate::domain::hen::Hen;
use crate::domain::lift::Lift;
use crate::domain::rules;
use crate::domain::tile::ContentTag;
use crate::domain::tile_map::TileMap;

use super::event::{AudioSink, DeathCause, GameEvent, TickOutcome, TickReport};
use super::loader::{LevelError, LevelLayout, Spawn, SpawnKind};
use super::status::StatusSink;

pub struct Level {
    pub name: String,
    pub map: TileMap,
    pub harry: Harry,
    pub hens: Vec<Hen>,
    pub lifts: Vec<Lift>,
    pub eggs_collected: usize,
    pub egg_total: usize,
    spawns: Vec<Spawn>,
    grid: GridConfig,
    physics: PhysicsConfig,
    rules: RulesConfig,
    hen_every: u64,
    tick: u64,
    seeds: ChaCha8Rng,
}

impl Level {
    pub fn new(layout: LevelLayout, config: &GameConfig) -> Result<Self, LevelError> {
        let harry_spawn = *layout.harry_spawn().ok_or(LevelError::MissingHarry)?;
        let seeds = match config.timing.hen_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let ts = config.grid.tile;
        let egg_total = layout.egg_total();

        let mut level = Level {
            name: layout.name,
            map: layout.map,
            harry: Harry::new(ts, harry_spawn.tx, harry_spawn.ty - 1, harry_spawn.facing),
            hens: vec![],
            lifts: vec![],
            eggs_collected: 0,
            egg_total,
            spawns: layout.spawns,
            grid: config.grid,
            physics: config.physics,
            rules: config.rules,
            hen_every: u64::from(config.timing.hen_every.max(1)),
            tick: 0,
            seeds,
        };
        level.spawn_movers();
        info!(
            name = %level.name,
            eggs = egg_total,
            hens = level.hens.len(),
            lifts = level.lifts.len(),
            "level loaded"
        );
        Ok(level)
    }

    /// Put every mover back at its spawn. Consumed eggs and grain stay gone.
    pub fn reset(&mut self) {
        debug!(name = %self.name, "level reset");
        self.spawn_movers();
    }

    fn spawn_movers(&mut self) {
        let ts = self.grid.tile;
        let p = &self.physics;
        self.hens.clear();
        self.lifts.clear();
        self.tick = 0;

        for spawn in &self.spawns {
            match spawn.kind {
                SpawnKind::Harry => {
                    self.harry = Harry::new(ts, spawn.tx, spawn.ty - 1, spawn.facing);
                }
                SpawnKind::Hen => {
                    let seed = self.seeds.gen::<u64>();
                    self.hens.push(Hen::new(ts, spawn.tx, spawn.ty - 1, spawn.facing, p.hen_step_x, p.hen_step_y, seed));
                }
                SpawnKind::Lift => {
                    self.lifts.push(Lift::new(
                        ts,
                        spawn.tx,
                        spawn.ty,
                        spawn.facing,
                        p.lift_velocity,
                        p.lift_disappear_row,
                        p.lift_reappear_row,
                    ));
                }
            }
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Tick
    // ══════════════════════════════════════════════════════════════

    pub fn tick(
        &mut self,
        input: &InputSnapshot,
        status: &mut dyn StatusSink,
        audio: &mut dyn AudioSink,
    ) -> TickReport {
        let mut events = vec![];
        if input.paused {
            return TickReport { outcome: TickOutcome::Running, events };
        }
        self.tick += 1;

        if self.tick % self.hen_every == 0 {
            self.update_hens(&mut events);
        }
        for lift in &mut self.lifts {
            lift.tick();
        }

        let mut sounds = vec![];
        let ctx = Ctx {
            map: &self.map,
            lifts: &self.lifts,
            grid: &self.grid,
            physics: &self.physics,
        };
        let pickup = self.harry.update(input, &ctx, &mut sounds);
        for sound in sounds {
            audio.play(sound);
        }

        if let Some((tx, ty)) = pickup {
            match self.map.tile_at(tx, ty) {
                ContentTag::Egg if self.consume_egg(tx, ty, status) => {
                    audio.play(SoundEvent::Egg);
                    events.push(GameEvent::EggCollected { tx, ty });
                }
                ContentTag::Grain if self.consume_grain(tx, ty, status) => {
                    audio.play(SoundEvent::Grain);
                    events.push(GameEvent::GrainCollected { tx, ty });
                }
                _ => {}
            }
        }

        if let Some(cause) = self.death_cause(status) {
            info!(?cause, name = %self.name, "harry died");
            events.push(GameEvent::HarryDied(cause));
            return TickReport { outcome: TickOutcome::Died(cause), events };
        }

        if self.all_eggs_collected() {
            info!(name = %self.name, eggs = self.eggs_collected, "level complete");
            events.push(GameEvent::LevelComplete);
            return TickReport { outcome: TickOutcome::Complete, events };
        }

        TickReport { outcome: TickOutcome::Running, events }
    }

    fn update_hens(&mut self, events: &mut Vec<GameEvent>) {
        let ts = self.grid.tile;
        for (i, hen) in self.hens.iter_mut().enumerate() {
            let Some((tx, ty)) = hen.update(&self.map, ts) else {
                continue;
            };
            if self.map.tile_at(tx, ty) == ContentTag::Grain && self.map.remove(tx, ty).is_ok() {
                events.push(GameEvent::HenAteGrain { hen: i, tx, ty });
            }
        }
    }

    fn death_cause(&self, status: &dyn StatusSink) -> Option<DeathCause> {
        if self.harry.is_splat() {
            return Some(DeathCause::Splat);
        }
        if self.check_lift_death() {
            return Some(DeathCause::LiftSquish);
        }
        if self.check_collision() {
            return Some(DeathCause::HenCollision);
        }
        if status.is_time_up() {
            return Some(DeathCause::TimeUp);
        }
        None
    }

    // ══════════════════════════════════════════════════════════════
    // Rules
    // ══════════════════════════════════════════════════════════════

    pub fn all_eggs_collected(&self) -> bool {
        rules::all_eggs_collected(self.eggs_collected, self.egg_total, self.rules.easy_mode)
    }

    pub fn check_collision(&self) -> bool {
        rules::check_collision(&self.harry.body, self.hens.iter().map(|h| &h.body), &self.rules, self.grid.tile)
    }

    pub fn check_lift_death(&self) -> bool {
        let disappear_y = self.physics.lift_disappear_row * self.grid.tile.height;
        rules::check_lift_death(&self.harry.body, self.harry.on_lift, disappear_y)
    }

    /// Take the egg at `(tx, ty)`. An already empty tile is a no-op.
    pub fn consume_egg(&mut self, tx: i32, ty: i32, status: &mut dyn StatusSink) -> bool {
        if !self.take(tx, ty, ContentTag::Egg) {
            return false;
        }
        self.eggs_collected += 1;
        status.on_egg_collected();
        true
    }

    /// Take the grain at `(tx, ty)` on Harry's behalf.
    pub fn consume_grain(&mut self, tx: i32, ty: i32, status: &mut dyn StatusSink) -> bool {
        if !self.take(tx, ty, ContentTag::Grain) {
            return false;
        }
        status.on_grain_collected();
        true
    }

    fn take(&mut self, tx: i32, ty: i32, tag: ContentTag) -> bool {
        if self.map.tile_at(tx, ty) != tag {
            debug!(tx, ty, ?tag, "nothing to consume");
            return false;
        }
        self.map.remove(tx, ty).is_ok()
    }

    /// Read-only view of every mover, back to front: lifts, hens, Harry.
    pub fn snapshots(&self) -> Vec<EntitySnapshot> {
        let mut out: Vec<EntitySnapshot> = self.lifts.iter().map(Lift::snapshot).collect();
        out.extend(self.hens.iter().map(Hen::snapshot));
        out.push(self.harry.snapshot());
        out
    }

    pub fn tile_size(&self) -> TileSize {
        self.grid.tile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::HarryState;
    use crate::sim::loader::parse_level;

    #[derive(Default)]
    struct Counting {
        eggs: u32,
        grain: u32,
        time_up: bool,
    }

    impl StatusSink for Counting {
        fn on_egg_collected(&mut self) {
            self.eggs += 1;
        }
        fn on_grain_collected(&mut self) {
            self.grain += 1;
        }
        fn on_time_tick(&mut self, _paused: bool) {}
        fn is_time_up(&self) -> bool {
            self.time_up
        }
        fn lives_remaining(&self) -> u32 {
            5
        }
    }

    /// Level text built up token by token on the full grid.
    struct Sketch(Vec<Vec<&'static str>>);

    impl Sketch {
        fn new() -> Self {
            Sketch(vec![vec!["."; 22]; 22])
        }

        fn put(mut self, tx: usize, ty: usize, tok: &'static str) -> Self {
            self.0[ty][tx] = tok;
            self
        }

        fn floor(mut self, ty: usize) -> Self {
            self.0[ty].iter_mut().for_each(|t| *t = "f");
            self
        }

        fn build_with(self, config: &GameConfig) -> Level {
            let text: Vec<String> = self.0.iter().map(|row| row.join(" ")).collect();
            let layout = parse_level(&text.join("\n"), &config.grid).unwrap();
            Level::new(layout, config).unwrap()
        }

        fn build(self) -> Level {
            self.build_with(&config())
        }
    }

    fn config() -> GameConfig {
        let mut c = GameConfig::default();
        c.timing.hen_seed = Some(7);
        c
    }

    fn right() -> InputSnapshot {
        InputSnapshot { right: true, ..Default::default() }
    }

    fn run(level: &mut Level, input: InputSnapshot, status: &mut Counting) -> TickReport {
        level.tick(&input, status, &mut ())
    }

    #[test]
    fn egg_pickup_reports_once() {
        let mut level = Sketch::new()
            .put(7, 9, "cr")
            .put(8, 9, "e")
            .put(12, 9, "e")
            .floor(10)
            .build();
        let mut status = Counting::default();
        let mut sounds: Vec<SoundEvent> = vec![];

        level.tick(&right(), &mut status, &mut sounds);
        let report = level.tick(&right(), &mut status, &mut sounds);

        assert_eq!(level.map.tile_at(8, 9), ContentTag::None);
        assert_eq!(status.eggs, 1);
        assert_eq!(level.eggs_collected, 1);
        assert!(report.events.contains(&GameEvent::EggCollected { tx: 8, ty: 9 }));
        assert!(sounds.contains(&SoundEvent::Egg));
        assert_eq!(report.outcome, TickOutcome::Running);

        run(&mut level, right(), &mut status);
        assert_eq!(status.eggs, 1);
    }

    #[test]
    fn double_consume_is_a_no_op() {
        let mut level = Sketch::new().put(1, 9, "cr").put(5, 9, "e").put(6, 9, "g").floor(10).build();
        let mut status = Counting::default();
        assert!(level.consume_egg(5, 9, &mut status));
        assert!(!level.consume_egg(5, 9, &mut status));
        assert!(!level.consume_egg(1, 10, &mut status));
        assert_eq!((status.eggs, level.eggs_collected), (1, 1));

        assert!(level.consume_grain(6, 9, &mut status));
        assert!(!level.consume_grain(6, 9, &mut status));
        assert_eq!(status.grain, 1);
    }

    #[test]
    fn collecting_last_egg_completes() {
        let mut level = Sketch::new().put(7, 9, "cr").put(8, 9, "e").floor(10).build();
        let mut status = Counting::default();
        run(&mut level, right(), &mut status);
        let report = run(&mut level, right(), &mut status);
        assert_eq!(report.outcome, TickOutcome::Complete);
        assert!(report.events.contains(&GameEvent::LevelComplete));
    }

    #[test]
    fn easy_mode_needs_one_egg() {
        let mut c = config();
        c.rules.easy_mode = true;
        let mut level = Sketch::new()
            .put(7, 9, "cr")
            .put(8, 9, "e")
            .put(15, 9, "e")
            .floor(10)
            .build_with(&c);
        let mut status = Counting::default();
        run(&mut level, right(), &mut status);
        assert_eq!(run(&mut level, right(), &mut status).outcome, TickOutcome::Complete);
    }

    #[test]
    fn riding_lift_past_top_squishes() {
        let mut level = Sketch::new().put(1, 21, "cr").put(10, 3, "-l").put(20, 20, "e").build();
        let lift_y = level.lifts[0].body.y;
        level.harry.body.x = level.lifts[0].body.x;
        level.harry.body.y = lift_y - level.harry.body.h;
        level.harry.on_lift = true;

        let mut status = Counting::default();
        let mut outcome = TickOutcome::Running;
        for _ in 0..20 {
            outcome = run(&mut level, InputSnapshot::default(), &mut status).outcome;
            if outcome != TickOutcome::Running {
                break;
            }
            assert!(level.harry.on_lift);
        }
        assert_eq!(outcome, TickOutcome::Died(DeathCause::LiftSquish));
    }

    #[test]
    fn falling_off_the_world_is_splat() {
        let mut level = Sketch::new()
            .put(2, 20, "cr")
            .put(0, 21, "f")
            .put(1, 21, "f")
            .put(2, 21, "f")
            .put(3, 21, "f")
            .put(20, 5, "e")
            .build();
        let mut status = Counting::default();
        let mut sounds: Vec<SoundEvent> = vec![];
        let mut outcome = TickOutcome::Running;
        for _ in 0..30 {
            outcome = level.tick(&right(), &mut status, &mut sounds).outcome;
            if outcome != TickOutcome::Running {
                break;
            }
        }
        assert_eq!(outcome, TickOutcome::Died(DeathCause::Splat));
        assert_eq!(level.harry.state, HarryState::Splat);
        assert_eq!(sounds.last(), Some(&SoundEvent::Splat));
    }

    #[test]
    fn hens_move_every_other_tick() {
        let mut level = Sketch::new().put(1, 9, "cr").put(10, 9, "hr").put(20, 9, "e").floor(10).build();
        let mut status = Counting::default();
        let x0 = level.hens[0].body.x;
        run(&mut level, InputSnapshot::default(), &mut status);
        assert_eq!(level.hens[0].body.x, x0);
        run(&mut level, InputSnapshot::default(), &mut status);
        assert_eq!(level.hens[0].body.x, x0 + 13);
    }

    #[test]
    fn hen_eats_grain_without_scoring() {
        let mut level = Sketch::new()
            .put(1, 9, "cr")
            .put(10, 9, "hr")
            .put(11, 9, "g")
            .put(20, 9, "e")
            .floor(10)
            .build();
        let mut status = Counting::default();
        run(&mut level, InputSnapshot::default(), &mut status);
        let report = run(&mut level, InputSnapshot::default(), &mut status);
        assert_eq!(level.map.tile_at(11, 9), ContentTag::None);
        assert!(report.events.contains(&GameEvent::HenAteGrain { hen: 0, tx: 11, ty: 9 }));
        assert_eq!(status.grain, 0);
    }

    #[test]
    fn touching_hen_is_fatal_unless_friendly() {
        let sketch = || Sketch::new().put(5, 9, "cr").put(6, 9, "hl").put(20, 9, "e").floor(10);
        let mut level = sketch().build();
        level.hens[0].body.x = level.harry.body.x;
        let mut status = Counting::default();
        let report = run(&mut level, InputSnapshot::default(), &mut status);
        assert_eq!(report.outcome, TickOutcome::Died(DeathCause::HenCollision));

        let mut c = config();
        c.rules.hens_friendly = true;
        let mut level = sketch().build_with(&c);
        level.hens[0].body.x = level.harry.body.x;
        assert_eq!(run(&mut level, InputSnapshot::default(), &mut status).outcome, TickOutcome::Running);
    }

    #[test]
    fn time_up_kills() {
        let mut level = Sketch::new().put(1, 9, "cr").put(20, 9, "e").floor(10).build();
        let mut status = Counting { time_up: true, ..Default::default() };
        let report = run(&mut level, InputSnapshot::default(), &mut status);
        assert_eq!(report.outcome, TickOutcome::Died(DeathCause::TimeUp));
    }

    #[test]
    fn pause_freezes_everything() {
        let mut level = Sketch::new().put(1, 9, "cr").put(10, 9, "hr").put(20, 9, "e").floor(10).build();
        let mut status = Counting::default();
        let paused = InputSnapshot { paused: true, right: true, ..Default::default() };
        let before = level.snapshots();
        for _ in 0..4 {
            run(&mut level, paused, &mut status);
        }
        assert_eq!(level.snapshots(), before);
    }

    #[test]
    fn reset_respawns_but_keeps_eaten_eggs() {
        let mut level = Sketch::new()
            .put(7, 9, "cr")
            .put(8, 9, "e")
            .put(15, 9, "e")
            .put(3, 9, "hr")
            .floor(10)
            .build();
        let mut status = Counting::default();
        run(&mut level, right(), &mut status);
        run(&mut level, right(), &mut status);
        assert_eq!(level.eggs_collected, 1);

        level.reset();
        assert_eq!((level.harry.body.x, level.harry.body.y), (7 * 52, 8 * 32));
        assert_eq!(level.hens[0].body.x, 3 * 52);
        assert_eq!(level.map.tile_at(8, 9), ContentTag::None);
        assert_eq!(level.eggs_collected, 1);
    }

    #[test]
    fn snapshots_draw_harry_last() {
        let level = Sketch::new().put(1, 9, "cr").put(10, 9, "hr").put(4, 5, "-r").floor(10).build();
        let snaps = level.snapshots();
        assert_eq!(snaps.len(), 3);
        assert!(matches!(snaps[2].kind, crate::domain::entity::EntityKind::Harry(_)));
    }
}
