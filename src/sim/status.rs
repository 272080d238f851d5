/// Score, time, bonus and lives.
///
/// The Level only talks to a `StatusSink`; `Status` is the bookkeeping the
/// game ships with. Time is kept in quarter units so the per-tick 0.25
/// decrement stays exact.

use tracing::info;

pub const START_TIME: u32 = 900;
pub const START_LIVES: u32 = 5;
pub const EGG_POINTS: u32 = 100;
pub const GRAIN_POINTS: u32 = 50;
/// Status ticks of frozen time per grain Harry picks up.
pub const GRAIN_PAUSE: u32 = 20;
/// Score that converts into an extra life.
pub const LIFE_EVERY: u32 = 10_000;

const BONUS_STEP: u32 = 10;
const BONUS_TICKS: u32 = 5;
const TALLY_STEP: u32 = 75;
const TALLY_FLUSH: u32 = 50;

/// What the Level reports into and asks about.
pub trait StatusSink {
    fn on_egg_collected(&mut self);
    fn on_grain_collected(&mut self);
    fn on_time_tick(&mut self, paused: bool);
    fn is_time_up(&self) -> bool;
    fn lives_remaining(&self) -> u32;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub score: u32,
    /// Zero based.
    pub level: usize,
    pub lives: u32,
    pub bonus: u32,
    time_quarters: u32,
    bonus_tick: u32,
    pause: u32,
}

impl Status {
    pub fn new(level: usize) -> Self {
        Status {
            score: 0,
            level,
            lives: START_LIVES,
            bonus: Self::level_bonus(level),
            time_quarters: START_TIME * 4,
            bonus_tick: 0,
            pause: 0,
        }
    }

    fn level_bonus(level: usize) -> u32 {
        1000 * (level as u32 + 1)
    }

    /// Whole seconds left, for display.
    pub fn time(&self) -> u32 {
        self.time_quarters / 4
    }

    pub fn reset_time(&mut self) {
        self.time_quarters = START_TIME * 4;
    }

    pub fn reset_new_level(&mut self) {
        self.reset_time();
        self.pause = 0;
        self.bonus_tick = 0;
        self.bonus = Self::level_bonus(self.level);
    }

    pub fn advance_level(&mut self) {
        self.level += 1;
        self.reset_new_level();
    }

    /// Take a life. True while any remain.
    pub fn on_harry_died(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.reset_time();
        self.pause = 0;
        info!(lives = self.lives, "life lost");
        self.lives > 0
    }

    fn add_score(&mut self, points: u32) {
        self.score += points;
        if self.score > LIFE_EVERY {
            self.score -= LIFE_EVERY;
            self.lives += 1;
            info!(lives = self.lives, "extra life");
        }
    }

    /// Move one chunk of bonus into the score. False once the bonus is empty.
    pub fn tally_step(&mut self) -> bool {
        if self.bonus == 0 {
            return false;
        }
        let chunk = if self.bonus < TALLY_FLUSH {
            self.bonus
        } else {
            self.bonus.min(TALLY_STEP)
        };
        self.bonus -= chunk;
        self.add_score(chunk);
        true
    }

    pub fn tally_bonus(&mut self) {
        while self.tally_step() {}
    }
}

impl StatusSink for Status {
    fn on_egg_collected(&mut self) {
        self.add_score(EGG_POINTS);
    }

    fn on_grain_collected(&mut self) {
        self.add_score(GRAIN_POINTS);
        self.pause += GRAIN_PAUSE;
    }

    fn on_time_tick(&mut self, paused: bool) {
        if paused {
            return;
        }
        if self.pause > 0 {
            self.pause -= 1;
            return;
        }
        self.time_quarters = self.time_quarters.saturating_sub(1);
        self.bonus_tick += 1;
        if self.bonus_tick == BONUS_TICKS {
            self.bonus_tick = 0;
            self.bonus = self.bonus.saturating_sub(BONUS_STEP);
        }
    }

    fn is_time_up(&self) -> bool {
        self.time_quarters == 0
    }

    fn lives_remaining(&self) -> u32 {
        self.lives
    }
}
