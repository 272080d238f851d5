/// Events emitted during a simulation tick.
/// The presentation layer consumes these for HUD flashes and sound.

pub use crate::domain::entity::SoundEvent;

/// Why Harry lost a life.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeathCause {
    Splat,
    HenCollision,
    LiftSquish,
    TimeUp,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    EggCollected { tx: i32, ty: i32 },
    GrainCollected { tx: i32, ty: i32 },
    HenAteGrain { hen: usize, tx: i32, ty: i32 },
    HarryDied(DeathCause),
    LevelComplete,
}

/// How a tick ended for the driver.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TickOutcome {
    Running,
    Died(DeathCause),
    Complete,
}

#[derive(Clone, Debug)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub events: Vec<GameEvent>,
}

/// Fire-and-forget sound output. Implementations must not block.
pub trait AudioSink {
    fn play(&mut self, event: SoundEvent);
}

/// Discards every cue; used headless and in tests.
impl AudioSink for () {
    fn play(&mut self, _event: SoundEvent) {}
}

/// Records cues in order.
impl AudioSink for Vec<SoundEvent> {
    fn play(&mut self, event: SoundEvent) {
        self.push(event);
    }
}
