/// Entry point and game loop.

mod ui;

use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::execute;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use henhouse::config::GameConfig;
use henhouse::domain::entity::InputSnapshot;
use henhouse::sim::event::{AudioSink, DeathCause, SoundEvent, TickOutcome};
use henhouse::sim::level::Level;
use henhouse::sim::loader::{load_levels, LevelLayout};
use henhouse::sim::status::{Status, StatusSink};
use ui::gamepad::GamepadState;
use ui::input::{InputState, KEYS_CONFIRM, KEYS_DOWN, KEYS_JUMP, KEYS_LEFT, KEYS_PAUSE, KEYS_QUIT, KEYS_RIGHT, KEYS_UP};
use ui::renderer::{Banner, Renderer};
use ui::sound::{SoundEngine, Speaker};

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "henhouse.log";

/// Ticks the "get ready" banner stays up unless a key skips it.
const READY_TICKS: u32 = 30;
/// Ticks Harry flashes before a life is taken.
const DYING_TICKS: u32 = 30;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    GetReady,
    Playing,
    Dying(DeathCause),
    Tally,
    GameOver,
    Victory,
}

impl Phase {
    fn banner(self, paused: bool) -> Banner {
        if paused {
            return Banner::Paused;
        }
        match self {
            Phase::GetReady => Banner::GetReady,
            Phase::Playing => Banner::None,
            Phase::Dying(cause) => Banner::Died(cause),
            Phase::Tally => Banner::Tally,
            Phase::GameOver => Banner::GameOver,
            Phase::Victory => Banner::Victory,
        }
    }
}

/// Everything the loop mutates between frames.
struct Session<'a> {
    layouts: &'a [LevelLayout],
    config: &'a GameConfig,
    level: Level,
    status: Status,
    phase: Phase,
    paused: bool,
    /// Ticks spent in the current phase.
    phase_ticks: u32,
    anim_tick: u32,
}

impl<'a> Session<'a> {
    fn new(layouts: &'a [LevelLayout], config: &'a GameConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let start = config.timing.starting_level.min(layouts.len().saturating_sub(1));
        let layout = layouts.get(start).ok_or("no levels to play")?;
        let level = Level::new(layout.clone(), config)?;
        Ok(Session {
            layouts,
            config,
            level,
            status: Status::new(start),
            phase: Phase::GetReady,
            paused: config.timing.start_paused,
            phase_ticks: 0,
            anim_tick: 0,
        })
    }

    fn enter(&mut self, phase: Phase) {
        info!(from = ?self.phase, to = ?phase, "phase change");
        self.phase = phase;
        self.phase_ticks = 0;
    }

    /// Load the level `status.level` points at, or finish the game.
    fn next_level(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.status.advance_level();
        match self.layouts.get(self.status.level) {
            Some(layout) => {
                self.level = Level::new(layout.clone(), self.config)?;
                self.enter(Phase::GetReady);
            }
            None => self.enter(Phase::Victory),
        }
        Ok(())
    }

    fn is_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver | Phase::Victory)
    }
}

fn main() {
    init_tracing();

    let config = GameConfig::load();
    let layouts = match load_levels(&config) {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, "built-in levels failed to load");
            eprintln!("Could not load levels: {e}");
            return;
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut kb = InputState::new();
    let enhanced = matches!(crossterm::terminal::supports_keyboard_enhancement(), Ok(true))
        && execute!(
            io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )
        .is_ok();
    kb.honor_release = enhanced;

    let sound = SoundEngine::new();

    let result = game_loop(&layouts, &config, &mut renderer, &mut kb, sound.as_ref());

    if enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(status) => {
            println!();
            println!("Thanks for playing Henhouse!");
            println!("Final Score: {}  (reached level {})", status.score, status.level + 1);
        }
        Err(e) => {
            error!(error = %e, "game loop failed");
            eprintln!("Game error: {e}");
        }
    }
}

/// Log to a file; the terminal belongs to the renderer.
fn init_tracing() {
    let Ok(file) = File::create(LOG_FILE) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .compact()
        .init();
}

fn game_loop(
    layouts: &[LevelLayout],
    config: &GameConfig,
    renderer: &mut Renderer,
    kb: &mut InputState,
    sound: Option<&SoundEngine>,
) -> Result<Status, Box<dyn std::error::Error>> {
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    info!(connected = gp.connected, levels = layouts.len(), "starting game loop");

    let mut session = Session::new(layouts, config)?;
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);
    let status_rate = Duration::from_millis(config.timing.status_tick_ms);
    let mut last_tick = Instant::now();
    let mut last_status = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.quit_pressed() {
            break;
        }
        if session.is_over() && (kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed()) {
            break;
        }

        let can_pause = matches!(session.phase, Phase::GetReady | Phase::Playing);
        if can_pause && (kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed()) {
            session.paused = !session.paused;
            info!(paused = session.paused, "pause toggled");
        }

        // Any movement key cuts the ready banner short.
        if session.phase == Phase::GetReady && !session.paused {
            let moved = [KEYS_LEFT, KEYS_RIGHT, KEYS_UP, KEYS_DOWN, KEYS_JUMP]
                .iter()
                .any(|keys| kb.any_pressed(keys));
            if moved || gp.confirm_pressed() {
                session.enter(Phase::Playing);
            }
        }

        if last_status.elapsed() >= status_rate {
            if session.phase == Phase::Playing {
                session.status.on_time_tick(session.paused);
            }
            last_status = Instant::now();
        }

        if last_tick.elapsed() >= tick_rate {
            let mut input = kb.snapshot(session.paused);
            gp.merge_into(&mut input);
            step(&mut session, input, sound)?;
            last_tick = Instant::now();
        }

        let banner = session.phase.banner(session.paused);
        renderer.render(&session.level, &session.status, banner, session.anim_tick)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(session.status)
}

/// One fixed-rate tick of whichever phase is active.
fn step(
    session: &mut Session,
    input: InputSnapshot,
    sound: Option<&SoundEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
    session.anim_tick = session.anim_tick.wrapping_add(1);
    if !session.paused {
        session.phase_ticks += 1;
    }

    match session.phase {
        Phase::GetReady => {
            if !session.paused && session.phase_ticks >= READY_TICKS {
                session.enter(Phase::Playing);
            }
        }
        // The level holds itself still while `input.paused` is set.
        Phase::Playing => {
            let mut speaker = Speaker(sound);
            let report = session.level.tick(&input, &mut session.status, &mut speaker);
            match report.outcome {
                TickOutcome::Running => {}
                TickOutcome::Died(cause) => {
                    // Splat already sounded from inside the tick.
                    if cause != DeathCause::Splat {
                        speaker.play(SoundEvent::Splat);
                    }
                    session.enter(Phase::Dying(cause));
                }
                TickOutcome::Complete => {
                    if let Some(sfx) = sound {
                        sfx.play_clear();
                    }
                    session.enter(Phase::Tally);
                }
            }
        }
        Phase::Dying(_) => {
            if session.phase_ticks >= DYING_TICKS {
                if session.status.on_harry_died() {
                    session.level.reset();
                    session.enter(Phase::GetReady);
                } else {
                    session.enter(Phase::GameOver);
                }
            }
        }
        Phase::Tally => {
            if session.status.tally_step() {
                if let Some(sfx) = sound {
                    sfx.play_tally();
                }
            } else {
                session.next_level()?;
            }
        }
        Phase::GameOver | Phase::Victory => {}
    }
    Ok(())
}
