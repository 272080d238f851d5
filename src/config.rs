/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// The result is built once at startup and passed around by reference.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

use crate::domain::geometry::TileSize;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub grid: GridConfig,
    pub physics: PhysicsConfig,
    pub rules: RulesConfig,
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Copy, Debug)]
pub struct GridConfig {
    pub tile: TileSize,
    pub cols: i32,
    pub rows: i32,
    /// Rows above the top of the grid Harry may jump into without dying.
    pub headroom_rows: i32,
}

/// Velocities are pixels per tick; negative y is up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicsConfig {
    pub harry_step_x: i32,
    pub harry_step_y: i32,
    pub fall_velocity: i32,
    pub max_fall_velocity: i32,
    pub jump_velocity: i32,
    pub gravity: i32,
    pub lift_jump_boost: i32,
    pub hen_step_x: i32,
    pub hen_step_y: i32,
    pub lift_velocity: i32,
    pub lift_disappear_row: i32,
    pub lift_reappear_row: i32,
    /// Ladder tiles flanked by floor catch a falling Harry like floor does.
    pub land_on_ladders: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RulesConfig {
    /// One egg is enough to finish a level.
    pub easy_mode: bool,
    pub hens_friendly: bool,
    /// Touching only a hen's head row is survivable.
    pub hens_jumpable: bool,
    /// Pixels shaved off each side of Harry and hen boxes before overlap tests.
    pub collision_inset: i32,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    /// Hens move once every `hen_every` ticks.
    pub hen_every: u32,
    pub status_tick_ms: u64,
    pub start_paused: bool,
    pub starting_level: usize,
    /// Fixed seed for hen RNGs; random when absent.
    pub hen_seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub pause: Vec<String>,
    pub confirm: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    grid: TomlGrid,
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlGrid {
    #[serde(default = "default_tile_width")]
    tile_width: i32,
    #[serde(default = "default_tile_height")]
    tile_height: i32,
    #[serde(default = "default_cols")]
    cols: i32,
    #[serde(default = "default_rows")]
    rows: i32,
    #[serde(default = "default_headroom")]
    headroom_rows: i32,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_harry_step_x")]
    harry_step_x: i32,
    #[serde(default = "default_harry_step_y")]
    harry_step_y: i32,
    #[serde(default = "default_fall")]
    fall_velocity: i32,
    #[serde(default = "default_max_fall")]
    max_fall_velocity: i32,
    #[serde(default = "default_jump")]
    jump_velocity: i32,
    #[serde(default = "default_gravity")]
    gravity: i32,
    #[serde(default = "default_lift_jump_boost")]
    lift_jump_boost: i32,
    #[serde(default = "default_hen_step_x")]
    hen_step_x: i32,
    #[serde(default = "default_hen_step_y")]
    hen_step_y: i32,
    #[serde(default = "default_lift_velocity")]
    lift_velocity: i32,
    #[serde(default = "default_lift_disappear")]
    lift_disappear_row: i32,
    #[serde(default = "default_lift_reappear")]
    lift_reappear_row: i32,
    #[serde(default = "default_true")]
    land_on_ladders: bool,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default)]
    easy_mode: bool,
    #[serde(default)]
    hens_friendly: bool,
    #[serde(default)]
    hens_jumpable: bool,
    #[serde(default = "default_inset")]
    collision_inset: i32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_hen_every")]
    hen_every: u32,
    #[serde(default = "default_status_tick")]
    status_tick_ms: u64,
    #[serde(default)]
    start_paused: bool,
    #[serde(default)]
    starting_level: usize,
    #[serde(default)]
    hen_seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_pause")]
    pause: Vec<String>,
    #[serde(default = "default_pad_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_tile_width() -> i32 { 52 }
fn default_tile_height() -> i32 { 32 }
fn default_cols() -> i32 { 22 }
fn default_rows() -> i32 { 22 }
fn default_headroom() -> i32 { 4 }

fn default_harry_step_x() -> i32 { 13 }   // quarter tile
fn default_harry_step_y() -> i32 { 16 }   // half tile
fn default_fall() -> i32 { 16 }
fn default_max_fall() -> i32 { 16 }
fn default_jump() -> i32 { -17 }
fn default_gravity() -> i32 { 4 }
fn default_lift_jump_boost() -> i32 { -25 } // 1.5x jump
fn default_hen_step_x() -> i32 { 13 }
fn default_hen_step_y() -> i32 { 16 }
fn default_lift_velocity() -> i32 { -5 }
fn default_lift_disappear() -> i32 { 2 }
fn default_lift_reappear() -> i32 { 21 }
fn default_true() -> bool { true }
fn default_inset() -> i32 { 8 }

fn default_tick_rate() -> u64 { 50 }      // 20 fps
fn default_hen_every() -> u32 { 2 }
fn default_status_tick() -> u64 { 500 }

fn default_pad_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_pad_pause() -> Vec<String> { vec!["Select".into()] }
fn default_pad_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_pad_quit() -> Vec<String> { vec!["Mode".into()] }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlGrid {
    fn default() -> Self {
        TomlGrid {
            tile_width: default_tile_width(),
            tile_height: default_tile_height(),
            cols: default_cols(),
            rows: default_rows(),
            headroom_rows: default_headroom(),
        }
    }
}

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            harry_step_x: default_harry_step_x(),
            harry_step_y: default_harry_step_y(),
            fall_velocity: default_fall(),
            max_fall_velocity: default_max_fall(),
            jump_velocity: default_jump(),
            gravity: default_gravity(),
            lift_jump_boost: default_lift_jump_boost(),
            hen_step_x: default_hen_step_x(),
            hen_step_y: default_hen_step_y(),
            lift_velocity: default_lift_velocity(),
            lift_disappear_row: default_lift_disappear(),
            lift_reappear_row: default_lift_reappear(),
            land_on_ladders: default_true(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            easy_mode: false,
            hens_friendly: false,
            hens_jumpable: false,
            collision_inset: default_inset(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            hen_every: default_hen_every(),
            status_tick_ms: default_status_tick(),
            start_paused: false,
            starting_level: 0,
            hen_seed: None,
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            pause: default_pad_pause(),
            confirm: default_pad_confirm(),
            quit: default_pad_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
        }
    }
}

// ── Validation ──

/// Grid must be non-degenerate.
fn validate_grid(grid: TomlGrid) -> TomlGrid {
    if grid.tile_width <= 0 || grid.tile_height <= 0 || grid.cols <= 0 || grid.rows <= 0 || grid.headroom_rows < 0 {
        warn!(?grid, "invalid [grid] section, using defaults");
        return TomlGrid::default();
    }
    grid
}

/// Steps must divide the tile size or movers never realign with the grid;
/// falls must stay under a tile per tick or Harry tunnels through floors.
fn physics_fits(physics: &TomlPhysics, grid: &TomlGrid) -> bool {
    let divides = |step: i32, size: i32| step > 0 && size % step == 0;
    divides(physics.harry_step_x, grid.tile_width)
        && divides(physics.harry_step_y, grid.tile_height)
        && divides(physics.hen_step_x, grid.tile_width)
        && divides(physics.hen_step_y, grid.tile_height)
        && divides(physics.fall_velocity, grid.tile_height)
        && physics.max_fall_velocity > 0
        && physics.max_fall_velocity < grid.tile_height
        && physics.jump_velocity < 0
        && physics.gravity > 0
        && physics.lift_velocity < 0
        && physics.lift_disappear_row < physics.lift_reappear_row
}

/// Fall back to default physics when the section does not fit the grid.
/// Default physics is tuned for the default tile size, so a custom tile
/// size it does not fit is dropped as well.
fn validate_physics(physics: TomlPhysics, grid: TomlGrid) -> (TomlGrid, TomlPhysics) {
    if physics_fits(&physics, &grid) {
        return (grid, physics);
    }
    warn!(?physics, "invalid [physics] section, using defaults");
    let physics = TomlPhysics::default();
    if physics_fits(&physics, &grid) {
        return (grid, physics);
    }
    warn!(?grid, "default physics does not fit this tile size, using the default tile size");
    let grid = TomlGrid {
        tile_width: default_tile_width(),
        tile_height: default_tile_height(),
        ..grid
    };
    (grid, physics)
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig::build(toml_cfg, levels_dir)
    }

    /// Parse config text directly (no file search); used by tests and tools.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg: TomlConfig = toml::from_str(text)?;
        let levels_dir = PathBuf::from(&toml_cfg.general.levels_dir);
        Ok(GameConfig::build(toml_cfg, levels_dir))
    }

    fn build(toml_cfg: TomlConfig, levels_dir: PathBuf) -> Self {
        let (grid, physics) = validate_physics(toml_cfg.physics, validate_grid(toml_cfg.grid));

        GameConfig {
            grid: GridConfig {
                tile: TileSize::new(grid.tile_width, grid.tile_height),
                cols: grid.cols,
                rows: grid.rows,
                headroom_rows: grid.headroom_rows,
            },
            physics: PhysicsConfig {
                harry_step_x: physics.harry_step_x,
                harry_step_y: physics.harry_step_y,
                fall_velocity: physics.fall_velocity,
                max_fall_velocity: physics.max_fall_velocity,
                jump_velocity: physics.jump_velocity,
                gravity: physics.gravity,
                lift_jump_boost: physics.lift_jump_boost,
                hen_step_x: physics.hen_step_x,
                hen_step_y: physics.hen_step_y,
                lift_velocity: physics.lift_velocity,
                lift_disappear_row: physics.lift_disappear_row,
                lift_reappear_row: physics.lift_reappear_row,
                land_on_ladders: physics.land_on_ladders,
            },
            rules: RulesConfig {
                easy_mode: toml_cfg.rules.easy_mode,
                hens_friendly: toml_cfg.rules.hens_friendly,
                hens_jumpable: toml_cfg.rules.hens_jumpable,
                collision_inset: toml_cfg.rules.collision_inset.max(0),
            },
            timing: TimingConfig {
                tick_rate_ms: toml_cfg.timing.tick_rate_ms.max(1),
                hen_every: toml_cfg.timing.hen_every.max(1),
                status_tick_ms: toml_cfg.timing.status_tick_ms.max(1),
                start_paused: toml_cfg.timing.start_paused,
                starting_level: toml_cfg.timing.starting_level,
                hen_seed: toml_cfg.timing.hen_seed,
            },
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                pause: toml_cfg.gamepad.pause,
                confirm: toml_cfg.gamepad.confirm,
                quit: toml_cfg.gamepad.quit,
            },
            levels_dir,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::build(TomlConfig::default(), PathBuf::from(default_levels_dir()))
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        GameConfig::default().physics
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        GameConfig::default().rules
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        GameConfig::default().grid
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/henhouse)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/henhouse");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warn!(path = %path.display(), "config.toml parse error, using defaults: {e}");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), "could not read config: {e}");
                }
            }
        }
    }
    TomlConfig::default()
}
