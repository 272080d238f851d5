/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels_dir` (individual `.txt` files, sorted by filename)
///   2. Built-in embedded levels
///
/// ## Level format (`.txt`):
///   Line 1: `# Level Name` (optional)
///   Lines: map rows of whitespace-separated tokens, placed from tile (0,0)
///
/// ## Token legend:
///   `.`  = Empty           `f`  = Floor
///   `l`  = Ladder          `e`  = Egg
///   `g`  = Grain           `hl` / `hr` = Hen spawn (facing left/right)
///   `cl` / `cr` = Harry spawn   `-l` / `-r` = Lift spawn
///
/// Harry and Hen spawns mark the tile their feet stand in; Lift spawns mark
/// the platform tile. Blank lines are ignored.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{GameConfig, GridConfig};
use crate::domain::entity::Direction;
use crate::domain::tile::ContentTag;
use crate::domain::tile_map::{TileError, TileMap};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("line {line}: unknown token `{token}`")]
    UnknownToken { line: usize, token: String },
    #[error(transparent)]
    Tile(#[from] TileError),
    #[error("level has no Harry spawn")]
    MissingHarry,
    #[error("second Harry spawn at ({tx}, {ty})")]
    DuplicateHarry { tx: i32, ty: i32 },
    #[error("level has no map rows")]
    Empty,
    #[error("reading {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpawnKind {
    Harry,
    Hen,
    Lift,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Spawn {
    pub kind: SpawnKind,
    pub tx: i32,
    pub ty: i32,
    pub facing: Direction,
}

/// A parsed level, before any movers exist.
#[derive(Clone, Debug)]
pub struct LevelLayout {
    pub name: String,
    pub map: TileMap,
    pub spawns: Vec<Spawn>,
}

impl LevelLayout {
    pub fn harry_spawn(&self) -> Option<&Spawn> {
        self.spawns.iter().find(|s| s.kind == SpawnKind::Harry)
    }

    pub fn egg_total(&self) -> usize {
        self.map.count(ContentTag::Egg)
    }
}

enum Token {
    Content(ContentTag),
    Spawn(SpawnKind, Direction),
}

fn token(text: &str) -> Option<Token> {
    let t = match text {
        "." => Token::Content(ContentTag::None),
        "f" => Token::Content(ContentTag::Floor),
        "l" => Token::Content(ContentTag::Ladder),
        "e" => Token::Content(ContentTag::Egg),
        "g" => Token::Content(ContentTag::Grain),
        "hl" => Token::Spawn(SpawnKind::Hen, Direction::Left),
        "hr" => Token::Spawn(SpawnKind::Hen, Direction::Right),
        "cl" => Token::Spawn(SpawnKind::Harry, Direction::Left),
        "cr" => Token::Spawn(SpawnKind::Harry, Direction::Right),
        "-l" => Token::Spawn(SpawnKind::Lift, Direction::Left),
        "-r" => Token::Spawn(SpawnKind::Lift, Direction::Right),
        _ => return None,
    };
    Some(t)
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

/// Parse one level. Fails fast on anything outside the configured grid.
pub fn parse_level(content: &str, grid: &GridConfig) -> Result<LevelLayout, LevelError> {
    let mut name = String::new();
    let mut map = TileMap::new(grid.cols, grid.rows);
    let mut spawns: Vec<Spawn> = vec![];
    let mut ty = 0;

    for (n, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix('#') {
            if name.is_empty() {
                name = rest.trim().to_string();
            }
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }

        for (tx, text) in trimmed.split_whitespace().enumerate() {
            let tx = tx as i32;
            let tok = token(text).ok_or_else(|| LevelError::UnknownToken {
                line: n + 1,
                token: text.to_string(),
            })?;
            match tok {
                Token::Content(tag) => map.set(tx, ty, tag)?,
                Token::Spawn(kind, facing) => {
                    map.set(tx, ty, ContentTag::None)?;
                    if kind == SpawnKind::Harry && spawns.iter().any(|s| s.kind == SpawnKind::Harry) {
                        return Err(LevelError::DuplicateHarry { tx, ty });
                    }
                    spawns.push(Spawn { kind, tx, ty, facing });
                }
            }
        }
        ty += 1;
    }

    if ty == 0 {
        return Err(LevelError::Empty);
    }
    if !spawns.iter().any(|s| s.kind == SpawnKind::Harry) {
        return Err(LevelError::MissingHarry);
    }
    if name.is_empty() {
        name = "Unnamed Coop".to_string();
    }

    Ok(LevelLayout { name, map, spawns })
}

// ══════════════════════════════════════════════════════════════
// Sources
// ══════════════════════════════════════════════════════════════

/// Directory levels when there are any, else the built-in set.
pub fn load_levels(config: &GameConfig) -> Result<Vec<LevelLayout>, LevelError> {
    if config.levels_dir.is_dir() {
        let levels = load_from_directory(&config.levels_dir, &config.grid)?;
        if !levels.is_empty() {
            info!(dir = %config.levels_dir.display(), count = levels.len(), "loaded levels");
            return Ok(levels);
        }
    }
    embedded_levels(&config.grid)
}

/// Every parsable `*.txt` in `dir`, sorted by filename. Broken files are
/// skipped with a warning.
pub fn load_from_directory(dir: &Path, grid: &GridConfig) -> Result<Vec<LevelLayout>, LevelError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LevelError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "txt"))
        .collect();
    paths.sort();

    let mut levels = vec![];
    for path in paths {
        let parsed = std::fs::read_to_string(&path)
            .map_err(|source| LevelError::Io { path: path.clone(), source })
            .and_then(|content| parse_level(&content, grid));
        match parsed {
            Ok(level) => levels.push(level),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping level file"),
        }
    }
    Ok(levels)
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

const EMBEDDED: [&str; 3] = [
    include_str!("../../levels/01-home-farm.txt"),
    include_str!("../../levels/02-lift-shaft.txt"),
    include_str!("../../levels/03-crowded-coop.txt"),
];

pub fn embedded_levels(grid: &GridConfig) -> Result<Vec<LevelLayout>, LevelError> {
    EMBEDDED.iter().map(|text| parse_level(text, grid)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridConfig {
        GridConfig::default()
    }

    #[test]
    fn parses_tokens_and_spawns() {
        let text = "# Tiny\n\
                    .  .  hl .\n\
                    cr e  g  -r\n\
                    f  l  f  f\n";
        let level = parse_level(text, &grid()).unwrap();
        assert_eq!(level.name, "Tiny");
        assert_eq!(level.map.tile_at(1, 1), ContentTag::Egg);
        assert_eq!(level.map.tile_at(2, 1), ContentTag::Grain);
        assert_eq!(level.map.tile_at(1, 2), ContentTag::Ladder);
        assert_eq!(level.map.tile_at(0, 2), ContentTag::Floor);
        assert_eq!(level.egg_total(), 1);

        let harry = level.harry_spawn().unwrap();
        assert_eq!((harry.tx, harry.ty, harry.facing), (0, 1, Direction::Right));
        assert!(level.spawns.contains(&Spawn { kind: SpawnKind::Hen, tx: 2, ty: 0, facing: Direction::Left }));
        assert!(level.spawns.contains(&Spawn { kind: SpawnKind::Lift, tx: 3, ty: 1, facing: Direction::Right }));
        assert_eq!(level.map.tile_at(3, 1), ContentTag::None);
    }

    #[test]
    fn unknown_token_names_the_line() {
        let err = parse_level("# X\ncr ?\n", &grid()).unwrap_err();
        assert!(matches!(err, LevelError::UnknownToken { line: 2, ref token } if token == "?"));
    }

    #[test]
    fn row_past_grid_is_rejected() {
        let wide = vec!["."; 23].join(" ");
        let text = format!("cr\n{wide}\n");
        let err = parse_level(&text, &grid()).unwrap_err();
        assert!(matches!(err, LevelError::Tile(TileError::OutOfGrid { tx: 22, ty: 1, .. })));
    }

    #[test]
    fn exactly_one_harry() {
        assert!(matches!(parse_level("f f\n", &grid()), Err(LevelError::MissingHarry)));
        assert!(matches!(
            parse_level("cl cr\n", &grid()),
            Err(LevelError::DuplicateHarry { tx: 1, ty: 0 })
        ));
        assert!(matches!(parse_level("# Nothing\n\n", &grid()), Err(LevelError::Empty)));
    }

    #[test]
    fn unnamed_level_gets_default_name() {
        let level = parse_level("cr\n", &grid()).unwrap();
        assert_eq!(level.name, "Unnamed Coop");
    }

    #[test]
    fn embedded_levels_are_playable() {
        let levels = embedded_levels(&grid()).unwrap();
        assert_eq!(levels.len(), 3);
        for level in &levels {
            assert!(level.egg_total() > 0, "{}", level.name);
            assert!(level.harry_spawn().is_some());
            assert!(level.spawns.iter().any(|s| s.kind == SpawnKind::Hen));
        }
        assert!(levels[1].spawns.iter().any(|s| s.kind == SpawnKind::Lift));
    }

    #[test]
    fn directory_levels_sorted_and_broken_skipped() {
        let dir = std::env::temp_dir().join(format!("henhouse-levels-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.txt"), "# Second\ncr\n").unwrap();
        std::fs::write(dir.join("a.txt"), "# First\ncl\n").unwrap();
        std::fs::write(dir.join("c.txt"), "zz\n").unwrap();
        std::fs::write(dir.join("notes.md"), "# ignored\n").unwrap();

        let levels = load_from_directory(&dir, &grid()).unwrap();
        let names: Vec<&str> = levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
