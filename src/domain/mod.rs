//! Movement and collision core: pure tile-grid rules and the movers.

pub mod entity;
pub mod geometry;
pub mod harry;
pub mod hen;
pub mod lift;
pub mod movement;
pub mod rules;
pub mod tile;
pub mod tile_map;
