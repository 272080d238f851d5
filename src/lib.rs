//! Hen-House Harry: movement, collision and level rules for a Chuckie Egg
//! style platformer. The terminal front end lives in the `henhouse` binary.

pub mod config;
pub mod domain;
pub mod sim;
