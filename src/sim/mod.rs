//! Per-level simulation built on the domain core.

pub mod event;
pub mod level;
pub mod loader;
pub mod status;
