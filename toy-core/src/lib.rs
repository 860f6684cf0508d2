//! Core 2-D particle physics toy library.
//!
//! Main components:
//! - [`config`]: every tunable parameter, grouped by subsystem.
//! - [`store`]: the single owner of the live configuration and presets.
//! - [`preset`]: partial configuration snapshots and the built-in set.
//! - [`error`]: configuration store errors.
//! - [`canvas`]: CPU frame buffer and drawing primitives.
//! - [`particle`]: particles and the system that moves and collides them.
//! - [`attractor`]: draggable point masses with inverse-square pull.
//! - [`constraint`]: springs between particle pairs.
//! - [`force`]: turbulence noise field and gravity.
//! - [`fractal`]: tree, Koch and Sierpinski geometry.
//! - [`effects`]: backgrounds and post-processing passes.
//! - [`simulation`]: the frame driver running all of the above.
//! - [`types`]: shared ids and input state.

pub mod attractor;
pub mod canvas;
pub mod config;
pub mod constraint;
pub mod effects;
pub mod error;
pub mod force;
pub mod fractal;
pub mod particle;
pub mod preset;
pub mod simulation;
pub mod store;
pub mod types;
