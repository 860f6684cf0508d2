//! Turbulence and uniform gravity.
//!
//! [`ForceField`] owns the one coherent-noise sampler of the simulation.
//! Particles sample it at their exact position through
//! [`ForceField::turbulence_at`]; the per-frame grid is built from the same
//! sampler and serves the nearest-cell lookup and the field overlay.

use crate::{
    canvas::{Canvas, Rgba},
    config::Config,
    particle::Particle,
};
use glam::Vec2;
use noise::{NoiseFn, Perlin};
use std::f32::consts::TAU;

/// Spacing of the grid in pixels.
pub const GRID_CELL: f32 = 20.0;
/// Spatial frequency of the noise, per pixel.
pub const NOISE_SCALE: f64 = 0.01;
/// Advance of the noise time axis per frame.
pub const NOISE_TIME_STEP: f64 = 0.01;
/// Noise in `[0, 1]` is mapped onto two full turns.
const ANGLE_SPAN: f32 = 2.0 * TAU;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldCell {
    pub pos: Vec2,
    pub force: Vec2,
}

#[derive(Clone)]
pub struct ForceField {
    noise: Perlin,
    cells: Vec<FieldCell>,
}

impl ForceField {
    pub fn new(seed: u32) -> Self {
        Self {
            noise: Perlin::new(seed),
            cells: Vec::new(),
        }
    }

    /// Noise at `pos` and `frame`, remapped from `[-1, 1]` to `[0, 1]`.
    pub fn noise01(&self, pos: Vec2, frame: u64) -> f32 {
        let v = self.noise.get([
            pos.x as f64 * NOISE_SCALE,
            pos.y as f64 * NOISE_SCALE,
            frame as f64 * NOISE_TIME_STEP,
        ]);
        (v * 0.5 + 0.5).clamp(0.0, 1.0) as f32
    }

    /// Turbulence force of magnitude `strength` sampled exactly at `pos`.
    pub fn turbulence_at(&self, pos: Vec2, frame: u64, strength: f32) -> Vec2 {
        Vec2::from_angle(self.noise01(pos, frame) * ANGLE_SPAN) * strength
    }

    pub fn cells(&self) -> &[FieldCell] {
        &self.cells
    }

    /// Rebuilds the grid from scratch when turbulence is on, empties it
    /// otherwise.
    pub fn run(&mut self, cfg: &Config, frame: u64) {
        self.cells.clear();
        if !cfg.physics.turbulence.active {
            return;
        }

        let strength = cfg.physics.turbulence.strength;
        let size = cfg.canvas.size();
        let mut y = 0.0;
        while y < size.y {
            let mut x = 0.0;
            while x < size.x {
                let pos = Vec2::new(x, y);
                self.cells.push(FieldCell {
                    pos,
                    force: self.turbulence_at(pos, frame, strength),
                });
                x += GRID_CELL;
            }
            y += GRID_CELL;
        }
    }

    /// Linear scan for the cell closest to `pos`.
    pub fn nearest_cell(&self, pos: Vec2) -> Option<&FieldCell> {
        self.cells
            .iter()
            .min_by(|a, b| a.pos.distance_squared(pos).total_cmp(&b.pos.distance_squared(pos)))
    }

    /// Applies gravity and the nearest grid cell's turbulence to one particle.
    ///
    /// The frame driver does not call this: particles take turbulence from
    /// [`ForceField::turbulence_at`] at their own position instead.
    pub fn apply_forces_to_particle(&self, cfg: &Config, particle: &mut Particle) {
        let gravity = &cfg.physics.gravity;
        if gravity.active {
            particle.apply_force(Vec2::new(gravity.x, gravity.y) * particle.mass);
        }
        if cfg.physics.turbulence.active
            && let Some(cell) = self.nearest_cell(particle.pos)
        {
            particle.apply_force(cell.force);
        }
    }

    /// Draws every cell's force as a short line when the overlay is on.
    pub fn display(&self, cfg: &Config, canvas: &mut Canvas) {
        if !cfg.physics.turbulence.show_field {
            return;
        }
        let color = Rgba::new(100, 100, 255, 50);
        for cell in &self.cells {
            let tip = cell.pos + cell.force * 20.0;
            canvas.line(cell.pos, tip, 1.0, color);
            canvas.fill_circle(tip, 1.5, color);
        }
    }
}
