//! Springs between pairs of particles.
//!
//! A [`Constraint`] refers to its endpoints by [`ParticleId`] and never owns
//! them. Each update looks both ids up in the [`ParticleSystem`]; a missing
//! or dead endpoint drops the constraint in that same pass.

use crate::{
    canvas::{Canvas, Rgba},
    config::{Config, ConstraintSettings},
    particle::{Particle, ParticleSystem},
    types::ParticleId,
};
use glam::Vec2;
use rand::Rng;

/// Stretch below which no force is applied, so links at rest do not jitter.
pub const DEADBAND: f32 = 0.1;
/// Replenishment gives up after this many duplicate picks in one frame.
const PAIR_ATTEMPTS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constraint {
    pub a: ParticleId,
    pub b: ParticleId,
    pub rest_length: f32,
    pub stiffness: f32,
    pub damping: f32,
}

impl Constraint {
    /// Links `a` and `b` with the configured stiffness and damping. A zero
    /// configured length captures the current separation instead.
    ///
    /// Later edits to the settings only affect links created afterwards.
    pub fn new(a: &Particle, b: &Particle, settings: &ConstraintSettings) -> Self {
        let rest_length = if settings.length > 0.0 {
            settings.length
        } else {
            a.pos.distance(b.pos)
        };
        Self {
            a: a.id,
            b: b.id,
            rest_length,
            stiffness: settings.stiffness,
            damping: settings.damping,
        }
    }

    pub fn links(&self, x: ParticleId, y: ParticleId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }

    /// Spring plus damping force on endpoint `a`; `b` receives its negation.
    ///
    /// The force lies along the `a -> b` axis with magnitude
    /// `stretch * stiffness + v_rel * damping`, where `v_rel` is the
    /// relative velocity projected on that axis. A stretched spring thus
    /// pulls the endpoints together and a compressed one pushes them apart.
    ///
    /// ### Returns
    /// `None` inside the deadband or when the endpoints coincide.
    pub fn force(&self, a: &Particle, b: &Particle) -> Option<Vec2> {
        let delta = b.pos - a.pos;
        let distance = delta.length();
        let stretch = distance - self.rest_length;
        if stretch.abs() <= DEADBAND {
            return None;
        }
        let axis = delta.try_normalize()?;
        let closing = (b.vel - a.vel).dot(axis);
        Some(axis * (stretch * self.stiffness + closing * self.damping))
    }

    /// Link color, tinted red past 10% stretch and blue past 10%
    /// compression.
    pub fn color(&self, a: &Particle, b: &Particle, settings: &ConstraintSettings) -> Rgba {
        let base = Rgba::from_array(settings.color);
        if self.rest_length <= f32::EPSILON {
            return base;
        }
        let ratio = a.pos.distance(b.pos) / self.rest_length;
        if ratio > 1.1 {
            base.lerp(Rgba::rgb(255, 0, 0), (ratio - 1.0) * 0.5)
        } else if ratio < 0.9 {
            base.lerp(Rgba::rgb(0, 0, 255), (1.0 - ratio) * 0.5)
        } else {
            base
        }
    }
}

#[derive(Debug, Default)]
pub struct ConstraintSystem {
    pub constraints: Vec<Constraint>,
}

impl ConstraintSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds up to the configured count of links between random
    /// distinct particles. Duplicate pairs are allowed here.
    pub fn initialize(&mut self, cfg: &Config, particles: &ParticleSystem, rng: &mut impl Rng) {
        self.constraints.clear();
        let pool = particles.particles();
        if cfg.constraints.count == 0 || pool.len() < 2 {
            return;
        }
        for _ in 0..cfg.constraints.count {
            let (i, j) = distinct_pair(pool.len(), rng);
            self.constraints
                .push(Constraint::new(&pool[i], &pool[j], &cfg.constraints));
        }
        log::info!("constraints initialized: {}", self.constraints.len());
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Drops broken links, applies spring forces, then tries to add one
    /// link if below the configured count.
    pub fn update(&mut self, cfg: &Config, particles: &mut ParticleSystem, rng: &mut impl Rng) {
        let settings = &cfg.constraints;
        for i in (0..self.constraints.len()).rev() {
            let c = self.constraints[i];
            let Some((a, b)) = particles.pair_mut(c.a, c.b) else {
                self.constraints.remove(i);
                continue;
            };
            if a.dead || b.dead {
                self.constraints.remove(i);
                continue;
            }
            if let Some(force) = c.force(a, b) {
                a.apply_force(force);
                b.apply_force(-force);
            }
        }

        if self.constraints.len() < settings.count && particles.len() >= 2 {
            self.replenish(settings, particles, rng);
        }
    }

    fn replenish(&mut self, settings: &ConstraintSettings, particles: &ParticleSystem, rng: &mut impl Rng) {
        let pool = particles.particles();
        for _ in 0..PAIR_ATTEMPTS {
            let (i, j) = distinct_pair(pool.len(), rng);
            let (a, b) = (&pool[i], &pool[j]);
            if !self.constraints.iter().any(|c| c.links(a.id, b.id)) {
                self.constraints.push(Constraint::new(a, b, settings));
                log::debug!("constraint added: {:?} - {:?}", a.id, b.id);
                return;
            }
        }
    }

    pub fn display(&self, cfg: &Config, particles: &ParticleSystem, canvas: &mut Canvas) {
        let settings = &cfg.constraints;
        if !settings.visible {
            return;
        }
        for c in &self.constraints {
            if let (Some(a), Some(b)) = (particles.get(c.a), particles.get(c.b)) {
                canvas.line(a.pos, b.pos, settings.weight, c.color(a, b, settings));
            }
        }
    }

    pub fn run(
        &mut self,
        cfg: &Config,
        particles: &mut ParticleSystem,
        rng: &mut impl Rng,
        canvas: &mut Canvas,
    ) {
        self.update(cfg, particles, rng);
        self.display(cfg, particles, canvas);
    }
}

/// Two different indices below `n`, uniformly. `n` must be at least 2.
fn distinct_pair(n: usize, rng: &mut impl Rng) -> (usize, usize) {
    let i = rng.random_range(0..n);
    let mut j = rng.random_range(0..n - 1);
    if j >= i {
        j += 1;
    }
    (i, j)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn setup(particle_count: usize, constraint_count: usize) -> (Config, ParticleSystem, StdRng) {
        let mut cfg = Config::default();
        cfg.particles.count = particle_count;
        cfg.constraints.count = constraint_count;
        let mut rng = StdRng::seed_from_u64(42);
        let mut particles = ParticleSystem::new();
        particles.initialize(&cfg, &mut rng);
        (cfg, particles, rng)
    }

    fn particle(id: u64, pos: Vec2, vel: Vec2) -> Particle {
        Particle::new(ParticleId(id), 0, pos, vel, 10.0, &Config::default())
    }

    #[test]
    fn distinct_pair_never_repeats_an_index() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let (i, j) = distinct_pair(2, &mut rng);
            assert_ne!(i, j);
            assert!(i < 2 && j < 2);
        }
    }

    #[test]
    fn initialize_needs_two_particles() {
        let (cfg, particles, mut rng) = setup(1, 5);
        let mut sys = ConstraintSystem::new();
        sys.initialize(&cfg, &particles, &mut rng);
        assert!(sys.is_empty());

        let (cfg, particles, mut rng) = setup(10, 5);
        sys.initialize(&cfg, &particles, &mut rng);
        assert_eq!(sys.len(), 5);
        assert!(sys.constraints.iter().all(|c| c.a != c.b));
    }

    #[test]
    fn zero_length_captures_current_separation() {
        let settings = ConstraintSettings {
            length: 0.0,
            ..ConstraintSettings::default()
        };
        let a = particle(0, Vec2::ZERO, Vec2::ZERO);
        let b = particle(1, Vec2::new(3.0, 4.0), Vec2::ZERO);
        assert_eq!(Constraint::new(&a, &b, &settings).rest_length, 5.0);
    }

    #[test]
    fn stretched_spring_pulls_endpoints_together() {
        let settings = ConstraintSettings {
            length: 10.0,
            stiffness: 0.5,
            damping: 0.0,
            ..ConstraintSettings::default()
        };
        let a = particle(0, Vec2::ZERO, Vec2::ZERO);
        let b = particle(1, Vec2::new(20.0, 0.0), Vec2::ZERO);
        let c = Constraint::new(&a, &b, &settings);

        // Force on `a` points toward `b`.
        let f = c.force(&a, &b).unwrap();
        assert!((f - Vec2::new(5.0, 0.0)).length() < 1e-5);

        let squeezed = particle(1, Vec2::new(4.0, 0.0), Vec2::ZERO);
        let f = c.force(&a, &squeezed).unwrap();
        assert!(f.x < 0.0);
    }

    #[test]
    fn damping_resists_separating_velocity() {
        let settings = ConstraintSettings {
            length: 10.0,
            stiffness: 0.0,
            damping: 0.5,
            ..ConstraintSettings::default()
        };
        let a = particle(0, Vec2::ZERO, Vec2::new(0.0, 3.0));
        let b = particle(1, Vec2::new(11.0, 0.0), Vec2::new(2.0, 0.0));
        let c = Constraint::new(&a, &b, &settings);

        // Only the axial part of the relative velocity counts.
        let f = c.force(&a, &b).unwrap();
        assert!((f - Vec2::new(1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn settings_edits_leave_existing_links_alone() {
        let mut settings = ConstraintSettings {
            length: 10.0,
            stiffness: 0.5,
            damping: 0.0,
            ..ConstraintSettings::default()
        };
        let a = particle(0, Vec2::ZERO, Vec2::ZERO);
        let b = particle(1, Vec2::new(20.0, 0.0), Vec2::ZERO);
        let old = Constraint::new(&a, &b, &settings);

        settings.stiffness = 0.1;
        let new = Constraint::new(&a, &b, &settings);
        assert_eq!(old.stiffness, 0.5);
        assert!((old.force(&a, &b).unwrap() - Vec2::new(5.0, 0.0)).length() < 1e-5);
        assert!((new.force(&a, &b).unwrap() - Vec2::new(1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn no_force_inside_deadband() {
        let settings = ConstraintSettings {
            length: 10.0,
            ..ConstraintSettings::default()
        };
        let a = particle(0, Vec2::ZERO, Vec2::ZERO);
        let b = particle(1, Vec2::new(10.05, 0.0), Vec2::ZERO);
        let c = Constraint::new(&a, &b, &settings);
        assert!(c.force(&a, &b).is_none());
    }

    #[test]
    fn dead_endpoint_removes_only_its_constraint() {
        let (mut cfg, mut particles, mut rng) = setup(6, 0);
        let ids: Vec<_> = particles.particles().iter().map(|p| p.id).collect();
        let mut sys = ConstraintSystem::new();
        for (a, b) in [(0, 1), (2, 3), (4, 5)] {
            let (pa, pb) = (particles.get(ids[a]).unwrap(), particles.get(ids[b]).unwrap());
            sys.constraints.push(Constraint::new(pa, pb, &cfg.constraints));
        }
        // Two survivors already meet the count, so nothing is replenished.
        cfg.constraints.count = 2;
        particles.get_mut(ids[2]).unwrap().dead = true;
        sys.update(&cfg, &mut particles, &mut rng);

        assert_eq!(sys.len(), 2);
        assert!(sys.constraints[0].links(ids[0], ids[1]));
        assert!(sys.constraints[1].links(ids[4], ids[5]));
    }

    #[test]
    fn vanished_endpoint_removes_constraint() {
        let (mut cfg, mut particles, mut rng) = setup(4, 1);
        let mut sys = ConstraintSystem::new();
        sys.initialize(&cfg, &particles, &mut rng);
        assert_eq!(sys.len(), 1);

        particles.clear();
        cfg.constraints.count = 1;
        sys.update(&cfg, &mut particles, &mut rng);
        assert!(sys.is_empty());
    }

    #[test]
    fn replenish_adds_at_most_one_per_frame_without_duplicates() {
        let (cfg, mut particles, mut rng) = setup(2, 3);
        let mut sys = ConstraintSystem::new();

        sys.update(&cfg, &mut particles, &mut rng);
        assert_eq!(sys.len(), 1);

        // The only possible pair is taken; further frames add nothing.
        for _ in 0..5 {
            sys.update(&cfg, &mut particles, &mut rng);
        }
        assert_eq!(sys.len(), 1);
    }

    #[test]
    fn update_applies_equal_and_opposite_forces() {
        let (mut cfg, mut particles, mut rng) = setup(2, 0);
        cfg.constraints.length = 1.0;
        cfg.constraints.damping = 0.0;
        let ids: Vec<_> = particles.particles().iter().map(|p| p.id).collect();
        let mut sys = ConstraintSystem::new();
        let (pa, pb) = (particles.get(ids[0]).unwrap(), particles.get(ids[1]).unwrap());
        sys.constraints.push(Constraint::new(pa, pb, &cfg.constraints));
        cfg.constraints.count = 1;

        sys.update(&cfg, &mut particles, &mut rng);
        let (a, b) = (particles.get(ids[0]).unwrap(), particles.get(ids[1]).unwrap());
        let momentum = a.acc * a.mass + b.acc * b.mass;
        assert!(momentum.length() < 1e-4);
        assert!(a.acc != Vec2::ZERO);
    }

    #[test]
    fn color_tints_with_stretch() {
        let settings = ConstraintSettings {
            length: 10.0,
            color: [100, 100, 100],
            ..ConstraintSettings::default()
        };
        let a = particle(0, Vec2::ZERO, Vec2::ZERO);
        let c = Constraint::new(&a, &particle(1, Vec2::new(10.0, 0.0), Vec2::ZERO), &settings);

        let rest = c.color(&a, &particle(1, Vec2::new(10.5, 0.0), Vec2::ZERO), &settings);
        assert_eq!(rest, Rgba::rgb(100, 100, 100));

        let stretched = c.color(&a, &particle(1, Vec2::new(30.0, 0.0), Vec2::ZERO), &settings);
        assert_eq!(stretched, Rgba::rgb(255, 0, 0));

        let squeezed = c.color(&a, &particle(1, Vec2::new(5.0, 0.0), Vec2::ZERO), &settings);
        assert!(squeezed.b > 100 && squeezed.r < 100);
    }
}
