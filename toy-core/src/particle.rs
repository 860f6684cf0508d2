//! Moving point masses and the system that owns them.
//!
//! Per frame, [`ParticleSystem::run`] walks the population from the back so
//! dead particles can be removed in place. For each particle it:
//! 1. applies gravity and turbulence,
//! 2. integrates (`vel += acc`, speed cap, friction, `pos += vel`, `acc = 0`),
//! 3. resolves the canvas boundary,
//! 4. ages it,
//! 5. tests it against every particle after it in storage order, so each
//!    unordered pair is tested once,
//! 6. draws it and drops it if it died.

use crate::{
    canvas::{Canvas, Rgba},
    config::{BoundsMode, ColorMode, Config, ParticleSettings, ParticleShape, Physics},
    force::ForceField,
    types::ParticleId,
};
use glam::Vec2;
use rand::Rng;
use std::collections::VecDeque;
use std::f32::consts::TAU;

/// Lower bound on mass so `F / m` stays finite for tiny particles.
const MIN_MASS: f32 = 0.05;

#[derive(Clone, Debug)]
pub struct Particle {
    pub id: ParticleId,
    /// Spawn ordinal, used to pick a palette entry.
    pub ordinal: usize,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Force accumulator, cleared after every integration step.
    pub acc: Vec2,
    pub size: f32,
    pub mass: f32,
    /// Current alpha in `0.0..=255.0`.
    pub alpha: f32,
    /// Oldest position first.
    pub trail: VecDeque<Vec2>,
    /// Remaining frames; `None` lives forever.
    pub lifespan: Option<u32>,
    lifespan_total: u32,
    pub dead: bool,
}

impl Particle {
    pub fn new(id: ParticleId, ordinal: usize, pos: Vec2, vel: Vec2, size: f32, cfg: &Config) -> Self {
        let lifespan = cfg.particles.lifespan;
        Self {
            id,
            ordinal,
            pos,
            vel,
            acc: Vec2::ZERO,
            size,
            mass: (size / 10.0).max(MIN_MASS),
            alpha: cfg.particles.opacity,
            trail: VecDeque::new(),
            lifespan,
            lifespan_total: lifespan.unwrap_or(0),
            dead: false,
        }
    }

    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }

    /// `a += F / m`.
    #[inline]
    pub fn apply_force(&mut self, force: Vec2) {
        self.acc += force / self.mass;
    }

    /// Records the trail, then advances velocity and position by one step.
    pub fn integrate(&mut self, cfg: &Config) {
        let settings = &cfg.particles;
        if settings.trails {
            self.trail.push_back(self.pos);
            while self.trail.len() > settings.trail_length {
                self.trail.pop_front();
            }
        } else {
            self.trail.clear();
        }

        self.vel += self.acc;
        if settings.max_speed > 0.0 {
            self.vel = self.vel.clamp_length_max(settings.max_speed);
        }
        if cfg.physics.friction.active {
            self.vel *= cfg.physics.friction.value;
        }
        self.pos += self.vel;
        self.acc = Vec2::ZERO;
    }

    /// Applies the configured edge policy inside a `size` canvas.
    pub fn handle_boundaries(&mut self, physics: &Physics, size: Vec2) {
        if !physics.bounds.active {
            return;
        }
        let r = self.radius();
        match physics.bounds.mode {
            BoundsMode::Bounce => {
                let e = physics.collision.elasticity;
                for axis in 0..2 {
                    if self.pos[axis] < r {
                        self.pos[axis] = r;
                        self.vel[axis] *= -e;
                    } else if self.pos[axis] > size[axis] - r {
                        self.pos[axis] = size[axis] - r;
                        self.vel[axis] *= -e;
                    }
                }
            }
            BoundsMode::Wrap => {
                for axis in 0..2 {
                    if self.pos[axis] < -r {
                        self.pos[axis] = size[axis] + r;
                    } else if self.pos[axis] > size[axis] + r {
                        self.pos[axis] = -r;
                    }
                }
            }
            BoundsMode::Disappear => {
                let off = self.pos.x < -r
                    || self.pos.x > size.x + r
                    || self.pos.y < -r
                    || self.pos.y > size.y + r;
                if off {
                    self.dead = true;
                }
            }
        }
    }

    /// Counts down the lifespan and fades alpha along with it.
    fn age(&mut self, settings: &ParticleSettings) {
        let Some(remaining) = self.lifespan.as_mut() else {
            self.alpha = settings.opacity;
            return;
        };
        if *remaining > 0 {
            *remaining -= 1;
            self.alpha = if self.lifespan_total > 0 {
                settings.opacity * (*remaining as f32 / self.lifespan_total as f32)
            } else {
                0.0
            };
        }
        if *remaining == 0 {
            self.dead = true;
        }
    }

    /// Full per-frame update: integrate, boundaries, ageing.
    pub fn update(&mut self, cfg: &Config) {
        self.integrate(cfg);
        self.handle_boundaries(&cfg.physics, cfg.canvas.size());
        self.age(&cfg.particles);
    }

    /// Resolves an overlap with `other`.
    ///
    /// Each velocity keeps its speed (times `elasticity`) but has its
    /// direction mirrored about the line joining the centers. This is an
    /// arcade model: it ignores mass and does not conserve momentum. Both
    /// particles are then pushed apart by half the overlap each.
    ///
    /// ### Returns
    /// `true` if the two particles overlapped.
    pub fn check_collision(&mut self, other: &mut Particle, elasticity: f32) -> bool {
        let min_dist = self.radius() + other.radius();
        let distance = self.pos.distance(other.pos);
        if distance >= min_dist {
            return false;
        }

        let normal_angle = (other.pos - self.pos).to_angle();
        let reflect = |vel: Vec2| {
            let speed = vel.length();
            Vec2::from_angle(2.0 * normal_angle - vel.to_angle()) * speed * elasticity
        };
        self.vel = reflect(self.vel);
        other.vel = reflect(other.vel);

        let overlap = min_dist - distance;
        let push = (self.pos - other.pos).try_normalize().unwrap_or(Vec2::X);
        self.pos += push * overlap * 0.5;
        other.pos -= push * overlap * 0.5;
        true
    }

    pub fn display(&self, settings: &ParticleSettings, canvas: &mut Canvas) {
        let base = particle_color(settings, self.ordinal);

        if settings.trails && self.trail.len() > 1 {
            let weight = self.size * 0.3;
            let n = self.trail.len();
            let head = self.trail.iter().copied().chain(std::iter::once(self.pos));
            let tail = self.trail.iter().copied().skip(1).chain(std::iter::once(self.pos));
            for (i, (a, b)) in head.zip(tail).enumerate() {
                let alpha = self.alpha * 0.8 * (i as f32 / (n - 1) as f32).min(1.0);
                canvas.line(a, b, weight, base.with_alpha(alpha));
            }
        }

        let fill = base.with_alpha(self.alpha);
        let outline = settings
            .outline
            .then(|| Rgba::from_array(settings.outline_color));
        let weight = settings.outline_weight;
        let r = self.radius();
        let p = self.pos;

        match settings.shape {
            ParticleShape::Circle => {
                canvas.fill_circle(p, r, fill);
                if let Some(c) = outline {
                    canvas.stroke_circle(p, r, weight, c);
                }
            }
            ParticleShape::Square => {
                let rim = [
                    p + Vec2::new(-r, -r),
                    p + Vec2::new(r, -r),
                    p + Vec2::new(r, r),
                    p + Vec2::new(-r, r),
                ];
                canvas.fill_rect(rim[0], rim[2], fill);
                if let Some(c) = outline {
                    stroke_closed(canvas, &rim, weight, c);
                }
            }
            ParticleShape::Triangle => {
                let rim = [
                    p + Vec2::new(0.0, -r),
                    p + Vec2::new(-r, r),
                    p + Vec2::new(r, r),
                ];
                canvas.fill_triangle(rim[0], rim[1], rim[2], fill);
                if let Some(c) = outline {
                    stroke_closed(canvas, &rim, weight, c);
                }
            }
            ParticleShape::Star => {
                let rim = star_points(p, r, r * 0.5, 5);
                canvas.fill_fan(p, &rim, fill);
                if let Some(c) = outline {
                    stroke_closed(canvas, &rim, weight, c);
                }
            }
        }
    }
}

fn stroke_closed(canvas: &mut Canvas, rim: &[Vec2], weight: f32, c: Rgba) {
    for (i, &a) in rim.iter().enumerate() {
        canvas.line(a, rim[(i + 1) % rim.len()], weight, c);
    }
}

/// Alternating outer/inner vertices of a star, starting at angle zero.
fn star_points(center: Vec2, outer: f32, inner: f32, points: usize) -> Vec<Vec2> {
    let step = TAU / points as f32;
    (0..points)
        .flat_map(|i| {
            let a = i as f32 * step;
            [
                center + Vec2::from_angle(a) * outer,
                center + Vec2::from_angle(a + step * 0.5) * inner,
            ]
        })
        .collect()
}

/// Opaque base color of the particle with spawn ordinal `ordinal`.
pub fn particle_color(settings: &ParticleSettings, ordinal: usize) -> Rgba {
    let total = settings.count.max(1);
    let hue = (ordinal % total) as f32 * 360.0 / total as f32;
    match settings.color_mode {
        ColorMode::Solid => Rgba::from_array(settings.color),
        ColorMode::Rainbow => Rgba::from_hsb(hue % 360.0, 100.0, 100.0, 255.0),
        ColorMode::Gradient => Rgba::from_hsb(hue, 80.0, 100.0, 255.0),
    }
}

/// Owns every live particle, kept sorted by [`ParticleId`].
#[derive(Debug, Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    next_id: u64,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards every particle and spawns the configured count.
    pub fn initialize(&mut self, cfg: &Config, rng: &mut impl Rng) {
        self.particles.clear();
        for _ in 0..cfg.particles.count {
            self.add_particle(cfg, None, rng);
        }
        log::info!("particles initialized: {}", self.particles.len());
    }

    /// Spawns one particle, at `pos` or at a random spot on the canvas,
    /// unless the population is already at the configured count.
    pub fn add_particle(
        &mut self,
        cfg: &Config,
        pos: Option<Vec2>,
        rng: &mut impl Rng,
    ) -> Option<ParticleId> {
        if self.particles.len() >= cfg.particles.count {
            return None;
        }
        let settings = &cfg.particles;
        let canvas = cfg.canvas.size();
        let pos = pos.unwrap_or_else(|| {
            Vec2::new(
                rng.random_range(0.0..canvas.x.max(1.0)),
                rng.random_range(0.0..canvas.y.max(1.0)),
            )
        });
        let vel = Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
        let size = if settings.size_variation && settings.min_size < settings.max_size {
            rng.random_range(settings.min_size..settings.max_size)
        } else if settings.size_variation {
            settings.min_size
        } else {
            settings.size
        };

        let id = ParticleId(self.next_id);
        self.next_id += 1;
        let ordinal = self.particles.len();
        self.particles
            .push(Particle::new(id, ordinal, pos, vel, size, cfg));
        Some(id)
    }

    /// Live particles, sorted by id.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Position of `id` in [`particles`](Self::particles), if it is still alive.
    pub fn index_of(&self, id: ParticleId) -> Option<usize> {
        self.particles.binary_search_by_key(&id, |p| p.id).ok()
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.index_of(id).map(|i| &self.particles[i])
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.index_of(id).map(|i| &mut self.particles[i])
    }

    /// Mutable access to two distinct particles at once.
    ///
    /// ### Returns
    /// `None` if either id is gone or both ids are the same.
    pub fn pair_mut(
        &mut self,
        a: ParticleId,
        b: ParticleId,
    ) -> Option<(&mut Particle, &mut Particle)> {
        let (i, j) = (self.index_of(a)?, self.index_of(b)?);
        if i == j {
            return None;
        }
        let (lo, hi) = (i.min(j), i.max(j));
        let (head, tail) = self.particles.split_at_mut(hi);
        let (pi, pj) = (&mut head[lo], &mut tail[0]);
        Some(if i < j { (pi, pj) } else { (pj, pi) })
    }

    /// Hands every particle to `f`, e.g. to apply external forces.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut Particle)) {
        for p in &mut self.particles {
            f(p);
        }
    }

    /// Advances one frame and draws every particle.
    pub fn run(
        &mut self,
        cfg: &Config,
        field: &ForceField,
        frame: u64,
        rng: &mut impl Rng,
        canvas: &mut Canvas,
    ) {
        self.step(cfg, field, frame, rng, Some(canvas));
    }

    /// Advances one frame without drawing.
    pub fn update(&mut self, cfg: &Config, field: &ForceField, frame: u64, rng: &mut impl Rng) {
        self.step(cfg, field, frame, rng, None);
    }

    pub fn display(&self, cfg: &Config, canvas: &mut Canvas) {
        for p in self.particles.iter().rev() {
            p.display(&cfg.particles, canvas);
        }
    }

    fn step(
        &mut self,
        cfg: &Config,
        field: &ForceField,
        frame: u64,
        rng: &mut impl Rng,
        mut canvas: Option<&mut Canvas>,
    ) {
        let target = cfg.particles.count;
        if self.particles.len() > target {
            log::debug!("particles shrink {} -> {}", self.particles.len(), target);
            self.particles.truncate(target);
        }
        while self.particles.len() < target {
            self.add_particle(cfg, None, rng);
        }

        let physics = &cfg.physics;
        for i in (0..self.particles.len()).rev() {
            let (head, later) = self.particles.split_at_mut(i + 1);
            let p = &mut head[i];

            if physics.gravity.active {
                let g = Vec2::new(physics.gravity.x, physics.gravity.y);
                p.apply_force(g * p.mass);
            }
            if physics.turbulence.active {
                p.apply_force(field.turbulence_at(p.pos, frame, physics.turbulence.strength));
            }

            p.update(cfg);

            if physics.collision.active {
                for other in later.iter_mut() {
                    p.check_collision(other, physics.collision.elasticity);
                }
            }

            if let Some(c) = canvas.as_deref_mut() {
                p.display(&cfg.particles, c);
            }

            if p.dead {
                self.particles.remove(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn quiet_config() -> Config {
        let mut cfg = Config::default();
        cfg.canvas.width = 200;
        cfg.canvas.height = 100;
        cfg.physics.collision.active = false;
        cfg.physics.bounds.active = false;
        cfg
    }

    fn particle_at(pos: Vec2, vel: Vec2, size: f32, cfg: &Config) -> Particle {
        Particle::new(ParticleId(0), 0, pos, vel, size, cfg)
    }

    #[test]
    fn integrate_without_force_moves_by_velocity() {
        let cfg = quiet_config();
        let mut p = particle_at(Vec2::new(50.0, 50.0), Vec2::new(1.5, -0.5), 10.0, &cfg);
        p.integrate(&cfg);

        assert_eq!(p.vel, Vec2::new(1.5, -0.5));
        assert_eq!(p.pos, Vec2::new(51.5, 49.5));
        assert_eq!(p.acc, Vec2::ZERO);
    }

    #[test]
    fn apply_force_divides_by_mass() {
        let cfg = quiet_config();
        let mut p = particle_at(Vec2::ZERO, Vec2::ZERO, 20.0, &cfg);
        p.apply_force(Vec2::new(4.0, 0.0));
        assert_eq!(p.acc, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn speed_is_capped_and_friction_scales_velocity() {
        let mut cfg = quiet_config();
        cfg.particles.max_speed = 2.0;
        cfg.physics.friction.active = true;
        cfg.physics.friction.value = 0.5;

        let mut p = particle_at(Vec2::ZERO, Vec2::new(10.0, 0.0), 10.0, &cfg);
        p.integrate(&cfg);
        assert!((p.vel.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bounce_clamps_position_and_reflects_with_elasticity() {
        let mut cfg = quiet_config();
        cfg.physics.bounds.active = true;
        cfg.physics.collision.elasticity = 0.5;
        let size = cfg.canvas.size();

        let mut p = particle_at(Vec2::new(-3.0, 120.0), Vec2::new(-2.0, 4.0), 10.0, &cfg);
        p.handle_boundaries(&cfg.physics, size);

        assert_eq!(p.pos, Vec2::new(5.0, 95.0));
        assert_eq!(p.vel, Vec2::new(1.0, -2.0));
    }

    #[test]
    fn bounce_keeps_particles_inside_inset_bounds() {
        let mut cfg = quiet_config();
        cfg.physics.bounds.active = true;
        let size = cfg.canvas.size();
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..200 {
            let pos = Vec2::new(rng.random_range(-50.0..250.0), rng.random_range(-50.0..150.0));
            let vel = Vec2::new(rng.random_range(-9.0..9.0), rng.random_range(-9.0..9.0));
            let mut p = particle_at(pos, vel, rng.random_range(2.0..30.0), &cfg);
            p.update(&cfg);

            let r = p.radius();
            assert!(p.pos.x >= r && p.pos.x <= size.x - r, "x out of bounds: {:?}", p.pos);
            assert!(p.pos.y >= r && p.pos.y <= size.y - r, "y out of bounds: {:?}", p.pos);
        }
    }

    #[test]
    fn wrap_teleports_once_fully_off_canvas() {
        let mut cfg = quiet_config();
        cfg.physics.bounds.active = true;
        cfg.physics.bounds.mode = BoundsMode::Wrap;
        let size = cfg.canvas.size();

        let mut p = particle_at(Vec2::new(-4.0, 50.0), Vec2::ZERO, 10.0, &cfg);
        p.handle_boundaries(&cfg.physics, size);
        assert_eq!(p.pos.x, -4.0, "still partly visible");

        p.pos.x = -6.0;
        p.handle_boundaries(&cfg.physics, size);
        assert_eq!(p.pos.x, 205.0);
    }

    #[test]
    fn disappear_marks_dead_only_when_fully_outside() {
        let mut cfg = quiet_config();
        cfg.physics.bounds.active = true;
        cfg.physics.bounds.mode = BoundsMode::Disappear;
        let size = cfg.canvas.size();

        let mut p = particle_at(Vec2::new(50.0, 104.0), Vec2::ZERO, 10.0, &cfg);
        p.handle_boundaries(&cfg.physics, size);
        assert!(!p.dead);

        p.pos.y = 106.0;
        p.handle_boundaries(&cfg.physics, size);
        assert!(p.dead);
    }

    #[test]
    fn lifespan_fades_alpha_then_kills() {
        let mut cfg = quiet_config();
        cfg.particles.lifespan = Some(4);
        cfg.particles.opacity = 200.0;

        let mut p = particle_at(Vec2::new(50.0, 50.0), Vec2::ZERO, 10.0, &cfg);
        p.update(&cfg);
        assert_eq!(p.lifespan, Some(3));
        assert!((p.alpha - 150.0).abs() < 1e-4);

        for _ in 0..3 {
            p.update(&cfg);
        }
        assert_eq!(p.alpha, 0.0);
        assert!(p.dead);
    }

    #[test]
    fn zero_trail_length_keeps_no_history() {
        let mut cfg = quiet_config();
        cfg.particles.trails = true;
        cfg.particles.trail_length = 0;

        let mut p = particle_at(Vec2::new(50.0, 50.0), Vec2::ONE, 10.0, &cfg);
        for _ in 0..5 {
            p.update(&cfg);
        }
        assert!(p.trail.is_empty());

        cfg.particles.trail_length = 3;
        for _ in 0..5 {
            p.update(&cfg);
        }
        assert_eq!(p.trail.len(), 3);

        cfg.particles.trails = false;
        p.update(&cfg);
        assert!(p.trail.is_empty());
    }

    #[test]
    fn collision_separates_overlapping_particles() {
        let cfg = quiet_config();
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..100 {
            let a_pos = Vec2::new(rng.random_range(40.0..60.0), rng.random_range(40.0..60.0));
            let b_pos = a_pos + Vec2::new(rng.random_range(-8.0..8.0), rng.random_range(-8.0..8.0));
            let mut a = particle_at(a_pos, Vec2::new(1.0, 0.5), 10.0, &cfg);
            let mut b = particle_at(b_pos, Vec2::new(-0.5, 1.0), 8.0, &cfg);

            let min_dist = a.radius() + b.radius();
            let before = a.pos.distance(b.pos);
            let hit = a.check_collision(&mut b, 0.9);

            assert_eq!(hit, before < min_dist);
            if hit {
                assert!(a.pos.distance(b.pos) >= min_dist - 1e-3);
            }
        }
    }

    #[test]
    fn collision_reflects_direction_and_scales_speed() {
        let cfg = quiet_config();
        // Centers stacked vertically: directions are mirrored about the
        // vertical axis, speeds halved.
        let mut a = particle_at(Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0), 10.0, &cfg);
        let mut b = particle_at(Vec2::new(0.0, 8.0), Vec2::new(0.0, -1.0), 10.0, &cfg);
        assert!(a.check_collision(&mut b, 0.5));

        assert!((a.vel - Vec2::new(-1.0, 0.0)).length() < 1e-5);
        assert!((b.vel - Vec2::new(0.0, -0.5)).length() < 1e-5);
        assert!((a.pos.y - -1.0).abs() < 1e-5);
        assert!((b.pos.y - 9.0).abs() < 1e-5);
    }

    #[test]
    fn coincident_particles_still_separate() {
        let cfg = quiet_config();
        let mut a = particle_at(Vec2::new(10.0, 10.0), Vec2::ZERO, 10.0, &cfg);
        let mut b = particle_at(Vec2::new(10.0, 10.0), Vec2::ZERO, 10.0, &cfg);
        assert!(a.check_collision(&mut b, 1.0));
        assert!((a.pos.distance(b.pos) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn initialize_spawns_exactly_the_configured_count() {
        let mut cfg = quiet_config();
        cfg.particles.count = 100;
        let mut rng = StdRng::seed_from_u64(1);
        let mut sys = ParticleSystem::new();

        sys.initialize(&cfg, &mut rng);
        assert_eq!(sys.len(), 100);
        sys.initialize(&cfg, &mut rng);
        assert_eq!(sys.len(), 100);
        assert!(sys.particles().iter().all(|p| {
            p.pos.x >= 0.0 && p.pos.x < 200.0 && p.pos.y >= 0.0 && p.pos.y < 100.0
        }));
    }

    #[test]
    fn run_tracks_count_changes() {
        let mut cfg = quiet_config();
        cfg.particles.count = 10;
        let mut rng = StdRng::seed_from_u64(2);
        let field = ForceField::new(0);
        let mut sys = ParticleSystem::new();

        sys.update(&cfg, &field, 1, &mut rng);
        assert_eq!(sys.len(), 10);

        cfg.particles.count = 0;
        sys.update(&cfg, &field, 2, &mut rng);
        assert!(sys.is_empty());

        cfg.particles.count = 25;
        let mut canvas = Canvas::new(200, 100);
        sys.run(&cfg, &field, 3, &mut rng, &mut canvas);
        assert_eq!(sys.len(), 25);
    }

    #[test]
    fn dead_particles_are_removed_and_ids_stay_sorted() {
        let mut cfg = quiet_config();
        cfg.particles.count = 20;
        cfg.particles.lifespan = Some(1);
        let mut rng = StdRng::seed_from_u64(3);
        let field = ForceField::new(0);
        let mut sys = ParticleSystem::new();
        sys.initialize(&cfg, &mut rng);
        let first_ids: Vec<_> = sys.particles().iter().map(|p| p.id).collect();

        // Everyone dies this frame and is replaced at the start of the next.
        sys.update(&cfg, &field, 1, &mut rng);
        assert!(sys.is_empty());
        cfg.particles.lifespan = None;
        sys.update(&cfg, &field, 2, &mut rng);
        assert_eq!(sys.len(), 20);
        assert!(first_ids.iter().all(|id| sys.get(*id).is_none()));

        let ids: Vec<_> = sys.particles().iter().map(|p| p.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn pair_mut_returns_particles_in_argument_order() {
        let mut cfg = quiet_config();
        cfg.particles.count = 3;
        let mut rng = StdRng::seed_from_u64(4);
        let mut sys = ParticleSystem::new();
        sys.initialize(&cfg, &mut rng);

        let ids: Vec<_> = sys.particles().iter().map(|p| p.id).collect();
        let (a, b) = sys.pair_mut(ids[2], ids[0]).unwrap();
        assert_eq!(a.id, ids[2]);
        assert_eq!(b.id, ids[0]);
        assert!(sys.pair_mut(ids[1], ids[1]).is_none());
    }

    #[test]
    fn palette_spreads_hues_by_ordinal() {
        let mut settings = ParticleSettings::default();
        settings.count = 3;
        settings.color_mode = ColorMode::Rainbow;
        assert_eq!(particle_color(&settings, 0), Rgba::rgb(255, 0, 0));
        assert_eq!(particle_color(&settings, 1), Rgba::rgb(0, 255, 0));

        settings.color_mode = ColorMode::Solid;
        settings.color = [1, 2, 3];
        assert_eq!(particle_color(&settings, 7), Rgba::rgb(1, 2, 3));
    }

    #[test]
    fn every_shape_draws_without_panicking_at_edges() {
        let mut cfg = quiet_config();
        cfg.particles.trails = true;
        let mut canvas = Canvas::new(20, 20);
        for shape in ParticleShape::ALL {
            cfg.particles.shape = *shape;
            let mut p = particle_at(Vec2::new(1.0, 19.0), Vec2::new(1.0, 1.0), 12.0, &cfg);
            p.update(&cfg);
            p.update(&cfg);
            p.display(&cfg.particles, &mut canvas);
        }
        assert_ne!(canvas.pixel(1, 18), Some(Rgba::BLACK));
    }

    #[test]
    fn turbulence_is_sampled_at_each_particle_position() {
        let mut cfg = quiet_config();
        cfg.particles.count = 20;
        cfg.particles.max_speed = 0.0;
        cfg.particles.size_variation = true;
        cfg.physics.turbulence.active = true;
        cfg.physics.turbulence.strength = 0.3;
        let mut rng = StdRng::seed_from_u64(21);
        let mut sys = ParticleSystem::new();
        sys.initialize(&cfg, &mut rng);
        let field = ForceField::new(4);
        let frame = 9;

        let before: Vec<(Vec2, Vec2, f32)> =
            sys.particles().iter().map(|p| (p.pos, p.vel, p.mass)).collect();
        sys.update(&cfg, &field, frame, &mut rng);

        assert_eq!(sys.len(), 20);
        for (p, (pos, vel, mass)) in sys.particles().iter().zip(before) {
            let expected = vel + field.turbulence_at(pos, frame, 0.3) / mass;
            assert!((p.vel - expected).length() < 1e-6, "{} vs {expected}", p.vel);
        }
    }
}
