//! Point masses pulling on every particle, optionally draggable.

use crate::{
    canvas::{Canvas, Rgba},
    config::{AttractorSettings, Config},
    particle::{Particle, ParticleSystem},
    types::PointerState,
};
use glam::Vec2;
use rand::Rng;

/// Separations are clamped into this range before the inverse-square law.
pub const MIN_DISTANCE: f32 = 5.0;
pub const MAX_DISTANCE: f32 = 500.0;

/// Pointer interaction state of a single attractor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    /// Pressed inside the radius; becomes `Dragging` on the next update.
    Candidate { offset: Vec2 },
    /// Follows the pointer at a fixed offset until release.
    Dragging { offset: Vec2 },
}

impl DragState {
    pub fn is_engaged(self) -> bool {
        !matches!(self, DragState::Idle)
    }

    fn offset(self) -> Option<Vec2> {
        match self {
            DragState::Idle => None,
            DragState::Candidate { offset } | DragState::Dragging { offset } => Some(offset),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Attractor {
    pub pos: Vec2,
    /// Mass, which is also the drawn and grab radius.
    pub mass: f32,
    /// Gravitational constant `G`.
    pub strength: f32,
    pub fixed: bool,
    pub drag: DragState,
}

impl Attractor {
    pub fn new(pos: Vec2, settings: &AttractorSettings) -> Self {
        Self {
            pos,
            mass: settings.size,
            strength: settings.strength,
            fixed: settings.fixed,
            drag: DragState::Idle,
        }
    }

    /// Force this attractor exerts on `particle`.
    ///
    /// `G * M * m / d^2` pointing from the particle to the attractor, with
    /// `d` clamped to [`MIN_DISTANCE`]..=[`MAX_DISTANCE`]. Coincident points
    /// get no direction and hence no force.
    pub fn attraction(&self, particle: &Particle) -> Vec2 {
        let delta = self.pos - particle.pos;
        let distance = delta.length().clamp(MIN_DISTANCE, MAX_DISTANCE);
        let magnitude = self.strength * self.mass * particle.mass / (distance * distance);
        delta.normalize_or_zero() * magnitude
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.distance(self.pos) < self.mass
    }

    fn refresh(&mut self, settings: &AttractorSettings) {
        self.mass = settings.size;
        self.strength = settings.strength;
        self.fixed = settings.fixed;
        if self.fixed {
            self.drag = DragState::Idle;
        }
    }

    pub fn display(&self, cfg: &Config, canvas: &mut Canvas) {
        let base = Rgba::from_array(cfg.attractors.color);
        canvas.fill_circle(self.pos, self.mass, base);

        if cfg.effects.glow {
            // Halos grow 2.5 px per ring and fade out toward the outermost.
            for ring in (1..=3).rev() {
                let alpha = 150.0 - ring as f32 * 50.0;
                canvas.fill_circle(self.pos, self.mass + ring as f32 * 2.5, base.with_alpha(alpha));
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct AttractorSystem {
    pub attractors: Vec<Attractor>,
}

impl AttractorSystem {
    pub fn from_positions(positions: Vec<Vec2>, settings: &AttractorSettings) -> Self {
        let attractors = positions
            .into_iter()
            .map(|pos| Attractor::new(pos, settings))
            .collect();

        Self { attractors }
    }

    /// `count` attractors uniformly inside `[0, size)`.
    pub fn random_in_rect(
        count: usize,
        size: Vec2,
        settings: &AttractorSettings,
        rng: &mut impl Rng,
    ) -> Self {
        let positions = (0..count).map(|_| random_point(size, rng)).collect();
        Self::from_positions(positions, settings)
    }

    /// Discards every attractor and scatters the configured count.
    pub fn initialize(&mut self, cfg: &Config, rng: &mut impl Rng) {
        *self = Self::random_in_rect(
            cfg.attractors.count,
            cfg.canvas.size(),
            &cfg.attractors,
            rng,
        );
        log::info!("attractors initialized: {}", self.attractors.len());
    }

    pub fn len(&self) -> usize {
        self.attractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attractors.is_empty()
    }

    /// The attractor currently following the pointer, if any.
    pub fn dragged(&self) -> Option<usize> {
        self.attractors.iter().position(|a| a.drag.is_engaged())
    }

    /// Grabs the first non-fixed attractor under `pos`, unless one is
    /// already held.
    pub fn pointer_pressed(&mut self, pos: Vec2) {
        if self.dragged().is_some() {
            return;
        }
        if let Some(a) = self
            .attractors
            .iter_mut()
            .find(|a| !a.fixed && a.contains(pos))
        {
            a.drag = DragState::Candidate { offset: pos - a.pos };
        }
    }

    pub fn pointer_released(&mut self) {
        for a in &mut self.attractors {
            a.drag = DragState::Idle;
        }
    }

    /// Moves the held attractor, or picks one up if the held pointer has
    /// wandered into it. A released pointer ends any drag.
    pub fn follow_pointer(&mut self, pointer: PointerState) {
        if !pointer.pressed {
            self.pointer_released();
            return;
        }

        let held = match self.dragged() {
            Some(i) => Some(i),
            None => {
                let grabbed = self
                    .attractors
                    .iter()
                    .position(|a| !a.fixed && a.contains(pointer.pos));
                if let Some(i) = grabbed {
                    let a = &mut self.attractors[i];
                    a.drag = DragState::Candidate { offset: pointer.pos - a.pos };
                }
                grabbed
            }
        };

        if let Some(i) = held {
            let a = &mut self.attractors[i];
            if let Some(offset) = a.drag.offset() {
                a.drag = DragState::Dragging { offset };
                a.pos = pointer.pos - offset;
            }
        }
    }

    /// Adds the pull of every attractor to every particle.
    pub fn apply_to(&self, particles: &mut ParticleSystem) {
        if self.attractors.is_empty() {
            return;
        }
        particles.for_each_mut(|p| {
            let force: Vec2 = self.attractors.iter().map(|a| a.attraction(p)).sum();
            p.apply_force(force);
        });
    }

    /// Matches the configured count, pulls particles when that module is
    /// on, then follows the pointer.
    pub fn update(
        &mut self,
        cfg: &Config,
        pointer: PointerState,
        particles: &mut ParticleSystem,
        rng: &mut impl Rng,
    ) {
        let size = cfg.canvas.size();
        while self.attractors.len() < cfg.attractors.count {
            self.attractors
                .push(Attractor::new(random_point(size, rng), &cfg.attractors));
        }
        self.attractors.truncate(cfg.attractors.count);
        for a in &mut self.attractors {
            a.refresh(&cfg.attractors);
        }

        if cfg.modules.particles {
            self.apply_to(particles);
        }
        self.follow_pointer(pointer);
    }

    pub fn display(&self, cfg: &Config, canvas: &mut Canvas) {
        if !cfg.attractors.visible {
            return;
        }
        for a in &self.attractors {
            a.display(cfg, canvas);
        }
    }

    pub fn run(
        &mut self,
        cfg: &Config,
        pointer: PointerState,
        particles: &mut ParticleSystem,
        rng: &mut impl Rng,
        canvas: &mut Canvas,
    ) {
        self.update(cfg, pointer, particles, rng);
        self.display(cfg, canvas);
    }
}

fn random_point(size: Vec2, rng: &mut impl Rng) -> Vec2 {
    Vec2::new(
        rng.random_range(0.0..size.x.max(1.0)),
        rng.random_range(0.0..size.y.max(1.0)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParticleId;
    use rand::{SeedableRng, rngs::StdRng};

    fn settings(fixed: bool) -> AttractorSettings {
        AttractorSettings {
            fixed,
            size: 20.0,
            strength: 1.0,
            ..AttractorSettings::default()
        }
    }

    fn test_particle(pos: Vec2) -> Particle {
        Particle::new(ParticleId(0), 0, pos, Vec2::ZERO, 10.0, &Config::default())
    }

    #[test]
    fn force_points_at_attractor_with_inverse_square_magnitude() {
        let a = Attractor::new(Vec2::new(100.0, 0.0), &settings(true));
        let f = a.attraction(&test_particle(Vec2::ZERO));

        // G * M * m / d^2 = 1 * 20 * 1 / 100^2
        assert!(f.y.abs() < 1e-7);
        assert!((f.x - 20.0 / 10_000.0).abs() < 1e-7);
    }

    #[test]
    fn force_is_capped_at_minimum_distance() {
        let a = Attractor::new(Vec2::ZERO, &settings(true));
        let at_floor = a.attraction(&test_particle(Vec2::new(5.0, 0.0))).length();
        assert!((at_floor - 20.0 / 25.0).abs() < 1e-5);

        for d in [4.9, 2.0, 0.5, 1e-3] {
            let f = a.attraction(&test_particle(Vec2::new(d, 0.0))).length();
            assert!(f <= at_floor + 1e-5, "d = {d}: {f} > {at_floor}");
        }
        assert_eq!(a.attraction(&test_particle(Vec2::ZERO)), Vec2::ZERO);
    }

    #[test]
    fn force_beyond_max_distance_uses_the_clamp() {
        let a = Attractor::new(Vec2::ZERO, &settings(true));
        let far = a.attraction(&test_particle(Vec2::new(0.0, 2000.0)));
        assert!((far.length() - 20.0 / 250_000.0).abs() < 1e-9);
        assert!(far.y < 0.0);
    }

    #[test]
    fn press_then_move_drags_with_offset() {
        let mut sys = AttractorSystem::from_positions(vec![Vec2::new(50.0, 50.0)], &settings(false));
        sys.pointer_pressed(Vec2::new(55.0, 50.0));
        assert_eq!(
            sys.attractors[0].drag,
            DragState::Candidate { offset: Vec2::new(5.0, 0.0) }
        );

        sys.follow_pointer(PointerState { pos: Vec2::new(105.0, 80.0), pressed: true });
        assert_eq!(sys.attractors[0].pos, Vec2::new(100.0, 80.0));
        assert!(matches!(sys.attractors[0].drag, DragState::Dragging { .. }));

        // Outside the radius now, but the drag holds.
        sys.follow_pointer(PointerState { pos: Vec2::new(300.0, 300.0), pressed: true });
        assert_eq!(sys.attractors[0].pos, Vec2::new(295.0, 300.0));

        sys.pointer_released();
        sys.follow_pointer(PointerState { pos: Vec2::new(0.0, 0.0), pressed: false });
        assert_eq!(sys.attractors[0].pos, Vec2::new(295.0, 300.0));
        assert_eq!(sys.attractors[0].drag, DragState::Idle);
    }

    #[test]
    fn fixed_attractors_ignore_the_pointer() {
        let mut sys = AttractorSystem::from_positions(vec![Vec2::new(50.0, 50.0)], &settings(true));
        sys.pointer_pressed(Vec2::new(50.0, 50.0));
        sys.follow_pointer(PointerState { pos: Vec2::new(80.0, 80.0), pressed: true });
        assert_eq!(sys.attractors[0].pos, Vec2::new(50.0, 50.0));
        assert_eq!(sys.dragged(), None);
    }

    #[test]
    fn first_overlapping_attractor_wins_and_only_one_moves() {
        let mut sys = AttractorSystem::from_positions(
            vec![Vec2::new(50.0, 50.0), Vec2::new(55.0, 50.0)],
            &settings(false),
        );
        sys.pointer_pressed(Vec2::new(53.0, 50.0));
        sys.follow_pointer(PointerState { pos: Vec2::new(63.0, 50.0), pressed: true });

        assert_eq!(sys.dragged(), Some(0));
        assert_eq!(sys.attractors[0].pos, Vec2::new(60.0, 50.0));
        assert_eq!(sys.attractors[1].pos, Vec2::new(55.0, 50.0));
    }

    #[test]
    fn held_pointer_entering_radius_picks_up_attractor() {
        let mut sys = AttractorSystem::from_positions(vec![Vec2::new(50.0, 50.0)], &settings(false));
        sys.follow_pointer(PointerState { pos: Vec2::new(200.0, 200.0), pressed: true });
        assert_eq!(sys.dragged(), None);

        sys.follow_pointer(PointerState { pos: Vec2::new(60.0, 50.0), pressed: true });
        assert_eq!(sys.dragged(), Some(0));
        sys.follow_pointer(PointerState { pos: Vec2::new(70.0, 50.0), pressed: true });
        assert_eq!(sys.attractors[0].pos, Vec2::new(60.0, 50.0));
    }

    #[test]
    fn update_tracks_count_and_pulls_particles() {
        let mut cfg = Config::default();
        cfg.attractors.count = 3;
        let mut rng = StdRng::seed_from_u64(9);
        let mut sys = AttractorSystem::default();
        let mut particles = ParticleSystem::new();
        particles.initialize(&cfg, &mut rng);

        sys.update(&cfg, PointerState::default(), &mut particles, &mut rng);
        assert_eq!(sys.len(), 3);
        assert!(particles.particles().iter().all(|p| p.acc != Vec2::ZERO));

        cfg.attractors.count = 1;
        sys.update(&cfg, PointerState::default(), &mut particles, &mut rng);
        assert_eq!(sys.len(), 1);

        cfg.attractors.count = 0;
        sys.update(&cfg, PointerState::default(), &mut particles, &mut rng);
        assert!(sys.is_empty());
    }

    #[test]
    fn making_attractors_fixed_cancels_a_drag() {
        let mut cfg = Config::default();
        cfg.attractors.fixed = false;
        let mut rng = StdRng::seed_from_u64(1);
        let mut sys = AttractorSystem::from_positions(vec![Vec2::new(50.0, 50.0)], &cfg.attractors);
        let mut particles = ParticleSystem::new();

        sys.pointer_pressed(Vec2::new(50.0, 50.0));
        cfg.attractors.fixed = true;
        sys.update(&cfg, PointerState { pos: Vec2::new(90.0, 90.0), pressed: true }, &mut particles, &mut rng);
        assert_eq!(sys.attractors[0].pos, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn hidden_attractors_draw_nothing() {
        let mut cfg = Config::default();
        cfg.attractors.visible = false;
        let sys = AttractorSystem::from_positions(vec![Vec2::new(5.0, 5.0)], &cfg.attractors);
        let mut canvas = Canvas::new(10, 10);
        sys.display(&cfg, &mut canvas);
        assert_eq!(canvas.pixel(5, 5), Some(Rgba::BLACK));

        cfg.attractors.visible = true;
        sys.display(&cfg, &mut canvas);
        assert_eq!(canvas.pixel(5, 5), Some(Rgba::rgb(255, 0, 0)));
    }
}
