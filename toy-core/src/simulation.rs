//! Frame driver tying every subsystem together.
//!
//! One [`Simulation::step`] renders one frame, in this order:
//! 1. background (or a solid clear when effects are off),
//! 2. fractal update and draw,
//! 3. force-field grid rebuild and overlay,
//! 4. attractor forces, dragging and draw,
//! 5. particle update and draw,
//! 6. constraint update and draw,
//! 7. post passes.
//!
//! Steps 2 to 7 run only when their module is enabled. The configuration is
//! read from the [`ConfigStore`] once at the start of the frame.

use crate::{
    attractor::AttractorSystem,
    canvas::{Canvas, Rgba},
    config::Config,
    constraint::ConstraintSystem,
    effects::EffectsSystem,
    force::ForceField,
    fractal::FractalSystem,
    particle::ParticleSystem,
    store::ConfigStore,
    types::PointerState,
};
use glam::Vec2;
use rand::{Rng, SeedableRng, rngs::StdRng};

pub struct Simulation {
    store: ConfigStore,
    canvas: Canvas,
    rng: StdRng,
    pointer: PointerState,
    frame: u64,
    particles: ParticleSystem,
    attractors: AttractorSystem,
    constraints: ConstraintSystem,
    field: ForceField,
    fractal: FractalSystem,
    effects: EffectsSystem,
}

impl Simulation {
    /// Creates an initialized simulation seeded from the thread rng.
    pub fn new(config: Config) -> Self {
        Self::from_rng(config, StdRng::from_rng(&mut rand::rng()))
    }

    /// Creates an initialized simulation whose every random draw follows
    /// from `seed`.
    pub fn with_seed(config: Config, seed: u64) -> Self {
        Self::from_rng(config, StdRng::seed_from_u64(seed))
    }

    fn from_rng(config: Config, mut rng: StdRng) -> Self {
        let field = ForceField::new(rng.random());
        let effects = EffectsSystem::new(rng.random());
        let canvas = Canvas::new(config.canvas.width as usize, config.canvas.height as usize);
        let fractal = FractalSystem::new(&config);

        let mut sim = Self {
            store: ConfigStore::new(config),
            canvas,
            rng,
            pointer: PointerState::default(),
            frame: 0,
            particles: ParticleSystem::new(),
            attractors: AttractorSystem::default(),
            constraints: ConstraintSystem::new(),
            field,
            fractal,
            effects,
        };
        sim.initialize();
        sim
    }

    /// Rebuilds every subsystem from the current configuration.
    pub fn initialize(&mut self) {
        let cfg = self.store.config();
        let (w, h) = (cfg.canvas.width as usize, cfg.canvas.height as usize);
        if self.canvas.width() != w.max(1) || self.canvas.height() != h.max(1) {
            self.canvas.resize(w, h);
        }

        self.particles.initialize(cfg, &mut self.rng);
        self.attractors.initialize(cfg, &mut self.rng);
        self.constraints.initialize(cfg, &self.particles, &mut self.rng);
        self.fractal.initialize(cfg);
        self.effects.initialize(cfg, &mut self.rng);
        log::info!("simulation initialized at frame {}", self.frame);
    }

    /// Primary button went down at `pos` (canvas coordinates).
    ///
    /// Only the attractors see presses, and only while their module is on.
    pub fn pointer_pressed(&mut self, pos: Vec2) {
        self.pointer = PointerState { pos, pressed: true };
        if self.store.config().modules.attractors {
            self.attractors.pointer_pressed(pos);
        }
    }

    /// Records the pointer position; a held attractor follows it on the
    /// next [`step`](Self::step).
    pub fn pointer_moved(&mut self, pos: Vec2) {
        self.pointer.pos = pos;
    }

    /// Ends any attractor drag.
    pub fn pointer_released(&mut self) {
        self.pointer.pressed = false;
        self.attractors.pointer_released();
    }

    /// Advances and renders one frame.
    pub fn step(&mut self) {
        self.frame += 1;
        let frame = self.frame;
        let cfg = self.store.config();
        let modules = &cfg.modules;

        let (w, h) = (cfg.canvas.width as usize, cfg.canvas.height as usize);
        if self.canvas.width() != w.max(1) || self.canvas.height() != h.max(1) {
            log::info!("canvas resized to {w}x{h}");
            self.canvas.resize(w, h);
            self.effects.initialize(cfg, &mut self.rng);
        }

        if modules.effects {
            self.effects.draw_background(cfg, frame, &mut self.canvas);
        } else {
            let [r, g, b, _] = cfg.canvas.background_color;
            self.canvas.clear(Rgba::rgb(r, g, b));
        }

        if modules.fractals {
            self.fractal.run(cfg, self.pointer, &mut self.canvas);
        }
        if modules.forces {
            self.field.run(cfg, frame);
            self.field.display(cfg, &mut self.canvas);
        }
        if modules.attractors {
            self.attractors.run(
                cfg,
                self.pointer,
                &mut self.particles,
                &mut self.rng,
                &mut self.canvas,
            );
        }
        if modules.particles {
            self.particles
                .run(cfg, &self.field, frame, &mut self.rng, &mut self.canvas);
        }
        if modules.constraints {
            self.constraints
                .run(cfg, &mut self.particles, &mut self.rng, &mut self.canvas);
        }
        if modules.effects {
            self.effects.post_process(cfg, &mut self.canvas);
        }
    }

    /// Configuration in effect for the next frame.
    pub fn config(&self) -> &Config {
        self.store.config()
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Mutable store access; changes take effect on the next [`step`](Self::step).
    pub fn store_mut(&mut self) -> &mut ConfigStore {
        &mut self.store
    }

    /// Rerolls the configuration with the simulation's own rng.
    pub fn randomize(&mut self) {
        self.store.randomize(&mut self.rng);
    }

    /// The frame rendered by the last [`step`](Self::step).
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Number of frames stepped since construction.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn attractors(&self) -> &AttractorSystem {
        &self.attractors
    }

    pub fn constraints(&self) -> &ConstraintSystem {
        &self.constraints
    }

    pub fn force_field(&self) -> &ForceField {
        &self.field
    }

    pub fn fractal(&self) -> &FractalSystem {
        &self.fractal
    }
}
