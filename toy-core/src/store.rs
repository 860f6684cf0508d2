//! The single owner of the live [`Config`].
//!
//! Every mutation goes through [`ConfigStore`] and bumps its revision, so a
//! caller can tell whether anything changed between two frames.

use crate::{
    config::{BackgroundKind, BoundsMode, ColorMode, Config, FractalKind},
    error::ConfigError,
    preset::{Preset, builtin_presets},
};
use rand::Rng;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config: Config,
    presets: BTreeMap<String, Preset>,
    revision: u64,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl ConfigStore {
    /// Creates a store holding `config` and the built-in presets.
    pub fn new(config: Config) -> Self {
        let presets = builtin_presets()
            .into_iter()
            .map(|(name, preset)| (name.to_string(), preset))
            .collect();

        Self {
            config,
            presets,
            revision: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the whole configuration. No-op if nothing changed.
    pub fn set(&mut self, config: Config) {
        if config != self.config {
            self.config = config;
            self.revision += 1;
        }
    }

    /// Mutates the configuration in place.
    pub fn update(&mut self, f: impl FnOnce(&mut Config)) {
        f(&mut self.config);
        self.revision += 1;
    }

    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    /// Merges the named preset into the current configuration.
    pub fn load_preset(&mut self, name: &str) -> Result<(), ConfigError> {
        let preset = self
            .presets
            .get(name)
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))?;
        preset.apply(&mut self.config);
        self.revision += 1;
        log::info!("loaded preset `{name}`");
        Ok(())
    }

    /// Stores a snapshot of the current configuration under `name`,
    /// overwriting any preset with the same (trimmed) name.
    pub fn save_preset(&mut self, name: &str) -> Result<(), ConfigError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::BlankPresetName);
        }
        self.presets
            .insert(name.to_string(), Preset::snapshot(&self.config));
        log::info!("saved preset `{name}`");
        Ok(())
    }

    pub fn export_presets(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self.presets)?)
    }

    /// Adds every preset from a JSON object of `name -> preset`.
    ///
    /// ### Returns
    /// The number of presets read.
    pub fn import_presets(&mut self, json: &str) -> Result<usize, ConfigError> {
        let incoming: BTreeMap<String, Preset> = serde_json::from_str(json)?;
        if incoming.keys().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::BlankPresetName);
        }
        let n = incoming.len();
        self.presets.extend(incoming);
        log::info!("imported {n} presets");
        Ok(n)
    }

    /// Rerolls the exploration-relevant settings.
    pub fn randomize(&mut self, rng: &mut impl Rng) {
        const COLOR_MODES: [ColorMode; 3] = [ColorMode::Solid, ColorMode::Rainbow, ColorMode::Gradient];
        const BOUNDS: [BoundsMode; 3] = [BoundsMode::Bounce, BoundsMode::Wrap, BoundsMode::Disappear];
        const FRACTALS: [FractalKind; 4] = [
            FractalKind::None,
            FractalKind::Tree,
            FractalKind::Koch,
            FractalKind::Sierpinski,
        ];
        const BACKGROUNDS: [BackgroundKind; 4] = [
            BackgroundKind::None,
            BackgroundKind::Gradient,
            BackgroundKind::Perlin,
            BackgroundKind::Stars,
        ];

        let c = &mut self.config;

        c.particles.count = rng.random_range(50..300);
        c.particles.size = rng.random_range(5.0..30.0);
        c.particles.size_variation = rng.random_bool(0.5);
        c.particles.color_mode = COLOR_MODES[rng.random_range(0..COLOR_MODES.len())];
        c.particles.opacity = rng.random_range(100.0..255.0);
        c.particles.trails = rng.random_bool(0.3);
        c.particles.trail_length = rng.random_range(5..30);

        c.physics.gravity.active = rng.random_bool(0.5);
        c.physics.gravity.y = rng.random_range(0.05..0.3);

        c.physics.bounds.active = rng.random_bool(0.7);
        c.physics.bounds.mode = BOUNDS[rng.random_range(0..BOUNDS.len())];

        c.physics.friction.active = rng.random_bool(0.5);
        c.physics.friction.value = rng.random_range(0.95..0.995);

        c.physics.turbulence.active = rng.random_bool(0.3);
        c.physics.turbulence.strength = rng.random_range(0.05..0.4);

        c.physics.collision.active = rng.random_bool(0.7);
        c.physics.collision.elasticity = rng.random_range(0.5..1.0);

        c.attractors.count = rng.random_range(0..3);
        c.attractors.strength = rng.random_range(0.2..1.5);
        c.attractors.fixed = rng.random_bool(0.7);

        c.fractal.kind = FRACTALS[rng.random_range(0..FRACTALS.len())];
        c.fractal.depth = rng.random_range(3..10);
        c.fractal.rotation_speed = rng.random_range(0.0..0.01);

        c.effects.background = BACKGROUNDS[rng.random_range(0..BACKGROUNDS.len())];
        c.effects.blur = rng.random_bool(0.3);
        c.effects.glow = rng.random_bool(0.5);
        c.effects.vignette = rng.random_bool(0.5);

        self.revision += 1;
        log::info!("randomized configuration");
    }
}
