//! Partial configuration snapshots.
//!
//! A [`Preset`] lists only the fields it cares about. Applying it replaces
//! the listed scalar fields and merges the listed physics groups field by
//! field, so a preset saying `gravity: { active: false }` keeps the current
//! gravity vector.

use crate::config::{
    BackgroundKind, Bounds, BoundsMode, Collision, ColorMode, Config, FractalKind, Friction,
    Gravity, Turbulence,
};
use serde::{Deserialize, Serialize};

/// Declares a partial mirror of a physics group plus its merge rules.
macro_rules! group_patch {
    ($patch:ident for $group:ident { $($field:ident: $ty:ty),+ $(,)? }) => {
        #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $patch {
            $(
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )+
        }

        impl $patch {
            pub fn merge_into(&self, target: &mut $group) {
                $(
                    if let Some(v) = &self.$field {
                        target.$field = v.clone();
                    }
                )+
            }
        }

        impl From<&$group> for $patch {
            fn from(group: &$group) -> Self {
                Self {
                    $($field: Some(group.$field.clone()),)+
                }
            }
        }
    };
}

group_patch!(GravityPatch for Gravity { active: bool, x: f32, y: f32 });
group_patch!(BoundsPatch for Bounds { active: bool, mode: BoundsMode });
group_patch!(FrictionPatch for Friction { active: bool, value: f32 });
group_patch!(TurbulencePatch for Turbulence { active: bool, strength: f32, show_field: bool });
group_patch!(CollisionPatch for Collision { active: bool, elasticity: f32 });

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle_size_variation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle_color_mode: Option<ColorMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle_opacity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle_trails: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle_trail_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gravity: Option<GravityPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundsPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friction: Option<FrictionPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turbulence: Option<TurbulencePatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collision: Option<CollisionPatch>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attractor_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attractor_strength: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attractor_fixed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fractal_type: Option<FractalKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fractal_depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fractal_rotation_speed: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fractal_interactive: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glow: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vignette: Option<bool>,
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

impl Preset {
    /// Captures the fields a saved preset carries; physics groups in full.
    pub fn snapshot(cfg: &Config) -> Self {
        Self {
            particle_count: Some(cfg.particles.count),
            particle_size: Some(cfg.particles.size),
            particle_size_variation: Some(cfg.particles.size_variation),
            particle_color_mode: Some(cfg.particles.color_mode),
            particle_opacity: Some(cfg.particles.opacity),
            particle_trails: Some(cfg.particles.trails),
            particle_trail_length: Some(cfg.particles.trail_length),

            gravity: Some((&cfg.physics.gravity).into()),
            bounds: Some((&cfg.physics.bounds).into()),
            friction: Some((&cfg.physics.friction).into()),
            turbulence: Some((&cfg.physics.turbulence).into()),
            collision: Some((&cfg.physics.collision).into()),

            attractor_count: Some(cfg.attractors.count),
            attractor_strength: Some(cfg.attractors.strength),
            attractor_fixed: Some(cfg.attractors.fixed),

            fractal_type: Some(cfg.fractal.kind),
            fractal_depth: Some(cfg.fractal.depth),
            fractal_rotation_speed: Some(cfg.fractal.rotation_speed),
            fractal_interactive: None,

            background: Some(cfg.effects.background),
            blur: Some(cfg.effects.blur),
            glow: Some(cfg.effects.glow),
            vignette: Some(cfg.effects.vignette),
        }
    }

    pub fn apply(&self, cfg: &mut Config) {
        set(&mut cfg.particles.count, &self.particle_count);
        set(&mut cfg.particles.size, &self.particle_size);
        set(&mut cfg.particles.size_variation, &self.particle_size_variation);
        set(&mut cfg.particles.color_mode, &self.particle_color_mode);
        set(&mut cfg.particles.opacity, &self.particle_opacity);
        set(&mut cfg.particles.trails, &self.particle_trails);
        set(&mut cfg.particles.trail_length, &self.particle_trail_length);

        if let Some(p) = &self.gravity {
            p.merge_into(&mut cfg.physics.gravity);
        }
        if let Some(p) = &self.bounds {
            p.merge_into(&mut cfg.physics.bounds);
        }
        if let Some(p) = &self.friction {
            p.merge_into(&mut cfg.physics.friction);
        }
        if let Some(p) = &self.turbulence {
            p.merge_into(&mut cfg.physics.turbulence);
        }
        if let Some(p) = &self.collision {
            p.merge_into(&mut cfg.physics.collision);
        }

        set(&mut cfg.attractors.count, &self.attractor_count);
        set(&mut cfg.attractors.strength, &self.attractor_strength);
        set(&mut cfg.attractors.fixed, &self.attractor_fixed);

        set(&mut cfg.fractal.kind, &self.fractal_type);
        set(&mut cfg.fractal.depth, &self.fractal_depth);
        set(&mut cfg.fractal.rotation_speed, &self.fractal_rotation_speed);
        set(&mut cfg.fractal.interactive, &self.fractal_interactive);

        set(&mut cfg.effects.background, &self.background);
        set(&mut cfg.effects.blur, &self.blur);
        set(&mut cfg.effects.glow, &self.glow);
        set(&mut cfg.effects.vignette, &self.vignette);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// The presets every store starts with.
pub fn builtin_presets() -> Vec<(&'static str, Preset)> {
    vec![
        (
            "bouncy",
            Preset {
                particle_count: Some(50),
                particle_size: Some(20.0),
                particle_size_variation: Some(true),
                particle_color_mode: Some(ColorMode::Rainbow),
                gravity: Some(GravityPatch {
                    active: Some(true),
                    x: Some(0.0),
                    y: Some(0.2),
                }),
                bounds: Some(BoundsPatch {
                    active: Some(true),
                    mode: Some(BoundsMode::Bounce),
                }),
                collision: Some(CollisionPatch {
                    active: Some(true),
                    elasticity: Some(0.9),
                }),
                ..Default::default()
            },
        ),
        (
            "galaxy",
            Preset {
                particle_count: Some(200),
                particle_size: Some(5.0),
                particle_opacity: Some(150.0),
                particle_trails: Some(true),
                particle_trail_length: Some(15),
                particle_color_mode: Some(ColorMode::Gradient),
                attractor_count: Some(1),
                attractor_strength: Some(0.8),
                attractor_fixed: Some(true),
                gravity: Some(GravityPatch {
                    active: Some(false),
                    ..Default::default()
                }),
                bounds: Some(BoundsPatch {
                    active: Some(false),
                    ..Default::default()
                }),
                friction: Some(FrictionPatch {
                    active: Some(true),
                    value: Some(0.99),
                }),
                background: Some(BackgroundKind::Stars),
                glow: Some(true),
                vignette: Some(true),
                ..Default::default()
            },
        ),
        (
            "fractals",
            Preset {
                particle_count: Some(0),
                fractal_type: Some(FractalKind::Tree),
                fractal_depth: Some(9),
                fractal_rotation_speed: Some(0.005),
                fractal_interactive: Some(true),
                background: Some(BackgroundKind::Gradient),
                glow: Some(true),
                ..Default::default()
            },
        ),
        (
            "fluid",
            Preset {
                particle_count: Some(300),
                particle_size: Some(8.0),
                particle_opacity: Some(150.0),
                gravity: Some(GravityPatch {
                    active: Some(false),
                    ..Default::default()
                }),
                friction: Some(FrictionPatch {
                    active: Some(true),
                    value: Some(0.98),
                }),
                turbulence: Some(TurbulencePatch {
                    active: Some(true),
                    strength: Some(0.3),
                    ..Default::default()
                }),
                collision: Some(CollisionPatch {
                    active: Some(false),
                    ..Default::default()
                }),
                background: Some(BackgroundKind::Perlin),
                blur: Some(true),
                glow: Some(true),
                ..Default::default()
            },
        ),
    ]
}
