//! Every tunable parameter of the toy, grouped the way the control panel
//! presents them.
//!
//! [`Config`] is plain data. It is owned by a
//! [`ConfigStore`](crate::store::ConfigStore), which is the only place it is
//! mutated; managers receive `&Config` once per frame and must cope with any
//! value changing between frames.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Declares a closed option set with lowercase names.
///
/// Unknown names deserialize to the declared fallback instead of failing,
/// so a hand-edited preset with a typo still loads.
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
        fallback = $fallback:ident;
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "&'static str")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Parses a lowercase name, falling back to the default variant.
            pub fn from_name(name: &str) -> Self {
                match name {
                    $($label => $name::$variant,)+
                    other => {
                        log::warn!(
                            "unknown {} `{}`, using `{}`",
                            stringify!($name),
                            other,
                            $name::$fallback.name()
                        );
                        $name::$fallback
                    }
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$fallback
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                $name::from_name(&name)
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.name()
            }
        }
    };
}

named_enum! {
    /// What happens when a particle reaches the canvas edge.
    pub enum BoundsMode {
        Bounce => "bounce",
        Wrap => "wrap",
        Disappear => "disappear",
    }
    fallback = Bounce;
}

named_enum! {
    pub enum ColorMode {
        Solid => "solid",
        Rainbow => "rainbow",
        Gradient => "gradient",
    }
    fallback = Solid;
}

named_enum! {
    pub enum ParticleShape {
        Circle => "circle",
        Square => "square",
        Triangle => "triangle",
        /// Five-point star.
        Star => "star",
    }
    fallback = Circle;
}

named_enum! {
    pub enum FractalKind {
        None => "none",
        Tree => "tree",
        Koch => "koch",
        Sierpinski => "sierpinski",
    }
    fallback = None;
}

named_enum! {
    pub enum BackgroundKind {
        /// Solid fill with [`CanvasSettings::background_color`].
        None => "none",
        Gradient => "gradient",
        Perlin => "perlin",
        Stars => "stars",
    }
    fallback = None;
}

named_enum! {
    pub enum RecordingFormat {
        Gif => "gif",
        Mp4 => "mp4",
        Webm => "webm",
    }
    fallback = Gif;
}

named_enum! {
    pub enum RecordingQuality {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
    fallback = Medium;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub width: u32,
    pub height: u32,
    pub background_color: [u8; 4],
    pub frame_rate: u32,
}

impl CanvasSettings {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn center(&self) -> Vec2 {
        self.size() * 0.5
    }
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 960,
            height: 640,
            background_color: [10, 10, 10, 255],
            frame_rate: 60,
        }
    }
}

/// Which subsystems the frame driver runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modules {
    pub particles: bool,
    pub attractors: bool,
    pub forces: bool,
    pub constraints: bool,
    pub fractals: bool,
    pub effects: bool,
}

impl Default for Modules {
    fn default() -> Self {
        Self {
            particles: true,
            attractors: false,
            forces: false,
            constraints: false,
            fractals: false,
            effects: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSettings {
    pub count: usize,
    pub size: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub size_variation: bool,
    pub color: [u8; 3],
    pub color_mode: ColorMode,
    pub shape: ParticleShape,
    pub outline: bool,
    pub outline_color: [u8; 3],
    pub outline_weight: f32,
    /// Alpha in `0.0..=255.0`.
    pub opacity: f32,
    /// Frames to live; `None` means forever.
    pub lifespan: Option<u32>,
    /// Speed cap; zero or negative disables it.
    pub max_speed: f32,
    pub trails: bool,
    pub trail_length: usize,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            count: 100,
            size: 15.0,
            min_size: 5.0,
            max_size: 30.0,
            size_variation: true,
            color: [255, 255, 255],
            color_mode: ColorMode::Solid,
            shape: ParticleShape::Circle,
            outline: true,
            outline_color: [255, 255, 255],
            outline_weight: 2.0,
            opacity: 200.0,
            lifespan: None,
            max_speed: 5.0,
            trails: false,
            trail_length: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gravity {
    pub active: bool,
    pub x: f32,
    pub y: f32,
}

impl Default for Gravity {
    fn default() -> Self {
        Self {
            active: false,
            x: 0.0,
            y: 0.1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    pub active: bool,
    pub mode: BoundsMode,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            active: true,
            mode: BoundsMode::Bounce,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Friction {
    pub active: bool,
    /// Multiplier applied to velocity every frame.
    pub value: f32,
}

impl Default for Friction {
    fn default() -> Self {
        Self {
            active: false,
            value: 0.99,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Turbulence {
    pub active: bool,
    pub strength: f32,
    /// Draw the force grid (needs the forces module).
    pub show_field: bool,
}

impl Default for Turbulence {
    fn default() -> Self {
        Self {
            active: false,
            strength: 0.1,
            show_field: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collision {
    pub active: bool,
    /// Rebound speed factor for wall and particle collisions.
    pub elasticity: f32,
}

impl Default for Collision {
    fn default() -> Self {
        Self {
            active: true,
            elasticity: 0.9,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Physics {
    pub gravity: Gravity,
    pub bounds: Bounds,
    pub friction: Friction,
    pub turbulence: Turbulence,
    pub collision: Collision,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractorSettings {
    pub count: usize,
    /// Gravitational constant `G` of the force law.
    pub strength: f32,
    /// Radius, which doubles as the attractor mass.
    pub size: f32,
    pub fixed: bool,
    pub visible: bool,
    pub color: [u8; 3],
}

impl Default for AttractorSettings {
    fn default() -> Self {
        Self {
            count: 1,
            strength: 1.0,
            size: 20.0,
            fixed: true,
            visible: true,
            color: [255, 0, 0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintSettings {
    pub count: usize,
    /// Rest length; zero captures the separation at creation time.
    pub length: f32,
    pub stiffness: f32,
    pub damping: f32,
    pub visible: bool,
    pub color: [u8; 3],
    pub weight: f32,
}

impl Default for ConstraintSettings {
    fn default() -> Self {
        Self {
            count: 0,
            length: 100.0,
            stiffness: 0.1,
            damping: 0.1,
            visible: true,
            color: [100, 100, 255],
            weight: 2.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalSettings {
    #[serde(rename = "type")]
    pub kind: FractalKind,
    pub depth: u32,
    pub size: f32,
    /// Radians added to the rotation every frame.
    pub rotation_speed: f32,
    pub color: [u8; 3],
    /// Tree branch angle follows the pointer x position.
    pub interactive: bool,
}

impl Default for FractalSettings {
    fn default() -> Self {
        Self {
            kind: FractalKind::None,
            depth: 5,
            size: 150.0,
            rotation_speed: 0.0,
            color: [0, 255, 0],
            interactive: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    pub background: BackgroundKind,
    pub blur: bool,
    pub glow: bool,
    /// Box blur radius of the glow pass, in pixels.
    pub glow_strength: u32,
    pub vignette: bool,
    /// Edge darkening in `0.0..=1.0`.
    pub vignette_amount: f32,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            background: BackgroundKind::None,
            blur: false,
            glow: false,
            glow_strength: 10,
            vignette: false,
            vignette_amount: 0.7,
        }
    }
}

/// Settings consumed by an external frame recorder; the core only stores them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    pub duration_secs: f32,
    pub fps: u32,
    pub format: RecordingFormat,
    pub quality: RecordingQuality,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            duration_secs: 5.0,
            fps: 30,
            format: RecordingFormat::Gif,
            quality: RecordingQuality::Medium,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub canvas: CanvasSettings,
    pub modules: Modules,
    pub particles: ParticleSettings,
    pub physics: Physics,
    pub attractors: AttractorSettings,
    pub constraints: ConstraintSettings,
    pub fractal: FractalSettings,
    pub effects: EffectSettings,
    pub recording: RecordingSettings,
}

impl Config {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a (possibly partial) configuration; missing fields take defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
