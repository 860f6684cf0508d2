//! Generative geometry drawn behind the simulation.
//!
//! Geometry is rebuilt only when the fractal kind, depth, size or canvas
//! size changes. Between rebuilds, each frame only advances the shared
//! rotation about the canvas center.

use crate::{
    canvas::{Canvas, Rgba},
    config::{Config, FractalKind},
    types::PointerState,
};
use glam::{Affine2, Vec2};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_6};

/// Configured depths are clamped to this many generations.
pub const MAX_DEPTH: u32 = 10;
/// Each tree branch is this fraction of its parent.
pub const TREE_RATIO: f32 = 0.67;
/// Split angle of the tree when it does not follow the pointer.
pub const TREE_ANGLE: f32 = FRAC_PI_6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub a: Vec2,
    pub b: Vec2,
}

impl Segment {
    pub fn length(&self) -> f32 {
        self.a.distance(self.b)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec2; 3],
    pub level: u32,
}

/// Stored geometry per fractal kind. The tree is drawn recursively and
/// keeps none.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Geometry {
    #[default]
    None,
    Tree,
    Koch(Vec<Segment>),
    Sierpinski(Vec<Triangle>),
}

/// One Koch generation: every segment becomes four, the middle third
/// replaced by the two sides of an equilateral peak.
pub fn koch_step(segments: &[Segment]) -> Vec<Segment> {
    let peak = Vec2::from_angle(-FRAC_PI_3);
    let mut next = Vec::with_capacity(segments.len() * 4);
    for s in segments {
        let third = (s.b - s.a) / 3.0;
        let b = s.a + third;
        let d = s.a + third * 2.0;
        let c = b + peak.rotate(third);
        next.extend([
            Segment { a: s.a, b },
            Segment { a: b, b: c },
            Segment { a: c, b: d },
            Segment { a: d, b: s.b },
        ]);
    }
    next
}

/// Subdivides every triangle tagged `level` into its three corner
/// triangles, appended with `level + 1`. Older triangles are kept.
pub fn sierpinski_step(triangles: &mut Vec<Triangle>, level: u32) {
    let children: Vec<Triangle> = triangles
        .iter()
        .filter(|t| t.level == level)
        .flat_map(|t| {
            let [p1, p2, p3] = t.vertices;
            let m12 = p1.lerp(p2, 0.5);
            let m23 = p2.lerp(p3, 0.5);
            let m31 = p3.lerp(p1, 0.5);
            let level = t.level + 1;
            [
                Triangle { vertices: [p1, m12, m31], level },
                Triangle { vertices: [m12, p2, m23], level },
                Triangle { vertices: [m31, m23, p3], level },
            ]
        })
        .collect();
    triangles.extend(children);
}

/// Walks a binary tree of branches, handing every segment to `sink`.
///
/// ### Parameters
/// - `base` - Start of the trunk.
/// - `heading` - Unit direction of the trunk.
/// - `len` - Trunk length; each level multiplies it by [`TREE_RATIO`].
/// - `split` - Angle between a branch and each of its two children.
/// - `depth` - Levels of children below the trunk.
pub fn tree_segments(
    base: Vec2,
    heading: Vec2,
    len: f32,
    split: f32,
    depth: u32,
    sink: &mut impl FnMut(Segment),
) {
    let tip = base + heading * len;
    sink(Segment { a: base, b: tip });
    if depth == 0 {
        return;
    }
    let len = len * TREE_RATIO;
    for turn in [split, -split] {
        tree_segments(tip, Vec2::from_angle(turn).rotate(heading), len, split, depth - 1, sink);
    }
}

#[derive(Clone, Debug, Default)]
pub struct FractalSystem {
    kind: FractalKind,
    depth: u32,
    size: f32,
    canvas: Vec2,
    /// Accumulated rotation in radians.
    pub angle: f32,
    /// Current tree split angle.
    pub tree_angle: f32,
    geometry: Geometry,
}

impl FractalSystem {
    pub fn new(cfg: &Config) -> Self {
        let mut sys = Self::default();
        sys.initialize(cfg);
        sys
    }

    pub fn kind(&self) -> FractalKind {
        self.kind
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Rebuilds the geometry for the current configuration.
    pub fn initialize(&mut self, cfg: &Config) {
        let settings = &cfg.fractal;
        self.kind = settings.kind;
        self.depth = settings.depth.min(MAX_DEPTH);
        self.size = settings.size;
        self.canvas = cfg.canvas.size();
        self.tree_angle = TREE_ANGLE;

        let center = cfg.canvas.center();
        self.geometry = match self.kind {
            FractalKind::None => Geometry::None,
            FractalKind::Tree => Geometry::Tree,
            FractalKind::Koch => {
                let offset = Vec2::new(self.size, 0.0);
                let mut segments = vec![Segment {
                    a: center - offset,
                    b: center + offset,
                }];
                for _ in 0..self.depth {
                    segments = koch_step(&segments);
                }
                Geometry::Koch(segments)
            }
            FractalKind::Sierpinski => {
                let h = self.size * 3f32.sqrt() / 2.0;
                let half = self.size / 2.0;
                let mut triangles = vec![Triangle {
                    vertices: [
                        center + Vec2::new(0.0, -2.0 * h / 3.0),
                        center + Vec2::new(-half, h / 3.0),
                        center + Vec2::new(half, h / 3.0),
                    ],
                    level: 0,
                }];
                for level in 0..self.depth {
                    sierpinski_step(&mut triangles, level);
                }
                Geometry::Sierpinski(triangles)
            }
        };
        log::debug!("fractal rebuilt: {} depth {}", self.kind, self.depth);
    }

    fn is_stale(&self, cfg: &Config) -> bool {
        let settings = &cfg.fractal;
        self.kind != settings.kind
            || self.depth != settings.depth.min(MAX_DEPTH)
            || self.size != settings.size
            || self.canvas != cfg.canvas.size()
    }

    pub fn update(&mut self, cfg: &Config, pointer: PointerState) {
        if self.is_stale(cfg) {
            self.initialize(cfg);
        }
        self.angle += cfg.fractal.rotation_speed;

        self.tree_angle = if cfg.fractal.interactive && self.kind == FractalKind::Tree {
            pointer.pos.x / self.canvas.x.max(1.0) * FRAC_PI_2
        } else {
            TREE_ANGLE
        };
    }

    /// Rotation about the canvas center by the accumulated angle.
    pub fn transform(&self) -> Affine2 {
        let c = self.canvas * 0.5;
        Affine2::from_translation(c) * Affine2::from_angle(self.angle) * Affine2::from_translation(-c)
    }

    pub fn display(&self, cfg: &Config, canvas: &mut Canvas) {
        let color = Rgba::from_array(cfg.fractal.color);
        let xf = self.transform();

        match &self.geometry {
            Geometry::None => {}
            Geometry::Tree => {
                let base = Vec2::new(self.canvas.x * 0.5, self.canvas.y * 0.5 + self.size);
                let weight = self.size / 20.0;
                tree_segments(
                    base,
                    Vec2::NEG_Y,
                    self.size,
                    self.tree_angle,
                    self.depth,
                    &mut |s: Segment| canvas.line(xf.transform_point2(s.a), xf.transform_point2(s.b), weight, color),
                );
            }
            Geometry::Koch(segments) => {
                for s in segments {
                    canvas.line(xf.transform_point2(s.a), xf.transform_point2(s.b), 2.0, color);
                }
            }
            Geometry::Sierpinski(triangles) => {
                let fill = color.with_alpha(150.0);
                for t in triangles.iter().filter(|t| t.level == self.depth) {
                    let [a, b, c] = t.vertices.map(|v| xf.transform_point2(v));
                    canvas.fill_triangle(a, b, c, fill);
                }
            }
        }
    }

    pub fn run(&mut self, cfg: &Config, pointer: PointerState, canvas: &mut Canvas) {
        self.update(cfg, pointer);
        self.display(cfg, canvas);
    }
}
