//! Backgrounds drawn before the simulation and post passes applied after.

use crate::{
    canvas::{Canvas, Rgba},
    config::{BackgroundKind, Config},
};
use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rand::Rng;

pub const STAR_COUNT: usize = 200;
const STAR_BACKDROP: Rgba = Rgba::rgb(0, 10, 40);
const GRADIENT_TOP: Rgba = Rgba::rgb(10, 0, 50);
const GRADIENT_BOTTOM: Rgba = Rgba::rgb(50, 10, 90);
const PERLIN_SCALE: f64 = 0.01;
const PERLIN_TIME_STEP: f64 = 0.005;
const PERLIN_BANDS: [(f32, Rgba); 3] = [
    (0.4, Rgba::rgb(0, 20, 60)),
    (0.7, Rgba::rgb(20, 40, 80)),
    (f32::INFINITY, Rgba::rgb(40, 60, 100)),
];
const BLUR_RADIUS: usize = 3;
const BLUR_MIX: f32 = 0.5;
const VIGNETTE_RINGS: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    pub pos: Vec2,
    /// Diameter in pixels.
    pub size: f32,
    /// Radians per frame of the twinkle sine.
    pub twinkle_speed: f32,
}

impl Star {
    /// Alpha oscillates in `150..=250` with the star's own speed.
    pub fn alpha(&self, frame: u64) -> f32 {
        (frame as f32 * self.twinkle_speed).sin() * 50.0 + 200.0
    }
}

#[derive(Clone)]
pub struct EffectsSystem {
    noise: Perlin,
    stars: Vec<Star>,
    /// One color per canvas row.
    gradient: Vec<Rgba>,
}

impl EffectsSystem {
    pub fn new(seed: u32) -> Self {
        Self {
            noise: Perlin::new(seed),
            stars: Vec::new(),
            gradient: Vec::new(),
        }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Rescatters the starfield and precomputes the gradient for the
    /// configured canvas size.
    pub fn initialize(&mut self, cfg: &Config, rng: &mut impl Rng) {
        let size = cfg.canvas.size();
        self.stars = (0..STAR_COUNT)
            .map(|_| Star {
                pos: Vec2::new(
                    rng.random_range(0.0..size.x.max(1.0)),
                    rng.random_range(0.0..size.y.max(1.0)),
                ),
                size: rng.random_range(1.0..3.0),
                twinkle_speed: rng.random_range(0.02..0.05),
            })
            .collect();

        let rows = cfg.canvas.height.max(1) as usize;
        self.gradient = (0..rows)
            .map(|y| GRADIENT_TOP.lerp(GRADIENT_BOTTOM, y as f32 / rows as f32))
            .collect();
        log::info!("effects initialized for {}x{}", cfg.canvas.width, cfg.canvas.height);
    }

    /// Noise in `[0, 1]` at pixel `(x, y)` of `frame`.
    fn perlin01(&self, x: usize, y: usize, frame: u64) -> f32 {
        let v = self.noise.get([
            x as f64 * PERLIN_SCALE,
            y as f64 * PERLIN_SCALE,
            frame as f64 * PERLIN_TIME_STEP,
        ]);
        (v * 0.5 + 0.5).clamp(0.0, 1.0) as f32
    }

    pub fn draw_background(&self, cfg: &Config, frame: u64, canvas: &mut Canvas) {
        match cfg.effects.background {
            BackgroundKind::None => {
                let [r, g, b, _] = cfg.canvas.background_color;
                canvas.clear(Rgba::rgb(r, g, b));
            }
            BackgroundKind::Gradient => {
                for y in 0..canvas.height() {
                    let c = self
                        .gradient
                        .get(y)
                        .or(self.gradient.last())
                        .copied()
                        .unwrap_or(GRADIENT_TOP);
                    canvas.fill_row(y, c);
                }
            }
            BackgroundKind::Stars => {
                canvas.clear(STAR_BACKDROP);
                for star in &self.stars {
                    canvas.fill_circle(star.pos, star.size * 0.5, Rgba::WHITE.with_alpha(star.alpha(frame)));
                }
            }
            BackgroundKind::Perlin => {
                canvas.fill_with(|x, y| {
                    let v = self.perlin01(x, y, frame);
                    PERLIN_BANDS
                        .iter()
                        .find(|(limit, _)| v < *limit)
                        .map_or(PERLIN_BANDS[2].1, |(_, c)| *c)
                });
            }
        }
    }

    /// Blur, glow, vignette, each only when enabled.
    pub fn post_process(&self, cfg: &Config, canvas: &mut Canvas) {
        let fx = &cfg.effects;
        if fx.blur {
            apply_blur(canvas);
        }
        if fx.glow {
            apply_glow(canvas, fx.glow_strength as usize);
        }
        if fx.vignette {
            apply_vignette(canvas, fx.vignette_amount);
        }
    }
}

/// Mixes a light box blur back into the frame at half strength.
pub fn apply_blur(canvas: &mut Canvas) {
    let blurred = canvas.box_blur(BLUR_RADIUS);
    canvas.mix(&blurred, BLUR_MIX);
}

/// Puts a heavy blur underneath the frame: the blur only shows where it is
/// brighter than the sharp image.
pub fn apply_glow(canvas: &mut Canvas, radius: usize) {
    let halo = canvas.box_blur(radius);
    canvas.lighten(&halo);
}

/// Darkens the frame in ten stepped rings, untouched at the center and by
/// `amount` at the corners.
pub fn apply_vignette(canvas: &mut Canvas, amount: f32) {
    let amount = amount.clamp(0.0, 1.0);
    let center = canvas.size() * 0.5;
    let reach = center.length().max(1.0);
    canvas.darken_with(|x, y| {
        let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let ring = (p.distance(center) / reach * VIGNETTE_RINGS)
            .floor()
            .min(VIGNETTE_RINGS - 1.0);
        1.0 - amount * ring / (VIGNETTE_RINGS - 1.0)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn small_config(background: BackgroundKind) -> Config {
        let mut cfg = Config::default();
        cfg.canvas.width = 64;
        cfg.canvas.height = 48;
        cfg.effects.background = background;
        cfg
    }

    fn ready(cfg: &Config) -> (EffectsSystem, Canvas) {
        let mut fx = EffectsSystem::new(0);
        fx.initialize(cfg, &mut StdRng::seed_from_u64(8));
        (fx, Canvas::new(64, 48))
    }

    #[test]
    fn solid_background_uses_configured_color() {
        let mut cfg = small_config(BackgroundKind::None);
        cfg.canvas.background_color = [1, 2, 3, 255];
        let (fx, mut canvas) = ready(&cfg);
        fx.draw_background(&cfg, 0, &mut canvas);
        assert_eq!(canvas.pixel(10, 10), Some(Rgba::rgb(1, 2, 3)));
    }

    #[test]
    fn gradient_runs_top_to_bottom() {
        let cfg = small_config(BackgroundKind::Gradient);
        let (fx, mut canvas) = ready(&cfg);
        fx.draw_background(&cfg, 0, &mut canvas);

        assert_eq!(canvas.pixel(0, 0), Some(GRADIENT_TOP));
        let bottom = canvas.pixel(0, 47).unwrap();
        assert!(bottom.r > 45 && bottom.b > 85);
        assert_eq!(canvas.pixel(0, 20), canvas.pixel(63, 20));
    }

    #[test]
    fn stars_twinkle_independently_within_range() {
        let cfg = small_config(BackgroundKind::Stars);
        let (fx, _) = ready(&cfg);
        assert_eq!(fx.stars().len(), STAR_COUNT);

        for star in fx.stars() {
            assert!((0.02..0.05).contains(&star.twinkle_speed));
            assert!((1.0..3.0).contains(&star.size));
            for frame in [0, 17, 400] {
                let a = star.alpha(frame);
                assert!((150.0..=250.0).contains(&a));
            }
        }
        let speeds: Vec<f32> = fx.stars().iter().map(|s| s.twinkle_speed).collect();
        assert!(speeds.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn perlin_background_is_banded() {
        let cfg = small_config(BackgroundKind::Perlin);
        let (fx, mut canvas) = ready(&cfg);
        fx.draw_background(&cfg, 3, &mut canvas);

        let bands: Vec<Rgba> = PERLIN_BANDS.iter().map(|(_, c)| *c).collect();
        for y in 0..48 {
            for x in 0..64 {
                assert!(bands.contains(&canvas.pixel(x, y).unwrap()));
            }
        }
    }

    #[test]
    fn vignette_spares_center_and_darkens_corners() {
        let mut canvas = Canvas::new(64, 48);
        canvas.clear(Rgba::rgb(200, 200, 200));
        apply_vignette(&mut canvas, 0.5);

        assert_eq!(canvas.pixel(32, 24), Some(Rgba::rgb(200, 200, 200)));
        assert_eq!(canvas.pixel(0, 0), Some(Rgba::rgb(100, 100, 100)));
    }

    #[test]
    fn glow_brightens_around_a_dot_without_dimming_it() {
        let mut canvas = Canvas::new(32, 32);
        canvas.fill_circle(Vec2::new(16.0, 16.0), 2.0, Rgba::WHITE);
        apply_glow(&mut canvas, 4);

        assert_eq!(canvas.pixel(16, 16), Some(Rgba::WHITE));
        assert!(canvas.pixel(20, 16).unwrap().r > 0);
        assert_eq!(canvas.pixel(0, 0), Some(Rgba::BLACK));
    }

    #[test]
    fn blur_softens_hard_edges() {
        let mut canvas = Canvas::new(32, 8);
        canvas.fill_rect(Vec2::ZERO, Vec2::new(16.0, 8.0), Rgba::WHITE);
        apply_blur(&mut canvas);

        let edge = canvas.pixel(16, 4).unwrap();
        assert!(edge.r > 0 && edge.r < 255);
        assert_eq!(canvas.pixel(31, 4), Some(Rgba::BLACK));
    }

    #[test]
    fn disabled_passes_leave_frame_untouched() {
        let cfg = small_config(BackgroundKind::None);
        let (fx, mut canvas) = ready(&cfg);
        canvas.fill_circle(Vec2::new(30.0, 20.0), 5.0, Rgba::WHITE);
        let before = canvas.clone();

        fx.post_process(&cfg, &mut canvas);
        assert_eq!(canvas.as_bytes(), before.as_bytes());
    }
}
