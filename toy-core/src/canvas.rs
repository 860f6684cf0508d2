//! CPU frame buffer every subsystem draws into.
//!
//! The canvas is always opaque: shapes are blended source-over onto it and
//! the alpha channel of every stored pixel stays 255. Coordinates are in
//! pixels with `(0, 0)` at the top-left corner and y growing downward; a
//! pixel `(x, y)` is covered when its center `(x + 0.5, y + 0.5)` is inside
//! the shape. Anything outside the canvas is clipped.

use glam::Vec2;
use rayon::prelude::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn from_array(c: [u8; 3]) -> Self {
        Self::rgb(c[0], c[1], c[2])
    }

    /// Same color with alpha taken from a `0.0..=255.0` float.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: alpha.clamp(0.0, 255.0) as u8,
            ..self
        }
    }

    /// Converts hue (degrees), saturation and brightness (percent).
    pub fn from_hsb(hue: f32, saturation: f32, brightness: f32, alpha: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let s = (saturation / 100.0).clamp(0.0, 1.0);
        let v = (brightness / 100.0).clamp(0.0, 1.0);

        let c = v * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = v - c;
        let to_u8 = |f: f32| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Self::rgb(to_u8(r), to_u8(g), to_u8(b)).with_alpha(alpha)
    }

    /// Component-wise interpolation, `t` clamped to `0.0..=1.0`.
    pub fn lerp(self, other: Rgba, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

#[derive(Clone, Debug)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 4]>,
}

/// Inclusive pixel index range whose centers may fall in `[lo, hi]`.
fn span(lo: f32, hi: f32, limit: usize) -> Option<(usize, usize)> {
    if !(lo.is_finite() && hi.is_finite()) || hi < 0.0 || lo > limit as f32 {
        return None;
    }
    let start = (lo - 0.5).floor().max(0.0) as usize;
    let end = ((hi - 0.5).ceil().max(0.0) as usize).min(limit - 1);
    (start <= end).then_some((start, end))
}

#[inline]
fn center(x: usize, y: usize) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}

#[inline]
fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

#[inline]
fn blend_px(dst: &mut [u8; 4], c: Rgba) {
    if c.a == 0 {
        return;
    }
    let t = c.a as u32;
    let mix = |d: u8, s: u8| ((d as u32 * (255 - t) + s as u32 * t + 127) / 255) as u8;
    dst[0] = mix(dst[0], c.r);
    dst[1] = mix(dst[1], c.g);
    dst[2] = mix(dst[2], c.b);
    dst[3] = 255;
}

/// Horizontal box blur of rows of `width` pixels, normalized at the edges.
fn blur_rows(src: &[[u8; 4]], dst: &mut [[u8; 4]], width: usize, radius: usize) {
    dst.par_chunks_mut(width)
        .zip(src.par_chunks(width))
        .for_each(|(out, row)| {
            let mut prefix = vec![[0u32; 3]; width + 1];
            for (i, px) in row.iter().enumerate() {
                for ch in 0..3 {
                    prefix[i + 1][ch] = prefix[i][ch] + px[ch] as u32;
                }
            }
            for (x, px) in out.iter_mut().enumerate() {
                let lo = x.saturating_sub(radius);
                let hi = (x + radius).min(width - 1);
                let n = (hi - lo + 1) as u32;
                for ch in 0..3 {
                    px[ch] = ((prefix[hi + 1][ch] - prefix[lo][ch]) / n) as u8;
                }
                px[3] = 255;
            }
        });
}

fn transpose(src: &[[u8; 4]], width: usize, height: usize) -> Vec<[u8; 4]> {
    let mut out = vec![[0u8; 4]; src.len()];
    for y in 0..height {
        for x in 0..width {
            out[x * height + y] = src[y * width + x];
        }
    }
    out
}

impl Canvas {
    /// Creates an opaque black canvas; zero dimensions are bumped to one.
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0, 255]; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Reallocates to a new size; contents are cleared to black.
    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let [r, g, b, a] = self.pixels[y * self.width + x];
        Some(Rgba::new(r, g, b, a))
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_flattened()
    }

    pub fn clear(&mut self, c: Rgba) {
        let px = [c.r, c.g, c.b, 255];
        self.pixels.fill(px);
    }

    /// Overwrites row `y` with an opaque color.
    pub fn fill_row(&mut self, y: usize, c: Rgba) {
        if y >= self.height {
            return;
        }
        let start = y * self.width;
        self.pixels[start..start + self.width].fill([c.r, c.g, c.b, 255]);
    }

    /// Overwrites every pixel with `f(x, y)`, rows in parallel.
    pub fn fill_with(&mut self, f: impl Fn(usize, usize) -> Rgba + Sync) {
        let width = self.width;
        self.pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.iter_mut().enumerate() {
                    let c = f(x, y);
                    *px = [c.r, c.g, c.b, 255];
                }
            });
    }

    /// Scales every pixel's color by `factor(x, y)` in `0.0..=1.0`.
    pub fn darken_with(&mut self, factor: impl Fn(usize, usize) -> f32 + Sync) {
        let width = self.width;
        self.pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.iter_mut().enumerate() {
                    let k = factor(x, y).clamp(0.0, 1.0);
                    for ch in px.iter_mut().take(3) {
                        *ch = (*ch as f32 * k).round() as u8;
                    }
                }
            });
    }

    pub fn blend(&mut self, x: usize, y: usize, c: Rgba) {
        if x < self.width && y < self.height {
            blend_px(&mut self.pixels[y * self.width + x], c);
        }
    }

    /// Blends `c` into every pixel in the bounding box of `(min, max)` for
    /// which `inside` holds.
    fn blend_where(&mut self, min: Vec2, max: Vec2, c: Rgba, inside: impl Fn(Vec2) -> bool) {
        if c.a == 0 {
            return;
        }
        let (Some((x0, x1)), Some((y0, y1))) =
            (span(min.x, max.x, self.width), span(min.y, max.y, self.height))
        else {
            return;
        };
        for y in y0..=y1 {
            let row = y * self.width;
            for x in x0..=x1 {
                if inside(center(x, y)) {
                    blend_px(&mut self.pixels[row + x], c);
                }
            }
        }
    }

    pub fn fill_rect(&mut self, min: Vec2, max: Vec2, c: Rgba) {
        self.blend_where(min, max, c, |p| {
            p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
        });
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, c: Rgba) {
        let r = radius.max(0.5);
        let r2 = r * r;
        self.blend_where(center - Vec2::splat(r), center + Vec2::splat(r), c, |p| {
            p.distance_squared(center) <= r2
        });
    }

    /// Ring of width `weight` centered on the circle of `radius`.
    pub fn stroke_circle(&mut self, center: Vec2, radius: f32, weight: f32, c: Rgba) {
        let half = (weight * 0.5).max(0.5);
        let outer = radius + half;
        self.blend_where(
            center - Vec2::splat(outer),
            center + Vec2::splat(outer),
            c,
            |p| (p.distance(center) - radius).abs() <= half,
        );
    }

    pub fn fill_triangle(&mut self, a: Vec2, b: Vec2, d: Vec2, c: Rgba) {
        let area = cross(b - a, d - a);
        if area.abs() < f32::EPSILON {
            return;
        }
        let sign = area.signum();
        self.blend_where(a.min(b).min(d), a.max(b).max(d), c, |p| {
            cross(b - a, p - a) * sign >= 0.0
                && cross(d - b, p - b) * sign >= 0.0
                && cross(a - d, p - d) * sign >= 0.0
        });
    }

    /// Fills a polygon that is star-shaped around `hub` as a triangle fan.
    pub fn fill_fan(&mut self, hub: Vec2, rim: &[Vec2], c: Rgba) {
        for (i, &p) in rim.iter().enumerate() {
            let q = rim[(i + 1) % rim.len()];
            self.fill_triangle(hub, p, q, c);
        }
    }

    /// Segment with round caps, `weight` pixels thick.
    ///
    /// Each row only scans the x-range of the segment part within `weight / 2`
    /// of it, so long diagonals cost their length, not their bounding box.
    pub fn line(&mut self, a: Vec2, b: Vec2, weight: f32, c: Rgba) {
        if c.a == 0 {
            return;
        }
        let half = (weight * 0.5).max(0.5);
        let ab = b - a;
        let len2 = ab.length_squared();
        let inside = |p: Vec2| {
            let t = if len2 > 0.0 {
                ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            p.distance_squared(a + ab * t) <= half * half
        };

        let Some((y0, y1)) = span(a.y.min(b.y) - half, a.y.max(b.y) + half, self.height) else {
            return;
        };
        // Half a pixel of slack keeps rounding from dropping edge pixels.
        let reach = half + 0.5;
        for y in y0..=y1 {
            let cy = y as f32 + 0.5;
            let (t0, t1) = if ab.y.abs() > f32::EPSILON {
                let (ta, tb) = ((cy - reach - a.y) / ab.y, (cy + reach - a.y) / ab.y);
                (ta.min(tb).max(0.0), ta.max(tb).min(1.0))
            } else {
                (0.0, 1.0)
            };
            if t0 > t1 {
                continue;
            }
            let (xa, xb) = (a.x + ab.x * t0, a.x + ab.x * t1);
            let Some((x0, x1)) = span(xa.min(xb) - reach, xa.max(xb) + reach, self.width) else {
                continue;
            };
            let row = y * self.width;
            for x in x0..=x1 {
                if inside(center(x, y)) {
                    blend_px(&mut self.pixels[row + x], c);
                }
            }
        }
    }

    /// Separable box blur with the given radius in pixels.
    pub fn box_blur(&self, radius: usize) -> Canvas {
        if radius == 0 {
            return self.clone();
        }
        let (w, h) = (self.width, self.height);
        let mut tmp = vec![[0u8; 4]; self.pixels.len()];
        blur_rows(&self.pixels, &mut tmp, w, radius);

        let cols = transpose(&tmp, w, h);
        let mut cols_out = vec![[0u8; 4]; cols.len()];
        blur_rows(&cols, &mut cols_out, h, radius);

        Canvas {
            width: w,
            height: h,
            pixels: transpose(&cols_out, h, w),
        }
    }

    /// Moves every pixel toward `other` by `t`. Sizes must match.
    pub fn mix(&mut self, other: &Canvas, t: f32) {
        if other.width != self.width || other.height != self.height {
            return;
        }
        let t = t.clamp(0.0, 1.0);
        self.pixels
            .par_iter_mut()
            .zip(other.pixels.par_iter())
            .for_each(|(d, s)| {
                for ch in 0..3 {
                    d[ch] = (d[ch] as f32 + (s[ch] as f32 - d[ch] as f32) * t).round() as u8;
                }
            });
    }

    /// Keeps the brighter of each channel, so `other` only shows where it
    /// exceeds the current frame. Sizes must match.
    pub fn lighten(&mut self, other: &Canvas) {
        if other.width != self.width || other.height != self.height {
            return;
        }
        self.pixels
            .par_iter_mut()
            .zip(other.pixels.par_iter())
            .for_each(|(d, s)| {
                for ch in 0..3 {
                    d[ch] = d[ch].max(s[ch]);
                }
            });
    }
}
