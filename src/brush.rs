//! Brush and eraser stroke kernels, and an optional stroke densifier.

use glam::Vec2;
use tracing::{debug, warn};

use crate::layer::Layer;
use crate::pixel::Pixel;

/// Paint a brush stroke: a polyline of pixel-space points stamped as a
/// union of disk stamps.
///
/// For each point, with integer radius `r = floor(size/2)`, every integer
/// offset `(dx, dy)` in `[-r, r]^2` with euclidean distance `d <= r` gets
/// weight `w = (1 - d/r) * opacity`, blended per channel (including alpha)
/// toward `color`. Points are applied independently; no interpolation along
/// the polyline is performed here (callers densify first, see
/// [`StrokeSpacer`]). Invalid `layer` index is a silent no-op.
pub fn draw_brush_stroke(layers: &mut [Layer], layer: usize, points: &[(f32, f32)], size: f32, opacity: f32, color: Pixel) {
    let Some(l) = layers.get_mut(layer) else {
        warn!("draw_brush_stroke: layer index {} out of range", layer);
        return;
    };
    let opacity = opacity.clamp(0.0, 1.0);
    let radius = (size / 2.0).floor();
    if radius <= 0.0 || opacity <= 0.0 {
        return;
    }
    debug!("draw_brush_stroke: layer={} points={} radius={}", layer, points.len(), radius);
    let grid = l.pixels_mut();
    let (w, h) = (grid.width() as i64, grid.height() as i64);
    let r = radius as i64;
    let color_n = color.to_normalized();

    for &(px, py) in points {
        let cx = px.round() as i64;
        let cy = py.round() as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                let d = ((dx * dx + dy * dy) as f32).sqrt();
                if d > radius {
                    continue;
                }
                let weight = (1.0 - d / radius) * opacity;
                let x = cx + dx;
                let y = cy + dy;
                if x < 0 || y < 0 || x >= w || y >= h {
                    continue;
                }
                let mut dst = grid.get_pixel(x as u32, y as u32).to_normalized();
                for c in 0..4 {
                    dst[c] = dst[c] * (1.0 - weight) + color_n[c] * weight;
                }
                grid.set_pixel(x as u32, y as u32, Pixel::from_normalized(dst));
            }
        }
    }
}

/// Erase along a polyline: identical stamping geometry to
/// [`draw_brush_stroke`], but only attenuates alpha; RGB channels are
/// untouched. Invalid `layer` index is a silent no-op.
pub fn erase_brush_stroke(layers: &mut [Layer], layer: usize, points: &[(f32, f32)], size: f32, opacity: f32) {
    let Some(l) = layers.get_mut(layer) else {
        warn!("erase_brush_stroke: layer index {} out of range", layer);
        return;
    };
    let opacity = opacity.clamp(0.0, 1.0);
    let radius = (size / 2.0).floor();
    if radius <= 0.0 || opacity <= 0.0 {
        return;
    }
    debug!("erase_brush_stroke: layer={} points={} radius={}", layer, points.len(), radius);
    let grid = l.pixels_mut();
    let (w, h) = (grid.width() as i64, grid.height() as i64);
    let r = radius as i64;

    for &(px, py) in points {
        let cx = px.round() as i64;
        let cy = py.round() as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                let d = ((dx * dx + dy * dy) as f32).sqrt();
                if d > radius {
                    continue;
                }
                let weight = (1.0 - d / radius) * opacity;
                let x = cx + dx;
                let y = cy + dy;
                if x < 0 || y < 0 || x >= w || y >= h {
                    continue;
                }
                let mut p = grid.get_pixel(x as u32, y as u32);
                let new_a = (p.a as f32) * (1.0 - weight);
                p.a = new_a.round().clamp(0.0, Pixel::MAX as f32) as u16;
                grid.set_pixel(x as u32, y as u32, p);
            }
        }
    }
}

/// Elliptical generalization of [`draw_brush_stroke`]. `radius` is the
/// major-axis radius in pixels; `aspect_ratio` in `(0, 1]` scales the minor
/// axis (`1.0` = circle); `angle_radians` rotates the ellipse
/// counter-clockwise. A point is inside the dab when its rotated,
/// per-axis-normalized distance from center is `<= 1`; the weight is
/// `(1 - normalized_distance) * opacity`, the same linear falloff shape the
/// circular kernel uses. Invalid `layer` index is a silent no-op.
pub fn draw_brush_stroke_ellipse(
    layers: &mut [Layer],
    layer: usize,
    points: &[(f32, f32)],
    radius: f32,
    aspect_ratio: f32,
    angle_radians: f32,
    opacity: f32,
    color: Pixel,
) {
    let Some(l) = layers.get_mut(layer) else {
        warn!("draw_brush_stroke_ellipse: layer index {} out of range", layer);
        return;
    };
    let opacity = opacity.clamp(0.0, 1.0);
    let aspect_ratio = aspect_ratio.clamp(0.01, 1.0);
    if radius <= 0.0 || opacity <= 0.0 {
        return;
    }
    debug!("draw_brush_stroke_ellipse: layer={} points={} radius={} aspect={}", layer, points.len(), radius, aspect_ratio);
    let grid = l.pixels_mut();
    let (w, h) = (grid.width() as i64, grid.height() as i64);
    let r = radius.ceil() as i64;
    let minor = radius * aspect_ratio;
    let (cos_a, sin_a) = (angle_radians.cos(), angle_radians.sin());
    let color_n = color.to_normalized();

    for &(px, py) in points {
        let cx = px.round() as i64;
        let cy = py.round() as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                let rotated_x = dx as f32 * cos_a + dy as f32 * sin_a;
                let rotated_y = -(dx as f32) * sin_a + dy as f32 * cos_a;
                let nx = rotated_x / radius;
                let ny = rotated_y / minor;
                let dist_sq = nx * nx + ny * ny;
                if dist_sq > 1.0 {
                    continue;
                }
                let weight = (1.0 - dist_sq.sqrt()) * opacity;
                let x = cx + dx;
                let y = cy + dy;
                if x < 0 || y < 0 || x >= w || y >= h {
                    continue;
                }
                let mut dst = grid.get_pixel(x as u32, y as u32).to_normalized();
                for c in 0..4 {
                    dst[c] = dst[c] * (1.0 - weight) + color_n[c] * weight;
                }
                grid.set_pixel(x as u32, y as u32, Pixel::from_normalized(dst));
            }
        }
    }
}

/// Elliptical generalization of [`erase_brush_stroke`]; see
/// [`draw_brush_stroke_ellipse`] for the geometry. Only alpha is attenuated.
pub fn erase_brush_stroke_ellipse(
    layers: &mut [Layer],
    layer: usize,
    points: &[(f32, f32)],
    radius: f32,
    aspect_ratio: f32,
    angle_radians: f32,
    opacity: f32,
) {
    let Some(l) = layers.get_mut(layer) else {
        warn!("erase_brush_stroke_ellipse: layer index {} out of range", layer);
        return;
    };
    let opacity = opacity.clamp(0.0, 1.0);
    let aspect_ratio = aspect_ratio.clamp(0.01, 1.0);
    if radius <= 0.0 || opacity <= 0.0 {
        return;
    }
    debug!("erase_brush_stroke_ellipse: layer={} points={} radius={} aspect={}", layer, points.len(), radius, aspect_ratio);
    let grid = l.pixels_mut();
    let (w, h) = (grid.width() as i64, grid.height() as i64);
    let r = radius.ceil() as i64;
    let minor = radius * aspect_ratio;
    let (cos_a, sin_a) = (angle_radians.cos(), angle_radians.sin());

    for &(px, py) in points {
        let cx = px.round() as i64;
        let cy = py.round() as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                let rotated_x = dx as f32 * cos_a + dy as f32 * sin_a;
                let rotated_y = -(dx as f32) * sin_a + dy as f32 * cos_a;
                let nx = rotated_x / radius;
                let ny = rotated_y / minor;
                let dist_sq = nx * nx + ny * ny;
                if dist_sq > 1.0 {
                    continue;
                }
                let weight = (1.0 - dist_sq.sqrt()) * opacity;
                let x = cx + dx;
                let y = cy + dy;
                if x < 0 || y < 0 || x >= w || y >= h {
                    continue;
                }
                let mut p = grid.get_pixel(x as u32, y as u32);
                let new_a = (p.a as f32) * (1.0 - weight);
                p.a = new_a.round().clamp(0.0, Pixel::MAX as f32) as u16;
                grid.set_pixel(x as u32, y as u32, p);
            }
        }
    }
}

/// Optional stroke densifier: spaces out evenly-sampled stamp points along a
/// raw polyline of sparse input points, so a caller whose input device emits
/// widely-spaced samples can still paint a continuous-looking stroke. This
/// sits entirely above the per-point kernels above — it never changes what a
/// single point does, only how many points a caller passes in.
pub struct StrokeSpacer {
    spacing_px: f32,
    last: Option<Vec2>,
    carry: f32,
}

impl StrokeSpacer {
    /// `spacing_px` is the distance between generated points; must be
    /// positive (non-positive values are clamped to a small epsilon to
    /// avoid an infinite loop).
    pub fn new(spacing_px: f32) -> Self {
        Self { spacing_px: spacing_px.max(0.01), last: None, carry: 0.0 }
    }

    pub fn begin(&mut self) {
        self.last = None;
        self.carry = 0.0;
    }

    /// Feed a new raw input point, returning densified points (including
    /// the very first point of the stroke) to stamp.
    pub fn advance(&mut self, point: (f32, f32)) -> Vec<(f32, f32)> {
        let p = Vec2::new(point.0, point.1);
        let Some(last) = self.last else {
            self.last = Some(p);
            return vec![point];
        };
        let delta = p - last;
        let distance = delta.length();
        if distance < 1e-6 {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut travelled = self.spacing_px - self.carry;
        while travelled <= distance {
            let t = travelled / distance;
            let stamp = last + delta * t;
            out.push((stamp.x, stamp.y));
            travelled += self.spacing_px;
        }
        self.carry = distance - (travelled - self.spacing_px);
        if self.carry < 0.0 {
            self.carry = 0.0;
        }
        self.last = Some(p);
        out
    }
}
