//! Gaussian blur approximated by three successive box filters (Kovesi).

use crate::filters::{for_each_tile_parallel, FilterPlugin, ParamBag, ProgressCallback};
use crate::pixel::Pixel;
use crate::tile::{Tile, TILE_SIZE};

const MIN_SIGMA: f64 = 0.1;
const MAX_SIGMA: f64 = 50.0;
const DEFAULT_SIGMA: f64 = 1.0;
const BOX_PASSES: f64 = 3.0;

/// Compute the three box-filter widths that approximate a Gaussian of the
/// given sigma, per Kovesi's method: the ideal width is
/// `w = sqrt(12*sigma^2/n + 1)` for `n` passes; the first `m` passes use the
/// odd `floor(w)`, the rest use `floor(w) + 2`, with `m` chosen to match
/// variance.
pub(crate) fn box_pass_widths(sigma: f64) -> [u32; 3] {
    let w_ideal = (12.0 * sigma * sigma / BOX_PASSES + 1.0).sqrt();
    let mut wl = w_ideal.floor() as i64;
    if wl % 2 == 0 {
        wl -= 1;
    }
    wl = wl.max(1);
    let wu = wl + 2;

    let wl_f = wl as f64;
    let m_ideal =
        (12.0 * sigma * sigma - BOX_PASSES * wl_f * wl_f - 4.0 * BOX_PASSES * wl_f - 3.0 * BOX_PASSES) / (-4.0 * wl_f - 4.0);
    let m = (m_ideal.round() as i64).clamp(0, BOX_PASSES as i64);

    let mut widths = [wu as u32; 3];
    for (i, slot) in widths.iter_mut().enumerate() {
        *slot = if (i as i64) < m { wl as u32 } else { wu as u32 };
    }
    widths
}

/// Box-blur a tile's own 256x256 pixel buffer in place, isolating edge
/// pixels within the tile (replicate-border, no halo into neighbors) — a
/// deliberate simplification; see DESIGN.md for the tile-seam tradeoff this
/// implies at large sigma.
pub(crate) fn box_blur_tile(tile: &mut Tile, width: u32) {
    if width <= 1 {
        return;
    }
    let dim = TILE_SIZE as i32;
    let radius = (width / 2) as i32;
    let window = (radius * 2 + 1) as f32;

    let src: Vec<Pixel> = tile.pixels().to_vec();
    let mut horiz = vec![Pixel::default(); src.len()];
    for y in 0..dim {
        for x in 0..dim {
            let mut sum = [0f32; 4];
            for dx in -radius..=radius {
                let sx = (x + dx).clamp(0, dim - 1);
                let p = src[(y * dim + sx) as usize].to_normalized();
                for (acc, v) in sum.iter_mut().zip(p) {
                    *acc += v;
                }
            }
            horiz[(y * dim + x) as usize] = Pixel::from_normalized(sum.map(|v| v / window));
        }
    }

    let mut vert = vec![Pixel::default(); horiz.len()];
    for y in 0..dim {
        for x in 0..dim {
            let mut sum = [0f32; 4];
            for dy in -radius..=radius {
                let sy = (y + dy).clamp(0, dim - 1);
                let p = horiz[(sy * dim + x) as usize].to_normalized();
                for (acc, v) in sum.iter_mut().zip(p) {
                    *acc += v;
                }
            }
            vert[(y * dim + x) as usize] = Pixel::from_normalized(sum.map(|v| v / window));
        }
    }

    tile.pixels_mut().copy_from_slice(&vert);
}

pub struct GaussianBlurFilter;

impl FilterPlugin for GaussianBlurFilter {
    fn name(&self) -> &'static str {
        "gaussian_blur"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn description(&self) -> &'static str {
        "Approximates a Gaussian blur with three successive box filters"
    }

    fn process(&self, tiles: &mut [Tile], _width: u32, _height: u32, params: &ParamBag, progress: &dyn ProgressCallback) {
        let sigma = params.float("sigma", DEFAULT_SIGMA).clamp(MIN_SIGMA, MAX_SIGMA);
        let widths = box_pass_widths(sigma);
        for_each_tile_parallel(tiles, progress, |tile| {
            for &w in &widths {
                box_blur_tile(tile, w);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::NoProgress;
    use crate::tile_grid::TileGrid;

    #[test]
    fn s6_flat_tile_preserves_energy() {
        let mut grid = TileGrid::new(256, 256);
        grid.fill(Pixel::new(1000, 2000, 3000, 65535));
        GaussianBlurFilter.process(grid.tiles_mut(), 256, 256, &ParamBag::new().with_float("sigma", 5.0), &NoProgress);
        for &(x, y) in &[(0, 0), (128, 128), (255, 255), (0, 255)] {
            let p = grid.get_pixel(x, y);
            assert!((p.r as i32 - 1000).abs() <= 2, "r={}", p.r);
            assert!((p.g as i32 - 2000).abs() <= 2, "g={}", p.g);
            assert!((p.b as i32 - 3000).abs() <= 2, "b={}", p.b);
        }
    }

    #[test]
    fn sigma_is_clamped_to_documented_range() {
        let mut grid = TileGrid::new(256, 256);
        grid.fill(Pixel::new(500, 500, 500, 65535));
        // Wildly out-of-range sigma should not panic and should still
        // preserve a flat field.
        GaussianBlurFilter.process(grid.tiles_mut(), 256, 256, &ParamBag::new().with_float("sigma", 9999.0), &NoProgress);
        assert!((grid.get_pixel(10, 10).r as i32 - 500).abs() <= 2);
    }

    #[test]
    fn default_sigma_used_when_param_missing() {
        let mut grid = TileGrid::new(256, 256);
        grid.set_pixel(128, 128, Pixel::new(65535, 65535, 65535, 65535));
        GaussianBlurFilter.process(grid.tiles_mut(), 256, 256, &ParamBag::new(), &NoProgress);
        // A single bright pixel should spread slightly into its neighbor
        // under the default sigma=1.0 blur.
        assert!(grid.get_pixel(129, 128).r > 0);
    }

    #[test]
    fn box_pass_widths_are_all_odd_or_even_per_kovesi() {
        let widths = box_pass_widths(3.0);
        assert_eq!(widths.len(), 3);
        assert!(widths.iter().all(|&w| w >= 1));
    }
}
