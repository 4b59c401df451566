//! Unsharp mask: blur a copy of the tile, then push the original away from
//! the blur wherever the difference clears a threshold.

use crate::filters::gaussian_blur::box_pass_widths;
use crate::filters::{for_each_tile_parallel, FilterPlugin, ParamBag, ProgressCallback};
use crate::pixel::Pixel;
use crate::tile::Tile;

const MIN_RADIUS: f64 = 0.1;
const MAX_RADIUS: f64 = 50.0;
const DEFAULT_RADIUS: f64 = 1.0;

const MIN_AMOUNT: f64 = 0.0;
const MAX_AMOUNT: f64 = 5.0;
const DEFAULT_AMOUNT: f64 = 1.0;

const MIN_THRESHOLD: f64 = 0.0;
const MAX_THRESHOLD: f64 = 1.0;
const DEFAULT_THRESHOLD: f64 = 0.0;

fn sharpen_tile(tile: &mut Tile, radius: f64, amount: f32, threshold: f32) {
    let widths = box_pass_widths(radius);
    let mut blurred = tile.clone();
    for &w in &widths {
        super::gaussian_blur::box_blur_tile(&mut blurred, w);
    }

    let sharp: Vec<Pixel> = tile
        .pixels()
        .iter()
        .zip(blurred.pixels().iter())
        .map(|(&orig, &blur)| {
            let o = orig.to_normalized();
            let b = blur.to_normalized();
            let diff = [o[0] - b[0], o[1] - b[1], o[2] - b[2], o[3] - b[3]];
            // Gate the whole pixel on one grayscale diff magnitude, per
            // spec: "zero out diff where |grayscale(diff)| <= threshold",
            // not per channel independently.
            let gray_diff = (0.2126 * diff[0] + 0.7152 * diff[1] + 0.0722 * diff[2]).abs();
            let mut out = [0f32; 4];
            for c in 0..4 {
                out[c] = if gray_diff > threshold { o[c] + amount * diff[c] } else { o[c] };
            }
            Pixel::from_normalized(out)
        })
        .collect();
    tile.pixels_mut().copy_from_slice(&sharp);
}

pub struct UnsharpMaskFilter;

impl FilterPlugin for UnsharpMaskFilter {
    fn name(&self) -> &'static str {
        "unsharp_mask"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn description(&self) -> &'static str {
        "Sharpens detail by amplifying the difference against a blurred copy"
    }

    fn process(&self, tiles: &mut [Tile], _width: u32, _height: u32, params: &ParamBag, progress: &dyn ProgressCallback) {
        let radius = params.float("radius", DEFAULT_RADIUS).clamp(MIN_RADIUS, MAX_RADIUS);
        let amount = params.float("amount", DEFAULT_AMOUNT).clamp(MIN_AMOUNT, MAX_AMOUNT) as f32;
        let threshold = params.float("threshold", DEFAULT_THRESHOLD).clamp(MIN_THRESHOLD, MAX_THRESHOLD) as f32;
        for_each_tile_parallel(tiles, progress, |tile| {
            sharpen_tile(tile, radius, amount, threshold);
        });
    }
}
