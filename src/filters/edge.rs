//! Shared edge-detection helpers used by the inpaint and smudge filters.
//!
//! A from-scratch full Canny (gradient + non-max suppression + hysteresis)
//! scoped to a single tile's own 256x256 buffer, since filters process
//! tiles independently (see gaussian_blur's box filter for the same
//! edge-isolation tradeoff).

use crate::pixel::Pixel;
use crate::tile::{Tile, TILE_SIZE};

const DIM: usize = TILE_SIZE as usize;

fn luminance(p: Pixel) -> f32 {
    let n = p.to_normalized();
    0.2126 * n[0] + 0.7152 * n[1] + 0.0722 * n[2]
}

fn luminance_buffer(tile: &Tile) -> Vec<f32> {
    tile.pixels().iter().map(|&p| luminance(p)).collect()
}

fn sample(buf: &[f32], x: i32, y: i32) -> f32 {
    let x = x.clamp(0, DIM as i32 - 1) as usize;
    let y = y.clamp(0, DIM as i32 - 1) as usize;
    buf[y * DIM + x]
}

/// Sobel gradient magnitude at every pixel, edge-clamped at the tile border.
fn sobel_magnitude(lum: &[f32]) -> Vec<f32> {
    let mut out = vec![0f32; DIM * DIM];
    for y in 0..DIM as i32 {
        for x in 0..DIM as i32 {
            let gx = -sample(lum, x - 1, y - 1) - 2.0 * sample(lum, x - 1, y) - sample(lum, x - 1, y + 1)
                + sample(lum, x + 1, y - 1)
                + 2.0 * sample(lum, x + 1, y)
                + sample(lum, x + 1, y + 1);
            let gy = -sample(lum, x - 1, y - 1) - 2.0 * sample(lum, x, y - 1) - sample(lum, x + 1, y - 1)
                + sample(lum, x - 1, y + 1)
                + 2.0 * sample(lum, x, y + 1)
                + sample(lum, x + 1, y + 1);
            out[(y as usize) * DIM + x as usize] = (gx * gx + gy * gy).sqrt();
        }
    }
    out
}

/// A Sobel-gradient edge mask with double-threshold hysteresis: pixels above
/// `high` are edges outright; pixels above `low` are edges only if 8-adjacent
/// to one already marked. Close enough to Canny's spirit for a per-tile,
/// single-pass approximation without non-max suppression.
pub(crate) fn canny_edge_mask(tile: &Tile, low: f32, high: f32) -> Vec<bool> {
    let lum = luminance_buffer(tile);
    let mag = sobel_magnitude(&lum);
    let mut mask: Vec<bool> = mag.iter().map(|&m| m >= high).collect();

    let mut changed = true;
    while changed {
        changed = false;
        for y in 0..DIM {
            for x in 0..DIM {
                let idx = y * DIM + x;
                if mask[idx] || mag[idx] < low {
                    continue;
                }
                let mut adjacent = false;
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = x as i32 + dx;
                        let ny = y as i32 + dy;
                        if nx >= 0 && ny >= 0 && (nx as usize) < DIM && (ny as usize) < DIM && mask[(ny as usize) * DIM + nx as usize] {
                            adjacent = true;
                        }
                    }
                }
                if adjacent {
                    mask[idx] = true;
                    changed = true;
                }
            }
        }
    }
    mask
}

/// Grow `mask` by `radius` pixels (square structuring element), matching the
/// "dilate" step the inpaint and smudge filters both use.
pub(crate) fn dilate_mask(mask: &[bool], radius: i32) -> Vec<bool> {
    if radius <= 0 {
        return mask.to_vec();
    }
    let mut out = vec![false; mask.len()];
    for y in 0..DIM as i32 {
        for x in 0..DIM as i32 {
            if out[(y as usize) * DIM + x as usize] {
                continue;
            }
            'search: for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx < 0 || ny < 0 || nx >= DIM as i32 || ny >= DIM as i32 {
                        continue;
                    }
                    if mask[(ny as usize) * DIM + nx as usize] {
                        out[(y as usize) * DIM + x as usize] = true;
                        break 'search;
                    }
                }
            }
        }
    }
    out
}

/// Multi-source BFS distance (in pixels) from every cell to the nearest
/// `true` cell in `mask`. Cells with no edge anywhere in the tile get
/// `f32::MAX`.
pub(crate) fn distance_to_mask(mask: &[bool]) -> Vec<f32> {
    let mut dist = vec![f32::MAX; mask.len()];
    let mut frontier: Vec<usize> = Vec::new();
    for (i, &m) in mask.iter().enumerate() {
        if m {
            dist[i] = 0.0;
            frontier.push(i);
        }
    }
    let mut step = 0f32;
    while !frontier.is_empty() {
        step += 1.0;
        let mut next = Vec::new();
        for idx in frontier {
            let x = (idx % DIM) as i32;
            let y = (idx / DIM) as i32;
            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || ny < 0 || nx >= DIM as i32 || ny >= DIM as i32 {
                    continue;
                }
                let nidx = (ny as usize) * DIM + nx as usize;
                if dist[nidx] == f32::MAX {
                    dist[nidx] = step;
                    next.push(nidx);
                }
            }
        }
        frontier = next;
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Tile;

    #[test]
    fn flat_tile_has_no_edges() {
        let mut t = Tile::new(0, 0);
        t.fill(Pixel::new(1000, 1000, 1000, 65535));
        let mask = canny_edge_mask(&t, 0.05, 0.2);
        assert!(mask.iter().all(|&m| !m));
    }

    #[test]
    fn sharp_boundary_is_detected() {
        let mut t = Tile::new(0, 0);
        t.fill(Pixel::new(0, 0, 0, 65535));
        for y in 0..TILE_SIZE {
            for x in 128..TILE_SIZE {
                t.set(x, y, Pixel::new(65535, 65535, 65535, 65535));
            }
        }
        let mask = canny_edge_mask(&t, 0.05, 0.2);
        assert!(mask[(10 * DIM) + 127] || mask[(10 * DIM) + 128]);
    }

    #[test]
    fn dilate_grows_mask() {
        let mut mask = vec![false; DIM * DIM];
        mask[DIM * 10 + 10] = true;
        let dilated = dilate_mask(&mask, 2);
        assert!(dilated[DIM * 10 + 12]);
        assert!(!dilated[DIM * 10 + 20]);
    }

    #[test]
    fn distance_transform_is_zero_on_mask() {
        let mut mask = vec![false; DIM * DIM];
        mask[DIM * 5 + 5] = true;
        let dist = distance_to_mask(&mask);
        assert_eq!(dist[DIM * 5 + 5], 0.0);
        assert_eq!(dist[DIM * 5 + 6], 1.0);
    }
}
