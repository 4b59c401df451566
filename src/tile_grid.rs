//! Logical image made of a dense, row-major grid of [`Tile`]s.

use tracing::debug;

use crate::pixel::Pixel;
use crate::tile::{Tile, TILE_SIZE};

/// Tile-space coordinates (column, row), not pixel-space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

fn tile_count(extent: u32) -> u32 {
    extent.div_ceil(TILE_SIZE)
}

/// A `width` x `height` image tiled into `ceil(width/256) x ceil(height/256)`
/// tiles. Tiles are contiguous and fully populated — there is no sparse
/// grid. Equality compares pixel content only (for snapshot tests).
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles_x: u32,
    tiles_y: u32,
    tiles: Vec<Tile>,
}

impl PartialEq for TileGrid {
    fn eq(&self, other: &Self) -> bool {
        if self.width != other.width || self.height != other.height {
            return false;
        }
        (0..self.height).all(|y| (0..self.width).all(|x| self.get_pixel(x, y) == other.get_pixel(x, y)))
    }
}

impl TileGrid {
    /// Create a new grid of the given pixel dimensions, filled with default
    /// pixels. `width`/`height` of zero produce a grid with zero tiles.
    pub fn new(width: u32, height: u32) -> Self {
        let tiles_x = tile_count(width);
        let tiles_y = tile_count(height);
        let mut tiles = Vec::with_capacity((tiles_x * tiles_y) as usize);
        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                tiles.push(Tile::new(tx * TILE_SIZE, ty * TILE_SIZE));
            }
        }
        debug!("TileGrid::new: {}x{} -> {}x{} tiles", width, height, tiles_x, tiles_y);
        Self { width, height, tiles_x, tiles_y, tiles }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn tiles_x(&self) -> u32 {
        self.tiles_x
    }

    #[inline]
    pub fn tiles_y(&self) -> u32 {
        self.tiles_y
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    fn tile_index(&self, tx: u32, ty: u32) -> Option<usize> {
        if tx >= self.tiles_x || ty >= self.tiles_y {
            return None;
        }
        Some((ty * self.tiles_x + tx) as usize)
    }

    /// Access a tile by tile-space coordinates.
    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.tile_index(coord.x, coord.y).map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        let i = self.tile_index(coord.x, coord.y)?;
        Some(&mut self.tiles[i])
    }

    /// All tiles, in row-major tile order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    #[inline]
    fn locate(&self, x: u32, y: u32) -> Option<(usize, u32, u32)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let tx = x / TILE_SIZE;
        let ty = y / TILE_SIZE;
        let i = self.tile_index(tx, ty)?;
        Some((i, x % TILE_SIZE, y % TILE_SIZE))
    }

    /// Read a pixel at image-space (x, y). Out-of-range yields a default
    /// pixel, same as a `Tile`'s own out-of-range read.
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Pixel {
        match self.locate(x, y) {
            Some((i, lx, ly)) => self.tiles[i].get(lx, ly),
            None => Pixel::default(),
        }
    }

    /// Write a pixel at image-space (x, y). Out-of-range is silently
    /// absorbed.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, value: Pixel) {
        if let Some((i, lx, ly)) = self.locate(x, y) {
            self.tiles[i].set(lx, ly, value);
        }
    }

    /// Clear every tile to the default pixel.
    pub fn clear(&mut self) {
        for t in &mut self.tiles {
            t.clear();
        }
    }

    /// Fill every tile with `color`.
    pub fn fill(&mut self, color: Pixel) {
        for t in &mut self.tiles {
            t.fill(color);
        }
    }

    /// Tiles whose dirty flag is set, in row-major tile order.
    pub fn dirty_tiles(&self) -> Vec<TileCoord> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_dirty())
            .map(|(i, _)| TileCoord { x: i as u32 % self.tiles_x, y: i as u32 / self.tiles_x })
            .collect()
    }

    /// Clear the dirty flag on every tile.
    pub fn clear_all_dirty(&mut self) {
        for t in &mut self.tiles {
            t.clear_dirty();
        }
    }

    /// Export to an external 16-bit image matrix, channel order B, G, R, A,
    /// row-major, `width * height * 4` elements.
    pub fn to_matrix(&self) -> Vec<u16> {
        let mut out = vec![0u16; (self.width as usize) * (self.height as usize) * 4];
        for y in 0..self.height {
            for x in 0..self.width {
                let p = self.get_pixel(x, y);
                let base = ((y as usize) * (self.width as usize) + x as usize) * 4;
                out[base] = p.b;
                out[base + 1] = p.g;
                out[base + 2] = p.r;
                out[base + 3] = p.a;
            }
        }
        out
    }

    /// Build a grid from a BGRA16 matrix of the given dimensions. Panics if
    /// `matrix.len() != width * height * 4` — this is a caller contract
    /// violation, not a runtime edge case.
    pub fn from_matrix(width: u32, height: u32, matrix: &[u16]) -> Self {
        assert_eq!(matrix.len(), (width as usize) * (height as usize) * 4, "matrix size mismatch");
        let mut grid = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let base = ((y as usize) * (width as usize) + x as usize) * 4;
                let p = Pixel::new(matrix[base + 2], matrix[base + 1], matrix[base], matrix[base + 3]);
                grid.set_pixel(x, y, p);
            }
        }
        grid
    }
}
