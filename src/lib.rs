//! A tiled, 16-bit-per-channel pixel engine for a digital painting
//! application: tiles and tile grids, layers with blend modes, a bounded
//! undo/redo history, brush/eraser stroke kernels, and a filter plugin
//! registry (Gaussian blur, unsharp mask, inpaint, smudge).

pub mod blend;
pub mod brush;
pub mod canvas;
pub mod error;
pub mod filters;
pub mod layer;
pub mod pixel;
pub mod tile;
pub mod tile_grid;
pub mod undo;

pub use blend::{blend_over, BlendMode};
pub use brush::{draw_brush_stroke, draw_brush_stroke_ellipse, erase_brush_stroke, erase_brush_stroke_ellipse, StrokeSpacer};
pub use canvas::Canvas;
pub use error::PaintError;
pub use filters::{FilterPlugin, FilterRegistry, NoProgress, ParamBag, ProgressCallback};
pub use layer::{Adjustment, ClipMaskRef, Layer};
pub use pixel::Pixel;
pub use tile::{Tile, TILE_SIZE};
pub use tile_grid::{TileCoord, TileGrid};
pub use undo::{UndoStack, UndoState};
