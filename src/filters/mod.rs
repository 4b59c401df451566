//! Uniform per-tile filter plugin contract and the reference plugin registry.

mod edge;
mod gaussian_blur;
mod inpaint;
mod smudge;
mod unsharp_mask;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

pub use gaussian_blur::GaussianBlurFilter;
pub use inpaint::InpaintFilter;
pub use smudge::{SmudgeFilter, SmudgeState};
pub use unsharp_mask::UnsharpMaskFilter;

use crate::tile::Tile;

/// A heterogeneous parameter bag with float/int/string sub-maps. Keys
/// absent from a lookup fall back to the caller-supplied default (each
/// filter documents and clamps its own defaults).
#[derive(Debug, Clone, Default)]
pub struct ParamBag {
    pub floats: HashMap<String, f64>,
    pub ints: HashMap<String, i64>,
    pub strings: HashMap<String, String>,
}

impl ParamBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_float(mut self, key: impl Into<String>, value: f64) -> Self {
        self.floats.insert(key.into(), value);
        self
    }

    pub fn with_int(mut self, key: impl Into<String>, value: i64) -> Self {
        self.ints.insert(key.into(), value);
        self
    }

    pub fn with_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.strings.insert(key.into(), value.into());
        self
    }

    pub fn float(&self, key: &str, default: f64) -> f64 {
        self.floats.get(key).copied().unwrap_or(default)
    }

    pub fn int(&self, key: &str, default: i64) -> i64 {
        self.ints.get(key).copied().unwrap_or(default)
    }

    pub fn string(&self, key: &str, default: &str) -> String {
        self.strings.get(key).cloned().unwrap_or_else(|| default.to_string())
    }
}

/// Cooperative progress/cancel pair. A missing callback is treated as
/// no-progress, never-cancelled — see [`NoProgress`].
pub trait ProgressCallback: Sync {
    fn progress(&self, fraction: f32);
    fn cancelled(&self) -> bool;
}

/// The default callback: never reports progress, never cancels.
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn progress(&self, _fraction: f32) {}
    fn cancelled(&self) -> bool {
        false
    }
}

/// A filter plugin processes a contiguous, row-major tile buffer in place.
/// Implementations must not reorder or reallocate the tile slice.
pub trait FilterPlugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn version(&self) -> &'static str;
    fn description(&self) -> &'static str;

    /// Mutate `tiles` in place. `width`/`height` are the full image's pixel
    /// dimensions (tiles.len() == ceil(width/256) * ceil(height/256)).
    fn process(&self, tiles: &mut [Tile], width: u32, height: u32, params: &ParamBag, progress: &dyn ProgressCallback);
}

/// Drive a per-tile closure over `tiles`, fanning out across a rayon
/// thread pool since each tile only touches its own pixels.
/// Checks `cancelled()` before starting each tile and reports `progress()`
/// after each tile completes. If `cancelled()` is already true, returns
/// immediately without touching any tile.
pub(crate) fn for_each_tile_parallel<F>(tiles: &mut [Tile], progress: &dyn ProgressCallback, f: F)
where
    F: Fn(&mut Tile) + Sync,
{
    if tiles.is_empty() || progress.cancelled() {
        return;
    }
    let total = tiles.len();
    let completed = AtomicUsize::new(0);
    tiles.par_iter_mut().for_each(|tile| {
        if progress.cancelled() {
            return;
        }
        f(tile);
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        progress.progress(done as f32 / total as f32);
    });
}

/// Static registry of named filter plugins.
pub struct FilterRegistry {
    plugins: HashMap<&'static str, Box<dyn FilterPlugin>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self { plugins: HashMap::new() }
    }

    /// A registry preloaded with the four reference filters.
    pub fn with_default_plugins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(GaussianBlurFilter));
        registry.register(Box::new(UnsharpMaskFilter));
        registry.register(Box::new(InpaintFilter));
        registry.register(Box::new(SmudgeFilter));
        registry
    }

    pub fn register(&mut self, plugin: Box<dyn FilterPlugin>) {
        self.plugins.insert(plugin.name(), plugin);
    }

    pub fn get(&self, name: &str) -> Option<&dyn FilterPlugin> {
        self.plugins.get(name).map(|b| b.as_ref())
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_default_plugins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile_grid::TileGrid;
    use std::sync::atomic::AtomicBool;

    struct AlwaysCancelled;
    impl ProgressCallback for AlwaysCancelled {
        fn progress(&self, _: f32) {}
        fn cancelled(&self) -> bool {
            true
        }
    }

    #[test]
    fn registry_resolves_all_four_reference_filters() {
        let registry = FilterRegistry::with_default_plugins();
        assert!(registry.get("gaussian_blur").is_some());
        assert!(registry.get("unsharp_mask").is_some());
        assert!(registry.get("inpaint").is_some());
        assert!(registry.get("smudge").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn cancelled_before_any_tile_leaves_grid_unchanged() {
        let mut grid = TileGrid::new(512, 512);
        grid.fill(crate::pixel::Pixel::new(100, 100, 100, 65535));
        let before = grid.clone();
        let filter = GaussianBlurFilter;
        filter.process(grid.tiles_mut(), 512, 512, &ParamBag::new().with_float("sigma", 5.0), &AlwaysCancelled);
        assert_eq!(grid, before);
    }

    #[test]
    fn empty_tile_buffer_is_a_noop() {
        let mut empty: Vec<Tile> = Vec::new();
        let flag = AtomicBool::new(false);
        struct Cb<'a>(&'a AtomicBool);
        impl ProgressCallback for Cb<'_> {
            fn progress(&self, _: f32) {
                self.0.store(true, Ordering::SeqCst);
            }
            fn cancelled(&self) -> bool {
                false
            }
        }
        GaussianBlurFilter.process(&mut empty, 0, 0, &ParamBag::new(), &Cb(&flag));
        assert!(!flag.load(Ordering::SeqCst));
    }
}
