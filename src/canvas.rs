//! The top-level document: a layer stack, undo history, selection, and
//! filter dispatch, orchestrating tiles/brush/undo into one coherent API.

use tracing::{debug, warn};

use crate::brush;
use crate::error::PaintError;
use crate::filters::{FilterRegistry, NoProgress, ParamBag, ProgressCallback};
use crate::layer::{Adjustment, Layer};
use crate::pixel::Pixel;
use crate::tile_grid::TileGrid;
use crate::undo::UndoStack;

/// A document: an ordered layer stack (bottom-to-top), a bounded undo
/// history, an advisory selection, and a filter registry.
pub struct Canvas {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
    undo: UndoStack,
    selection: Option<Vec<(f32, f32)>>,
    registry: FilterRegistry,
}

impl Canvas {
    /// A new canvas always starts with a single layer named "Background",
    /// per the invariant that a `Canvas` is never empty.
    pub fn new(width: u32, height: u32) -> Self {
        debug!("Canvas::new: {}x{}", width, height);
        Self {
            width,
            height,
            layers: vec![Layer::new("Background", width, height)],
            undo: UndoStack::new(),
            selection: None,
            registry: FilterRegistry::with_default_plugins(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get_layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn get_layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn get_layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    /// Push a new layer on top of the stack. Returns its index.
    pub fn add_layer(&mut self, name: impl Into<String>) -> usize {
        self.layers.push(Layer::new(name, self.width, self.height));
        debug!("Canvas::add_layer: index {}", self.layers.len() - 1);
        self.layers.len() - 1
    }

    /// Remove the layer at `index`. Silent no-op if out of range. Any other
    /// layer's clip mask pointing at the removed layer is cleared; clip
    /// masks pointing past it are shifted down to stay on the same target.
    pub fn remove_layer(&mut self, index: usize) {
        if index >= self.layers.len() {
            warn!("Canvas::remove_layer: index {} out of range ({})", index, self.layers.len());
            return;
        }
        self.layers.remove(index);
        for layer in self.layers.iter_mut() {
            if let Some(cm) = layer.clip_mask() {
                if cm == index {
                    layer.set_clip_mask(None);
                } else if cm > index {
                    layer.set_clip_mask(Some(cm - 1));
                }
            }
        }
    }

    /// Move the layer at `from` to position `to` (ordered move, not swap).
    /// Silent no-op if `from` is out of range; `to` is clamped into range.
    /// Clip mask references are remapped to keep pointing at the same
    /// logical layer after the move.
    pub fn move_layer(&mut self, from: usize, to: usize) {
        if from >= self.layers.len() {
            warn!("Canvas::move_layer: from {} out of range ({})", from, self.layers.len());
            return;
        }
        if from == to {
            return;
        }
        let original_len = self.layers.len();
        let mut order: Vec<usize> = (0..original_len).collect();
        let moved = order.remove(from);
        let to_clamped = to.min(order.len());
        order.insert(to_clamped, moved);

        let mut old_to_new = vec![0usize; original_len];
        for (new_idx, &old_idx) in order.iter().enumerate() {
            old_to_new[old_idx] = new_idx;
        }

        let layer = self.layers.remove(from);
        self.layers.insert(to_clamped, layer);

        for layer in self.layers.iter_mut() {
            if let Some(cm) = layer.clip_mask() {
                layer.set_clip_mask(Some(old_to_new[cm]));
            }
        }
    }

    /// Resize the canvas. Rejects non-positive dimensions. On success,
    /// every layer's pixel content is discarded and replaced with a blank
    /// grid of the new size, and the undo history is cleared (existing
    /// snapshots are the wrong dimensions to restore).
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), PaintError> {
        if width == 0 || height == 0 {
            return Err(PaintError::InvalidDimensions { width, height });
        }
        debug!("Canvas::resize: {}x{} -> {}x{}", self.width, self.height, width, height);
        self.width = width;
        self.height = height;
        for layer in &mut self.layers {
            *layer.pixels_mut() = TileGrid::new(width, height);
        }
        self.undo.clear();
        Ok(())
    }

    /// Composite the full layer stack bottom-to-top into `target`, which is
    /// cleared first.
    pub fn render_to(&self, target: &mut TileGrid) {
        target.clear();
        for layer in &self.layers {
            layer.render_to(target, 0, 0);
        }
    }

    /// Render and export as a BGRA16 matrix.
    pub fn get_composited_image(&self) -> Vec<u16> {
        let mut target = TileGrid::new(self.width, self.height);
        self.render_to(&mut target);
        target.to_matrix()
    }

    /// Undo snapshots the full layer stack at stroke *begin*, not at stroke
    /// end. One consequence: the most recently
    /// completed stroke only becomes undoable once another `begin_stroke`
    /// call (or none, if the document is never touched again) checkpoints
    /// the state that followed it — see DESIGN.md.
    pub fn begin_stroke(&mut self) {
        let snapshots: Vec<TileGrid> = self.layers.iter().map(|l| l.pixels().clone()).collect();
        self.undo.push_state(snapshots, "stroke");
    }

    /// Sealing no-op: the stroke's mutations already landed directly on
    /// layer pixels; nothing further needs to happen here.
    pub fn end_stroke(&self) {}

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Restore the most recent checkpoint. No-op if nothing to undo.
    /// Layer *count* is not restored, only pixel content, and only for
    /// layers that still exist at the same index (see begin_stroke's doc).
    pub fn undo(&mut self) -> bool {
        let Some(snapshots) = self.undo.pop_state() else {
            return false;
        };
        for (layer, snapshot) in self.layers.iter_mut().zip(snapshots) {
            *layer.pixels_mut() = snapshot;
        }
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshots) = self.undo.redo_state() else {
            return false;
        };
        for (layer, snapshot) in self.layers.iter_mut().zip(snapshots) {
            *layer.pixels_mut() = snapshot;
        }
        true
    }

    /// Advisory only: a selection never gates writes from brush, eraser, or
    /// filter operations.
    pub fn set_selection(&mut self, points: Vec<(f32, f32)>) {
        self.selection = Some(points);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    pub fn selection(&self) -> Option<&[(f32, f32)]> {
        self.selection.as_deref()
    }

    pub fn draw_brush_stroke(&mut self, layer: usize, points: &[(f32, f32)], size: f32, opacity: f32, color: Pixel) {
        brush::draw_brush_stroke(&mut self.layers, layer, points, size, opacity, color);
    }

    pub fn erase_brush_stroke(&mut self, layer: usize, points: &[(f32, f32)], size: f32, opacity: f32) {
        brush::erase_brush_stroke(&mut self.layers, layer, points, size, opacity);
    }

    /// Elliptical dab variant of [`Canvas::draw_brush_stroke`]; see
    /// [`brush::draw_brush_stroke_ellipse`].
    #[allow(clippy::too_many_arguments)]
    pub fn draw_brush_stroke_ellipse(
        &mut self,
        layer: usize,
        points: &[(f32, f32)],
        radius: f32,
        aspect_ratio: f32,
        angle_radians: f32,
        opacity: f32,
        color: Pixel,
    ) {
        brush::draw_brush_stroke_ellipse(&mut self.layers, layer, points, radius, aspect_ratio, angle_radians, opacity, color);
    }

    /// Elliptical dab variant of [`Canvas::erase_brush_stroke`]; see
    /// [`brush::erase_brush_stroke_ellipse`].
    pub fn erase_brush_stroke_ellipse(
        &mut self,
        layer: usize,
        points: &[(f32, f32)],
        radius: f32,
        aspect_ratio: f32,
        angle_radians: f32,
        opacity: f32,
    ) {
        brush::erase_brush_stroke_ellipse(&mut self.layers, layer, points, radius, aspect_ratio, angle_radians, opacity);
    }

    /// Dispatch a named filter from the registry onto one layer's pixels.
    /// `UnknownFilter` if `filter_name` isn't registered; `InvalidLayerIndex`
    /// if `layer_index` is out of range. This is the primary path for the
    /// four reference filters; [`Canvas::add_adjustment`] is the separate,
    /// secondary path for the (currently identity) adjustment stack.
    pub fn apply_filter(&mut self, layer_index: usize, filter_name: &str, params: &ParamBag) -> Result<(), PaintError> {
        self.apply_filter_with_progress(layer_index, filter_name, params, &NoProgress)
    }

    pub fn apply_filter_with_progress(
        &mut self,
        layer_index: usize,
        filter_name: &str,
        params: &ParamBag,
        progress: &dyn ProgressCallback,
    ) -> Result<(), PaintError> {
        let plugin = self.registry.get(filter_name).ok_or_else(|| PaintError::UnknownFilter(filter_name.to_string()))?;
        let (width, height) = (self.width, self.height);
        let layer = self.layers.get_mut(layer_index).ok_or(PaintError::InvalidLayerIndex(layer_index))?;
        debug!("Canvas::apply_filter: layer={} filter={}", layer_index, filter_name);
        plugin.process(layer.pixels_mut().tiles_mut(), width, height, params, progress);
        Ok(())
    }

    /// Secondary path: push an adjustment onto a layer's stack. Math is
    /// still the identity placeholder documented on `Layer::apply_adjustments`.
    pub fn add_adjustment(&mut self, layer_index: usize, adjustment: Adjustment) -> Result<(), PaintError> {
        let layer = self.layers.get_mut(layer_index).ok_or(PaintError::InvalidLayerIndex(layer_index))?;
        layer.push_adjustment(adjustment);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_canvas_has_one_background_layer() {
        let canvas = Canvas::new(64, 64);
        assert_eq!(canvas.get_layers().len(), 1);
        assert_eq!(canvas.get_layer(0).unwrap().name(), "Background");
    }

    #[test]
    fn add_remove_layer_roundtrip() {
        let mut canvas = Canvas::new(32, 32);
        let idx = canvas.add_layer("Sketch");
        assert_eq!(idx, 1);
        assert_eq!(canvas.get_layers().len(), 2);
        canvas.remove_layer(0);
        assert_eq!(canvas.get_layers().len(), 1);
        assert_eq!(canvas.get_layer(0).unwrap().name(), "Sketch");
    }

    #[test]
    fn remove_layer_out_of_range_is_noop() {
        let mut canvas = Canvas::new(32, 32);
        canvas.remove_layer(99);
        assert_eq!(canvas.get_layers().len(), 1);
    }

    #[test]
    fn move_layer_reorders_and_remaps_clip_mask() {
        let mut canvas = Canvas::new(16, 16);
        canvas.add_layer("Mid");
        canvas.add_layer("Top");
        canvas.get_layer_mut(2).unwrap().set_clip_mask(Some(1));
        canvas.move_layer(0, 2);
        // layer originally at index 1 ("Mid") is now at index 0.
        assert_eq!(canvas.get_layer(0).unwrap().name(), "Mid");
        assert_eq!(canvas.get_layer(1).unwrap().name(), "Top");
        assert_eq!(canvas.get_layer(2).unwrap().name(), "Background");
        assert_eq!(canvas.get_layer(1).unwrap().clip_mask(), Some(0));
    }

    #[test]
    fn resize_rejects_non_positive_dimensions() {
        let mut canvas = Canvas::new(16, 16);
        assert!(canvas.resize(0, 10).is_err());
        assert_eq!(canvas.width(), 16);
    }

    #[test]
    fn resize_discards_pixels_and_clears_undo() {
        let mut canvas = Canvas::new(16, 16);
        canvas.get_layer_mut(0).unwrap().pixels_mut().fill(Pixel::new(1, 2, 3, 65535));
        canvas.begin_stroke();
        canvas.resize(32, 32).unwrap();
        assert_eq!(canvas.width(), 32);
        assert_eq!(canvas.get_layer(0).unwrap().pixels().get_pixel(0, 0), Pixel::default());
        assert!(!canvas.can_undo());
    }

    #[test]
    fn begin_stroke_then_undo_reverts_the_stroke() {
        let mut canvas = Canvas::new(64, 64);
        canvas.begin_stroke();
        canvas.draw_brush_stroke(0, &[(32.0, 32.0)], 6.0, 1.0, Pixel::new(65535, 0, 0, 65535));
        canvas.end_stroke();
        assert_ne!(canvas.get_layer(0).unwrap().pixels().get_pixel(32, 32), Pixel::default());
        assert!(canvas.undo());
        assert_eq!(canvas.get_layer(0).unwrap().pixels().get_pixel(32, 32), Pixel::default());
    }

    #[test]
    fn undo_with_empty_history_is_a_noop() {
        let mut canvas = Canvas::new(8, 8);
        assert!(!canvas.undo());
        assert!(!canvas.can_redo());
    }

    #[test]
    fn selection_is_advisory_and_never_gates_writes() {
        let mut canvas = Canvas::new(16, 16);
        canvas.set_selection(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        assert!(canvas.has_selection());
        canvas.draw_brush_stroke(0, &[(10.0, 10.0)], 2.0, 1.0, Pixel::new(65535, 0, 0, 65535));
        assert_eq!(canvas.get_layer(0).unwrap().pixels().get_pixel(10, 10), Pixel::new(65535, 0, 0, 65535));
        canvas.clear_selection();
        assert!(!canvas.has_selection());
    }

    #[test]
    fn apply_filter_rejects_unknown_name() {
        let mut canvas = Canvas::new(256, 256);
        let err = canvas.apply_filter(0, "nonexistent", &ParamBag::new()).unwrap_err();
        assert!(matches!(err, PaintError::UnknownFilter(_)));
    }

    #[test]
    fn apply_filter_rejects_invalid_layer_index() {
        let mut canvas = Canvas::new(256, 256);
        let err = canvas.apply_filter(5, "gaussian_blur", &ParamBag::new()).unwrap_err();
        assert!(matches!(err, PaintError::InvalidLayerIndex(5)));
    }

    #[test]
    fn apply_filter_dispatches_to_registered_plugin() {
        let mut canvas = Canvas::new(256, 256);
        canvas.get_layer_mut(0).unwrap().pixels_mut().fill(Pixel::new(1000, 2000, 3000, 65535));
        assert!(canvas.apply_filter(0, "gaussian_blur", &ParamBag::new().with_float("sigma", 3.0)).is_ok());
    }

    #[test]
    fn add_adjustment_pushes_onto_layer_stack() {
        let mut canvas = Canvas::new(16, 16);
        canvas.add_adjustment(0, Adjustment::new("brightness")).unwrap();
        assert_eq!(canvas.get_layer(0).unwrap().adjustments().len(), 1);
        let err = canvas.add_adjustment(9, Adjustment::new("brightness")).unwrap_err();
        assert!(matches!(err, PaintError::InvalidLayerIndex(9)));
    }
}
