//! Whole-pipeline scenarios mirroring the per-module unit tests, exercised
//! through the public `Canvas` API end to end.

use paint_engine::filters::{GaussianBlurFilter, NoProgress};
use paint_engine::{BlendMode, Canvas, FilterPlugin, Layer, ParamBag, Pixel, TileGrid};

#[test]
fn invariant_new_canvas_has_single_background_layer() {
    let canvas = Canvas::new(128, 128);
    assert_eq!(canvas.get_layers().len(), 1);
    assert_eq!(canvas.get_layer(0).unwrap().name(), "Background");
}

#[test]
fn s1_opaque_red_brush_dot() {
    let mut canvas = Canvas::new(512, 512);
    canvas.draw_brush_stroke(0, &[(100.0, 100.0)], 2.0, 1.0, Pixel::new(65535, 0, 0, 65535));
    let pixels = canvas.get_layer(0).unwrap().pixels();
    assert_eq!(pixels.get_pixel(100, 100), Pixel::new(65535, 0, 0, 65535));
    assert_eq!(pixels.get_pixel(101, 100), Pixel::default());
    assert_eq!(pixels.get_pixel(99, 100), Pixel::default());
    assert_eq!(pixels.get_pixel(100, 101), Pixel::default());
    assert_eq!(pixels.get_pixel(100, 99), Pixel::default());
}

#[test]
fn s2_eraser_on_opaque() {
    let mut canvas = Canvas::new(256, 256);
    canvas.get_layer_mut(0).unwrap().pixels_mut().fill(Pixel::new(0, 0, 0, 65535));
    canvas.erase_brush_stroke(0, &[(50.0, 50.0)], 4.0, 1.0);
    let pixels = canvas.get_layer(0).unwrap().pixels();
    assert_eq!(pixels.get_pixel(50, 50).a, 0);
    assert_eq!(pixels.get_pixel(52, 50).a, 65535);
    assert_eq!(pixels.get_pixel(50, 50).r, 0);
    assert_eq!(pixels.get_pixel(30, 30).r, 0);
}

#[test]
fn s3_multiply_blend_two_mid_gray_layers() {
    let mut canvas = Canvas::new(4, 4);
    canvas.get_layer_mut(0).unwrap().pixels_mut().fill(Pixel::new(32768, 32768, 32768, 65535));
    let top = canvas.add_layer("Multiply");
    canvas.get_layer_mut(top).unwrap().pixels_mut().fill(Pixel::new(32768, 32768, 32768, 65535));
    canvas.get_layer_mut(top).unwrap().set_blend_mode(BlendMode::Multiply);

    let mut target = TileGrid::new(4, 4);
    canvas.render_to(&mut target);
    let p = target.get_pixel(0, 0);
    assert!((p.r as i32 - 16384).abs() <= 1);
    assert!((p.g as i32 - 16384).abs() <= 1);
    assert!((p.b as i32 - 16384).abs() <= 1);
    assert_eq!(p.a, 65535);
}

#[test]
fn s4_undo_restores_pre_stroke_state() {
    let mut canvas = Canvas::new(128, 128);
    assert_eq!(canvas.get_layer(0).unwrap().pixels().get_pixel(10, 10), Pixel::default());

    canvas.begin_stroke();
    canvas.draw_brush_stroke(0, &[(10.0, 10.0)], 2.0, 1.0, Pixel::new(65535, 65535, 65535, 65535));
    canvas.end_stroke();
    assert_eq!(canvas.get_layer(0).unwrap().pixels().get_pixel(10, 10), Pixel::new(65535, 65535, 65535, 65535));

    assert!(canvas.undo());
    assert_eq!(canvas.get_layer(0).unwrap().pixels().get_pixel(10, 10), Pixel::default());
}

#[test]
fn s5_undo_capacity_eviction_via_canvas() {
    use paint_engine::UndoStack;

    let snap = |n: u16| {
        let mut g = TileGrid::new(2, 2);
        g.fill(Pixel::new(n, n, n, 65535));
        vec![g]
    };
    let mut stack = UndoStack::with_max_states(3);
    stack.push_state(snap(1), "A");
    stack.push_state(snap(2), "B");
    stack.push_state(snap(3), "C");
    stack.push_state(snap(4), "D");

    assert_eq!(stack.state_count(), 3);
    assert!(stack.pop_state().is_some());
    assert!(stack.pop_state().is_some());
    assert!(stack.pop_state().is_some());
    assert!(!stack.can_undo());
    assert!(stack.pop_state().is_none());
}

#[test]
fn s6_gaussian_blur_preserves_energy_of_a_flat_tile() {
    let mut grid = TileGrid::new(256, 256);
    grid.fill(Pixel::new(1000, 2000, 3000, 65535));
    GaussianBlurFilter.process(grid.tiles_mut(), 256, 256, &ParamBag::new().with_float("sigma", 5.0), &NoProgress);
    for &(x, y) in &[(0u32, 0u32), (128, 128), (255, 255)] {
        let p = grid.get_pixel(x, y);
        assert!((p.r as i32 - 1000).abs() <= 2);
        assert!((p.g as i32 - 2000).abs() <= 2);
        assert!((p.b as i32 - 3000).abs() <= 2);
    }
}

#[test]
fn render_determinism_across_repeated_calls() {
    let mut canvas = Canvas::new(16, 16);
    canvas.draw_brush_stroke(0, &[(8.0, 8.0)], 4.0, 0.6, Pixel::new(10000, 20000, 30000, 65535));
    let mut a = TileGrid::new(16, 16);
    let mut b = TileGrid::new(16, 16);
    canvas.render_to(&mut a);
    canvas.render_to(&mut b);
    assert_eq!(a, b);
}

#[test]
fn filter_cancellation_leaves_grid_untouched() {
    struct AlwaysCancelled;
    impl paint_engine::ProgressCallback for AlwaysCancelled {
        fn progress(&self, _: f32) {}
        fn cancelled(&self) -> bool {
            true
        }
    }
    let mut canvas = Canvas::new(256, 256);
    canvas.get_layer_mut(0).unwrap().pixels_mut().fill(Pixel::new(500, 500, 500, 65535));
    let before = canvas.get_layer(0).unwrap().pixels().clone();
    canvas
        .apply_filter_with_progress(0, "gaussian_blur", &ParamBag::new().with_float("sigma", 4.0), &AlwaysCancelled)
        .unwrap();
    assert_eq!(*canvas.get_layer(0).unwrap().pixels(), before);
}

#[test]
fn multi_layer_composite_respects_visibility_and_opacity() {
    let mut canvas = Canvas::new(8, 8);
    canvas.get_layer_mut(0).unwrap().pixels_mut().fill(Pixel::new(100, 100, 100, 65535));
    let hidden = canvas.add_layer("Hidden");
    canvas.get_layer_mut(hidden).unwrap().pixels_mut().fill(Pixel::new(65535, 0, 0, 65535));
    canvas.get_layer_mut(hidden).unwrap().set_visible(false);

    let mut target = TileGrid::new(8, 8);
    canvas.render_to(&mut target);
    assert_eq!(target.get_pixel(0, 0), Pixel::new(100, 100, 100, 65535));
}

#[test]
fn layer_helper_constructs_named_layer_with_defaults() {
    let l = Layer::new("Sketch", 4, 4);
    assert_eq!(l.name(), "Sketch");
    assert_eq!(l.opacity(), 1.0);
    assert!(l.visible());
}
