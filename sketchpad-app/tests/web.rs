//! Browser tests for the canvas surface and chart view.
//!
//! Run with `wasm-pack test --headless --firefox sketchpad-app`.

#![cfg(target_arch = "wasm32")]

use sketchpad_app::{ChartView, HtmlCanvasSurface};
use sketchpad_core::{
    to_payload, to_view_model, DrawingSurface, PredictionResult, SketchConfig, StrokeEvent,
};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Document, HtmlCanvasElement};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window()
        .and_then(|w| w.document())
        .expect("document")
}

fn canvas() -> HtmlCanvasElement {
    document()
        .create_element("canvas")
        .expect("create canvas")
        .dyn_into::<HtmlCanvasElement>()
        .expect("canvas element")
}

fn surface() -> HtmlCanvasSurface {
    HtmlCanvasSurface::new(canvas(), &SketchConfig::default()).expect("surface")
}

#[wasm_bindgen_test]
fn surface_takes_configured_size() {
    let surface = surface();
    assert_eq!(surface.canvas().width(), 280);
    assert_eq!(surface.canvas().height(), 280);
    assert!(surface.is_ready());
}

#[wasm_bindgen_test]
fn export_is_an_encodable_png() {
    let mut surface = surface();
    surface.draw(&StrokeEvent::start(50.0, 50.0));
    surface.draw(&StrokeEvent::moved(200.0, 200.0));
    surface.draw(&StrokeEvent::end(200.0, 220.0));

    let image = surface.export_image().expect("export");
    assert!(image.as_str().starts_with("data:image/png;base64,"));
    let payload = to_payload(&image).expect("payload");
    assert!(!payload.is_empty());
}

#[wasm_bindgen_test]
fn rejected_arc_leaves_canvas_untouched() {
    let mut config = SketchConfig::default();
    config.stroke.width = -10.0;
    let mut surface = HtmlCanvasSurface::new(canvas(), &config).expect("surface");
    let blank = surface.export_image().expect("blank");

    // A negative radius makes arc() throw; the dot is skipped
    assert!(surface.draw(&StrokeEvent::start(140.0, 140.0)));
    assert_eq!(surface.export_image().expect("export"), blank);
}

#[wasm_bindgen_test]
fn start_off_canvas_is_not_accepted() {
    let mut surface = surface();
    assert!(!surface.draw(&StrokeEvent::start(-1.0, 10.0)));
    assert!(!surface.draw(&StrokeEvent::moved(10.0, 10.0)));
    assert!(surface.draw(&StrokeEvent::start(10.0, 10.0)));
    assert!(!surface.draw(&StrokeEvent::moved(f32::NAN, 10.0)));
}

#[wasm_bindgen_test]
fn clear_matches_a_fresh_canvas() {
    let blank = surface().export_image().expect("blank");

    let mut drawn = surface();
    drawn.draw(&StrokeEvent::start(140.0, 140.0));
    drawn.draw(&StrokeEvent::end(140.0, 140.0));
    assert_ne!(drawn.export_image().expect("drawn"), blank);

    drawn.clear();
    drawn.clear();
    assert_eq!(drawn.export_image().expect("cleared"), blank);
}

#[wasm_bindgen_test]
fn chart_highlights_only_the_winner() {
    let document = document();
    let container = document.create_element("div").expect("container");
    let chart = ChartView::mount(&document, &container).expect("chart");
    assert_eq!(container.child_element_count(), 10);

    let result = PredictionResult::new(
        7,
        Some(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.92, 0.05, 0.03]),
    )
    .expect("valid");
    chart.render(&to_view_model(Some(&result)));

    assert_eq!(
        container
            .query_selector_all(".winner-bar")
            .expect("query")
            .length(),
        1
    );
    let winner_label = container
        .query_selector(".winner-text")
        .expect("query")
        .expect("winner label");
    assert_eq!(winner_label.text_content().as_deref(), Some("7"));

    chart.render(&to_view_model(None));
    assert!(container
        .query_selector(".winner-bar")
        .expect("query")
        .is_none());
}
