#![allow(clippy::float_cmp)]

use super::*;
use crate::factory::ModelFactory;
use crate::schema::ElementSchema;

#[test]
fn screen_and_model_conversions_invert() {
    let vp = Viewport::new(Point::new(10.0, 20.0), 2.0);
    let screen = vp.model_to_screen(Point::new(15.0, 25.0));
    assert_eq!(screen, Point::new(10.0, 10.0));
    assert_eq!(vp.screen_to_model(screen), Point::new(15.0, 25.0));
}

#[test]
fn center_places_bounds_mid_canvas() {
    let canvas = Bounds::new(0.0, 0.0, 200.0, 100.0);
    let vp = center_viewport(canvas, Bounds::new(0.0, 0.0, 20.0, 20.0), 1.0).expect("measured canvas");
    assert_eq!(vp.scroll, Point::new(-90.0, -40.0));
    assert_eq!(vp.zoom, 1.0);
}

#[test]
fn fit_uses_limiting_axis() {
    let canvas = Bounds::new(0.0, 0.0, 200.0, 100.0);
    let vp = fit_viewport(canvas, Bounds::new(0.0, 0.0, 100.0, 100.0), 0.0, None).expect("measured canvas");
    assert_eq!(vp.zoom, 1.0);
    let vp = fit_viewport(canvas, Bounds::new(0.0, 0.0, 40.0, 20.0), 0.0, Some(2.0)).expect("measured canvas");
    assert_eq!(vp.zoom, 2.0);
}

#[test]
fn unmeasured_canvas_yields_none() {
    assert!(fit_viewport(Bounds::EMPTY, Bounds::new(0.0, 0.0, 1.0, 1.0), 0.0, None).is_none());
    assert!(center_viewport(Bounds::EMPTY, Bounds::new(0.0, 0.0, 1.0, 1.0), 1.0).is_none());
}

#[test]
fn elements_bounds_defaults_to_top_level_children() {
    let schema = ElementSchema::new("g", "graph").with_children(vec![
        ElementSchema::shape("a", "node", Bounds::new(0.0, 0.0, 10.0, 10.0)),
        ElementSchema::shape("b", "node", Bounds::new(30.0, 40.0, 10.0, 10.0)),
    ]);
    let model = ModelFactory::new().create_root(&schema).expect("model");
    assert_eq!(elements_bounds(&model, &[]), Bounds::new(0.0, 0.0, 40.0, 50.0));
    assert_eq!(elements_bounds(&model, &["b".to_string()]), Bounds::new(30.0, 40.0, 10.0, 10.0));
}

#[test]
fn apply_viewport_writes_root() {
    let mut model = ModelFactory::new().create_root(&ElementSchema::new("g", "graph")).expect("model");
    apply_viewport(&mut model, Viewport::new(Point::new(1.0, 2.0), 3.0));
    assert_eq!(viewport_of(&model), Viewport::new(Point::new(1.0, 2.0), 3.0));
}
