use super::*;
use crate::fixtures::{graph, position};

#[test]
fn move_interpolates_and_reverses() {
    let mut model = graph();
    let animation = MoveAnimation::new(vec![ElementTween {
        element_id: "node1".into(),
        from: Point::new(0.0, 0.0),
        to: Point::new(10.0, 20.0),
    }]);
    animation.tween(0.5, &mut model);
    assert_eq!(position(&model, "node1"), Point::new(5.0, 10.0));
    animation.reversed().tween(1.0, &mut model);
    assert_eq!(position(&model, "node1"), Point::new(0.0, 0.0));
}

#[test]
fn move_skips_unknown_elements() {
    let mut model = graph();
    let before = model.clone();
    MoveAnimation::new(vec![ElementTween { element_id: "ghost".into(), from: Point::ORIGIN, to: Point::new(1.0, 1.0) }])
        .tween(1.0, &mut model);
    assert_eq!(model, before);
}

#[test]
fn resize_interpolates_both_sides() {
    let mut model = graph();
    ResizeAnimation::new(vec![ElementResize {
        element_id: "node2".into(),
        from: Dimension::new(20.0, 20.0),
        to: Dimension::new(40.0, 10.0),
    }])
    .tween(0.5, &mut model);
    assert_eq!(model.get("node2").and_then(|e| e.size), Some(Dimension::new(30.0, 15.0)));
}

#[test]
fn fade_sets_opacity_and_removes_at_the_end() {
    let mut model = graph();
    let animation = FadeAnimation::new(
        vec![Fade { element_id: "node1".into(), fade_in: true }, Fade { element_id: "node2".into(), fade_in: false }],
        true,
    );
    animation.tween(0.25, &mut model);
    assert!((model.get("node1").map_or(0.0, |e| e.opacity) - 0.25).abs() < 1e-12);
    assert!((model.get("node2").map_or(0.0, |e| e.opacity) - 0.75).abs() < 1e-12);

    animation.tween(1.0, &mut model);
    assert!(model.contains("node1"));
    assert!(!model.contains("node2"));
    // a repeated final frame finds nothing left to remove
    animation.tween(1.0, &mut model);
    assert!(!model.contains("node2"));
}

#[test]
fn fade_without_removal_keeps_elements() {
    let mut model = graph();
    FadeAnimation::new(vec![Fade { element_id: "node2".into(), fade_in: false }], false).tween(1.0, &mut model);
    assert!(model.contains("node2"));
    assert!(model.get("node2").map_or(1.0, |e| e.opacity).abs() < f64::EPSILON);
}

#[test]
fn morph_interpolates_equal_lengths() {
    let mut model = graph();
    let animation = MorphEdgesAnimation::new(vec![EdgeMorph {
        edge_id: "edge1".into(),
        from: vec![Point::new(0.0, 0.0)],
        to: vec![Point::new(10.0, 10.0)],
    }]);
    animation.tween(0.5, &mut model);
    let points = model.get("edge1").and_then(|e| e.edge.as_ref()).map(|e| e.routing_points.clone());
    assert_eq!(points, Some(vec![Point::new(5.0, 5.0)]));
}

#[test]
fn morph_switches_when_lengths_differ() {
    let mut model = graph();
    let to = vec![Point::new(10.0, 10.0), Point::new(20.0, 10.0)];
    MorphEdgesAnimation::new(vec![EdgeMorph { edge_id: "edge1".into(), from: Vec::new(), to: to.clone() }])
        .tween(0.1, &mut model);
    let points = model.get("edge1").and_then(|e| e.edge.as_ref()).map(|e| e.routing_points.clone());
    assert_eq!(points, Some(to));
}

#[test]
fn viewport_zooms_geometrically() {
    let mut model = graph();
    let animation =
        ViewportAnimation::new(Viewport::new(Point::ORIGIN, 1.0), Viewport::new(Point::new(100.0, 0.0), 4.0));
    animation.tween(0.5, &mut model);
    let viewport = scene::viewport::viewport_of(&model);
    assert!((viewport.zoom - 2.0).abs() < 1e-9);
    assert_eq!(viewport.scroll, Point::new(50.0, 0.0));
    animation.tween(1.0, &mut model);
    assert_eq!(scene::viewport::viewport_of(&model), Viewport::new(Point::new(100.0, 0.0), 4.0));
}

#[test]
fn compound_advances_every_part() {
    let mut model = graph();
    let mut compound = CompoundAnimation::new();
    assert!(compound.is_empty());
    compound.push(MoveAnimation::new(vec![ElementTween {
        element_id: "node1".into(),
        from: Point::ORIGIN,
        to: Point::new(0.0, 30.0),
    }]));
    compound.push(FadeAnimation::new(vec![Fade { element_id: "node2".into(), fade_in: true }], false));
    assert_eq!(compound.len(), 2);
    compound.tween(1.0, &mut model);
    assert_eq!(position(&model, "node1"), Point::new(0.0, 30.0));
    assert!((model.get("node2").map_or(0.0, |e| e.opacity) - 1.0).abs() < f64::EPSILON);
}
