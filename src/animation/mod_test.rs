use std::sync::Arc;

use scene::geometry::Point;

use super::*;
use crate::fixtures::{RecordingTarget, graph, position};

#[test]
fn easing_is_symmetric_and_pinned() {
    assert!(ease_in_out(0.0).abs() < f64::EPSILON);
    assert!((ease_in_out(1.0) - 1.0).abs() < f64::EPSILON);
    assert!((ease_in_out(0.5) - 0.5).abs() < f64::EPSILON);
    assert!((ease_in_out(0.25) + ease_in_out(0.75) - 1.0).abs() < 1e-12);
    assert!((ease_in_out(2.0) - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn run_renders_intermediate_frames_and_ends_at_target() {
    let mut model = graph();
    let animation = MoveAnimation::new(vec![ElementTween {
        element_id: "node1".into(),
        from: Point::new(0.0, 0.0),
        to: Point::new(40.0, 0.0),
    }]);
    let syncer = ImmediateFrameSyncer::new(Duration::from_millis(10));
    let target = Arc::new(RecordingTarget::default());

    let frames =
        run_animation(&animation, &mut model, &syncer, Duration::from_millis(40), Some(target.as_ref())).await;

    assert_eq!(frames, 4);
    assert_eq!(target.count(), 3);
    assert_eq!(position(&model, "node1"), Point::new(40.0, 0.0));
    let mid = target.last_model().expect("rendered frame");
    let x = position(&mid, "node1").x;
    assert!(x > 0.0 && x < 40.0);
}

#[tokio::test]
async fn zero_duration_jumps_to_the_end() {
    let mut model = graph();
    let animation = MoveAnimation::new(vec![ElementTween {
        element_id: "node2".into(),
        from: Point::new(100.0, 0.0),
        to: Point::new(0.0, 50.0),
    }]);
    let syncer = ImmediateFrameSyncer::default();
    let frames = run_animation(&animation, &mut model, &syncer, Duration::ZERO, None).await;
    assert_eq!(frames, 1);
    assert_eq!(position(&model, "node2"), Point::new(0.0, 50.0));
}
