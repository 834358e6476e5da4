#![allow(clippy::float_cmp)]

use super::*;

// =============================================================
// Points
// =============================================================

#[test]
fn linear_interpolates_between_endpoints() {
    let p = linear(Point::new(0.0, 0.0), Point::new(10.0, 20.0), 0.25);
    assert_eq!(p, Point::new(2.5, 5.0));
}

#[test]
fn distances_agree_on_axis_aligned_points() {
    let a = Point::new(1.0, 1.0);
    let b = Point::new(4.0, 5.0);
    assert_eq!(euclidean_distance(a, b), 5.0);
    assert_eq!(manhattan_distance(a, b), 7.0);
    assert_eq!(max_distance(a, b), 4.0);
}

#[test]
fn normalize_keeps_zero_vector() {
    assert_eq!(normalize(Point::ORIGIN), Point::ORIGIN);
    let n = normalize(Point::new(3.0, 4.0));
    assert!(almost_equals(magnitude(n), 1.0));
}

#[test]
fn angle_between_opposite_vectors_is_pi() {
    let angle = angle_between(Point::new(1.0, 0.0), Point::new(-1.0, 0.0));
    assert!((angle - std::f64::consts::PI).abs() < 1e-9);
}

#[test]
fn shift_towards_moves_along_direction() {
    let p = shift_towards(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 3.0);
    assert_eq!(p, Point::new(3.0, 0.0));
    let q = shift_towards(Point::new(0.0, 0.0), Point::new(10.0, 0.0), -3.0);
    assert_eq!(q, Point::new(-3.0, 0.0));
}

// =============================================================
// Bounds
// =============================================================

#[test]
fn combine_ignores_invalid_bounds() {
    let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(a.combine(&Bounds::EMPTY), a);
    assert_eq!(Bounds::EMPTY.combine(&a), a);
}

#[test]
fn combine_spans_both() {
    let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
    let b = Bounds::new(20.0, 5.0, 10.0, 10.0);
    assert_eq!(a.combine(&b), Bounds::new(0.0, 0.0, 30.0, 15.0));
}

#[test]
fn includes_border_points() {
    let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
    assert!(b.includes(Point::new(10.0, 10.0)));
    assert!(!b.includes(Point::new(10.1, 5.0)));
}

#[test]
fn inflate_grows_every_side() {
    let b = Bounds::new(10.0, 10.0, 10.0, 10.0).inflate(2.0);
    assert_eq!(b, Bounds::new(8.0, 8.0, 14.0, 14.0));
}

// =============================================================
// Lines
// =============================================================

#[test]
fn line_intersection_of_diagonals() {
    let l1 = PointToPointLine::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    let l2 = PointToPointLine::new(Point::new(0.0, 10.0), Point::new(10.0, 0.0));
    let p = l1.intersection(&l2).expect("diagonals intersect");
    assert!(points_almost_equal(p, Point::new(5.0, 5.0)));
}

#[test]
fn parallel_lines_do_not_intersect() {
    let l1 = PointToPointLine::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
    let l2 = PointToPointLine::new(Point::new(0.0, 5.0), Point::new(10.0, 5.0));
    assert!(l1.intersection(&l2).is_none());
    assert!(l1.segment_intersection(&l2).is_none());
}

#[test]
fn segment_intersection_respects_extent() {
    let l1 = PointToPointLine::new(Point::new(0.0, 0.0), Point::new(4.0, 4.0));
    let l2 = PointToPointLine::new(Point::new(0.0, 10.0), Point::new(10.0, 0.0));
    assert!(l1.intersection(&l2).is_some());
    assert!(l1.segment_intersection(&l2).is_none());
}

#[test]
fn vertical_line_has_no_slope() {
    let l = PointToPointLine::new(Point::new(1.0, 0.0), Point::new(1.0, 5.0));
    assert!(l.slope().is_none());
}

#[test]
fn diamond_picks_side_by_quadrant() {
    let d = Diamond::new(&Bounds::new(0.0, 0.0, 20.0, 10.0));
    let side = d.closest_side_line(Point::new(30.0, -5.0));
    assert_eq!(side.p1, Point::new(10.0, 0.0));
    assert_eq!(side.p2, Point::new(20.0, 5.0));
}
