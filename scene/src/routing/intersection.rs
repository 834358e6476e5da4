//! Sweep-line detection of crossings between routed edges.
//!
//! Segment endpoints are queued left to right (ties broken by y, then left
//! endpoints before right endpoints). A left endpoint makes its segment active
//! and tests it against the active segments of other edges; a right endpoint
//! retires it. Each crossing is reported once, from the segment that entered
//! the sweep last, and attached to the routed point that ends the crossing
//! segment on both edges so the renderer can draw a jump or gap there.

#[cfg(test)]
#[path = "intersection_test.rs"]
mod intersection_test;

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::Serialize;

use crate::consts::MIN_SEGMENT_LENGTH;
use crate::geometry::{Point, PointToPointLine, points_almost_equal};
use crate::routing::EdgeRouting;

/// A crossing between segment `segment_index1` of `routable1` and segment
/// `segment_index2` of `routable2`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Intersection {
    pub routable1: String,
    pub segment_index1: usize,
    pub routable2: String,
    pub segment_index2: usize,
    pub intersection_point: Point,
}

struct Segment {
    route: usize,
    index: usize,
    line: PointToPointLine,
}

impl Segment {
    fn has_endpoint(&self, p: Point) -> bool {
        points_almost_equal(self.line.p1, p) || points_almost_equal(self.line.p2, p)
    }
}

struct SweepEvent {
    point: Point,
    is_right: bool,
    segment: usize,
}

impl Ord for SweepEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.point
            .x
            .total_cmp(&other.point.x)
            .then_with(|| self.point.y.total_cmp(&other.point.y))
            .then_with(|| self.is_right.cmp(&other.is_right))
            .then_with(|| self.segment.cmp(&other.segment))
    }
}

impl PartialOrd for SweepEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SweepEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SweepEvent {}

fn lexicographic(a: Point, b: Point) -> Ordering {
    a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntersectionFinder;

impl IntersectionFinder {
    /// All crossings between segments of different routes.
    #[must_use]
    pub fn find(&self, routing: &EdgeRouting) -> Vec<Intersection> {
        let ids: Vec<&String> = routing.routes.keys().collect();
        let mut segments = Vec::new();
        let mut queue = BinaryHeap::new();
        for (route, points) in routing.routes.values().enumerate() {
            for (index, pair) in points.windows(2).enumerate() {
                let line = PointToPointLine::new(pair[0].point, pair[1].point);
                if line.length() < MIN_SEGMENT_LENGTH {
                    continue;
                }
                let (left, right) = match lexicographic(line.p1, line.p2) {
                    Ordering::Greater => (line.p2, line.p1),
                    _ => (line.p1, line.p2),
                };
                let segment = segments.len();
                segments.push(Segment { route, index, line });
                queue.push(Reverse(SweepEvent { point: left, is_right: false, segment }));
                queue.push(Reverse(SweepEvent { point: right, is_right: true, segment }));
            }
        }

        let mut active: Vec<usize> = Vec::new();
        let mut found = Vec::new();
        while let Some(Reverse(event)) = queue.pop() {
            if event.is_right {
                active.retain(|s| *s != event.segment);
                continue;
            }
            let current = &segments[event.segment];
            for other in active.iter().map(|s| &segments[*s]) {
                if other.route == current.route {
                    continue;
                }
                let Some(point) = current.line.segment_intersection(&other.line) else {
                    continue;
                };
                if current.has_endpoint(point) && other.has_endpoint(point) {
                    continue;
                }
                found.push(Intersection {
                    routable1: ids[current.route].clone(),
                    segment_index1: current.index,
                    routable2: ids[other.route].clone(),
                    segment_index2: other.index,
                    intersection_point: point,
                });
            }
            active.push(event.segment);
        }
        found
    }

    /// Attach every crossing to the routed points ending the crossing
    /// segments of both edges.
    pub fn apply(&self, routing: &mut EdgeRouting) {
        for intersection in self.find(routing) {
            for (id, segment) in [
                (&intersection.routable1, intersection.segment_index1),
                (&intersection.routable2, intersection.segment_index2),
            ] {
                if let Some(point) = routing.routes.get_mut(id).and_then(|route| route.get_mut(segment + 1)) {
                    point.intersections.push(intersection.clone());
                }
            }
        }
    }
}
