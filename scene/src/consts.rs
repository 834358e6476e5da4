//! Shared numeric constants for the scene crate.

// ── Geometry ────────────────────────────────────────────────────

/// Tolerance used by [`crate::geometry::almost_equals`].
pub const EPSILON: f64 = 1e-3;

/// Segments shorter than this are skipped when sampling along a route.
pub const MIN_SEGMENT_LENGTH: f64 = 1e-8;

// ── Routing ─────────────────────────────────────────────────────

/// Router used when an edge does not name one.
pub const DEFAULT_ROUTER_KIND: &str = "polyline";

/// Anchor kind used when a connectable element does not name one.
pub const DEFAULT_ANCHOR_KIND: &str = "rectangular";

/// Two manhattan points closer than this on one axis are treated as aligned.
pub const MANHATTAN_ALIGN_TOLERANCE: f64 = 1.0;

// ── Viewport ────────────────────────────────────────────────────

/// Smallest zoom factor a viewport command may produce.
pub const MIN_ZOOM: f64 = 0.01;

/// Largest zoom factor a viewport command may produce.
pub const MAX_ZOOM: f64 = 100.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Slop in model units around zero-sized connectables when hit-testing.
pub const HIT_SLOP: f64 = 2.0;

// ── Rendering ───────────────────────────────────────────────────

/// Radius of the circle drawn for a routing handle.
pub const ROUTING_HANDLE_RADIUS: f64 = 5.0;

/// Radius of the marker drawn where two routed edges cross.
pub const INTERSECTION_MARKER_RADIUS: f64 = 4.0;

// ── Estimated text metrics ──────────────────────────────────────

/// Average glyph advance used when no real text measurement is available.
pub const ESTIMATED_CHAR_WIDTH: f64 = 7.0;

/// Line height used when no real text measurement is available.
pub const ESTIMATED_LINE_HEIGHT: f64 = 16.0;
