use serde::{Deserialize, Serialize};

use crate::Vector2;

/// A directed line segment between two points, in meters.
///
/// Zero-length segments are valid and behave as points for all distance
/// queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Vector2,
    pub end: Vector2,
}

impl Segment {
    pub fn new(start: Vector2, end: Vector2) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// The point at the given arc length from `start`, clamped to `end`.
    pub fn interpolate(&self, arc_len: f64) -> Vector2 {
        let len = self.length();
        if len < f64::EPSILON {
            return self.start;
        }
        let f = (arc_len / len).clamp(0.0, 1.0);
        self.start + (self.end - self.start) * f
    }

    /// The point at the given normalized fraction along the segment.
    pub fn interpolate_normalized(&self, f: f64) -> Vector2 {
        self.start + (self.end - self.start) * f.clamp(0.0, 1.0)
    }

    /// Shortest distance from a point to this segment.
    pub fn distance_to_point(&self, p: Vector2) -> f64 {
        let d = self.end - self.start;
        let len_sq = d.norm_squared();
        if len_sq < f64::EPSILON {
            return (p - self.start).norm();
        }
        let t = ((p - self.start).dot(&d) / len_sq).clamp(0.0, 1.0);
        (p - (self.start + d * t)).norm()
    }

    /// Shortest distance between two segments; zero if they cross.
    pub fn distance_to_segment(&self, other: &Segment) -> f64 {
        if self.intersects(other) {
            return 0.0;
        }
        self.distance_to_point(other.start)
            .min(self.distance_to_point(other.end))
            .min(other.distance_to_point(self.start))
            .min(other.distance_to_point(self.end))
    }

    /// Whether the two segments cross (shared endpoints count).
    pub fn intersects(&self, other: &Segment) -> bool {
        fn orient(a: Vector2, b: Vector2, c: Vector2) -> f64 {
            (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
        }
        fn on_segment(a: Vector2, b: Vector2, p: Vector2) -> bool {
            p.x >= a.x.min(b.x) - f64::EPSILON
                && p.x <= a.x.max(b.x) + f64::EPSILON
                && p.y >= a.y.min(b.y) - f64::EPSILON
                && p.y <= a.y.max(b.y) + f64::EPSILON
        }

        let d1 = orient(other.start, other.end, self.start);
        let d2 = orient(other.start, other.end, self.end);
        let d3 = orient(self.start, self.end, other.start);
        let d4 = orient(self.start, self.end, other.end);

        if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
        {
            return true;
        }

        (d1 == 0.0 && on_segment(other.start, other.end, self.start))
            || (d2 == 0.0 && on_segment(other.start, other.end, self.end))
            || (d3 == 0.0 && on_segment(self.start, self.end, other.start))
            || (d4 == 0.0 && on_segment(self.start, self.end, other.end))
    }
}

/// A closed polygon used for temporary keep-out zones (defense areas, the
/// field boundary). Only the boundary matters for clearance checks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Vector2>,
}

impl Polygon {
    /// Create a polygon from its vertices in order. Panics if fewer than 3
    /// vertices are given, which is always a programmer error.
    pub fn new(vertices: Vec<Vector2>) -> Self {
        assert!(vertices.len() >= 3, "a polygon needs at least 3 vertices");
        Self { vertices }
    }

    /// Axis-aligned rectangle from two opposite corners.
    pub fn rect(min: Vector2, max: Vector2) -> Self {
        Self::new(vec![
            Vector2::new(min.x, min.y),
            Vector2::new(max.x, min.y),
            Vector2::new(max.x, max.y),
            Vector2::new(min.x, max.y),
        ])
    }

    pub fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| Segment::new(self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Shortest distance from a segment to the polygon's boundary.
    pub fn boundary_distance(&self, seg: &Segment) -> f64 {
        self.edges()
            .map(|e| e.distance_to_segment(seg))
            .fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_interpolate_clamps_to_end() {
        let seg = Segment::new(Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0));
        let p = seg.interpolate(0.25);
        assert_relative_eq!(p.x, 0.25);
        let p = seg.interpolate(5.0);
        assert_relative_eq!(p.x, 1.0);
    }

    #[test]
    fn test_distance_to_point() {
        let seg = Segment::new(Vector2::new(0.0, 0.0), Vector2::new(2.0, 0.0));
        assert_relative_eq!(seg.distance_to_point(Vector2::new(1.0, 1.0)), 1.0);
        // Beyond the end the closest point is the endpoint
        assert_relative_eq!(
            seg.distance_to_point(Vector2::new(3.0, 0.0)),
            1.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_zero_length_segment_is_a_point() {
        let seg = Segment::new(Vector2::new(1.0, 1.0), Vector2::new(1.0, 1.0));
        assert_relative_eq!(seg.distance_to_point(Vector2::new(1.0, 2.0)), 1.0);
        assert_eq!(seg.interpolate(0.5), Vector2::new(1.0, 1.0));
    }

    #[test]
    fn test_crossing_segments_have_zero_distance() {
        let a = Segment::new(Vector2::new(-1.0, 0.0), Vector2::new(1.0, 0.0));
        let b = Segment::new(Vector2::new(0.0, -1.0), Vector2::new(0.0, 1.0));
        assert_relative_eq!(a.distance_to_segment(&b), 0.0);
    }

    #[test]
    fn test_parallel_segment_distance() {
        let a = Segment::new(Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0));
        let b = Segment::new(Vector2::new(0.0, 0.5), Vector2::new(1.0, 0.5));
        assert_relative_eq!(a.distance_to_segment(&b), 0.5);
    }

    #[test]
    fn test_polygon_boundary_distance() {
        let poly = Polygon::rect(Vector2::new(-1.0, -1.0), Vector2::new(1.0, 1.0));
        let seg = Segment::new(Vector2::new(2.0, 0.0), Vector2::new(3.0, 0.0));
        assert_relative_eq!(poly.boundary_distance(&seg), 1.0);
        // A segment inside the polygon is still measured to the boundary
        let inside = Segment::new(Vector2::new(0.0, 0.0), Vector2::new(0.1, 0.0));
        assert_relative_eq!(poly.boundary_distance(&inside), 0.9);
    }
}
