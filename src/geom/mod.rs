pub mod clip;

pub use clip::{clip_half_plane, HalfPlane};

use serde::{Deserialize, Serialize};

/// Tolerance for degenerate-area and orientation checks.
pub const AREA_EPSILON: f64 = 1e-9;

/// A 2D point in layout space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance to another point.
    pub fn dist2(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// An ordered vertex ring, implicitly closed (last vertex connects to first).
///
/// Layout code assumes convexity; `Polygon` itself only normalizes
/// representation (trailing duplicate removal, orientation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    /// Build a polygon from a vertex ring. A trailing vertex equal to the
    /// first is dropped: the demo data closes its rings explicitly.
    pub fn new(mut vertices: Vec<Point>) -> Self {
        if vertices.len() > 1 {
            let first = vertices[0];
            let last = *vertices.last().unwrap();
            if (first.x - last.x).abs() < AREA_EPSILON && (first.y - last.y).abs() < AREA_EPSILON {
                vertices.pop();
            }
        }
        Self { vertices }
    }

    /// Axis-aligned rectangle as a counter-clockwise ring.
    pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            vertices: vec![
                Point::new(x0, y0),
                Point::new(x1, y0),
                Point::new(x1, y1),
                Point::new(x0, y1),
            ],
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Signed area via the shoelace formula. Positive for counter-clockwise
    /// rings with y pointing up.
    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            sum += a.x * b.y - b.x * a.y;
        }
        sum * 0.5
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Area-weighted centroid. Falls back to the vertex average when the
    /// ring is degenerate (near-zero area).
    pub fn centroid(&self) -> Point {
        let n = self.vertices.len();
        if n == 0 {
            return Point::new(0.0, 0.0);
        }
        if n < 3 {
            return self.vertex_average();
        }

        let mut area = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let cross = a.x * b.y - b.x * a.y;
            area += cross;
            cx += (a.x + b.x) * cross;
            cy += (a.y + b.y) * cross;
        }
        if area.abs() < AREA_EPSILON {
            return self.vertex_average();
        }
        area *= 0.5;
        Point::new(cx / (6.0 * area), cy / (6.0 * area))
    }

    fn vertex_average(&self) -> Point {
        let n = self.vertices.len() as f64;
        let sx: f64 = self.vertices.iter().map(|p| p.x).sum();
        let sy: f64 = self.vertices.iter().map(|p| p.y).sum();
        Point::new(sx / n, sy / n)
    }

    /// Reverse the ring in place if it winds clockwise.
    pub fn normalize_ccw(&mut self) {
        if self.signed_area() < 0.0 {
            self.vertices.reverse();
        }
    }

    /// Min/max corners of the axis-aligned bounding box.
    pub fn bounding_box(&self) -> (Point, Point) {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for v in &self.vertices {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }
        (min, max)
    }

    /// Point containment for a convex counter-clockwise ring. Boundary
    /// points count as inside.
    pub fn contains(&self, p: Point) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
            if cross < -AREA_EPSILON {
                return false;
            }
        }
        true
    }
}
