use super::{Point, Polygon};

/// The half-plane `ax·x + ay·y <= b`. Power-diagram cells are carved out of
/// the clipping polygon by intersecting one of these per competing site.
#[derive(Debug, Clone, Copy)]
pub struct HalfPlane {
    pub ax: f64,
    pub ay: f64,
    pub b: f64,
}

impl HalfPlane {
    pub fn new(ax: f64, ay: f64, b: f64) -> Self {
        Self { ax, ay, b }
    }

    fn eval(&self, p: Point) -> f64 {
        self.ax * p.x + self.ay * p.y - self.b
    }
}

/// Sutherland–Hodgman clip of a convex ring against one half-plane.
/// Returns an empty polygon when nothing survives.
pub fn clip_half_plane(poly: &Polygon, hp: &HalfPlane) -> Polygon {
    let verts = poly.vertices();
    let n = verts.len();
    if n == 0 {
        return Polygon::new(Vec::new());
    }

    let mut out = Vec::with_capacity(n + 1);
    for i in 0..n {
        let cur = verts[i];
        let next = verts[(i + 1) % n];
        let d_cur = hp.eval(cur);
        let d_next = hp.eval(next);

        if d_cur <= 0.0 {
            out.push(cur);
        }
        // Edge crosses the boundary: emit the intersection point.
        if (d_cur < 0.0 && d_next > 0.0) || (d_cur > 0.0 && d_next < 0.0) {
            let t = d_cur / (d_cur - d_next);
            out.push(Point::new(
                cur.x + t * (next.x - cur.x),
                cur.y + t * (next.y - cur.y),
            ));
        }
    }

    Polygon::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_square_in_half() {
        let sq = Polygon::rect(0.0, 0.0, 10.0, 10.0);
        // keep x <= 5
        let left = clip_half_plane(&sq, &HalfPlane::new(1.0, 0.0, 5.0));
        assert!((left.area() - 50.0).abs() < 1e-9);
        for v in left.vertices() {
            assert!(v.x <= 5.0 + 1e-9);
        }
    }

    #[test]
    fn clip_away_everything() {
        let sq = Polygon::rect(0.0, 0.0, 10.0, 10.0);
        // keep x <= -1: nothing survives
        let gone = clip_half_plane(&sq, &HalfPlane::new(1.0, 0.0, -1.0));
        assert_eq!(gone.area(), 0.0);
    }

    #[test]
    fn clip_is_noop_when_polygon_inside() {
        let sq = Polygon::rect(0.0, 0.0, 10.0, 10.0);
        let same = clip_half_plane(&sq, &HalfPlane::new(1.0, 0.0, 100.0));
        assert!((same.area() - sq.area()).abs() < 1e-9);
    }

    #[test]
    fn diagonal_cut_of_unit_square() {
        let sq = Polygon::rect(0.0, 0.0, 1.0, 1.0);
        // keep x + y <= 1: lower-left triangle
        let tri = clip_half_plane(&sq, &HalfPlane::new(1.0, 1.0, 1.0));
        assert!((tri.area() - 0.5).abs() < 1e-9);
    }
}
