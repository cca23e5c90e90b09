//! Line-line and ray-polygon intersection, plus the convexity classifier
//! used both to validate generated polygons and caller-supplied custom
//! polygons (`Item::mark_as_custom`).

use super::{Line, Point};

/// Intersects two line *segments* (not infinite lines), following
/// `polygon_math.hpp::line_intersect`: returns `None` when the segments are
/// parallel or the intersection point lies outside either segment's
/// bounding interval.
pub fn line_intersect(l1: Line, l2: Line) -> Option<Point> {
    let (x1, y1) = l1.start;
    let (x2, y2) = l1.end;
    let (x3, y3) = l2.start;
    let (x4, y4) = l2.end;

    let determinant = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if determinant == 0.0 {
        return None;
    }

    let pre = x1 * y2 - y1 * x2;
    let post = x3 * y4 - y3 * x4;
    let x = (pre * (x3 - x4) - (x1 - x2) * post) / determinant;
    let y = (pre * (y3 - y4) - (y1 - y2) * post) / determinant;

    if x < x1.min(x2) || x > x1.max(x2) || x < x3.min(x4) || x > x3.max(x4) {
        return None;
    }
    if y < y1.min(y2) || y > y1.max(y2) || y < y3.min(y4) || y > y3.max(y4) {
        return None;
    }

    Some((x, y))
}

/// Finds the first edge of `polygon` (iterated in winding order) that the
/// `ray` segment crosses, returning the edge's two vertex indices and the
/// intersection point. Mirrors the polygon overload of
/// `polygon_math.hpp::line_intersect`.
pub fn ray_polygon_intersect(polygon: &[Point], ray: Line) -> Option<(usize, usize, Point)> {
    let len = polygon.len();
    for i in 0..len {
        let p1_idx = i;
        let p2_idx = (i + 1) % len;
        let candidate = Line::new(polygon[p1_idx], polygon[p2_idx]);
        if let Some(point) = line_intersect(candidate, ray) {
            return Some((p1_idx, p2_idx, point));
        }
    }
    None
}

/// Classification of a point sequence's winding, used to gate acceptance of
/// both generated and caller-supplied polygons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolygonType {
    Convex,
    Concave,
    Degenerate,
}

/// Classifies `points` by the consistency of the cross-product sign between
/// consecutive edges. A polygon is `Convex` iff every turn has the same sign
/// (all CCW or all CW); a single sign flip makes it `Concave`; fewer than 3
/// points, or all collinear, is `Degenerate`.
pub fn polygon_type(points: &[Point]) -> PolygonType {
    let n = points.len();
    if n < 3 {
        return PolygonType::Degenerate;
    }

    let mut positive = false;
    let mut negative = false;

    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];

        let cross = (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0);
        if cross > 0.0 {
            positive = true;
        } else if cross < 0.0 {
            negative = true;
        }
    }

    match (positive, negative) {
        (true, true) => PolygonType::Concave,
        (true, false) | (false, true) => PolygonType::Convex,
        (false, false) => PolygonType::Degenerate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersecting_segments() {
        let l1 = Line::new((0.0, 0.0), (4.0, 4.0));
        let l2 = Line::new((0.0, 4.0), (4.0, 0.0));
        let point = line_intersect(l1, l2).unwrap();
        assert!((point.0 - 2.0).abs() < 1e-9);
        assert!((point.1 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        let l1 = Line::new((0.0, 0.0), (4.0, 0.0));
        let l2 = Line::new((0.0, 1.0), (4.0, 1.0));
        assert!(line_intersect(l1, l2).is_none());
    }

    #[test]
    fn segments_outside_bounding_interval() {
        let l1 = Line::new((0.0, 0.0), (1.0, 1.0));
        let l2 = Line::new((5.0, 0.0), (5.0, -1.0));
        assert!(line_intersect(l1, l2).is_none());
    }

    #[test]
    fn square_is_convex() {
        let square = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
        assert_eq!(polygon_type(&square), PolygonType::Convex);
    }

    #[test]
    fn notched_polygon_is_concave() {
        let notched = [
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (2.0, 2.0),
            (0.0, 4.0),
        ];
        assert_eq!(polygon_type(&notched), PolygonType::Concave);
    }

    #[test]
    fn ray_hits_first_crossed_edge() {
        let square = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
        let ray = Line::new((2.0, 2.0), (10.0, 2.0));
        let (p1, p2, point) = ray_polygon_intersect(&square, ray).unwrap();
        assert_eq!((p1, p2), (1, 2));
        assert!((point.0 - 4.0).abs() < 1e-9);
    }
}
