//! Quickhull convex hull construction over an integer point cloud (the
//! contour points emitted by `Item::get_image_contour`).

use super::Point;

/// Computes the convex hull of `points` and returns it as a CCW-wound simple
/// polygon. Returns an empty vec if fewer than 3 distinct points are given.
pub fn quick_hull(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return Vec::new();
    }

    let mut leftmost = points[0];
    let mut rightmost = points[0];
    for &p in points {
        if p.0 < leftmost.0 || (p.0 == leftmost.0 && p.1 < leftmost.1) {
            leftmost = p;
        }
        if p.0 > rightmost.0 || (p.0 == rightmost.0 && p.1 > rightmost.1) {
            rightmost = p;
        }
    }

    if leftmost == rightmost {
        return Vec::new();
    }

    let (left_set, right_set): (Vec<Point>, Vec<Point>) = points
        .iter()
        .copied()
        .partition(|&p| side(leftmost, rightmost, p) > 0.0);

    let mut hull = Vec::new();
    hull.push(leftmost);
    hull_half(&left_set, leftmost, rightmost, &mut hull);
    hull.push(rightmost);
    hull_half(&right_set, rightmost, leftmost, &mut hull);

    dedup_consecutive(hull)
}

/// Signed distance (scaled) of `p` from the directed line `a -> b`; positive
/// when `p` is to the left of the line.
fn side(a: Point, b: Point, p: Point) -> f64 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

fn hull_half(subset: &[Point], a: Point, b: Point, out: &mut Vec<Point>) {
    if subset.is_empty() {
        return;
    }

    let farthest = subset
        .iter()
        .copied()
        .max_by(|&p, &q| side(a, b, p).partial_cmp(&side(a, b, q)).unwrap())
        .unwrap();

    if side(a, b, farthest) <= 0.0 {
        return;
    }

    let left_of_af: Vec<Point> = subset
        .iter()
        .copied()
        .filter(|&p| side(a, farthest, p) > 0.0)
        .collect();
    let left_of_fb: Vec<Point> = subset
        .iter()
        .copied()
        .filter(|&p| side(farthest, b, p) > 0.0)
        .collect();

    hull_half(&left_of_af, a, farthest, out);
    out.push(farthest);
    hull_half(&left_of_fb, farthest, b, out);
}

fn dedup_consecutive(points: Vec<Point>) -> Vec<Point> {
    let mut result: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if result.last() != Some(&p) {
            result.push(p);
        }
    }
    if result.len() > 1 && result.first() == result.last() {
        result.pop();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::polygon_type;
    use crate::geometry::PolygonType;

    #[test]
    fn hull_of_square_with_interior_points() {
        let points = vec![
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
            (2.0, 2.0),
            (1.0, 1.0),
            (3.0, 3.0),
        ];
        let hull = quick_hull(&points);
        assert_eq!(hull.len(), 4);
        assert_eq!(polygon_type(&hull), PolygonType::Convex);
        for corner in [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)] {
            assert!(hull.contains(&corner));
        }
    }

    #[test]
    fn hull_of_fewer_than_three_points_is_empty() {
        assert!(quick_hull(&[(0.0, 0.0), (1.0, 1.0)]).is_empty());
    }

    #[test]
    fn hull_of_circle_like_point_cloud_is_convex() {
        let mut points = Vec::new();
        for i in 0..32 {
            let angle = i as f64 / 32.0 * std::f64::consts::TAU;
            points.push((10.0 * angle.cos(), 10.0 * angle.sin()));
        }
        let hull = quick_hull(&points);
        assert!(hull.len() >= 8);
        assert_eq!(polygon_type(&hull), PolygonType::Convex);
    }
}
