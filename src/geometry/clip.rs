//! Polygon boolean operations (difference, intersection) used by the corner
//! cut-off refinement step and by 9-slice region computation
//! (`Item::get_9slice`).
//!
//! Both operations assume the *clip* polygon is convex and CCW-wound (true
//! for the triangles and guide rectangles this crate ever clips against);
//! the *subject* may be any simple polygon. This is a half-plane
//! decomposition rather than a general Weiler-Atherton/Vatti engine, which
//! keeps the kernel free of an external clipping dependency while covering
//! every shape this crate actually produces.

use super::Point;

/// Signed distance (scaled) of `p` from directed line `a -> b`; positive
/// when `p` is left of the line.
fn side(a: Point, b: Point, p: Point) -> f64 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

fn segment_intersect(a: Point, b: Point, p: Point, q: Point) -> Point {
    let (x1, y1) = a;
    let (x2, y2) = b;
    let (x3, y3) = p;
    let (x4, y4) = q;

    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom == 0.0 {
        return p;
    }
    let pre = x1 * y2 - y1 * x2;
    let post = x3 * y4 - y3 * x4;
    let x = (pre * (x3 - x4) - (x1 - x2) * post) / denom;
    let y = (pre * (y3 - y4) - (y1 - y2) * post) / denom;
    (x, y)
}

/// Clips `polygon` against the half-plane of directed line `a -> b`,
/// keeping the left side when `keep_left` is true, the right side
/// otherwise. Standard Sutherland-Hodgman single-edge clip.
fn half_plane_clip(polygon: &[Point], a: Point, b: Point, keep_left: bool) -> Vec<Point> {
    if polygon.is_empty() {
        return Vec::new();
    }

    let inside = |p: Point| {
        let s = side(a, b, p);
        if keep_left {
            s >= 0.0
        } else {
            s <= 0.0
        }
    };

    let mut output = Vec::with_capacity(polygon.len() + 1);
    let n = polygon.len();
    for i in 0..n {
        let cur = polygon[i];
        let next = polygon[(i + 1) % n];
        let cur_in = inside(cur);
        let next_in = inside(next);

        if cur_in {
            output.push(cur);
        }
        if cur_in != next_in {
            output.push(segment_intersect(a, b, cur, next));
        }
    }
    output
}

/// Intersects `subject` (any simple polygon) with convex CCW `clip`,
/// returning the (possibly empty) resulting polygon.
pub fn intersection(subject: &[Point], clip: &[Point]) -> Vec<Point> {
    let mut result = subject.to_vec();
    let n = clip.len();
    for i in 0..n {
        if result.is_empty() {
            break;
        }
        let a = clip[i];
        let b = clip[(i + 1) % n];
        result = half_plane_clip(&result, a, b, true);
    }
    result
}

/// Subtracts the union of `clips` (each a convex CCW polygon) from
/// `subject`, returning the resulting fragments. Each clip is applied via a
/// half-plane decomposition: a fragment lying entirely outside one of the
/// clip's edges is emitted as a result piece; the remainder continues to be
/// tested against the clip's other edges (and subsequent clips).
pub fn difference(subject: &[Point], clips: &[Vec<Point>]) -> Vec<Vec<Point>> {
    let mut fragments = vec![subject.to_vec()];

    for clip in clips {
        if clip.len() < 3 {
            continue;
        }
        let mut next_fragments = Vec::new();
        let mut outside_pieces = Vec::new();

        for fragment in fragments {
            let mut remaining = fragment;
            let n = clip.len();
            for i in 0..n {
                if remaining.is_empty() {
                    break;
                }
                let a = clip[i];
                let b = clip[(i + 1) % n];

                let outside = half_plane_clip(&remaining, a, b, false);
                if outside.len() >= 3 {
                    outside_pieces.push(outside);
                }
                remaining = half_plane_clip(&remaining, a, b, true);
            }
            // `remaining` here is fragment ∩ clip: inside every clip edge, discarded.
        }

        next_fragments.append(&mut outside_pieces);
        fragments = next_fragments;
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::signed_area2;

    #[test]
    fn intersect_square_with_centered_square() {
        let subject = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let clip = vec![(5.0, 5.0), (15.0, 5.0), (15.0, 15.0), (5.0, 15.0)];
        let result = intersection(&subject, &clip);
        assert!(!result.is_empty());
        assert!((signed_area2(&result).abs() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn difference_removes_corner_triangle() {
        let subject = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let corner = vec![(0.0, 0.0), (2.0, 0.0), (0.0, 2.0)];
        let result = difference(&subject, std::slice::from_ref(&corner));
        let biggest = result
            .iter()
            .max_by(|a, b| signed_area2(a).abs().partial_cmp(&signed_area2(b).abs()).unwrap())
            .unwrap();
        // full square area 100 minus corner triangle area 2
        assert!((signed_area2(biggest).abs() - 98.0).abs() < 1e-6);
    }

    #[test]
    fn difference_against_non_overlapping_clip_keeps_subject() {
        let subject = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let far_away = vec![(100.0, 100.0), (102.0, 100.0), (100.0, 102.0)];
        let result = difference(&subject, std::slice::from_ref(&far_away));
        assert_eq!(result.len(), 1);
        assert!((signed_area2(&result[0]).abs() - 100.0).abs() < 1e-6);
    }
}
