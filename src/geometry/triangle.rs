//! Isoceles-triangle construction for the corner cut-off refinement step,
//! grounded on `polygon_math.hpp::build_triangle`.

use super::{Line, Point, Triangle};

/// The angle (radians, `atan2`) of the directed line from `line.start` to
/// `line.end`.
#[inline]
pub fn line_angle(line: Line) -> f64 {
    (line.end.1 - line.start.1).atan2(line.end.0 - line.start.0)
}

/// Builds an isoceles triangle whose apex is `bisector.start` and whose base
/// is centered at `bisector.end`, running along `angle` with the given base
/// `length`. Mirrors `polygon_math.hpp::build_triangle`.
pub fn build_triangle(bisector: Line, angle: f64, length: f64) -> Triangle {
    let half_length = length / 2.0;
    let midpoint = bisector.end;

    let p2: Point = (
        midpoint.0 + half_length * angle.cos(),
        midpoint.1 + half_length * angle.sin(),
    );
    let p3: Point = (
        midpoint.0 - half_length * angle.cos(),
        midpoint.1 - half_length * angle.sin(),
    );

    Triangle { p1: bisector.start, p2, p3 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_base_is_centered_on_bisector_end() {
        let bisector = Line::new((0.0, 0.0), (10.0, 0.0));
        let tri = build_triangle(bisector, 0.0, 4.0);
        assert_eq!(tri.p1, (0.0, 0.0));
        // base runs along angle 0 (horizontal), centered at (10, 0)
        assert!((tri.p2.0 - 12.0).abs() < 1e-9);
        assert!((tri.p3.0 - 8.0).abs() < 1e-9);
        assert!(tri.p2.1.abs() < 1e-9 && tri.p3.1.abs() < 1e-9);
    }

    #[test]
    fn line_angle_matches_atan2() {
        let line = Line::new((0.0, 0.0), (1.0, 1.0));
        assert!((line_angle(line) - std::f64::consts::FRAC_PI_4).abs() < 1e-9);
    }
}
