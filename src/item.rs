//! A single packable sprite: source pixels, alpha-driven polygon
//! extraction, 9-slice region computation and duplicate-content equality.
//! This is the densest module in the crate — the contour -> hull ->
//! corner-cutoff -> clip pipeline is `generate_image_polygon`, ported
//! near-verbatim from `Item.cpp::generate_image_polygon`.

use std::cell::Cell;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::geometry::{self, Line, Point, PolygonType, Rect};
use crate::image::{CropRect, Image, PixelDepth};

/// A polygon vertex: `xy` in the sprite's own coordinate space, `uv` in the
/// packed-atlas space before `Item::transform` is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vertex {
    pub xy: (i32, i32),
    pub uv: (u16, u16),
}

/// Rotation (radians) plus integer translation mapping UV to atlas
/// coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transformation {
    pub rotation: f64,
    pub translation: (i32, i32),
}

impl Default for Transformation {
    fn default() -> Self {
        Self { rotation: 0.0, translation: (0, 0) }
    }
}

impl Transformation {
    /// Applies the rotation and translation to `p`.
    pub fn apply(&self, p: (i32, i32)) -> (i32, i32) {
        let (px, py) = (p.0 as f64, p.1 as f64);
        let (sin, cos) = self.rotation.sin_cos();
        let x = (px * cos - py * sin + self.translation.0 as f64).ceil() as i32;
        let y = (py * cos + px * sin + self.translation.1 as f64).ceil() as i32;
        (x, y)
    }
}

/// Polygon generation state of an [`Item`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    Unset,
    Valid,
    InvalidPolygon,
}

/// The axis-aligned bounding box of an item's `xy` vertices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XyBounds {
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
    pub top: i32,
}

/// The axis-aligned bounding box of an item's `uv` vertices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UvBounds {
    pub left: u16,
    pub bottom: u16,
    pub right: u16,
    pub top: u16,
}

/// One sprite to be packed. See the module docs for the invariants this
/// type upholds once `status() == Status::Valid`.
pub struct Item {
    image: Arc<Image>,
    sliced: bool,
    colorfill: bool,
    status: Status,
    preprocessed: bool,
    hash: Cell<Option<u64>>,
    pub(crate) texture_index: usize,
    vertices: Vec<Vertex>,
    transform: Transformation,
}

impl Item {
    /// Wraps an already-decoded image as a packable item.
    pub fn from_image(image: Image, sliced: bool) -> Self {
        Self {
            image: Arc::new(image),
            sliced,
            colorfill: false,
            status: Status::Unset,
            preprocessed: false,
            hash: Cell::new(None),
            texture_index: 0,
            vertices: Vec::new(),
            transform: Transformation::default(),
        }
    }

    /// A 1x1 solid-color item.
    pub fn from_color(rgba: [u8; 4]) -> Self {
        let mut image = Image::new(1, 1, PixelDepth::Rgba8);
        image.set(0, 0, &rgba);
        let mut item = Self::from_image(image, false);
        item.colorfill = true;
        item
    }

    /// Decodes an image file via the `image` crate.
    pub fn from_path(path: impl AsRef<Path>, sliced: bool) -> image::ImageResult<Self> {
        let decoded = image::open(path)?;
        Ok(Self::from_image(image_from_dynamic(decoded), sliced))
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.image.height()
    }

    #[inline]
    pub fn image(&self) -> &Image {
        &self.image
    }

    #[inline]
    pub fn transform(&self) -> Transformation {
        self.transform
    }

    #[inline]
    pub fn set_transform(&mut self, transform: Transformation) {
        self.transform = transform;
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn texture_index(&self) -> usize {
        self.texture_index
    }

    #[inline]
    pub fn is_sliced(&self) -> bool {
        self.sliced
    }

    #[inline]
    pub fn is_colorfill(&self) -> bool {
        self.colorfill
    }

    /// `true` when this item is packed as an axis-aligned rectangle rather
    /// than a cut polygon: `is_sliced() || width() + height() < 100`,
    /// evaluated against the item's *current* (possibly already cropped)
    /// dimensions.
    pub fn is_rectangle(&self) -> bool {
        self.sliced || (self.width() as u32 + self.height() as u32) < 100
    }

    /// Returns the item's single vertex when it is a colorfill, for callers
    /// that want the packed placement of a solid-color swatch without
    /// walking `vertices` themselves.
    pub fn get_colorfill(&self) -> Option<Vertex> {
        if self.colorfill {
            self.vertices.first().copied()
        } else {
            None
        }
    }

    /// Accepts an externally supplied polygon. Fails (returning `false`,
    /// without raising) unless `vertices`' `uv` ring is convex.
    pub fn mark_as_custom(&mut self, vertices: Vec<Vertex>) -> bool {
        let uv_points: Vec<Point> =
            vertices.iter().map(|v| (v.uv.0 as f64, v.uv.1 as f64)).collect();

        if geometry::polygon_type(&uv_points) != PolygonType::Convex {
            self.status = Status::InvalidPolygon;
            return false;
        }

        self.vertices = vertices;
        self.status = Status::Valid;
        self.mark_as_preprocessed();
        true
    }

    #[inline]
    pub fn mark_as_preprocessed(&mut self) {
        self.preprocessed = true;
    }

    /// Copies polygon, placement and status from a duplicate's source item
    /// during the generator's writeback pass.
    pub(crate) fn adopt_from(&mut self, source: &Item) {
        self.vertices = source.vertices.clone();
        self.transform = source.transform;
        self.texture_index = source.texture_index;
        self.status = source.status;
    }

    /// The bounding box of `xy` vertices.
    pub fn bound(&self) -> XyBounds {
        let mut left = i32::MAX;
        let mut bottom = i32::MAX;
        let mut right = i32::MIN;
        let mut top = i32::MIN;
        for v in &self.vertices {
            left = left.min(v.xy.0);
            right = right.max(v.xy.0);
            bottom = bottom.min(v.xy.1);
            top = top.max(v.xy.1);
        }
        XyBounds { left, bottom, right, top }
    }

    /// The bounding box of `uv` vertices.
    pub fn bound_uv(&self) -> UvBounds {
        let mut left = u16::MAX;
        let mut bottom = u16::MAX;
        let mut right = 0u16;
        let mut top = 0u16;
        for v in &self.vertices {
            left = left.min(v.uv.0);
            right = right.max(v.uv.0);
            bottom = bottom.min(v.uv.1);
            top = top.max(v.uv.1);
        }
        UvBounds { left, bottom, right, top }
    }

    /// Splits this (rectangular) item into up to nine regions against a
    /// `guide` rectangle, appending each non-empty region to `out`. No-op
    /// for non-rectangular items.
    pub fn get_9slice(&self, guide: XyBounds, out: &mut Vec<Vec<Vertex>>, xy_transform: Transformation) {
        if !self.is_rectangle() {
            return;
        }

        let bound = self.bound();
        let translated = XyBounds {
            left: bound.left + xy_transform.translation.0,
            right: bound.right + xy_transform.translation.0,
            bottom: bound.bottom + xy_transform.translation.1,
            top: bound.top + xy_transform.translation.1,
        };
        let offset = (translated.left as f64, translated.bottom as f64);
        let size = (
            (translated.right - translated.left).unsigned_abs().max(1) as f64,
            (translated.top - translated.bottom).unsigned_abs().max(1) as f64,
        );

        let uv_bound = self.bound_uv();
        let uv_size = (
            (uv_bound.right as i32 - uv_bound.left as i32).unsigned_abs() as f64,
            (uv_bound.top as i32 - uv_bound.bottom as i32).unsigned_abs() as f64,
        );

        let subject: Vec<Point> = self
            .vertices
            .iter()
            .map(|v| {
                (
                    (v.xy.0 + xy_transform.translation.0) as f64,
                    (v.xy.1 + xy_transform.translation.1) as f64,
                )
            })
            .collect();

        const MIN: f64 = -1e9;
        const MAX: f64 = 1e9;
        let (gl, gb, gr, gt) = (guide.left as f64, guide.bottom as f64, guide.right as f64, guide.top as f64);

        let regions = [
            (MIN, MIN, gl, gb),
            (gl, MIN, gr, gb),
            (gr, MIN, MAX, gb),
            (MIN, gb, gl, gt),
            (gl, gb, gr, gt),
            (gr, gb, MAX, gt),
            (MIN, gt, gl, MAX),
            (gl, gt, gr, MAX),
            (gr, gt, MAX, MAX),
        ];

        for (left, bottom, right, top) in regions {
            let clip_rect = Rect::new(left, bottom, right, top).to_polygon();
            let piece = geometry::intersection(&subject, &clip_rect);
            if piece.len() < 3 {
                continue;
            }

            let mut path = Vec::with_capacity(piece.len());
            for (x, y) in piece {
                let u = (x - offset.0) / size.0;
                let v = (y - offset.1) / size.1;
                path.push(Vertex {
                    xy: (x.round() as i32, y.round() as i32),
                    uv: (
                        (u * uv_size.0).clamp(0.0, u16::MAX as f64) as u16,
                        (v * uv_size.1).clamp(0.0, u16::MAX as f64) as u16,
                    ),
                });
            }
            out.push(path);
        }
    }

    fn cached_hash(&self) -> u64 {
        if let Some(hash) = self.hash.get() {
            return hash;
        }
        let hash = self.image.hash();
        self.hash.set(Some(hash));
        hash
    }

    /// Idempotent: scales (unless sliced) and premultiplies alpha.
    fn preprocess(&mut self, config: &Config) {
        if self.preprocessed {
            return;
        }

        if config.scale() != 1.0 && !self.sliced {
            let resized = {
                let width = ((self.image.width() as f32) * config.scale()).ceil().max(1.0) as u16;
                let height = ((self.image.height() as f32) * config.scale()).ceil().max(1.0) as u16;
                self.image.resized(width, height)
            };
            self.image = Arc::new(resized);
        }

        if let Some(alpha_channel) = self.image.depth().alpha_channel() {
            let image = Arc::make_mut(&mut self.image);
            premultiply_alpha(image, alpha_channel);
        }

        self.preprocessed = true;
    }

    /// Runs the full polygon-extraction pipeline. Leaves `status = Valid`
    /// with a non-empty `vertices` on every path; the only
    /// way `vertices` ends up empty is the documented "no triangles and no
    /// rectangle fallback" edge, which cannot occur given the fallback is
    /// always attempted last.
    pub fn generate_image_polygon(&mut self, config: &Config) {
        self.preprocess(config);

        let scale_factor = if self.sliced { 1.0 } else { config.scale() };
        let full_size = (self.image.width(), self.image.height());

        if full_size.0 <= 1 || full_size.1 <= 1 {
            log::debug!("item has degenerate dimensions {full_size:?}, using rectangle fallback");
            self.emit_rectangle_fallback(full_size, (0, 0), scale_factor);
            return;
        }

        let alpha_channel = match self.image.depth().alpha_channel() {
            Some(channel) => channel,
            None => {
                log::debug!("item has no alpha channel, using rectangle fallback");
                self.emit_rectangle_fallback(full_size, (0, 0), scale_factor);
                return;
            }
        };

        let mut mask = self.image.extract_channel(alpha_channel);
        normalize_mask(&mut mask, config.alpha_threshold());

        let crop_bound = mask.bound().unwrap_or(CropRect { min_x: 0, min_y: 0, max_x: 1, max_y: 1 });

        self.image = Arc::new(self.image.crop(crop_bound));
        let mask = mask.crop(crop_bound);
        let current_size = (mask.width(), mask.height());
        let crop_min = (crop_bound.min_x, crop_bound.min_y);

        if self.is_rectangle() {
            self.emit_rectangle_fallback(current_size, crop_min, scale_factor);
            return;
        }

        let contour = get_image_contour(&mask);
        let contour_f64: Vec<Point> = contour.iter().map(|&(x, y)| (x as f64, y as f64)).collect();
        let hull = geometry::quick_hull(&contour_f64);

        if hull.len() < 3 {
            log::debug!("item contour did not yield a hull, using rectangle fallback");
            self.emit_rectangle_fallback(current_size, crop_min, scale_factor);
            return;
        }

        let centroid: Point = (current_size.0 as f64 / 2.0, current_size.1 as f64 / 2.0);
        let distance_threshold = (current_size.0 as f64 + current_size.1 as f64) * 0.03;
        let corners: [Point; 4] = [
            (0.0, 0.0),
            (current_size.0 as f64, 0.0),
            (current_size.0 as f64, current_size.1 as f64),
            (0.0, current_size.1 as f64),
        ];

        let triangles: Vec<Vec<Point>> = corners
            .iter()
            .filter_map(|&corner| {
                corner_cutoff_triangle(corner, centroid, &hull, distance_threshold, current_size)
            })
            .collect();

        if triangles.is_empty() {
            log::debug!("no corners needed cutting, using rectangle fallback");
            self.emit_rectangle_fallback(current_size, crop_min, scale_factor);
            return;
        }

        let rect_polygon = Rect::new(0.0, 0.0, current_size.0 as f64, current_size.1 as f64).to_polygon();
        let solutions = geometry::difference(&rect_polygon, &triangles);
        let chosen = solutions.into_iter().find(|polygon| polygon.len() >= 4);

        match chosen {
            Some(polygon) => {
                self.vertices = polygon
                    .iter()
                    .map(|&(x, y)| Vertex {
                        xy: (
                            (((x + crop_min.0 as f64) * scale_factor as f64).ceil()) as i32,
                            (((y + crop_min.1 as f64) * scale_factor as f64).ceil()) as i32,
                        ),
                        uv: (x.max(0.0).ceil() as u16, y.max(0.0).ceil() as u16),
                    })
                    .collect();

                if self.vertices.is_empty() {
                    self.emit_rectangle_fallback(current_size, crop_min, scale_factor);
                } else {
                    self.status = Status::Valid;
                }
            }
            None => {
                log::debug!("corner cutoff left no usable polygon, using rectangle fallback");
                self.emit_rectangle_fallback(current_size, crop_min, scale_factor);
            }
        }
    }

    fn emit_rectangle_fallback(&mut self, current_size: (u16, u16), crop_min: (u16, u16), scale_factor: f32) {
        let (w, h) = current_size;
        let to_xy = |x: u16, y: u16| -> (i32, i32) {
            (
                (((x as f32 + crop_min.0 as f32) * scale_factor).ceil()) as i32,
                (((y as f32 + crop_min.1 as f32) * scale_factor).ceil()) as i32,
            )
        };
        self.vertices = vec![
            Vertex { uv: (w, 0), xy: to_xy(w, 0) },
            Vertex { uv: (w, h), xy: to_xy(w, h) },
            Vertex { uv: (0, h), xy: to_xy(0, h) },
            Vertex { uv: (0, 0), xy: to_xy(0, 0) },
        ];
        self.status = Status::Valid;
    }
}

impl PartialEq for Item {
    /// `true` iff the images share the same backing allocation, or their
    /// content hashes match.
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.image, &other.image) {
            return true;
        }
        self.cached_hash() == other.cached_hash()
    }
}

fn premultiply_alpha(image: &mut Image, alpha_channel: usize) {
    let (w, h) = (image.width(), image.height());
    for y in 0..h {
        for x in 0..w {
            let mut pixel = image.at(x, y).to_vec();
            let alpha = pixel[alpha_channel] as f32 / 255.0;
            for (i, channel) in pixel.iter_mut().enumerate() {
                if i != alpha_channel {
                    *channel = (*channel as f32 * alpha) as u8;
                }
            }
            image.set(x, y, &pixel);
        }
    }
}

fn normalize_mask(mask: &mut Image, alpha_threshold: u8) {
    let (w, h) = (mask.width(), mask.height());
    for y in 0..h {
        for x in 0..w {
            let value = mask.at(x, y)[0];
            mask.set(x, y, &[if value > alpha_threshold { 255 } else { 0 }]);
        }
    }
}

/// Emits every foreground pixel that touches the image border or has at
/// least one zero-valued and one non-zero 8-neighbor.
fn get_image_contour(mask: &Image) -> Vec<(u16, u16)> {
    let (w, h) = (mask.width(), mask.height());
    let mut result = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if mask.at(x, y)[0] == 0 {
                continue;
            }

            if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                result.push((x, y));
                continue;
            }

            let mut has_positive = false;
            let mut has_negative = false;
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                        continue;
                    }
                    let neighbor = mask.at(nx as u16, ny as u16)[0];
                    has_positive |= neighbor > 0;
                    has_negative |= neighbor == 0;
                }
            }

            if has_positive && has_negative {
                result.push((x, y));
            }
        }
    }

    result
}

/// Casts a ray from `corner` toward `centroid`; if it crosses the hull far
/// enough from `corner`, builds the cut-off triangle.
fn corner_cutoff_triangle(
    corner: Point,
    centroid: Point,
    hull: &[Point],
    distance_threshold: f64,
    current_size: (u16, u16),
) -> Option<Vec<Point>> {
    let ray = Line::new(corner, centroid);
    let (p1_idx, p2_idx, intersect) = geometry::ray_polygon_intersect(hull, ray)?;

    if distance_threshold > geometry::dist(corner, intersect) {
        return None;
    }

    let p1 = hull[p1_idx];
    let p2 = hull[p2_idx];
    let angle = geometry::line_angle(Line::new(p1, p2));

    let bisector = Line::new(corner, (intersect.0.ceil(), intersect.1.ceil()));
    let length = (current_size.0 as f64 + current_size.1 as f64) * 2.0;

    Some(geometry::build_triangle(bisector, angle, length).to_polygon())
}

fn image_from_dynamic(img: image::DynamicImage) -> Image {
    use image::DynamicImage::*;
    match img {
        ImageLuma8(buf) => {
            let (w, h) = (buf.width() as u16, buf.height() as u16);
            Image::from_bytes(w, h, PixelDepth::L8, buf.into_raw())
        }
        ImageLumaA8(buf) => {
            let (w, h) = (buf.width() as u16, buf.height() as u16);
            Image::from_bytes(w, h, PixelDepth::La8, buf.into_raw())
        }
        ImageRgb8(buf) => {
            let (w, h) = (buf.width() as u16, buf.height() as u16);
            Image::from_bytes(w, h, PixelDepth::Rgb8, buf.into_raw())
        }
        ImageRgba8(buf) => {
            let (w, h) = (buf.width() as u16, buf.height() as u16);
            Image::from_bytes(w, h, PixelDepth::Rgba8, buf.into_raw())
        }
        other => {
            let buf = other.to_rgba8();
            let (w, h) = (buf.width() as u16, buf.height() as u16);
            Image::from_bytes(w, h, PixelDepth::Rgba8, buf.into_raw())
        }
    }
}
