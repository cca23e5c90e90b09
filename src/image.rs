//! Typed pixel buffer. Row-major byte storage with a runtime pixel depth, so
//! items of different source formats can be grouped, cropped and hashed
//! uniformly without a generic type parameter.

use ahash::RandomState;
use std::hash::{BuildHasher, Hasher};

/// Supported per-pixel channel layouts, all 8-bit-per-channel (no support for
/// higher bit depths).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelDepth {
    L8,
    La8,
    Rgb8,
    Rgba8,
}

impl PixelDepth {
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            PixelDepth::L8 => 1,
            PixelDepth::La8 => 2,
            PixelDepth::Rgb8 => 3,
            PixelDepth::Rgba8 => 4,
        }
    }

    /// Index of the alpha channel within a pixel, if this depth carries one.
    #[inline]
    pub fn alpha_channel(self) -> Option<usize> {
        match self {
            PixelDepth::La8 => Some(1),
            PixelDepth::Rgba8 => Some(3),
            PixelDepth::L8 | PixelDepth::Rgb8 => None,
        }
    }

    /// A stable ordering key used to group items by depth for descending
    /// depth-group iteration, matching `Generator.cpp`'s
    /// `std::greater<int>`-ordered map. Rgba8 sorts first.
    #[inline]
    pub fn group_rank(self) -> u8 {
        match self {
            PixelDepth::Rgba8 => 3,
            PixelDepth::Rgb8 => 2,
            PixelDepth::La8 => 1,
            PixelDepth::L8 => 0,
        }
    }
}

/// A row-major pixel buffer of a single [`PixelDepth`].
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    width: u16,
    height: u16,
    depth: PixelDepth,
    bytes: Vec<u8>,
}

impl Image {
    /// Allocates a zeroed buffer. Dimensions are not validated here; use
    /// [`Image::is_valid`] at input boundaries.
    pub fn new(width: u16, height: u16, depth: PixelDepth) -> Self {
        let len = width as usize * height as usize * depth.channels();
        Self { width, height, depth, bytes: vec![0u8; len] }
    }

    /// Builds an image from caller-supplied bytes; panics if the length
    /// does not match `width * height * depth.channels()`.
    pub fn from_bytes(width: u16, height: u16, depth: PixelDepth, bytes: Vec<u8>) -> Self {
        assert_eq!(bytes.len(), width as usize * height as usize * depth.channels());
        Self { width, height, depth, bytes }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    pub fn depth(&self) -> PixelDepth {
        self.depth
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `w < 1 || h < 1` is invalid. All four [`PixelDepth`] variants are
    /// supported by construction, so only the dimension check remains
    /// meaningful here.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.width >= 1 && self.height >= 1
    }

    #[inline]
    fn pixel_offset(&self, x: u16, y: u16) -> usize {
        (y as usize * self.width as usize + x as usize) * self.depth.channels()
    }

    /// Reads the raw channel bytes of the pixel at `(x, y)`.
    #[inline]
    pub fn at(&self, x: u16, y: u16) -> &[u8] {
        let offset = self.pixel_offset(x, y);
        &self.bytes[offset..offset + self.depth.channels()]
    }

    /// Writes the raw channel bytes of the pixel at `(x, y)`.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, pixel: &[u8]) {
        let offset = self.pixel_offset(x, y);
        let channels = self.depth.channels();
        self.bytes[offset..offset + channels].copy_from_slice(&pixel[..channels]);
    }

    /// Extracts one channel as a standalone `L8` image.
    pub fn extract_channel(&self, channel: usize) -> Image {
        let mut out = Image::new(self.width, self.height, PixelDepth::L8);
        let channels = self.depth.channels();
        for y in 0..self.height {
            for x in 0..self.width {
                let value = self.at(x, y)[channel];
                out.set(x, y, &[value]);
            }
        }
        debug_assert!(channel < channels);
        out
    }

    /// Crops to an inclusive-min/exclusive-max rectangle, returning a new
    /// buffer (never a view).
    pub fn crop(&self, rect: CropRect) -> Image {
        let width = rect.width();
        let height = rect.height();
        let mut out = Image::new(width, height, self.depth);
        for y in 0..height {
            for x in 0..width {
                let src_x = rect.min_x + x;
                let src_y = rect.min_y + y;
                if src_x < self.width && src_y < self.height {
                    let pixel = self.at(src_x, src_y).to_vec();
                    out.set(x, y, &pixel);
                }
            }
        }
        out
    }

    /// The tight bounding rectangle of non-zero pixels. Intended for use on
    /// an `L8` alpha mask; returns `None` if every pixel is zero.
    pub fn bound(&self) -> Option<CropRect> {
        let mut min_x = self.width;
        let mut min_y = self.height;
        let mut max_x = 0u16;
        let mut max_y = 0u16;
        let mut found = false;

        for y in 0..self.height {
            for x in 0..self.width {
                if self.at(x, y).iter().any(|&b| b != 0) {
                    found = true;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }

        if !found {
            return None;
        }

        Some(CropRect { min_x, min_y, max_x: max_x + 1, max_y: max_y + 1 })
    }

    /// A deterministic, cross-process-stable content digest over depth,
    /// dimensions and raw bytes. Uses a fixed-seed `ahash` hasher rather
    /// than `std`'s randomly-seeded `DefaultHasher` so two processes
    /// packing the same sprites agree on duplicate detection.
    pub fn hash(&self) -> u64 {
        const BUILD: RandomState = RandomState::with_seeds(
            0x7369_6d70_6c69_6679,
            0x6174_6c61_735f_6861,
            0x7368_5f73_6565_6431,
            0x5f64_6574_6572_6d31,
        );
        let mut hasher = BUILD.build_hasher();
        hasher.write_u16(self.width);
        hasher.write_u16(self.height);
        hasher.write_u8(self.depth.channels() as u8);
        hasher.write(&self.bytes);
        hasher.finish()
    }

    /// Nearest-neighbor resize of `self` into a new buffer of `(width,
    /// height)`, or a straight copy when dimensions already match.
    pub fn resized(&self, width: u16, height: u16) -> Image {
        if width == self.width && height == self.height {
            return self.clone();
        }

        let mut out = Image::new(width, height, self.depth);
        for y in 0..height {
            for x in 0..width {
                let src_x = ((x as u32 * self.width as u32) / width.max(1) as u32) as u16;
                let src_y = ((y as u32 * self.height as u32) / height.max(1) as u32) as u16;
                let src_x = src_x.min(self.width.saturating_sub(1));
                let src_y = src_y.min(self.height.saturating_sub(1));
                let pixel = self.at(src_x, src_y).to_vec();
                out.set(x, y, &pixel);
            }
        }
        out
    }
}

/// An inclusive-min/exclusive-max crop rectangle in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub min_x: u16,
    pub min_y: u16,
    pub max_x: u16,
    pub max_y: u16,
}

impl CropRect {
    #[inline]
    pub fn width(&self) -> u16 {
        self.max_x.saturating_sub(self.min_x)
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.max_y.saturating_sub(self.min_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        let mut a = Image::new(2, 2, PixelDepth::L8);
        a.set(0, 0, &[200]);
        let mut b = a.clone();
        assert_eq!(a.hash(), b.hash());
        b.set(1, 1, &[5]);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn extract_alpha_channel_from_rgba() {
        let mut image = Image::new(1, 1, PixelDepth::Rgba8);
        image.set(0, 0, &[10, 20, 30, 200]);
        let alpha = image.extract_channel(3);
        assert_eq!(alpha.at(0, 0), &[200]);
    }

    #[test]
    fn bound_of_all_zero_mask_is_none() {
        let mask = Image::new(4, 4, PixelDepth::L8);
        assert!(mask.bound().is_none());
    }

    #[test]
    fn bound_is_tight_around_nonzero_pixels() {
        let mut mask = Image::new(4, 4, PixelDepth::L8);
        mask.set(1, 1, &[255]);
        mask.set(2, 2, &[255]);
        let bound = mask.bound().unwrap();
        assert_eq!((bound.min_x, bound.min_y, bound.max_x, bound.max_y), (1, 1, 3, 3));
    }

    #[test]
    fn crop_never_aliases_source() {
        let mut image = Image::new(4, 4, PixelDepth::L8);
        image.set(1, 1, &[7]);
        let cropped = image.crop(CropRect { min_x: 1, min_y: 1, max_x: 3, max_y: 3 });
        image.set(1, 1, &[9]);
        assert_eq!(cropped.at(0, 0), &[7]);
    }
}
