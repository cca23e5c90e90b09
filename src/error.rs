//! Packaging error type. Hand-rolled `Display`/`Error`, matching
//! `PackagingException.h`'s error kinds rather than introducing a
//! derive-macro error crate.

use std::fmt;

/// An error raised by [`crate::Generator::generate`]. Each variant that can
/// be attributed to one input item carries its 0-based index into the
/// caller's slice.
#[derive(Debug)]
pub enum Error {
    /// The packer could not place every item into a bin.
    Unknown,
    /// An item's post-preprocess dimensions exceed `Config`'s limits.
    TooBigImage(usize),
    /// An item's image has an unsupported pixel depth or a zero dimension.
    UnsupportedImage(usize),
    /// Polygon generation produced zero vertices, or a caller-supplied
    /// custom polygon failed the convexity check.
    InvalidPolygon(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unknown => write!(f, "packing failed for an unknown reason"),
            Error::TooBigImage(i) => write!(f, "item {i} is too big for packaging"),
            Error::UnsupportedImage(i) => write!(f, "item {i} has an unsupported image type"),
            Error::InvalidPolygon(i) => write!(f, "failed to generate a polygon for item {i}"),
        }
    }
}

impl std::error::Error for Error {}
