//! Immutable packaging configuration, with clamping identical to the
//! original `limits.h`.

use std::sync::Arc;

/// Minimum/maximum atlas width and height, in pixels.
pub const MIN_TEXTURE_DIMENSION: u16 = 512;
pub const MAX_TEXTURE_DIMENSION: u16 = 8192;

/// Minimum/maximum item scale factor.
pub const MIN_SCALE_FACTOR: f32 = 0.25;
pub const MAX_SCALE_FACTOR: f32 = 10.0;

/// Minimum/maximum border extrusion, in pixels.
pub const MIN_EXTRUDE: u8 = 0;
pub const MAX_EXTRUDE: u8 = 10;

/// A progress callback invoked as the packer places items. The argument is
/// the running count of duplicates-seen plus items-placed so far.
pub type ProgressFn = Arc<dyn Fn(usize) + Send + Sync>;

/// Immutable generation settings shared by every call to
/// [`crate::Generator::generate`].
#[derive(Clone)]
pub struct Config {
    max_width: u16,
    max_height: u16,
    scale: f32,
    extrude: u8,
    parallel: bool,
    alpha_threshold: u8,
    progress: Option<ProgressFn>,
}

impl Config {
    /// Builds a `Config`, clamping `max_width`/`max_height` to
    /// `[512, 8192]`, `scale` to `[0.25, 10.0]` and `extrude` to `[0, 10]`.
    pub fn new(max_width: u16, max_height: u16, scale: f32, extrude: u8) -> Self {
        Self {
            max_width: max_width.clamp(MIN_TEXTURE_DIMENSION, MAX_TEXTURE_DIMENSION),
            max_height: max_height.clamp(MIN_TEXTURE_DIMENSION, MAX_TEXTURE_DIMENSION),
            scale: scale.clamp(MIN_SCALE_FACTOR, MAX_SCALE_FACTOR),
            extrude: extrude.clamp(MIN_EXTRUDE, MAX_EXTRUDE),
            parallel: false,
            alpha_threshold: 0,
            progress: None,
        }
    }

    #[inline]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[inline]
    pub fn with_alpha_threshold(mut self, alpha_threshold: u8) -> Self {
        self.alpha_threshold = alpha_threshold;
        self
    }

    #[inline]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    #[inline]
    pub fn max_width(&self) -> u16 {
        self.max_width
    }

    #[inline]
    pub fn max_height(&self) -> u16 {
        self.max_height
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[inline]
    pub fn extrude(&self) -> u8 {
        self.extrude
    }

    #[inline]
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    #[inline]
    pub fn alpha_threshold(&self) -> u8 {
        self.alpha_threshold
    }

    pub(crate) fn report_progress(&self, count: usize) {
        if let Some(progress) = &self.progress {
            progress(count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_are_clamped_to_bounds() {
        let config = Config::new(64, 100_000, 1.0, 0);
        assert_eq!(config.max_width(), MIN_TEXTURE_DIMENSION);
        assert_eq!(config.max_height(), MAX_TEXTURE_DIMENSION);
    }

    #[test]
    fn scale_and_extrude_are_clamped() {
        let config = Config::new(512, 512, 50.0, 255);
        assert_eq!(config.scale(), MAX_SCALE_FACTOR);
        assert_eq!(config.extrude(), MAX_EXTRUDE);
    }
}
