//! Atlas synthesis: border extrusion, fixed-quadrant rotation and
//! alpha-gated blitting.

use crate::image::Image;
use crate::packer::Rotation;

/// Replicates `image`'s border pixels outward by `extrude` on every side,
/// returning a new, larger buffer of the same depth. The placement origin
/// shifts by `-extrude` to compensate, which callers apply via
/// `placement_origin`.
pub fn extrude_source(image: &Image, extrude: u16) -> Image {
    if extrude == 0 {
        return image.clone();
    }

    let (w, h) = (image.width(), image.height());
    let mut out = Image::new(w + 2 * extrude, h + 2 * extrude, image.depth());

    for y in 0..out.height() {
        for x in 0..out.width() {
            let src_x = (x as i32 - extrude as i32).clamp(0, w as i32 - 1) as u16;
            let src_y = (y as i32 - extrude as i32).clamp(0, h as i32 - 1) as u16;
            let pixel = image.at(src_x, src_y).to_vec();
            out.set(x, y, &pixel);
        }
    }

    out
}

/// The placement-origin correction an extruded source needs: `-extrude` on
/// both axes.
#[inline]
pub fn placement_origin(translation: (i32, i32), extrude: u16) -> (i32, i32) {
    (translation.0 - extrude as i32, translation.1 - extrude as i32)
}

/// Blits `extruded` into `atlas` at `origin`, applying `rotation` by
/// remapping each destination pixel back to its source-local coordinate
/// (one of four fixed quadrant cases), and skipping pixels whose alpha falls
/// below `alpha_threshold` so the atlas's zero-initial background shows
/// through. `extruded` and `atlas` must share the same [`PixelDepth`].
pub fn blit_rotated(atlas: &mut Image, extruded: &Image, rotation: Rotation, origin: (i32, i32), alpha_threshold: u8) {
    let (src_w, src_h) = (extruded.width(), extruded.height());
    let alpha_channel = extruded.depth().alpha_channel();

    let (dst_w, dst_h) = match rotation {
        Rotation::Deg0 | Rotation::Deg180 => (src_w, src_h),
        Rotation::Deg90 | Rotation::Deg270 => (src_h, src_w),
    };

    for h in 0..dst_h {
        for w in 0..dst_w {
            let (sw, sh) = match rotation {
                Rotation::Deg0 => (w, h),
                Rotation::Deg90 => (src_h - 1 - h, w),
                Rotation::Deg180 => (src_w - 1 - w, src_h - 1 - h),
                Rotation::Deg270 => (h, src_w - 1 - w),
            };

            let dest_x = origin.0 + w as i32;
            let dest_y = origin.1 + h as i32;
            if dest_x < 0 || dest_y < 0 || dest_x >= atlas.width() as i32 || dest_y >= atlas.height() as i32 {
                continue;
            }

            let pixel = extruded.at(sw, sh);
            let alpha = alpha_channel.map(|c| pixel[c]).unwrap_or(255);
            if alpha < alpha_threshold {
                continue;
            }

            atlas.set(dest_x as u16, dest_y as u16, pixel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelDepth;

    #[test]
    fn extrude_replicates_border_pixels() {
        let mut image = Image::new(2, 2, PixelDepth::L8);
        image.set(0, 0, &[10]);
        image.set(1, 0, &[20]);
        image.set(0, 1, &[30]);
        image.set(1, 1, &[40]);

        let extruded = extrude_source(&image, 1);
        assert_eq!(extruded.width(), 4);
        assert_eq!(extruded.height(), 4);
        assert_eq!(extruded.at(0, 0), &[10]);
        assert_eq!(extruded.at(3, 3), &[40]);
        assert_eq!(extruded.at(1, 0), &[10]);
    }

    #[test]
    fn blit_identity_rotation_copies_pixels() {
        let mut source = Image::new(2, 2, PixelDepth::Rgba8);
        source.set(0, 0, &[1, 2, 3, 255]);
        source.set(1, 0, &[4, 5, 6, 255]);
        source.set(0, 1, &[7, 8, 9, 255]);
        source.set(1, 1, &[10, 11, 12, 255]);

        let mut atlas = Image::new(4, 4, PixelDepth::Rgba8);
        blit_rotated(&mut atlas, &source, Rotation::Deg0, (1, 1), 0);

        assert_eq!(atlas.at(1, 1), &[1, 2, 3, 255]);
        assert_eq!(atlas.at(2, 2), &[10, 11, 12, 255]);
    }

    #[test]
    fn blit_90_degrees_swaps_dimensions() {
        let mut source = Image::new(2, 1, PixelDepth::Rgba8);
        source.set(0, 0, &[1, 0, 0, 255]);
        source.set(1, 0, &[0, 1, 0, 255]);

        let mut atlas = Image::new(4, 4, PixelDepth::Rgba8);
        blit_rotated(&mut atlas, &source, Rotation::Deg90, (0, 0), 0);

        assert_eq!(atlas.at(0, 0), &[0, 1, 0, 255]);
        assert_eq!(atlas.at(0, 1), &[1, 0, 0, 255]);
    }

    #[test]
    fn sub_threshold_alpha_leaves_background() {
        let mut source = Image::new(1, 1, PixelDepth::Rgba8);
        source.set(0, 0, &[255, 255, 255, 10]);

        let mut atlas = Image::new(2, 2, PixelDepth::Rgba8);
        blit_rotated(&mut atlas, &source, Rotation::Deg0, (0, 0), 128);

        assert_eq!(atlas.at(0, 0), &[0, 0, 0, 0]);
    }
}
