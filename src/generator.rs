//! Orchestrates one `generate` call: validate, dedup, extract polygons,
//! pack and blit, grouping items by pixel depth so each atlas ends up
//! homogeneous.

use crate::atlas;
use crate::config::Config;
use crate::error::Error;
use crate::image::Image;
use crate::item::{Item, Transformation};
use crate::packer;

/// Runs the packaging pipeline and owns the resulting atlas buffers.
pub struct Generator {
    config: Config,
    atlases: Vec<Image>,
}

impl Generator {
    pub fn new(config: Config) -> Self {
        Self { config, atlases: Vec::new() }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn atlas_count(&self) -> usize {
        self.atlases.len()
    }

    #[inline]
    pub fn get_atlas(&self, index: usize) -> &Image {
        &self.atlases[index]
    }

    /// Packs every item in `items`, mutating each with its final
    /// `texture_index`, `vertices` and `transform`. Returns the number of
    /// atlases produced. Duplicate entries in `items` end up sharing a
    /// `texture_index`/`transform`/`vertices` with their source, per
    /// `Item`'s content-hash equality rule.
    pub fn generate(&mut self, items: &mut [Item]) -> Result<usize, Error> {
        self.atlases.clear();
        if items.is_empty() {
            return Ok(0);
        }

        for (i, item) in items.iter().enumerate() {
            if !item.image().is_valid() {
                return Err(Error::UnsupportedImage(i));
            }
        }

        // Groups are visited in descending pixel-depth rank order, matching
        // `Generator.cpp`'s `std::map<int, ..., std::greater<int>>`.
        let mut indices: Vec<usize> = (0..items.len()).collect();
        indices.sort_by_key(|&i| std::cmp::Reverse(items[i].image().depth().group_rank()));

        let mut duplicates_seen = 0usize;
        let mut items_placed = 0usize;

        let mut group_start = 0;
        while group_start < indices.len() {
            let rank = items[indices[group_start]].image().depth().group_rank();
            let mut group_end = group_start;
            while group_end < indices.len() && items[indices[group_end]].image().depth().group_rank() == rank {
                group_end += 1;
            }

            let mut group: Vec<usize> = indices[group_start..group_end].to_vec();
            group.sort_unstable();

            log::debug!("processing depth group (rank {rank}) with {} items", group.len());
            self.process_group(items, &group, &mut duplicates_seen, &mut items_placed)?;

            group_start = group_end;
        }

        Ok(self.atlases.len())
    }

    fn process_group(
        &mut self,
        items: &mut [Item],
        group: &[usize],
        duplicates_seen: &mut usize,
        items_placed: &mut usize,
    ) -> Result<(), Error> {
        let (working, duplicates) = dedup_pass(items, group);
        *duplicates_seen += duplicates.len();

        run_polygon_pass(&mut collect_working_refs(items, &working), &self.config);

        for &w in &working {
            if items[w].vertices().is_empty() {
                return Err(Error::InvalidPolygon(w));
            }
            if items[w].width() > self.config.max_width() || items[w].height() > self.config.max_height() {
                return Err(Error::TooBigImage(w));
            }
        }

        let packer_items: Vec<packer::PackerItem> = working
            .iter()
            .map(|&w| packer::PackerItem {
                id: w,
                polygon: items[w].vertices().iter().map(|v| (v.uv.0 as f64, v.uv.1 as f64)).collect(),
            })
            .collect();

        let accuracy: f32 = if cfg!(debug_assertions) { 1.0 } else { 0.6 };
        let spacing = 2 * self.config.extrude() as u16;

        let config = &self.config;
        let (placements, bin_count) = packer::pack(
            &packer_items,
            config.max_width(),
            config.max_height(),
            spacing,
            accuracy,
            || {
                *items_placed += 1;
                config.report_progress(*duplicates_seen + *items_placed);
            },
        )
        .ok_or(Error::Unknown)?;

        let bin_sizes = packer::bin_sizes(
            &packer_items,
            &placements,
            bin_count,
            self.config.extrude() as u16,
            self.config.max_width(),
            self.config.max_height(),
        );

        let depth = items[working[0]].image().depth();
        let atlas_base = self.atlases.len();
        for (w, h) in bin_sizes {
            self.atlases.push(Image::new(w, h, depth));
        }

        let extrude = self.config.extrude() as u16;
        let alpha_threshold = self.config.alpha_threshold();

        for (&w, placement) in working.iter().zip(&placements) {
            let atlas_index = atlas_base + placement.bin_id;
            items[w].texture_index = atlas_index;
            items[w].set_transform(Transformation {
                rotation: placement.rotation.radians(),
                translation: placement.translation,
            });

            let extruded = atlas::extrude_source(items[w].image(), extrude);
            let origin = atlas::placement_origin(placement.translation, extrude);
            atlas::blit_rotated(&mut self.atlases[atlas_index], &extruded, placement.rotation, origin, alpha_threshold);
        }

        for (dup, source) in duplicates {
            let (dup_item, source_item) = borrow_two_mut(items, dup, source);
            dup_item.adopt_from(source_item);
        }

        Ok(())
    }
}

/// Linearly searches the growing working list for an equal item, recording
/// `(duplicate_index, source_index)` pairs.
fn dedup_pass(items: &[Item], group: &[usize]) -> (Vec<usize>, Vec<(usize, usize)>) {
    let mut working = Vec::with_capacity(group.len());
    let mut duplicates = Vec::new();

    for &i in group {
        let found = working.iter().copied().find(|&w| items[i] == items[w]);
        match found {
            Some(w) => duplicates.push((i, w)),
            None => working.push(i),
        }
    }

    (working, duplicates)
}

fn collect_working_refs<'a>(items: &'a mut [Item], working: &[usize]) -> Vec<&'a mut Item> {
    let mut refs = Vec::with_capacity(working.len());
    let mut wi = 0;
    for (i, item) in items.iter_mut().enumerate() {
        if wi < working.len() && working[wi] == i {
            refs.push(item);
            wi += 1;
        }
    }
    refs
}

#[cfg(feature = "parallel")]
fn run_polygon_pass(items: &mut [&mut Item], config: &Config) {
    if config.parallel() {
        use rayon::prelude::*;
        items.par_iter_mut().for_each(|item| item.generate_image_polygon(config));
    } else {
        items.iter_mut().for_each(|item| item.generate_image_polygon(config));
    }
}

#[cfg(not(feature = "parallel"))]
fn run_polygon_pass(items: &mut [&mut Item], config: &Config) {
    items.iter_mut().for_each(|item| item.generate_image_polygon(config));
}

fn borrow_two_mut(items: &mut [Item], a: usize, b: usize) -> (&mut Item, &mut Item) {
    assert_ne!(a, b);
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelDepth;

    fn opaque_image(size: u16, depth: PixelDepth) -> Image {
        let mut image = Image::new(size, size, depth);
        let pixel = match depth {
            PixelDepth::L8 => vec![255],
            PixelDepth::La8 => vec![255, 255],
            PixelDepth::Rgb8 => vec![255, 255, 255],
            PixelDepth::Rgba8 => vec![255, 255, 255, 255],
        };
        for y in 0..size {
            for x in 0..size {
                image.set(x, y, &pixel);
            }
        }
        image
    }

    fn default_config() -> Config {
        Config::new(256, 256, 1.0, 1)
    }

    #[test]
    fn empty_input_produces_zero_atlases() {
        let mut generator = Generator::new(default_config());
        let mut items: Vec<Item> = Vec::new();
        assert_eq!(generator.generate(&mut items).unwrap(), 0);
    }

    #[test]
    fn single_item_produces_one_atlas_and_a_placed_transform() {
        let mut generator = Generator::new(default_config());
        let mut items = vec![Item::from_image(opaque_image(10, PixelDepth::Rgba8), false)];
        let count = generator.generate(&mut items).unwrap();
        assert_eq!(count, 1);
        assert_eq!(items[0].texture_index(), 0);
        assert!(!items[0].vertices().is_empty());
    }

    #[test]
    fn duplicate_items_share_texture_index_and_transform() {
        let mut generator = Generator::new(default_config());
        let mut items = vec![
            Item::from_image(opaque_image(10, PixelDepth::Rgba8), false),
            Item::from_image(opaque_image(10, PixelDepth::Rgba8), false),
        ];
        generator.generate(&mut items).unwrap();
        assert_eq!(items[0].texture_index(), items[1].texture_index());
        assert_eq!(items[0].transform(), items[1].transform());
        assert_eq!(items[0].vertices().len(), items[1].vertices().len());
    }

    #[test]
    fn groups_visited_in_descending_depth_order() {
        // An Rgb8 item (rank 2) placed before an Rgba8 item (rank 3) in
        // input order must still end up in an atlas whose depth is Rgba8,
        // proving the Rgba8 group is processed (and its atlas opened)
        // first.
        let mut generator = Generator::new(default_config());
        let mut items = vec![
            Item::from_image(opaque_image(10, PixelDepth::Rgb8), false),
            Item::from_image(opaque_image(10, PixelDepth::Rgba8), false),
        ];
        generator.generate(&mut items).unwrap();

        let rgba_atlas = generator.get_atlas(items[1].texture_index());
        assert_eq!(rgba_atlas.depth(), PixelDepth::Rgba8);
        assert_eq!(items[1].texture_index(), 0);
    }

    #[test]
    fn unsupported_image_is_rejected() {
        let mut generator = Generator::new(default_config());
        let mut items = vec![Item::from_image(Image::new(0, 0, PixelDepth::Rgba8), false)];
        // width/height 0 makes this image invalid per `Image::is_valid`.
        let err = generator.generate(&mut items).unwrap_err();
        assert!(matches!(err, Error::UnsupportedImage(0)));
    }

    #[test]
    fn oversized_item_is_rejected() {
        let config = Config::new(512, 512, 1.0, 0);
        let mut generator = Generator::new(config);
        let mut items = vec![Item::from_image(opaque_image(2000, PixelDepth::Rgba8), false)];
        let err = generator.generate(&mut items).unwrap_err();
        assert!(matches!(err, Error::TooBigImage(0)));
    }
}
