use std::f64::consts::FRAC_PI_2;

use sprite_atlas::{Config, Generator, Image, Item, PixelDepth};

fn filled(width: u16, height: u16, depth: PixelDepth, pixel: &[u8]) -> Image {
    let mut image = Image::new(width, height, depth);
    for y in 0..height {
        for x in 0..width {
            image.set(x, y, pixel);
        }
    }
    image
}

fn solid_circle(diameter: u16) -> Image {
    let mut image = Image::new(diameter, diameter, PixelDepth::Rgba8);
    let radius = diameter as f64 / 2.0;
    let center = radius - 0.5;
    for y in 0..diameter {
        for x in 0..diameter {
            let dx = x as f64 - center;
            let dy = y as f64 - center;
            if dx * dx + dy * dy <= radius * radius {
                image.set(x, y, &[200, 100, 50, 255]);
            }
        }
    }
    image
}

#[test]
fn single_rgba_circle_yields_a_compact_convex_polygon() {
    let config = Config::new(512, 512, 1.0, 2);
    let mut generator = Generator::new(config);
    let mut items = vec![Item::from_image(solid_circle(128), false)];

    let atlas_count = generator.generate(&mut items).unwrap();
    assert_eq!(atlas_count, 1);

    let item = &items[0];
    assert_eq!(item.texture_index(), 0);
    assert!((6..=12).contains(&item.vertices().len()), "got {} vertices", item.vertices().len());

    let allowed_rotations = [0.0, FRAC_PI_2, std::f64::consts::PI, 3.0 * FRAC_PI_2];
    assert!(allowed_rotations.iter().any(|&r| (item.transform().rotation - r).abs() < 1e-6));

    let atlas = generator.get_atlas(0);
    assert!(atlas.width() <= 130 && atlas.height() <= 130);
}

#[test]
fn identical_sprites_dedup_to_a_single_atlas_copy() {
    let config = Config::new(256, 256, 1.0, 1);
    let mut generator = Generator::new(config);
    let sprite = solid_circle(64);
    let mut items = vec![Item::from_image(sprite.clone(), false), Item::from_image(sprite, false)];

    let atlas_count = generator.generate(&mut items).unwrap();
    assert_eq!(atlas_count, 1);
    assert_eq!(items[0].texture_index(), items[1].texture_index());
    assert_eq!(items[0].transform(), items[1].transform());
    assert_eq!(items[0].vertices(), items[1].vertices());
}

#[test]
fn small_opaque_squares_use_rectangle_fallback_and_all_pack() {
    let config = Config::new(512, 512, 1.0, 0);
    let mut generator = Generator::new(config);
    let mut items: Vec<Item> = (0..4).map(|_| Item::from_image(filled(10, 10, PixelDepth::Rgba8, &[1, 2, 3, 255]), false)).collect();

    let atlas_count = generator.generate(&mut items).unwrap();
    assert!(atlas_count >= 1);

    for item in &items {
        assert_eq!(item.vertices().len(), 4);
        assert!(item.texture_index() < atlas_count);
    }

    let atlas = generator.get_atlas(0);
    assert!(atlas.width() as u32 <= 512 && atlas.height() as u32 <= 512);
}

#[test]
fn rgba_and_la8_sprites_land_in_separate_depth_homogeneous_atlases() {
    let config = Config::new(256, 256, 1.0, 1);
    let mut generator = Generator::new(config);
    let mut items = vec![
        Item::from_image(filled(32, 32, PixelDepth::Rgba8, &[255, 255, 255, 255]), false),
        Item::from_image(filled(32, 32, PixelDepth::La8, &[255, 255]), false),
    ];

    generator.generate(&mut items).unwrap();

    let rgba_atlas = generator.get_atlas(items[0].texture_index());
    let la_atlas = generator.get_atlas(items[1].texture_index());
    assert_eq!(rgba_atlas.depth(), PixelDepth::Rgba8);
    assert_eq!(la_atlas.depth(), PixelDepth::La8);
}

#[test]
fn oversized_sprite_is_rejected_before_packing() {
    let config = Config::new(4096, 4096, 1.0, 0);
    let mut generator = Generator::new(config);
    let mut items = vec![Item::from_image(filled(5000, 5000, PixelDepth::Rgba8, &[255, 255, 255, 255]), false)];

    let err = generator.generate(&mut items).unwrap_err();
    assert!(matches!(err, sprite_atlas::Error::TooBigImage(0)));
}

#[test]
fn colorfill_item_packs_as_a_one_pixel_rectangle() {
    let config = Config::new(512, 512, 1.0, 0);
    let mut generator = Generator::new(config);
    let mut items = vec![Item::from_color([10, 20, 30, 255])];

    generator.generate(&mut items).unwrap();
    assert_eq!(items[0].vertices().len(), 4);
    assert!(items[0].is_rectangle());
}
