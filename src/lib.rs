//! Packs a batch of raster sprites into a small number of texture atlases,
//! computing a tight polygonal outline for each sprite so a renderer can
//! draw it as a textured convex polygon instead of a full rectangle.
//!
//! The pipeline: decode each sprite into an [`Item`], run
//! [`Generator::generate`] to extract each item's polygon (component C),
//! pack the polygons into atlas-sized bins (component D), and blit the
//! source pixels into the resulting [`Image`] buffers with border
//! extrusion (component E).
//!
//! ```no_run
//! use sprite_atlas::{Config, Generator, Item};
//!
//! let config = Config::new(1024, 1024, 1.0, 2);
//! let mut generator = Generator::new(config);
//! let mut items = vec![Item::from_path("sprite.png", false).unwrap()];
//! let atlas_count = generator.generate(&mut items).unwrap();
//! for i in 0..atlas_count {
//!     let _atlas = generator.get_atlas(i);
//! }
//! ```

pub mod atlas;
pub mod config;
pub mod error;
pub mod generator;
pub mod geometry;
pub mod image;
pub mod item;
pub mod packer;

pub use config::Config;
pub use error::Error;
pub use generator::Generator;
pub use image::{Image, PixelDepth};
pub use item::{Item, Status, Transformation, UvBounds, Vertex, XyBounds};
pub use packer::Rotation;
