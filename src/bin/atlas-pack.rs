//! `atlas-pack <out_dir> [--force] [--debug] [--item-debug] <path>...`
//!
//! Packs one or more PNG sprites (or directories of them) into texture
//! atlases, writing `atlas_<i>.png` and an `atlas.txt` placement manifest
//! into `out_dir`. A sibling `<file>_guide.txt` (four newline-separated
//! floats: left, top, right, bottom) marks a sprite as sliced. Reproduces
//! `cli/main.cpp`'s argument shape; `--debug`/`--item-debug` dump PNG
//! overlays instead of popping interactive windows, since this crate has no
//! GUI dependency.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use sprite_atlas::{Config, Error, Generator, Image, Item, PixelDepth};

#[derive(Parser)]
#[command(name = "atlas-pack", about = "Packs sprites into texture atlases")]
struct Cli {
    /// Output folder; created if missing.
    output: PathBuf,

    /// Rewrite the output folder even if it already exists.
    #[arg(long)]
    force: bool,

    /// Dump a PNG overlay of each atlas's packed polygons.
    #[arg(long)]
    debug: bool,

    /// Dump a PNG overlay of each item's own polygon.
    #[arg(long = "item-debug")]
    item_debug: bool,

    /// Image files or directories of image files.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    prepare_output(&cli.output, cli.force)?;

    let files = expand_paths(&cli.paths).map_err(|e| e.to_string())?;

    let mut paths: Vec<PathBuf> = Vec::new();
    let mut items: Vec<Item> = Vec::new();

    for path in &files {
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }

        let guide_path =
            path.with_file_name(format!("{}_guide.txt", path.file_stem().and_then(|s| s.to_str()).unwrap_or_default()));

        let sliced = if guide_path.exists() {
            match fs::read_to_string(&guide_path) {
                Ok(contents) => {
                    let floats: Vec<f32> = contents.lines().filter_map(|l| l.trim().parse().ok()).collect();
                    if floats.len() != 4 {
                        log::warn!("malformed guide file {}, skipping {}", guide_path.display(), path.display());
                        continue;
                    }
                    true
                }
                Err(e) => {
                    log::warn!("could not read guide file {}: {e}", guide_path.display());
                    continue;
                }
            }
        } else {
            false
        };

        let item = Item::from_path(path, sliced).map_err(|e| format!("{}: {e}", path.display()))?;
        paths.push(path.clone());
        items.push(item);
    }

    let progress_total = items.len();
    let config = Config::new(4096, 4096, 1.0, 2).with_parallel(true).with_progress(Arc::new(move |count| {
        log::info!("{count} / {progress_total}");
    }));
    let scale = config.scale();

    let mut generator = Generator::new(config);
    let atlas_count = generator.generate(&mut items).map_err(|error| describe_error(&error, &paths))?;

    for i in 0..atlas_count {
        let destination = cli.output.join(format!("atlas_{i}.png"));
        to_dynamic_image(generator.get_atlas(i))
            .save(&destination)
            .map_err(|e| format!("writing {}: {e}", destination.display()))?;
    }

    write_manifest(&cli.output.join("atlas.txt"), &paths, &items, scale).map_err(|e| e.to_string())?;

    if cli.debug {
        dump_atlas_debug(&cli.output, &generator, &items, atlas_count).map_err(|e| e.to_string())?;
    }
    if cli.item_debug {
        dump_item_debug(&cli.output, &items).map_err(|e| e.to_string())?;
    }

    Ok(())
}

fn prepare_output(output: &Path, force: bool) -> Result<(), String> {
    if output.exists() {
        if force {
            fs::remove_dir_all(output).map_err(|e| e.to_string())?;
        } else {
            return Err(format!("output folder {} already exists", output.display()));
        }
    }
    fs::create_dir_all(output).map_err(|e| e.to_string())
}

fn expand_paths(paths: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in fs::read_dir(path)? {
                files.push(entry?.path());
            }
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn describe_error(error: &Error, paths: &[PathBuf]) -> String {
    match error {
        Error::Unknown => "packing failed for an unknown reason".to_string(),
        Error::TooBigImage(i) => format!("item {} is too big for packaging", describe_index(*i, paths)),
        Error::UnsupportedImage(i) => format!("item {} has an unsupported image type", describe_index(*i, paths)),
        Error::InvalidPolygon(i) => format!("failed to generate a polygon for item {}", describe_index(*i, paths)),
    }
}

fn describe_index(index: usize, paths: &[PathBuf]) -> String {
    paths.get(index).map(|p| p.display().to_string()).unwrap_or_else(|| index.to_string())
}

fn write_manifest(path: &Path, paths: &[PathBuf], items: &[Item], scale: f32) -> std::io::Result<()> {
    use std::fmt::Write as _;

    let mut out = String::new();
    for (path_entry, item) in paths.iter().zip(items) {
        writeln!(out, "path={path_entry:?}").unwrap();
        writeln!(out, "textureIndex={}", item.texture_index()).unwrap();

        write!(out, "uv=").unwrap();
        for vertex in item.vertices() {
            let (ux, uy) = item.transform().apply((vertex.uv.0 as i32, vertex.uv.1 as i32));
            write!(out, "[{},{}]", ux as f32 / scale, uy as f32 / scale).unwrap();
        }
        writeln!(out).unwrap();

        write!(out, "xy=").unwrap();
        for vertex in item.vertices() {
            write!(out, "[{},{}]", vertex.xy.0, vertex.xy.1).unwrap();
        }
        writeln!(out).unwrap();
        writeln!(out).unwrap();
    }

    fs::write(path, out)
}

fn to_dynamic_image(image: &Image) -> image::DynamicImage {
    let (w, h) = (image.width() as u32, image.height() as u32);
    let bytes = image.bytes().to_vec();
    match image.depth() {
        PixelDepth::L8 => image::DynamicImage::ImageLuma8(image::GrayImage::from_raw(w, h, bytes).unwrap()),
        PixelDepth::La8 => image::DynamicImage::ImageLumaA8(image::GrayAlphaImage::from_raw(w, h, bytes).unwrap()),
        PixelDepth::Rgb8 => image::DynamicImage::ImageRgb8(image::RgbImage::from_raw(w, h, bytes).unwrap()),
        PixelDepth::Rgba8 => image::DynamicImage::ImageRgba8(image::RgbaImage::from_raw(w, h, bytes).unwrap()),
    }
}

fn dump_atlas_debug(output: &Path, generator: &Generator, items: &[Item], atlas_count: usize) -> std::io::Result<()> {
    let mut sheets: Vec<image::RgbaImage> =
        (0..atlas_count).map(|i| to_dynamic_image(generator.get_atlas(i)).to_rgba8()).collect();

    for (slot, item) in items.iter().enumerate() {
        let points: Vec<(i32, i32)> =
            item.vertices().iter().map(|v| item.transform().apply((v.uv.0 as i32, v.uv.1 as i32))).collect();
        let color = debug_color(slot);
        if let Some(sheet) = sheets.get_mut(item.texture_index()) {
            draw_polygon_outline(sheet, &points, color);
        }
    }

    for (i, sheet) in sheets.iter().enumerate() {
        let destination = output.join(format!("debug_atlas_{i}.png"));
        sheet.save(&destination).map_err(|e| std::io::Error::other(e.to_string()))?;
    }
    Ok(())
}

fn dump_item_debug(output: &Path, items: &[Item]) -> std::io::Result<()> {
    for (i, item) in items.iter().enumerate() {
        let mut canvas = to_dynamic_image(item.image()).to_rgba8();
        let points: Vec<(i32, i32)> = item.vertices().iter().map(|v| v.xy).collect();
        draw_polygon_outline(&mut canvas, &points, debug_color(i));

        let destination = output.join(format!("debug_item_{i}.png"));
        canvas.save(&destination).map_err(|e| std::io::Error::other(e.to_string()))?;
    }
    Ok(())
}

fn debug_color(seed: usize) -> image::Rgba<u8> {
    let palette = [[255, 80, 80], [80, 255, 80], [80, 80, 255], [255, 255, 80], [255, 80, 255], [80, 255, 255]];
    let [r, g, b] = palette[seed % palette.len()];
    image::Rgba([r, g, b, 255])
}

fn draw_polygon_outline(image: &mut image::RgbaImage, points: &[(i32, i32)], color: image::Rgba<u8>) {
    let n = points.len();
    if n < 2 {
        return;
    }
    for i in 0..n {
        draw_line(image, points[i], points[(i + 1) % n], color);
    }
}

fn draw_line(image: &mut image::RgbaImage, a: (i32, i32), b: (i32, i32), color: image::Rgba<u8>) {
    let steps = (b.0 - a.0).abs().max((b.1 - a.1).abs()).max(1);
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = (a.0 as f32 + (b.0 - a.0) as f32 * t).round() as i32;
        let y = (a.1 as f32 + (b.1 - a.1) as f32 * t).round() as i32;
        if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}
