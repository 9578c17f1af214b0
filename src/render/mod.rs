//! Rasterize a dot table into a color-coded PNG: bin dots on a canvas,
//! shade pixel intensity by histogram equalization of the per-pixel counts,
//! and blend dot colors under the category color key.

mod color;

use std::{collections::BTreeMap, fs::File, path::Path};

use anyhow::{Context, Result, ensure};
use image::{Rgb, RgbImage};
use log::info;
use polars::{io::SerReader, prelude::ParquetReader};

use crate::dots::Category;
pub use color::{BACKGROUND, color_for};

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Canvas width in pixels; height follows the data's aspect ratio.
    pub width: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { width: 2000 }
    }
}

/// Per-pixel accumulator: dot count plus summed color channels.
#[derive(Clone, Copy, Default)]
struct Bin {
    count: u64,
    r: u64,
    g: u64,
    b: u64,
}

/// Read the dot table at `input` and write a shaded PNG to `output`.
pub fn render_dots(input: &Path, output: &Path, options: &RenderOptions) -> Result<()> {
    info!("reading dots from {}", input.display());
    let file = File::open(input)
        .with_context(|| format!("Failed to open dot table: {}", input.display()))?;
    let df = ParquetReader::new(file)
        .finish()
        .with_context(|| format!("Failed to read dot table from {}", input.display()))?;

    let xs: Vec<f64> = df.column("x")?.f64()?.into_no_null_iter().collect();
    let ys: Vec<f64> = df.column("y")?.f64()?.into_no_null_iter().collect();
    let categories = df.column("category")?.str()?;
    ensure!(!xs.is_empty(), "dot table is empty, nothing to render");
    info!("read {} dots", xs.len());

    info!("creating image");
    let (x_min, x_max) = min_max(&xs);
    let (y_min, y_max) = min_max(&ys);
    ensure!(x_max > x_min && y_max > y_min, "dots have zero spatial extent");

    let width = options.width;
    let ratio = (y_max - y_min) / (x_max - x_min);
    let height = ((width as f64 * ratio) as u32).max(1);

    let mut bins = vec![Bin::default(); (width as usize) * (height as usize)];
    for ((&x, &y), category) in xs.iter().zip(&ys).zip(categories) {
        let category = Category::from_key(category.unwrap_or_default())?;
        let [r, g, b] = color_for(category);
        let col = bin_index(x, x_min, x_max, width);
        // Raster rows grow downward; northing grows upward.
        let row = height - 1 - bin_index(y, y_min, y_max, height);
        let bin = &mut bins[(row as usize) * (width as usize) + (col as usize)];
        bin.count += 1;
        bin.r += r as u64;
        bin.g += g as u64;
        bin.b += b as u64;
    }

    let shade = equalize(bins.iter().map(|bin| bin.count));
    let image = RgbImage::from_fn(width, height, |x, y| {
        let bin = &bins[(y as usize) * (width as usize) + (x as usize)];
        if bin.count == 0 {
            return Rgb(BACKGROUND);
        }
        let level = shade.get(&bin.count).copied().unwrap_or(1.0);
        let channel = |sum: u64| ((sum as f64 / bin.count as f64) * level).round() as u8;
        Rgb([channel(bin.r), channel(bin.g), channel(bin.b)])
    });
    info!("created {}x{} image", width, height);

    info!("saving image to {}", output.display());
    image
        .save(output)
        .with_context(|| format!("Failed to save image: {}", output.display()))?;
    info!("saved image");
    Ok(())
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}

/// Map a coordinate to a pixel index along one axis.
fn bin_index(value: f64, lo: f64, hi: f64, cells: u32) -> u32 {
    let frac = (value - lo) / (hi - lo);
    ((frac * cells as f64) as u32).min(cells - 1)
}

/// Histogram equalization of the nonzero per-pixel counts: each distinct
/// count maps to its cumulative frequency in (0, 1], spreading intensity
/// evenly across the range actually present.
fn equalize(counts: impl Iterator<Item = u64>) -> BTreeMap<u64, f64> {
    let mut freq: BTreeMap<u64, u64> = BTreeMap::new();
    for count in counts.filter(|&c| c > 0) {
        *freq.entry(count).or_insert(0) += 1;
    }
    let total: u64 = freq.values().sum();
    let mut cumulative = 0u64;
    freq.into_iter()
        .map(|(count, f)| {
            cumulative += f;
            (count, cumulative as f64 / total as f64)
        })
        .collect()
}
