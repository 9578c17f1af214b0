use anyhow::Result;
use log::info;

use crate::cli::{DotsArgs, RenderArgs, SupplementArgs};
use crate::dots::{CsvStream, SamplerConfig, label_all};
use crate::io::{features::read_features, table::write_dot_table};
use crate::render::{RenderOptions, render_dots};
use crate::supplement::supplement_shapefile;

pub fn dots(args: &DotsArgs) -> Result<()> {
    info!("reading features from {}", args.shapefile.display());
    let features = read_features(&args.shapefile)?;
    info!("got {} features", features.len());

    let config = SamplerConfig { max_draws_per_point: args.max_draws_per_point };
    let stream = label_all(features, args.seed, config);
    let mut rows = CsvStream::new(stream, args.chunk_size);

    info!("writing points to {}", args.output.display());
    let total = write_dot_table(&args.output, &mut rows, args.chunk_size)?;
    info!("wrote {total} points");
    Ok(())
}

pub fn supplement(args: &SupplementArgs) -> Result<()> {
    supplement_shapefile(
        &args.shapefile,
        &args.data,
        &args.column_map,
        &args.output,
        &args.join_key,
    )
}

pub fn render(args: &RenderArgs) -> Result<()> {
    render_dots(&args.input, &args.output, &RenderOptions { width: args.width })
}
