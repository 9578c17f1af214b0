use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

/// Dot-density mapping CLI (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "dotdensity", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sample one labeled dot per person into a Parquet table
    Dots(DotsArgs),

    /// Join tabular attributes onto a shapefile
    Supplement(SupplementArgs),

    /// Rasterize a dot table into a PNG
    Render(RenderArgs),
}

#[derive(Args, Debug)]
pub struct DotsArgs {
    /// Input polygon shapefile with per-category population counts
    #[arg(value_hint = ValueHint::FilePath)]
    pub shapefile: PathBuf,

    /// Output Parquet dot table
    #[arg(value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// RNG seed for reproducible output (random otherwise)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Records per chunk in the streaming buffer and output row groups
    #[arg(long, default_value_t = 10_000)]
    pub chunk_size: usize,

    /// Candidate-draw budget per requested point before a feature stalls
    #[arg(long, default_value_t = 10_000)]
    pub max_draws_per_point: u64,
}

#[derive(Args, Debug)]
pub struct SupplementArgs {
    /// Input polygon shapefile
    #[arg(value_hint = ValueHint::FilePath)]
    pub shapefile: PathBuf,

    /// Delimited attribute file (header row + one descriptor row)
    #[arg(value_hint = ValueHint::FilePath)]
    pub data: PathBuf,

    /// Column-map config: lines of source_column,target_name,target_type
    #[arg(value_hint = ValueHint::FilePath)]
    pub column_map: PathBuf,

    /// Output shapefile with the supplemented attribute table
    #[arg(value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Attribute column joining the data file to the features
    #[arg(long, default_value = "GISJOIN")]
    pub join_key: String,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Input Parquet dot table
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output PNG path
    #[arg(value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Canvas width in pixels (height follows the data aspect ratio)
    #[arg(long, default_value_t = 2000)]
    pub width: u32,
}
