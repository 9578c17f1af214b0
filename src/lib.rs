#![doc = "Dot-density census mapping: one uniformly-placed point per person, \
streamed through a bounded-memory chunk buffer into a Parquet table, then \
rasterized into a color-coded image."]

pub mod cli;
pub mod commands;
pub mod dots;
pub mod io;
pub mod render;
pub mod supplement;

#[doc(inline)]
pub use dots::{
    Category, CategoryCounts, Containment, CsvStream, Dot, DotStream, DotsError, EdgeIndex,
    Feature, FeatureDots, RejectionSampler, SamplerConfig, label_all, sample_points,
};
