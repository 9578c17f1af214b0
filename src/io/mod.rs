//! Thin I/O adapters around the sampling core: feature sources, the
//! chunked table writer, and supplemental config files.

pub mod colmap;
pub mod features;
pub mod table;
