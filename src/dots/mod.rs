//! The point-sampling core: rejection sampling, per-feature labeling,
//! feature-set flattening, and the bounded-memory CSV chunk buffer.

mod category;
mod error;
mod flatten;
mod label;
mod sample;
mod stream;

pub use category::{Category, CategoryCounts};
pub use error::DotsError;
pub use flatten::{DotStream, label_all};
pub use label::{Dot, Feature, FeatureDots};
pub use sample::{Containment, EdgeIndex, RejectionSampler, SamplerConfig, sample_points};
pub use stream::{CsvStream, Row, push_field};
