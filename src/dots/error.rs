use thiserror::Error;

/// Failures specific to the dot-sampling pipeline.
///
/// End-of-sequence is never signaled through this type: iterators return
/// `None` and the stream adapter returns `Ok(None)` once drained.
#[derive(Debug, Error)]
pub enum DotsError {
    /// A feature's declared total disagrees with the sum of its category
    /// counts. Raised before any point is emitted for the feature.
    #[error("declared total {declared} != sum of category counts {summed}")]
    MismatchedCounts { declared: u64, summed: u64 },

    /// The geometry is empty or has a zero-extent bounding box, so the
    /// rejection loop cannot produce points.
    #[error("geometry is empty or has zero extent")]
    DegenerateGeometry,

    /// The rejection loop exceeded its candidate-draw budget. For a polygon
    /// far smaller than its bounding box this fires instead of spinning
    /// forever.
    #[error("sampling stalled after {drawn} draws ({accepted} of {needed} points accepted)")]
    SamplingStalled { drawn: u64, accepted: u64, needed: u64 },

    /// An attribute record lacks one of the canonical category columns.
    #[error("attribute record is missing field '{field}'")]
    MissingField { field: String },

    /// A label that is not one of the 14 canonical category keys.
    #[error("unknown category key '{key}'")]
    UnknownCategory { key: String },

    /// A serialized dot row that does not parse back into (x, y, category).
    #[error("malformed dot row '{row}'")]
    MalformedRow { row: String },
}
