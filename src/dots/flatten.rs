use log::{info, warn};
use rand::{RngCore, SeedableRng, rngs::StdRng};

use crate::dots::error::DotsError;
use crate::dots::label::{Dot, Feature, FeatureDots};
use crate::dots::sample::SamplerConfig;

const PROGRESS_EVERY: u64 = 1000;

/// Flat lazy sequence of labeled dots across all features, in source order.
///
/// Feature boundaries are not marked in the output; each feature's dots
/// form one contiguous block. Features that fail validation up front
/// (count mismatch, degenerate geometry) are logged and skipped; a sampler
/// stall mid-feature is fatal, since dots already emitted for that feature
/// cannot be retracted downstream.
pub struct DotStream<I> {
    features: I,
    current: Option<FeatureDots>,
    rng: StdRng,
    config: SamplerConfig,
    processed: u64,
    skipped: u64,
    failed: bool,
}

/// Label every feature of `features` and flatten the results.
///
/// With `seed` fixed the full output sequence is deterministic; each
/// feature's sampler gets its own RNG forked from the master stream, so
/// features stay independently samplable.
pub fn label_all<I>(features: I, seed: Option<u64>, config: SamplerConfig) -> DotStream<I::IntoIter>
where
    I: IntoIterator<Item = Feature>,
{
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    DotStream {
        features: features.into_iter(),
        current: None,
        rng,
        config,
        processed: 0,
        skipped: 0,
        failed: false,
    }
}

impl<I: Iterator<Item = Feature>> DotStream<I> {
    /// Features skipped so far due to per-feature validation failures.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl<I: Iterator<Item = Feature>> Iterator for DotStream<I> {
    type Item = Result<Dot, DotsError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(dots) = &mut self.current {
                match dots.next() {
                    Some(Ok(dot)) => return Some(Ok(dot)),
                    Some(Err(err)) => {
                        self.failed = true;
                        return Some(Err(err));
                    }
                    None => self.current = None,
                }
            }
            let feature = self.features.next()?;
            self.processed += 1;
            if self.processed % PROGRESS_EVERY == 0 {
                info!("processed {} features ({} skipped)", self.processed, self.skipped);
            }
            let feature_rng = StdRng::seed_from_u64(self.rng.next_u64());
            match FeatureDots::new(&feature, feature_rng, &self.config) {
                Ok(dots) => self.current = Some(dots),
                Err(err) => {
                    warn!("skipping feature {}: {}", feature.id, err);
                    self.skipped += 1;
                }
            }
        }
    }
}
