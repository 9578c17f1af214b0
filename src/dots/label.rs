use geo::MultiPolygon;
use rand::rngs::StdRng;

use crate::dots::category::{Category, CategoryCounts};
use crate::dots::error::DotsError;
use crate::dots::sample::{EdgeIndex, RejectionSampler, SamplerConfig, sample_points};

/// One person: a point inside their home polygon, tagged with their
/// demographic category.
#[derive(Debug, Clone, PartialEq)]
pub struct Dot {
    pub x: f64,
    pub y: f64,
    pub category: Category,
}

/// One polygon feature with its per-category population counts.
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: String,
    pub geometry: MultiPolygon<f64>,
    pub counts: CategoryCounts,
    /// Total population as declared by the source data, if it carries one.
    /// Only used for validation; the category counts drive sampling.
    pub declared_total: Option<u64>,
}

impl Feature {
    /// Number of dots this feature produces.
    ///
    /// Fails loudly if a declared total disagrees with the summed category
    /// counts, instead of letting a mismatch silently drop or mislabel
    /// points downstream.
    pub fn validate_counts(&self) -> Result<u64, DotsError> {
        let summed = self.counts.total();
        if let Some(declared) = self.declared_total {
            if declared != summed {
                return Err(DotsError::MismatchedCounts { declared, summed });
            }
        }
        Ok(summed)
    }
}

/// Lazy label sequence: each category key repeated `count[key]` times, in
/// canonical key order. Never materialized; a feature can be millions of
/// people.
#[derive(Debug)]
struct LabelSeq {
    counts: CategoryCounts,
    cursor: usize,
    emitted: u64,
}

impl LabelSeq {
    fn new(counts: CategoryCounts) -> Self {
        Self { counts, cursor: 0, emitted: 0 }
    }
}

impl Iterator for LabelSeq {
    type Item = Category;

    fn next(&mut self) -> Option<Category> {
        while self.cursor < Category::ALL.len() {
            let category = Category::ALL[self.cursor];
            if self.emitted < self.counts.get(category) {
                self.emitted += 1;
                return Some(category);
            }
            self.cursor += 1;
            self.emitted = 0;
        }
        None
    }
}

/// Lazy sequence of labeled dots for a single feature: the sampler's points
/// zipped 1:1 against the label sequence.
#[derive(Debug)]
pub struct FeatureDots {
    sampler: RejectionSampler<EdgeIndex>,
    labels: LabelSeq,
}

impl FeatureDots {
    pub fn new(feature: &Feature, rng: StdRng, config: &SamplerConfig) -> Result<Self, DotsError> {
        let n = feature.validate_counts()?;
        let sampler = sample_points(&feature.geometry, n, rng, config)?;
        Ok(Self { sampler, labels: LabelSeq::new(feature.counts.clone()) })
    }
}

impl Iterator for FeatureDots {
    type Item = Result<Dot, DotsError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.sampler.next()? {
            Ok((x, y)) => {
                // Sampler length and label length both equal the validated
                // count, so the zip can never truncate.
                let category = self.labels.next();
                debug_assert!(category.is_some(), "label sequence shorter than point sequence");
                category.map(|category| Ok(Dot { x, y, category }))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use geo::{MultiPolygon, polygon};
    use rand::{SeedableRng, rngs::StdRng};

    use super::{Feature, FeatureDots};
    use crate::dots::category::{Category, CategoryCounts};
    use crate::dots::error::DotsError;
    use crate::dots::sample::SamplerConfig;

    fn feature(counts: CategoryCounts, declared_total: Option<u64>) -> Feature {
        Feature {
            id: "G0100010".to_string(),
            geometry: MultiPolygon(vec![polygon![
                (x: 0.0, y: 0.0),
                (x: 0.0, y: 10.0),
                (x: 10.0, y: 10.0),
                (x: 10.0, y: 0.0),
            ]]),
            counts,
            declared_total,
        }
    }

    #[test]
    fn label_multiset_matches_counts() {
        let counts: CategoryCounts = [
            (Category::NonHispanicBlack, 4u64),
            (Category::HispanicWhite, 3),
            (Category::HispanicMultiple, 1),
        ]
        .into_iter()
        .collect();
        let feature = feature(counts.clone(), None);

        let rng = StdRng::seed_from_u64(11);
        let dots = FeatureDots::new(&feature, rng, &SamplerConfig::default())
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(dots.len(), 8);
        let mut seen: HashMap<Category, u64> = HashMap::new();
        for dot in &dots {
            *seen.entry(dot.category).or_default() += 1;
            assert!((0.0..10.0).contains(&dot.x));
            assert!((0.0..10.0).contains(&dot.y));
        }
        for (category, count) in counts.iter() {
            assert_eq!(seen.get(&category).copied().unwrap_or(0), count);
        }
    }

    #[test]
    fn labels_come_in_canonical_blocks() {
        let counts: CategoryCounts = [
            (Category::NonHispanicWhite, 2u64),
            (Category::HispanicBlack, 2),
        ]
        .into_iter()
        .collect();
        let rng = StdRng::seed_from_u64(5);
        let dots = FeatureDots::new(&feature(counts, None), rng, &SamplerConfig::default())
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let labels: Vec<_> = dots.iter().map(|dot| dot.category).collect();
        assert_eq!(
            labels,
            vec![
                Category::NonHispanicWhite,
                Category::NonHispanicWhite,
                Category::HispanicBlack,
                Category::HispanicBlack,
            ]
        );
    }

    #[test]
    fn empty_feature_yields_nothing() {
        let rng = StdRng::seed_from_u64(5);
        let mut dots =
            FeatureDots::new(&feature(CategoryCounts::new(), Some(0)), rng, &SamplerConfig::default())
                .unwrap();
        assert!(dots.next().is_none());
    }

    #[test]
    fn declared_total_mismatch_fails_loudly() {
        let counts: CategoryCounts =
            [(Category::HispanicWhite, 3u64)].into_iter().collect();
        let rng = StdRng::seed_from_u64(5);
        let err = FeatureDots::new(&feature(counts, Some(7)), rng, &SamplerConfig::default())
            .unwrap_err();
        match err {
            DotsError::MismatchedCounts { declared, summed } => {
                assert_eq!((declared, summed), (7, 3));
            }
            other => panic!("expected MismatchedCounts, got {other}"),
        }
    }
}
