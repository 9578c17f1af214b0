//! End-to-end pipeline scenarios: features -> sampler -> labels -> chunk
//! buffer -> Parquet table -> read back.

use geo::{MultiPolygon, polygon};
use polars::io::SerReader;
use polars::prelude::ParquetReader;

use dotdensity::io::table::write_dot_table;
use dotdensity::{Category, CategoryCounts, CsvStream, Feature, SamplerConfig, label_all};

fn square(side: f64) -> MultiPolygon<f64> {
    MultiPolygon(vec![polygon![
        (x: 0.0, y: 0.0),
        (x: 0.0, y: side),
        (x: side, y: side),
        (x: side, y: 0.0),
    ]])
}

fn feature(id: &str, geometry: MultiPolygon<f64>, counts: CategoryCounts) -> Feature {
    Feature { id: id.to_string(), geometry, counts, declared_total: None }
}

#[test]
fn square_feature_yields_labeled_points_in_bounds() {
    let counts: CategoryCounts = [
        (Category::HispanicWhite, 3u64),
        (Category::HispanicBlack, 2),
    ]
    .into_iter()
    .collect();
    let features = vec![feature("sq", square(10.0), counts)];

    let dots = label_all(features, Some(1234), SamplerConfig::default())
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(dots.len(), 5);
    let white = dots.iter().filter(|d| d.category == Category::HispanicWhite).count();
    let black = dots.iter().filter(|d| d.category == Category::HispanicBlack).count();
    assert_eq!((white, black), (3, 2));
    for dot in &dots {
        assert!((0.0..=10.0).contains(&dot.x));
        assert!((0.0..=10.0).contains(&dot.y));
    }
}

#[test]
fn empty_feature_yields_zero_points_without_error() {
    let features = vec![feature("empty", square(10.0), CategoryCounts::new())];
    let dots = label_all(features, Some(1), SamplerConfig::default())
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert!(dots.is_empty());
}

#[test]
fn two_features_flatten_into_contiguous_blocks() {
    let a_counts: CategoryCounts = [(Category::NonHispanicNative, 4u64)].into_iter().collect();
    let b_counts: CategoryCounts = [(Category::HispanicAsian, 6u64)].into_iter().collect();
    let mut b_geometry = square(5.0);
    // Shift B well away from A so block membership is visible in x.
    for polygon in &mut b_geometry.0 {
        polygon.exterior_mut(|ring| {
            for coord in &mut ring.0 {
                coord.x += 1000.0;
            }
        });
    }

    let features = vec![
        feature("a", square(5.0), a_counts),
        feature("b", b_geometry, b_counts),
    ];
    let dots = label_all(features, Some(9), SamplerConfig::default())
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(dots.len(), 10);
    assert!(dots[..4].iter().all(|dot| dot.x <= 5.0));
    assert!(dots[4..].iter().all(|dot| dot.x >= 1000.0));
}

#[test]
fn chunked_parquet_write_round_trips_all_rows() {
    let counts: CategoryCounts = [
        (Category::NonHispanicWhite, 40u64),
        (Category::HispanicOther, 17),
    ]
    .into_iter()
    .collect();
    let features = vec![feature("sq", square(8.0), counts)];
    let stream = label_all(features, Some(7), SamplerConfig::default());

    // A chunk size that does not divide 57, so the tail chunk is short.
    let chunk_size = 10;
    let mut rows = CsvStream::new(stream, chunk_size);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dots.parquet");
    let written = write_dot_table(&path, &mut rows, chunk_size).unwrap();
    assert_eq!(written, 57);

    let df = ParquetReader::new(std::fs::File::open(&path).unwrap())
        .finish()
        .unwrap();
    assert_eq!(df.height(), 57);

    let categories = df.column("category").unwrap().str().unwrap();
    let white = categories
        .into_iter()
        .filter(|c| *c == Some(Category::NonHispanicWhite.key()))
        .count();
    assert_eq!(white, 40);

    let xs = df.column("x").unwrap().f64().unwrap();
    for x in xs.into_no_null_iter() {
        assert!((0.0..8.0).contains(&x));
    }
}

#[test]
fn whole_pipeline_is_deterministic_under_a_seed() {
    let counts: CategoryCounts = [(Category::HispanicNative, 25u64)].into_iter().collect();
    let run = || {
        let features = vec![feature("sq", square(3.0), counts.clone())];
        label_all(features, Some(31), SamplerConfig::default())
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    };
    assert_eq!(run(), run());
}
