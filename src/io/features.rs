//! Shapefile feature source: shapes + attribute records into [`Feature`]s.

use std::path::Path;

use anyhow::{Context, Result, bail};
use shapefile::dbase::{FieldValue, Record};
use shapefile::{Reader, Shape};

use crate::dots::{Category, CategoryCounts, DotsError, Feature};

/// Read every polygon feature of a shapefile, with its per-category
/// population counts taken from the dBase attribute table.
pub fn read_features(path: &Path) -> Result<Vec<Feature>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut features = Vec::with_capacity(reader.shape_count()?);
    for (idx, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result.context("Error reading shape+record")?;
        let geometry = shape_to_multipolygon(shape)
            .with_context(|| format!("record {idx} in {}", path.display()))?;
        let counts = counts_from_record(&record)
            .with_context(|| format!("record {idx} in {}", path.display()))?;
        features.push(Feature {
            id: feature_id(&record, idx),
            geometry,
            counts,
            declared_total: declared_total(&record)?,
        });
    }
    Ok(features)
}

/// Prefer the GISJOIN key as the feature identifier, fall back to the
/// record index.
fn feature_id(record: &Record, idx: usize) -> String {
    match record.get("GISJOIN") {
        Some(FieldValue::Character(Some(s))) => s.trim().to_string(),
        _ => idx.to_string(),
    }
}

/// Declared total population, when the attribute table carries a `total`
/// column. A null or absent total means "not declared", not zero; only a
/// concrete value participates in count validation.
fn declared_total(record: &Record) -> Result<Option<u64>, DotsError> {
    match record.get("total") {
        None
        | Some(FieldValue::Numeric(None))
        | Some(FieldValue::Float(None)) => Ok(None),
        Some(_) => count_field(record, "total").map(Some),
    }
}

fn counts_from_record(record: &Record) -> Result<CategoryCounts, DotsError> {
    let mut counts = CategoryCounts::new();
    for category in Category::ALL {
        counts.set(category, count_field(record, category.key())?);
    }
    Ok(counts)
}

/// Population counts arrive as dBase numeric fields (sometimes float or
/// integer, depending on the writer); a null counts as zero.
fn count_field(record: &Record, field: &str) -> Result<u64, DotsError> {
    match record.get(field) {
        Some(FieldValue::Numeric(Some(n))) => Ok(n.max(0.0) as u64),
        Some(FieldValue::Float(Some(n))) => Ok(n.max(0.0) as u64),
        Some(FieldValue::Integer(n)) => Ok((*n).max(0) as u64),
        Some(FieldValue::Numeric(None)) | Some(FieldValue::Float(None)) => Ok(0),
        _ => Err(DotsError::MissingField { field: field.to_string() }),
    }
}

/// Convert a shapefile shape to geo::MultiPolygon<f64>.
pub fn shape_to_multipolygon(shape: Shape) -> Result<geo::MultiPolygon<f64>> {
    match shape {
        Shape::Polygon(polygon) => Ok(polygon_to_multipolygon(&polygon)),
        Shape::NullShape => Ok(geo::MultiPolygon(vec![])),
        other => bail!("expected polygon shapes, got {:?}", other.shapetype()),
    }
}

/// Convert shapefile::Polygon to geo::MultiPolygon<f64>, grouping each
/// exterior ring with the holes that follow it (shapefiles store rings in
/// that order, exteriors wound clockwise).
pub fn polygon_to_multipolygon(polygon: &shapefile::Polygon) -> geo::MultiPolygon<f64> {
    /// Ensure first and last are the same for geo::LineString coords
    fn ensure_closed(coords: &mut Vec<geo::Coord<f64>>) {
        if !coords.is_empty() && coords[0] != coords[coords.len() - 1] {
            coords.push(coords[0]);
        }
    }

    /// Get the signed area of a geo::Coord list (negative for exterior here)
    fn signed_area(pts: &[geo::Coord<f64>]) -> f64 {
        let mut area = 0.0;
        for pair in pts.windows(2) {
            area += pair[0].x * pair[1].y - pair[1].x * pair[0].y;
        }
        area / 2.0
    }

    let mut polygons: Vec<geo::Polygon<f64>> = Vec::new();
    let mut exterior: Option<geo::LineString<f64>> = None;
    let mut holes: Vec<geo::LineString<f64>> = Vec::new();

    for ring in polygon.rings() {
        let mut coords: Vec<geo::Coord<f64>> = ring
            .points()
            .iter()
            .map(|point| geo::Coord { x: point.x, y: point.y })
            .collect();
        ensure_closed(&mut coords);
        // CW (negative signed area) marks an exterior in shapefile convention.
        let is_exterior = signed_area(&coords) < 0.0;
        let ring = geo::LineString(coords);

        if is_exterior {
            if let Some(ext) = exterior.take() {
                polygons.push(geo::Polygon::new(ext, std::mem::take(&mut holes)));
            }
            exterior = Some(ring);
        } else {
            holes.push(ring);
        }
    }
    if let Some(ext) = exterior {
        polygons.push(geo::Polygon::new(ext, holes));
    }

    geo::MultiPolygon(polygons)
}
