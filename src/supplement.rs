//! Join a delimited attribute file onto a shapefile's dBase table and
//! write the supplemented features to a new shapefile.

use std::{collections::HashMap, fs::File, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use log::{info, warn};
use polars::{
    frame::DataFrame,
    io::SerReader,
    prelude::{CsvEncoding, CsvReadOptions, StringChunked},
};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::Shape;

use crate::io::colmap::{ColumnMapping, TargetType, read_column_map};

const PROGRESS_EVERY: usize = 1000;

/// Supplement every feature of `shp_path` with the columns named in the
/// column map, joined from `dat_path` on `join_key`.
///
/// A feature whose join key has no attribute row is logged and written
/// through with null supplemental values; that is recoverable, not fatal.
pub fn supplement_shapefile(
    shp_path: &Path,
    dat_path: &Path,
    colmap_path: &Path,
    out_path: &Path,
    join_key: &str,
) -> Result<()> {
    let mappings = read_column_map(colmap_path)?;

    info!("reading attribute table {}", dat_path.display());
    let table = read_attribute_table(dat_path)?;
    info!("read {} attribute rows", table.height());

    let keys = table
        .column(join_key)
        .with_context(|| format!("attribute table has no join column '{join_key}'"))?
        .str()?;
    let mut index: HashMap<String, usize> = HashMap::with_capacity(table.height());
    for (row, key) in keys.into_iter().enumerate() {
        if let Some(key) = key {
            index.entry(key.trim().to_string()).or_insert(row);
        }
    }

    let columns = mappings
        .iter()
        .map(|mapping| {
            table
                .column(&mapping.source)
                .with_context(|| format!("attribute table has no column '{}'", mapping.source))?
                .str()
                .map_err(Into::into)
        })
        .collect::<Result<Vec<&StringChunked>>>()?;

    info!("reading shapefile {}", shp_path.display());
    let mut reader = shapefile::Reader::from_path(shp_path)
        .with_context(|| format!("Failed to open shapefile: {}", shp_path.display()))?;
    let mut items = Vec::with_capacity(reader.shape_count()?);
    for result in reader.iter_shapes_and_records() {
        items.push(result.context("Error reading shape+record")?);
    }
    let nr_features = items.len();
    info!("got {nr_features} features");

    // Source schema inferred from the first record; mapped targets replace
    // same-named source fields rather than duplicating them.
    let mut template: Vec<(String, FieldValue)> = items
        .first()
        .map(|(_, record)| record.clone().into_iter().collect())
        .unwrap_or_default();
    template.sort_by(|a, b| a.0.cmp(&b.0));
    template.retain(|(name, _)| !mappings.iter().any(|mapping| &mapping.target == name));

    let builder = build_schema(&template, &mappings)?;
    let mut writer = shapefile::Writer::from_path(out_path, builder)
        .with_context(|| format!("Failed to create shapefile: {}", out_path.display()))?;

    let mut misses = 0usize;
    for (i, (shape, record)) in items.into_iter().enumerate() {
        let polygon = match shape {
            Shape::Polygon(polygon) => polygon,
            other => bail!("expected polygon shapes, got {:?}", other.shapetype()),
        };

        let mut out = Record::default();
        for (name, _) in &template {
            if let Some(value) = record.get(name) {
                out.insert(name.clone(), normalize_value(value.clone()));
            }
        }

        let key = join_value(&record, join_key)?;
        match index.get(&key) {
            Some(&row) => {
                for (mapping, column) in mappings.iter().zip(&columns) {
                    out.insert(mapping.target.clone(), field_value(mapping, column.get(row))?);
                }
            }
            None => {
                warn!("no attribute row for join key '{key}'");
                misses += 1;
                for mapping in &mappings {
                    out.insert(mapping.target.clone(), null_value(mapping.ty));
                }
            }
        }

        if i % PROGRESS_EVERY == 0 {
            info!("{} of {} features", i, nr_features);
        }
        writer.write_shape_and_record(&polygon, &out)?;
    }

    info!("wrote {} features ({} without attribute rows)", nr_features, misses);
    Ok(())
}

/// Read the delimited attribute file. Everything is kept as text (numeric
/// parsing happens per the column map) so join keys keep leading zeros; one
/// descriptor row after the header is skipped, and latin-1 bytes survive as
/// lossy UTF-8.
fn read_attribute_table(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open attribute file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_skip_rows_after_header(1)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|options| options.with_encoding(CsvEncoding::LossyUtf8))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("Failed to read attribute file from {}", path.display()))
}

fn field_name(name: &str) -> Result<FieldName> {
    FieldName::try_from(name).map_err(|err| anyhow!("invalid field name '{name}': {err:?}"))
}

fn build_schema(
    template: &[(String, FieldValue)],
    mappings: &[ColumnMapping],
) -> Result<TableWriterBuilder> {
    let mut builder = TableWriterBuilder::new();
    for (name, value) in template {
        let field = field_name(name)?;
        builder = match value {
            FieldValue::Character(_) => builder.add_character_field(field, 80),
            FieldValue::Numeric(_) | FieldValue::Integer(_) => {
                builder.add_numeric_field(field, 20, 8)
            }
            FieldValue::Float(_) => builder.add_float_field(field, 20, 8),
            FieldValue::Logical(_) => builder.add_logical_field(field),
            FieldValue::Date(_) => builder.add_date_field(field),
            other => bail!("unsupported attribute field type for '{name}': {other:?}"),
        };
    }
    for mapping in mappings {
        let field = field_name(&mapping.target)?;
        builder = match mapping.ty {
            TargetType::Int => builder.add_numeric_field(field, 20, 0),
            TargetType::Float => builder.add_numeric_field(field, 24, 10),
            TargetType::Str => builder.add_character_field(field, 80),
        };
    }
    Ok(builder)
}

/// Integers are carried as numerics so the writer schema stays uniform.
fn normalize_value(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Integer(n) => FieldValue::Numeric(Some(n as f64)),
        other => other,
    }
}

fn join_value(record: &Record, key: &str) -> Result<String> {
    match record.get(key) {
        Some(FieldValue::Character(Some(s))) => Ok(s.trim().to_string()),
        Some(FieldValue::Numeric(Some(n))) => Ok(format!("{n}")),
        _ => bail!("feature is missing join key field '{key}'"),
    }
}

fn field_value(mapping: &ColumnMapping, raw: Option<&str>) -> Result<FieldValue> {
    let Some(raw) = raw else {
        return Ok(null_value(mapping.ty));
    };
    match mapping.ty {
        TargetType::Int | TargetType::Float => {
            let value: f64 = raw.trim().parse().with_context(|| {
                format!("column {}: cannot parse '{}' as a number", mapping.source, raw)
            })?;
            Ok(FieldValue::Numeric(Some(value)))
        }
        TargetType::Str => Ok(FieldValue::Character(Some(raw.to_string()))),
    }
}

fn null_value(ty: TargetType) -> FieldValue {
    match ty {
        TargetType::Int | TargetType::Float => FieldValue::Numeric(None),
        TargetType::Str => FieldValue::Character(None),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
    use shapefile::{Point, Polygon, PolygonRing};

    use super::supplement_shapefile;

    fn square(x0: f64) -> Polygon {
        Polygon::with_rings(vec![PolygonRing::Outer(vec![
            Point::new(x0, 0.0),
            Point::new(x0, 1.0),
            Point::new(x0 + 1.0, 1.0),
            Point::new(x0 + 1.0, 0.0),
            Point::new(x0, 0.0),
        ])])
    }

    fn write_input(path: &std::path::Path, keys: &[&str]) {
        let builder = TableWriterBuilder::new()
            .add_character_field(FieldName::try_from("GISJOIN").unwrap(), 20);
        let mut writer = shapefile::Writer::from_path(path, builder).unwrap();
        for (i, key) in keys.iter().enumerate() {
            let mut record = Record::default();
            record.insert("GISJOIN".to_string(), FieldValue::Character(Some(key.to_string())));
            writer.write_shape_and_record(&square(i as f64 * 10.0), &record).unwrap();
        }
    }

    #[test]
    fn join_miss_is_written_through_with_null_values() {
        let dir = tempfile::tempdir().unwrap();
        let shp = dir.path().join("in.shp");
        let out = dir.path().join("out.shp");
        let dat = dir.path().join("attrs.csv");
        let map = dir.path().join("columns.map");

        write_input(&shp, &["G0100010", "G0100020"]);
        // Header, one descriptor row, then attribute data for only the
        // first feature's key.
        fs::write(&dat, "GISJOIN,H7Z001\nGIS Join Code,Total Population\nG0100010,41\n").unwrap();
        fs::write(&map, "H7Z001,total,int\n").unwrap();

        supplement_shapefile(&shp, &dat, &map, &out, "GISJOIN").unwrap();

        let mut reader = shapefile::Reader::from_path(&out).unwrap();
        let items = reader
            .iter_shapes_and_records()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(items.len(), 2);

        let (_, hit) = &items[0];
        assert_eq!(hit.get("total"), Some(&FieldValue::Numeric(Some(41.0))));
        let (_, miss) = &items[1];
        assert_eq!(miss.get("total"), Some(&FieldValue::Numeric(None)));
        match miss.get("GISJOIN") {
            Some(FieldValue::Character(Some(key))) => assert_eq!(key.trim(), "G0100020"),
            other => panic!("join key column lost: {other:?}"),
        }
    }

    #[test]
    fn every_key_present_supplements_all_features() {
        let dir = tempfile::tempdir().unwrap();
        let shp = dir.path().join("in.shp");
        let out = dir.path().join("out.shp");
        let dat = dir.path().join("attrs.csv");
        let map = dir.path().join("columns.map");

        write_input(&shp, &["A1", "A2"]);
        fs::write(&dat, "GISJOIN,POP,NAME\ncode,count,label\nA2,7,south\nA1,3,north\n").unwrap();
        fs::write(&map, "POP,total,int\nNAME,name,str\n").unwrap();

        supplement_shapefile(&shp, &dat, &map, &out, "GISJOIN").unwrap();

        let mut reader = shapefile::Reader::from_path(&out).unwrap();
        let items = reader
            .iter_shapes_and_records()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].1.get("total"), Some(&FieldValue::Numeric(Some(3.0))));
        assert_eq!(items[1].1.get("total"), Some(&FieldValue::Numeric(Some(7.0))));
        match items[1].1.get("name") {
            Some(FieldValue::Character(Some(name))) => assert_eq!(name.trim(), "south"),
            other => panic!("supplemented string column lost: {other:?}"),
        }
    }
}
