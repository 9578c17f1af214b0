//! Append-only dot table: fixed-size chunks of parsed rows written as
//! individual Parquet row groups.

use std::{fs::File, path::Path, sync::Arc};

use anyhow::{Context, Result};
use arrow_array::{ArrayRef, Float64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use log::info;
use parquet::{
    arrow::ArrowWriter,
    basic::{Compression, ZstdLevel},
    file::properties::WriterProperties,
};

use crate::dots::{Category, CsvStream, Dot, DotsError, Row};

/// Schema of the output table: one row per person.
fn dot_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("x", DataType::Float64, false),
        Field::new("y", DataType::Float64, false),
        Field::new("category", DataType::Utf8, false),
    ]))
}

/// Drain `stream` into a Parquet file at `path`, one row group per
/// `chunk_size` rows. Chunk boundaries carry no meaning; the table is one
/// flat point set and the file only ever grows.
///
/// Returns the number of rows written.
pub fn write_dot_table<I, R>(path: &Path, stream: &mut CsvStream<I>, chunk_size: usize) -> Result<u64>
where
    I: Iterator<Item = Result<R, DotsError>>,
    R: Row,
{
    let file = File::create(path)
        .with_context(|| format!("Failed to create dot table: {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::try_new(4)?))
        .build();
    let schema = dot_schema();
    let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

    let mut xs: Vec<f64> = Vec::with_capacity(chunk_size);
    let mut ys: Vec<f64> = Vec::with_capacity(chunk_size);
    let mut categories: Vec<&'static str> = Vec::with_capacity(chunk_size);
    let mut total = 0u64;
    let mut chunk = 0u64;

    while let Some(line) = stream.next_line()? {
        let dot = parse_row(&line)?;
        xs.push(dot.x);
        ys.push(dot.y);
        categories.push(dot.category.key());
        if xs.len() == chunk_size {
            info!("writing chunk {} with {} rows", chunk, xs.len());
            flush_chunk(&mut writer, &schema, &mut xs, &mut ys, &mut categories)?;
            chunk += 1;
        }
        total += 1;
    }
    if !xs.is_empty() {
        info!("writing chunk {} with {} rows", chunk, xs.len());
        flush_chunk(&mut writer, &schema, &mut xs, &mut ys, &mut categories)?;
    }
    writer.close()?;
    Ok(total)
}

/// Parse one serialized row back into a dot.
pub fn parse_row(line: &str) -> Result<Dot, DotsError> {
    let malformed = || DotsError::MalformedRow { row: line.to_string() };
    let mut fields = line.splitn(3, ',');
    let x = fields.next().and_then(|f| f.parse().ok()).ok_or_else(malformed)?;
    let y = fields.next().and_then(|f| f.parse().ok()).ok_or_else(malformed)?;
    let category = Category::from_key(fields.next().ok_or_else(malformed)?)?;
    Ok(Dot { x, y, category })
}

/// Append one row group and reset the column accumulators.
fn flush_chunk(
    writer: &mut ArrowWriter<File>,
    schema: &Arc<Schema>,
    xs: &mut Vec<f64>,
    ys: &mut Vec<f64>,
    categories: &mut Vec<&'static str>,
) -> Result<()> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(std::mem::take(xs))),
        Arc::new(Float64Array::from(std::mem::take(ys))),
        Arc::new(StringArray::from(std::mem::take(categories))),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    writer.write(&batch)?;
    // Finish the row group so each chunk is its own append.
    writer.flush()?;
    Ok(())
}
