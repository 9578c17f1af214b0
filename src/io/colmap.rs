//! Column-map config files: one `source_column,target_name,target_type`
//! line per supplemental column, `#` comments and blank lines ignored.

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};

/// dBase-facing type of a supplemented column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Int,
    Float,
    Str,
}

#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub source: String,
    pub target: String,
    pub ty: TargetType,
}

/// Read a column map from `path`.
pub fn read_column_map(path: &Path) -> Result<Vec<ColumnMapping>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read column map: {}", path.display()))?;
    parse_column_map(&text).with_context(|| format!("in column map {}", path.display()))
}

pub fn parse_column_map(text: &str) -> Result<Vec<ColumnMapping>> {
    let mut mappings = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [source, target, ty] = fields.as_slice() else {
            bail!("line {}: expected 'source,target,type', got '{}'", lineno + 1, line);
        };
        mappings.push(ColumnMapping {
            source: source.to_string(),
            target: target.to_string(),
            ty: parse_type(ty).with_context(|| format!("line {}", lineno + 1))?,
        });
    }
    Ok(mappings)
}

/// Accepts fiona-style width suffixes (`float:40.30`); only the base type
/// matters here.
fn parse_type(ty: &str) -> Result<TargetType> {
    let base = ty.split(':').next().unwrap_or(ty);
    match base {
        "int" => Ok(TargetType::Int),
        "float" => Ok(TargetType::Float),
        "str" => Ok(TargetType::Str),
        other => bail!("unknown target type '{other}'"),
    }
}
