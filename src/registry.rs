use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::pattern::dense_key;

/// Number of status columns carried per registry row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryShape {
    Three,
    Five,
}

impl RegistryShape {
    pub fn width(self) -> usize {
        match self {
            RegistryShape::Three => 3,
            RegistryShape::Five => 5,
        }
    }
}

impl TryFrom<usize> for RegistryShape {
    type Error = RegistryError;

    fn try_from(width: usize) -> Result<Self, Self::Error> {
        match width {
            3 => Ok(RegistryShape::Three),
            5 => Ok(RegistryShape::Five),
            other => Err(RegistryError::InvalidShape(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRecord {
    /// Key cell exactly as stored.
    pub raw_key: String,
    pub key: String,
    pub dense_key: String,
    /// Status fields in column order; field 0 carries the validity text.
    pub fields: Vec<Option<String>>,
}

impl RegistryRecord {
    pub fn status(&self) -> Option<&str> {
        self.fields.first().and_then(|f| f.as_deref())
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("RegistryRead: {path}: {message}")]
    Read { path: String, message: String },
    #[error("RegistryParse: {0}")]
    Parse(String),
    #[error("UnsupportedRegistryFormat: {0}")]
    UnsupportedFormat(String),
    #[error("MalformedRow {row}: {message}")]
    MalformedRow { row: usize, message: String },
    #[error("InvalidShape: {0} (expected 3 or 5)")]
    InvalidShape(usize),
    #[error("EmptyRegistry")]
    Empty,
}

/// Read-only lookup table, shared across scan workers without locking.
#[derive(Debug, Clone)]
pub struct Registry {
    shape: RegistryShape,
    records: Vec<RegistryRecord>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Deserialize)]
struct JsonRecord {
    key: String,
    #[serde(default)]
    fields: Vec<Option<String>>,
}

impl Registry {
    /// Build from `(key, fields)` rows. Blank keys are skipped, the first row
    /// wins for duplicate keys, and an empty result is an error.
    pub fn from_records<I>(shape: RegistryShape, rows: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (String, Vec<Option<String>>)>,
    {
        let mut records = Vec::new();
        let mut index = HashMap::new();
        for (i, (raw_key, fields)) in rows.into_iter().enumerate() {
            if fields.len() != shape.width() {
                return Err(RegistryError::MalformedRow {
                    row: i + 1,
                    message: format!("expected {} status fields, got {}", shape.width(), fields.len()),
                });
            }
            let key = raw_key.trim().to_string();
            if key.is_empty() {
                continue;
            }
            let dense = dense_key(&key);
            if index.contains_key(&dense) {
                continue;
            }
            index.insert(dense.clone(), records.len());
            records.push(RegistryRecord { raw_key, key, dense_key: dense, fields: fields.into_iter().map(blank_to_none).collect() });
        }
        if records.is_empty() {
            return Err(RegistryError::Empty);
        }
        tracing::info!(records = records.len(), width = shape.width(), "registry loaded");
        Ok(Registry { shape, records, index })
    }

    /// CSV with a header row. The key sits in `key_column`; status fields are
    /// the last `shape` columns.
    pub fn from_csv_reader<R: Read>(reader: R, shape: RegistryShape, key_column: usize) -> Result<Self, RegistryError> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);
        let width = shape.width();
        let mut rows = Vec::new();
        for (idx, result) in csv_reader.records().enumerate() {
            let row_no = idx + 2; // header is line 1
            let record = result.map_err(|e| RegistryError::Parse(e.to_string()))?;
            if record.len() <= key_column || record.len() < width {
                return Err(RegistryError::MalformedRow {
                    row: row_no,
                    message: format!("{} columns, need key column {} and {} status columns", record.len(), key_column, width),
                });
            }
            let key = record.get(key_column).unwrap_or_default().to_string();
            let fields: Vec<Option<String>> = (record.len() - width..record.len()).map(|c| record.get(c).map(str::to_string)).collect();
            rows.push((key, fields));
        }
        Self::from_records(shape, rows)
    }

    pub fn from_csv_path(path: &Path, shape: RegistryShape, key_column: usize) -> Result<Self, RegistryError> {
        let file = std::fs::File::open(path).map_err(|e| read_error(path, e))?;
        Self::from_csv_reader(file, shape, key_column)
    }

    /// JSON array of `{"key": ..., "fields": [...]}`.
    pub fn from_json_str(raw: &str, shape: RegistryShape) -> Result<Self, RegistryError> {
        let rows: Vec<JsonRecord> = serde_json::from_str(raw).map_err(|e| RegistryError::Parse(e.to_string()))?;
        Self::from_records(shape, rows.into_iter().map(|r| (r.key, r.fields)))
    }

    pub fn from_json_path(path: &Path, shape: RegistryShape) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path).map_err(|e| read_error(path, e))?;
        Self::from_json_str(&raw, shape)
    }

    /// Dispatch on file extension.
    pub fn from_path(path: &Path, shape: RegistryShape, key_column: usize) -> Result<Self, RegistryError> {
        let ext = path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Self::from_csv_path(path, shape, key_column),
            Some("json") => Self::from_json_path(path, shape),
            _ => Err(RegistryError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn shape(&self) -> RegistryShape {
        self.shape
    }

    pub fn records(&self) -> &[RegistryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact lookup by dense key.
    pub fn get(&self, dense: &str) -> Option<&RegistryRecord> {
        self.index.get(dense).map(|&i| &self.records[i])
    }

    /// First record, in registry order, whose dense key occurs inside `dense`.
    pub fn find_contained_in(&self, dense: &str) -> Option<&RegistryRecord> {
        self.records.iter().find(|r| dense.contains(r.dense_key.as_str()))
    }
}

fn blank_to_none(field: Option<String>) -> Option<String> {
    field.filter(|f| !f.trim().is_empty())
}

fn read_error(path: &Path, e: std::io::Error) -> RegistryError {
    RegistryError::Read { path: path.display().to_string(), message: e.to_string() }
}
