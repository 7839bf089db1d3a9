use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use csv::{ByteRecord, ReaderBuilder, WriterBuilder};
use indexmap::IndexMap;
use mc_core::errors::ErrorInfo;
use mc_core::{McError, ResultsRecord};
use serde_json::Value;

use crate::config::{OutputFormat, StorageConfig};
use crate::layout::{write_atomic, OutputLayout};

/// Append-only log of per-condition summary rows, index aligned with the
/// checkpoint files.
///
/// Entry `i` belongs to condition `i`. Resumption truncates every enabled
/// store to the same length before new rows are appended.
pub trait ResultsStore {
    /// Format of the backing file.
    fn format(&self) -> OutputFormat;

    /// Backing file.
    fn path(&self) -> &Path;

    /// Whether the backing file exists.
    fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Number of complete entries. A missing file has none.
    fn len(&self) -> Result<usize, McError>;

    /// Drops every entry at or beyond `len`.
    fn truncate(&mut self, len: usize) -> Result<(), McError>;

    /// Appends one entry.
    fn append(&mut self, record: &ResultsRecord) -> Result<(), McError>;
}

/// Opens one store per enabled format, in configuration order.
pub fn open_stores(layout: &OutputLayout, storage: &StorageConfig) -> Vec<Box<dyn ResultsStore>> {
    let mut stores: Vec<Box<dyn ResultsStore>> = Vec::new();
    for format in &storage.output_format {
        if stores.iter().any(|store| store.format() == *format) {
            continue;
        }
        let path = layout.results(*format);
        match format {
            OutputFormat::Csv => stores.push(Box::new(CsvResults::new(path))),
            OutputFormat::Json => stores.push(Box::new(JsonResults::new(path))),
        }
    }
    stores
}

/// Column oriented JSON summary: `{"column": [entry0, entry1, ...], ...}`.
#[derive(Debug, Clone)]
pub struct JsonResults {
    path: PathBuf,
}

type Columns = IndexMap<String, Vec<Value>>;

impl JsonResults {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<Columns, McError> {
        if !self.path.exists() {
            return Ok(Columns::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|err| {
            McError::Io(
                ErrorInfo::new("results-json-read", err.to_string())
                    .with_context("path", self.path.display().to_string()),
            )
        })?;
        if contents.trim().is_empty() {
            return Ok(Columns::new());
        }
        serde_json::from_str(&contents).map_err(|err| {
            McError::Serde(
                ErrorInfo::new("results-json-parse", err.to_string())
                    .with_context("path", self.path.display().to_string()),
            )
        })
    }

    fn write(&self, columns: &Columns) -> Result<(), McError> {
        let json = serde_json::to_string_pretty(columns).map_err(|err| {
            McError::Serde(
                ErrorInfo::new("results-json-serialize", err.to_string())
                    .with_context("path", self.path.display().to_string()),
            )
        })?;
        write_atomic(&self.path, json.as_bytes(), "results-json")
    }
}

/// An entry is complete only if every column holds a value for it.
fn complete_entries(columns: &Columns) -> usize {
    columns.values().map(Vec::len).min().unwrap_or(0)
}

impl ResultsStore for JsonResults {
    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn len(&self) -> Result<usize, McError> {
        Ok(complete_entries(&self.read()?))
    }

    fn truncate(&mut self, len: usize) -> Result<(), McError> {
        if !self.exists() {
            return Ok(());
        }
        let mut columns = self.read()?;
        for values in columns.values_mut() {
            values.truncate(len);
        }
        self.write(&columns)
    }

    fn append(&mut self, record: &ResultsRecord) -> Result<(), McError> {
        let mut columns = self.read()?;
        let len = complete_entries(&columns);
        for values in columns.values_mut() {
            values.truncate(len);
        }
        for (name, value) in record.iter() {
            columns
                .entry(name.to_string())
                .or_insert_with(|| vec![Value::Null; len])
                .push(value.clone());
        }
        for values in columns.values_mut() {
            if values.len() == len {
                values.push(Value::Null);
            }
        }
        self.write(&columns)
    }
}

/// Row oriented CSV summary with a header line.
#[derive(Debug, Clone)]
pub struct CsvResults {
    path: PathBuf,
}

impl CsvResults {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the header and every complete row.
    ///
    /// Only newline terminated lines count, and a row with the wrong number
    /// of fields ends the scan. Either is the trace of an interrupted append.
    fn read(&self) -> Result<Option<(ByteRecord, Vec<ByteRecord>)>, McError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(McError::Io(
                    ErrorInfo::new("results-csv-read", err.to_string())
                        .with_context("path", self.path.display().to_string()),
                ))
            }
        };
        let Some(end) = bytes.iter().rposition(|&byte| byte == b'\n') else {
            return Ok(None);
        };
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(&bytes[..=end]);
        let header = reader
            .byte_headers()
            .map_err(|err| wrap_csv("results-csv-header", &self.path, err))?
            .clone();
        if header.is_empty() {
            return Ok(None);
        }
        let mut rows = Vec::new();
        for result in reader.byte_records() {
            let record = result.map_err(|err| wrap_csv("results-csv-record", &self.path, err))?;
            if record.len() != header.len() {
                break;
            }
            rows.push(record);
        }
        Ok(Some((header, rows)))
    }
}

impl ResultsStore for CsvResults {
    fn format(&self) -> OutputFormat {
        OutputFormat::Csv
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn len(&self) -> Result<usize, McError> {
        Ok(self.read()?.map_or(0, |(_, rows)| rows.len()))
    }

    fn truncate(&mut self, len: usize) -> Result<(), McError> {
        let Some((header, mut rows)) = self.read()? else {
            return Ok(());
        };
        rows.truncate(len);
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
        writer
            .write_record(&header)
            .map_err(|err| wrap_csv("results-csv-write-header", &self.path, err))?;
        for row in &rows {
            writer
                .write_byte_record(row)
                .map_err(|err| wrap_csv("results-csv-write-row", &self.path, err))?;
        }
        let bytes = writer.into_inner().map_err(|err| {
            McError::Io(
                ErrorInfo::new("results-csv-flush", err.to_string())
                    .with_context("path", self.path.display().to_string()),
            )
        })?;
        write_atomic(&self.path, &bytes, "results-csv")
    }

    fn append(&mut self, record: &ResultsRecord) -> Result<(), McError> {
        let existing = self.read()?;
        match &existing {
            // rewrite so an interrupted trailing row cannot merge with the new one
            Some((_, rows)) => self.truncate(rows.len())?,
            None if self.exists() => write_atomic(&self.path, b"", "results-csv")?,
            None => {}
        }
        let header: Vec<String> = match &existing {
            Some((header, _)) => header
                .iter()
                .map(|name| String::from_utf8_lossy(name).into_owned())
                .collect(),
            None => record.names().map(str::to_string).collect(),
        };
        if let Some(extra) = record.names().find(|name| !header.iter().any(|h| h == name)) {
            return Err(McError::Serde(
                ErrorInfo::new("results-csv-columns", "record column missing from CSV header")
                    .with_context("path", self.path.display().to_string())
                    .with_context("column", extra),
            ));
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                McError::Io(
                    ErrorInfo::new("results-csv-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|err| {
                McError::Io(
                    ErrorInfo::new("results-csv-open", "failed to open CSV results")
                        .with_context("path", self.path.display().to_string())
                        .with_hint(err.to_string()),
                )
            })?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));
        if existing.is_none() {
            writer
                .write_record(&header)
                .map_err(|err| wrap_csv("results-csv-write-header", &self.path, err))?;
        }
        let row: Vec<String> = header
            .iter()
            .map(|name| record.get(name).map(csv_field).unwrap_or_default())
            .collect();
        writer
            .write_record(&row)
            .map_err(|err| wrap_csv("results-csv-write-row", &self.path, err))?;
        writer
            .flush()
            .map_err(|err| wrap_csv("results-csv-flush", &self.path, err.into()))?;
        Ok(())
    }
}

fn csv_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn wrap_csv(code: &str, path: &Path, err: csv::Error) -> McError {
    let info = ErrorInfo::new(code, "CSV results failure")
        .with_context("path", path.display().to_string())
        .with_hint(err.to_string());
    if err.is_io_error() {
        McError::Io(info)
    } else {
        McError::Serde(info)
    }
}
