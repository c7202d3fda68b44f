use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::record::{parse_records, ParsedRecords, RawRecord};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Csv,
}

impl RecordFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => RecordFormat::Csv,
            _ => RecordFormat::Json,
        }
    }
}

/// Reads raw records from a JSON array or a CSV file with a header row.
pub fn read_raw_records(path: &Path) -> Result<Vec<RawRecord>, ImportError> {
    match RecordFormat::from_path(path) {
        RecordFormat::Json => {
            let bytes = fs::read(path).map_err(|source| ImportError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_slice(&bytes).map_err(|source| ImportError::Json {
                path: path.to_path_buf(),
                source,
            })
        }
        RecordFormat::Csv => {
            let csv_err = |source: csv::Error| ImportError::Csv {
                path: path.to_path_buf(),
                source,
            };
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_path(path)
                .map_err(csv_err)?;
            reader
                .deserialize::<RawRecord>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(csv_err)
        }
    }
}

/// Reads and validates a record file. A missing file is an empty history.
pub fn load_records(path: &Path) -> Result<ParsedRecords, ImportError> {
    if !path.exists() {
        log::info!("no record file at {}, starting empty", path.display());
        return Ok(ParsedRecords::default());
    }
    let raw = read_raw_records(path)?;
    let parsed = parse_records(&raw);
    log::debug!(
        "loaded {} records from {} ({} invalid)",
        parsed.records.len(),
        path.display(),
        parsed.invalid
    );
    Ok(parsed)
}
