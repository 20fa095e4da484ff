use std::path::Path;

use chrono::NaiveDateTime;

use crate::config::KITTI_TIMESTAMP_FORMAT;
use crate::error::{KittiError, Result};

/// Nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn as_sec(&self) -> f64 {
        self.0 as f64 / 1e9
    }
    /// dt, widened so any two representable timestamps can be subtracted
    pub fn duration_since(&self, other: &Timestamp) -> f64 {
        (i128::from(self.0) - i128::from(other.0)) as f64 / 1e9
    }

    /// Parses KITTI's `2011-09-26 13:02:25.964389445`, read as UTC.
    pub fn parse_kitti(value: &str) -> Result<Self> {
        let bad = |message: String| KittiError::TimestampFormat {
            value: value.to_string(),
            message,
        };
        let datetime = NaiveDateTime::parse_from_str(value.trim(), KITTI_TIMESTAMP_FORMAT)
            .map_err(|e| bad(e.to_string()))?;
        let nanos = datetime
            .and_utc()
            .timestamp_nanos_opt()
            .ok_or_else(|| bad("outside the representable range".to_string()))?;
        Ok(Self(nanos))
    }
}

/// 时间戳表
///
/// One row per line of the timestamp file, no header, kept as the raw strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimestampTable {
    rows: Vec<String>,
}

impl TimestampTable {
    pub fn read(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| KittiError::io(path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| table_error(path, e))?;
            if record.len() != 1 {
                return Err(KittiError::TimestampFormat {
                    value: record.iter().collect::<Vec<_>>().join(","),
                    message: format!("expected one column, found {}", record.len()),
                });
            }
            rows.push(record[0].to_string());
        }
        log::debug!("read {} timestamps from {}", rows.len(), path.display());
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.rows.get(index).map(String::as_str)
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(String::as_str)
    }

    pub fn parse_row(&self, index: usize) -> Result<Timestamp> {
        let row = self.get(index).ok_or(KittiError::IndexOutOfRange {
            index,
            len: self.len(),
        })?;
        Timestamp::parse_kitti(row)
    }
}

/// I/O failures surface as `Io`, everything else csv reports as `TimestampTable`.
fn table_error(path: &Path, err: csv::Error) -> KittiError {
    if err.is_io_error() {
        let source = match err.into_kind() {
            csv::ErrorKind::Io(source) => source,
            other => std::io::Error::other(format!("{other:?}")),
        };
        return KittiError::io(path, source);
    }
    KittiError::TimestampTable {
        path: path.to_path_buf(),
        source: err,
    }
}

impl From<Vec<String>> for TimestampTable {
    fn from(rows: Vec<String>) -> Self {
        Self { rows }
    }
}
