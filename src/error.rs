//! 错误类型
//!
//! Every failure of the loader surfaces as a [`KittiError`] at the point where it is first
//! detected. Nothing is retried and nothing falls back to a default.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KittiError>;

#[derive(Debug, Error)]
pub enum KittiError {
    /// The image directory handed to the accessor does not exist.
    #[error("path does not exist: {}", .path.display())]
    PathNotFound { path: PathBuf },

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed calibration line.
    #[error("calibration parse error at {}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// The directory name does not end in `_<integer>`.
    #[error("cannot extract a sequence id from '{segment}'")]
    SequenceIdFormat { segment: String },

    /// `K_0N:` only covers single digit camera numbers.
    #[error("sequence id {id} is outside the K_00..K_09 calibration key convention")]
    UnsupportedSequenceId { id: u32 },

    #[error("calibration key not found: {key}")]
    KeyNotFound { key: String },

    #[error("calibration value '{key}' is a vector of {len} values, not a matrix")]
    NotAMatrix { key: String, len: usize },

    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("sequence has no images")]
    EmptySequence,

    #[error("found {images} images but {timestamps} timestamps")]
    TimestampCountMismatch { images: usize, timestamps: usize },

    /// Image file names must be zero-padded frame numbers of one common width.
    #[error("bad image file name {}: {message}", .path.display())]
    FilenameFormat { path: PathBuf, message: String },

    #[error("cannot read timestamp table {}: {source}", .path.display())]
    TimestampTable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("bad timestamp '{value}': {message}")]
    TimestampFormat { value: String, message: String },

    #[error("cannot decode {}: {message}", .path.display())]
    Decode { path: PathBuf, message: String },
}

impl KittiError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
