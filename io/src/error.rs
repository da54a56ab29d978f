use std::path::PathBuf;

use solid_closure::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("scan data of {len} bytes is not a whole number of {record}-byte records")]
    TruncatedRecord { len: usize, record: usize },
    #[error("malformed {format} scan: {reason}")]
    MalformedScan { format: &'static str, reason: String },
    #[error("no scan reader for {0:?}")]
    UnsupportedFormat(PathBuf),
    #[error("malformed ground truth at line {line}: {reason}")]
    MalformedGroundTruth { line: usize, reason: String },
    #[error("directory {0:?} does not exist")]
    MissingDirectory(PathBuf),
    #[error(transparent)]
    Session(#[from] SessionError),
}
