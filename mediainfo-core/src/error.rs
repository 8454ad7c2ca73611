use std::path::PathBuf;

use thiserror::Error;

/// The only error class `analyze` propagates: a failed `stat`/`open`.
/// Format mismatches and malformed payloads recover locally into a
/// minimal or partial `Report` instead of reaching here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
