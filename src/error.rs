use std::path::PathBuf;
use thiserror::Error;

/// Bound on the `_copy` suffix retries performed when `no_overwrite` is set.
pub const MAX_COPY_ATTEMPTS: usize = 10;

/// Error kinds surfaced by the processing core.
///
/// Per-item errors (`Decode`, `Encode`, `PathExhaustion`) are caught at the
/// worker boundary and reported as that item's batch result; they never abort
/// sibling items. `EmptyBatch` is the only run-level error and is raised
/// before any item is dispatched.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Input file unreadable or corrupt.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Destination unwritable or the encoder rejected the image.
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Batch invoked with zero items.
    #[error("no files in input")]
    EmptyBatch,

    /// The `no_overwrite` retry bound was exceeded.
    #[error("too many copies in the folder, can not save file: {path}")]
    PathExhaustion { path: PathBuf },
}
