use std::path::PathBuf;

/// Everything that can go wrong while resolving splits and loading videos.
///
/// Variants fall into three groups: configuration (unknown dataset, split
/// index, bad loader settings), data (missing or malformed store entries,
/// inconsistent split files) and usage (sample index out of range). All of
/// them carry the identifier, index or path needed to locate the problem.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Dataset name matched none of the registry entries.
    #[error("dataset not found: {name:?} (known: {known})")]
    UnknownDataset { name: String, known: String },

    /// The split file has fewer records than the requested index.
    #[error("split index {index} out of range: split file has {len} records")]
    SplitIndexOutOfRange { index: usize, len: usize },

    /// Sample index past the end of a loaded partition.
    #[error("sample index {index} out of range for partition of {len} videos")]
    SampleIndexOutOfRange { index: usize, len: usize },

    /// Partition mode string other than "train"/"test".
    #[error("unknown partition mode {0:?}, expected \"train\" or \"test\"")]
    UnknownMode(String),

    /// Loader or registry settings that cannot work.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No store backend handles this file.
    #[error("unsupported feature store {}: {reason}", path.display())]
    UnsupportedStore { path: PathBuf, reason: String },

    /// A video named in the split has no such array in the store.
    #[error("missing key: video {video:?} has no {array:?} array in the feature store")]
    MissingKey { video: String, array: String },

    /// A stored array has the wrong rank or an unsupported dtype.
    #[error("invalid array {key:?}: {reason}")]
    InvalidArray { key: String, reason: String },

    /// Feature rows and score entries disagree for one video.
    #[error("video {video:?} has {frames} feature rows but {scores} scores")]
    LengthMismatch {
        video: String,
        frames: usize,
        scores: usize,
    },

    /// The same video is listed in both partitions of a split record.
    #[error("split record {record}: video {video:?} is in both train_keys and test_keys")]
    OverlappingKeys { record: usize, video: String },

    /// A video is listed twice in one partition.
    #[error("split record {record}: video {video:?} appears more than once in {mode}_keys")]
    DuplicateKey {
        record: usize,
        mode: crate::Mode,
        video: String,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backend-specific failure while reading the store.
    #[error("feature store error: {0}")]
    Store(String),

    #[error(transparent)]
    Tensor(#[from] vsumm_core::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }
}

#[cfg(feature = "hdf5")]
impl From<hdf5::Error> for Error {
    fn from(e: hdf5::Error) -> Self {
        Error::Store(e.to_string())
    }
}

/// Convenience Result type used throughout vsumm-data.
pub type Result<T> = std::result::Result<T, Error>;
