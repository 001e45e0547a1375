// Feature stores — read-only indexed array files
//
// Every video in a store owns two arrays, addressed by path-like keys:
//
//   <video>/feature   [T, D]  frame features (e.g. GoogLeNet pool5, D = 1024)
//   <video>/label     [T]     ground-truth importance score per frame
//
// Backends:
//   - SafetensorsStore — a single .safetensors file with keys as above
//   - MemoryStore      — a map held in memory, for tests and generated data
//   - Hdf5Store        — the published .h5 files (cargo feature `hdf5`)
//
// Stores are only opened for the duration of a dataset load; nothing here
// writes.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use safetensors::tensor::{Dtype, SafeTensorError};
use safetensors::SafeTensors;
use vsumm_core::{DType, Tensor};

use crate::error::{Error, Result};

/// Array holding the `[T, D]` frame features of a video.
pub const FEATURE_ARRAY: &str = "feature";
/// Array holding the `[T]` importance scores of a video.
pub const LABEL_ARRAY: &str = "label";

/// Key of array `array` of video `video`, e.g. `video_1/feature`.
pub fn array_key(video: &str, array: &str) -> String {
    format!("{video}/{array}")
}

/// A read-only store of named arrays.
pub trait FeatureStore {
    /// Fetch the array stored under `key`, or `None` if there is none.
    fn array(&self, key: &str) -> Result<Option<Tensor>>;

    /// Whether `key` names an array in this store.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.array(key)?.is_some())
    }

    /// Read the feature matrix and score vector of one video.
    ///
    /// Fails with [`Error::MissingKey`] when either array is absent,
    /// [`Error::InvalidArray`] when the features are not 2-D or the scores
    /// not 1-D, and [`Error::LengthMismatch`] when their lengths differ.
    fn read_video(&self, video: &str) -> Result<(Tensor, Tensor)> {
        let features = require(self, video, FEATURE_ARRAY)?;
        let scores = require(self, video, LABEL_ARRAY)?;

        if let Err(e) = features.expect_rank(2) {
            return Err(Error::InvalidArray {
                key: array_key(video, FEATURE_ARRAY),
                reason: e.to_string(),
            });
        }
        if let Err(e) = scores.expect_rank(1) {
            return Err(Error::InvalidArray {
                key: array_key(video, LABEL_ARRAY),
                reason: e.to_string(),
            });
        }

        let frames = features.dims()[0];
        let n_scores = scores.dims()[0];
        if frames != n_scores {
            return Err(Error::LengthMismatch {
                video: video.to_string(),
                frames,
                scores: n_scores,
            });
        }
        Ok((features, scores))
    }
}

fn require<S: FeatureStore + ?Sized>(store: &S, video: &str, array: &str) -> Result<Tensor> {
    store
        .array(&array_key(video, array))?
        .ok_or_else(|| Error::MissingKey {
            video: video.to_string(),
            array: array.to_string(),
        })
}

/// Open the store at `path`, choosing a backend from its extension.
///
/// `.safetensors` / `.st` open a [`SafetensorsStore`]; `.h5` / `.hdf5` open
/// an `Hdf5Store` when the `hdf5` feature is enabled.
pub fn open_store(path: impl AsRef<Path>) -> Result<Box<dyn FeatureStore>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "safetensors" | "st" => Ok(Box::new(SafetensorsStore::open(path)?)),
        #[cfg(feature = "hdf5")]
        "h5" | "hdf5" => Ok(Box::new(Hdf5Store::open(path)?)),
        #[cfg(not(feature = "hdf5"))]
        "h5" | "hdf5" => Err(Error::UnsupportedStore {
            path: path.to_path_buf(),
            reason: "HDF5 support requires the `hdf5` feature".to_string(),
        }),
        _ => Err(Error::UnsupportedStore {
            path: path.to_path_buf(),
            reason: format!("unrecognised extension {ext:?}"),
        }),
    }
}

// MemoryStore

/// Arrays held in a plain map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    arrays: HashMap<String, Tensor>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `tensor` under `key`.
    pub fn insert(&mut self, key: impl Into<String>, tensor: Tensor) {
        self.arrays.insert(key.into(), tensor);
    }

    /// Add both arrays of one video.
    pub fn with_video(mut self, video: &str, features: Tensor, scores: Tensor) -> Self {
        self.insert(array_key(video, FEATURE_ARRAY), features);
        self.insert(array_key(video, LABEL_ARRAY), scores);
        self
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

impl FeatureStore for MemoryStore {
    fn array(&self, key: &str) -> Result<Option<Tensor>> {
        Ok(self.arrays.get(key).cloned())
    }
}

// SafetensorsStore

/// Location of one array inside a safetensors buffer.
#[derive(Debug, Clone)]
struct ArrayEntry {
    dtype: Dtype,
    shape: Vec<usize>,
    start: usize,
    end: usize,
}

/// A safetensors file read fully into memory.
///
/// The header is parsed once on open. Arrays may be stored as F16, BF16, F32
/// or F64; they are converted to f32 on access.
pub struct SafetensorsStore {
    path: PathBuf,
    bytes: Vec<u8>,
    index: HashMap<String, ArrayEntry>,
}

impl SafetensorsStore {
    /// Read and validate the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_bytes(path, bytes)
    }

    /// Wrap an in-memory safetensors buffer; `path` is used in error messages.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Self> {
        let path = path.into();
        let store_err = |e: SafeTensorError| Error::Store(format!("{}: {e}", path.display()));

        // Full deserialize checks that every offset lies inside the buffer.
        SafeTensors::deserialize(&bytes).map_err(store_err)?;
        let (header_len, metadata) = SafeTensors::read_metadata(&bytes).map_err(store_err)?;

        // 8-byte length prefix, then the JSON header, then the data section.
        let data_start = 8 + header_len;
        let index: HashMap<String, ArrayEntry> = metadata
            .tensors()
            .into_iter()
            .map(|(name, info)| {
                let (begin, end) = info.data_offsets;
                let entry = ArrayEntry {
                    dtype: info.dtype,
                    shape: info.shape.clone(),
                    start: data_start + begin,
                    end: data_start + end,
                };
                (name, entry)
            })
            .collect();

        tracing::debug!(path = %path.display(), arrays = index.len(), "opened safetensors store");
        Ok(Self { path, bytes, index })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of arrays in the file.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl fmt::Debug for SafetensorsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafetensorsStore")
            .field("path", &self.path)
            .field("arrays", &self.index.len())
            .finish()
    }
}

fn dtype_of(key: &str, dtype: Dtype) -> Result<DType> {
    match dtype {
        Dtype::F16 => Ok(DType::F16),
        Dtype::BF16 => Ok(DType::BF16),
        Dtype::F32 => Ok(DType::F32),
        Dtype::F64 => Ok(DType::F64),
        other => Err(Error::InvalidArray {
            key: key.to_string(),
            reason: format!("unsupported dtype {other:?}"),
        }),
    }
}

impl FeatureStore for SafetensorsStore {
    fn array(&self, key: &str) -> Result<Option<Tensor>> {
        let entry = match self.index.get(key) {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let dtype = dtype_of(key, entry.dtype)?;
        let data = dtype.decode_le(&self.bytes[entry.start..entry.end])?;
        Ok(Some(Tensor::from_vec(data, entry.shape.clone())?))
    }

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.index.contains_key(key))
    }
}

// Hdf5Store

/// The HDF5 layout used by the published SumMe/TVSum feature files.
#[cfg(feature = "hdf5")]
pub struct Hdf5Store {
    file: hdf5::File,
}

#[cfg(feature = "hdf5")]
impl Hdf5Store {
    /// Open `path` read-only. The handle closes when the store is dropped.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = hdf5::File::open(path)?;
        tracing::debug!(path = %path.display(), "opened hdf5 store");
        Ok(Self { file })
    }
}

#[cfg(feature = "hdf5")]
impl FeatureStore for Hdf5Store {
    fn array(&self, key: &str) -> Result<Option<Tensor>> {
        // Check each path component so a missing video group reads as absent.
        let mut prefix = String::with_capacity(key.len());
        for part in key.split('/') {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            if !self.file.link_exists(&prefix) {
                return Ok(None);
            }
        }
        let dataset = self.file.dataset(key)?;
        let shape = dataset.shape();
        let data: Vec<f32> = dataset.read_raw()?;
        Ok(Some(Tensor::from_vec(data, shape)?))
    }
}
