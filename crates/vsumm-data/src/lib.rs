//! # vsumm-data
//!
//! Dataset loading for video-summarization training.
//!
//! This crate provides:
//! - [`DatasetRegistry`] — which feature store and split file each corpus uses
//! - [`SplitDefinition`] — precomputed train/test folds parsed from JSON
//! - [`FeatureStore`] — read-only array stores (safetensors, in-memory, HDF5)
//! - [`VideoDataset`] — one partition of one fold, loaded eagerly
//! - [`DataLoader`] — batching and per-epoch shuffling over any [`Dataset`]
//! - [`get_loader`] — the train/test loader pair for a fold
//
// HDF5 support is behind the `hdf5` feature since it links against libhdf5.

pub mod dataset;
pub mod error;
pub mod factory;
pub mod loader;
pub mod registry;
pub mod splits;
pub mod store;
pub mod video;

pub use dataset::{Collate, Dataset};
pub use error::{Error, Result};
pub use factory::{get_loader, LoaderOptions};
pub use loader::{BatchIterator, DataLoader, DataLoaderConfig};
pub use registry::{DatasetKind, DatasetRegistry};
pub use splits::{Mode, SplitDefinition, SplitRecord};
pub use store::{array_key, open_store, FeatureStore, MemoryStore, SafetensorsStore};
pub use video::{VideoBatch, VideoDataset, VideoSample};

#[cfg(feature = "hdf5")]
pub use store::Hdf5Store;
