// DataLoader — batching, shuffling, iteration

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};

use rayon::prelude::*;

use crate::dataset::{Collate, Dataset};
use crate::error::{Error, Result};

/// Configuration for the DataLoader.
#[derive(Debug, Clone)]
pub struct DataLoaderConfig {
    /// Number of samples per batch.
    pub batch_size: usize,
    /// Whether to shuffle indices each epoch.
    pub shuffle: bool,
    /// Whether to drop the last incomplete batch.
    pub drop_last: bool,
    /// Number of parallel workers for sample fetching (0 = sequential).
    pub num_workers: usize,
    /// Optional random seed for reproducible shuffling.
    pub seed: Option<u64>,
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            shuffle: false,
            drop_last: false,
            num_workers: 0,
            seed: None,
        }
    }
}

impl DataLoaderConfig {
    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs;
        self
    }

    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }

    pub fn drop_last(mut self, d: bool) -> Self {
        self.drop_last = d;
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }
}

/// A DataLoader owns a Dataset and produces collated batches.
///
/// Every call to [`iter`](DataLoader::iter) starts a new pass (epoch). With
/// `shuffle` on, each pass draws a fresh permutation; with a `seed`, pass `e`
/// uses `seed + e`, so a run is reproducible but epochs still differ.
#[derive(Debug)]
pub struct DataLoader<D: Dataset> {
    dataset: D,
    config: DataLoaderConfig,
    indices: Vec<usize>,
    epoch: u64,
}

impl<D> DataLoader<D>
where
    D: Dataset,
    D::Sample: Collate + Send,
{
    /// Create a new DataLoader over a dataset.
    pub fn new(dataset: D, config: DataLoaderConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".to_string()));
        }
        let indices: Vec<usize> = (0..dataset.len()).collect();
        Ok(Self {
            dataset,
            config,
            indices,
            epoch: 0,
        })
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    pub fn config(&self) -> &DataLoaderConfig {
        &self.config
    }

    /// Number of passes started so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The number of batches per epoch.
    pub fn num_batches(&self) -> usize {
        if self.config.drop_last {
            self.dataset.len() / self.config.batch_size
        } else {
            self.dataset.len().div_ceil(self.config.batch_size)
        }
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Draw a new presentation order for the next pass (no-op without shuffle).
    pub fn reshuffle(&mut self) {
        if !self.config.shuffle {
            return;
        }
        self.indices = (0..self.dataset.len()).collect();
        match self.config.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(self.epoch));
                self.indices.shuffle(&mut rng);
            }
            None => {
                let mut rng = thread_rng();
                self.indices.shuffle(&mut rng);
            }
        }
        tracing::debug!(
            dataset = self.dataset.name(),
            epoch = self.epoch,
            "reshuffled"
        );
    }

    /// Fetch a slice of samples, optionally in parallel via rayon.
    fn fetch_samples(&self, indices: &[usize]) -> Result<Vec<D::Sample>> {
        if self.config.num_workers > 0 && indices.len() > 1 {
            indices.par_iter().map(|&i| self.dataset.get(i)).collect()
        } else {
            indices.iter().map(|&i| self.dataset.get(i)).collect()
        }
    }

    fn batch(&self, batch_idx: usize) -> Option<Result<<D::Sample as Collate>::Batch>> {
        let bs = self.config.batch_size;
        let n = self.indices.len();
        let start = batch_idx * bs;

        if start >= n {
            return None;
        }
        if self.config.drop_last && start + bs > n {
            return None;
        }

        let end = (start + bs).min(n);
        Some(
            self.fetch_samples(&self.indices[start..end])
                .and_then(<D::Sample as Collate>::collate),
        )
    }

    /// Start a pass and iterate over its batches one at a time.
    pub fn iter(&mut self) -> BatchIterator<'_, D> {
        self.reshuffle();
        self.epoch += 1;
        BatchIterator {
            loader: self,
            batch_idx: 0,
        }
    }

    /// Produce all batches for one pass.
    pub fn epoch_batches(&mut self) -> Result<Vec<<D::Sample as Collate>::Batch>> {
        self.iter().collect()
    }
}

/// Iterator that yields one batch at a time.
pub struct BatchIterator<'l, D: Dataset> {
    loader: &'l DataLoader<D>,
    batch_idx: usize,
}

impl<'l, D> Iterator for BatchIterator<'l, D>
where
    D: Dataset,
    D::Sample: Collate + Send,
{
    type Item = Result<<D::Sample as Collate>::Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = self.loader.batch(self.batch_idx)?;
        self.batch_idx += 1;
        Some(batch)
    }
}
