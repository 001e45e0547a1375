// Dataset trait — indexed access to loaded samples

use crate::error::Result;

/// A dataset is an indexed collection of samples.
///
/// Implementations must be `Send + Sync` so a [`DataLoader`](crate::DataLoader)
/// can fetch samples from several rayon workers at once.
pub trait Dataset: Send + Sync {
    /// What `get` returns.
    type Sample;

    /// Total number of samples in the dataset.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the sample at position `index`.
    ///
    /// Fails with an out-of-range error if `index >= self.len()`.
    fn get(&self, index: usize) -> Result<Self::Sample>;

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}

/// Turns the samples of one loader step into a batch.
pub trait Collate: Sized {
    type Batch;

    /// Collate `samples`, given in presentation order.
    fn collate(samples: Vec<Self>) -> Result<Self::Batch>;
}
