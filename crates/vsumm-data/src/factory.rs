// get_loader — train/test loaders for one fold

use crate::error::{Error, Result};
use crate::loader::{DataLoader, DataLoaderConfig};
use crate::registry::DatasetRegistry;
use crate::splits::Mode;
use crate::video::VideoDataset;

/// Settings for [`get_loader`].
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Batch size of the train loader.
    pub batch_train: usize,
    /// Batch size of the test loader.
    pub batch_test: usize,
    /// Seed for the train loader's per-epoch shuffle.
    pub seed: Option<u64>,
    /// Rayon workers used to fetch samples (0 = sequential).
    pub num_workers: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            batch_train: 1,
            batch_test: 1,
            seed: None,
            num_workers: 0,
        }
    }
}

impl LoaderOptions {
    pub fn batch_train(mut self, bs: usize) -> Self {
        self.batch_train = bs;
        self
    }

    pub fn batch_test(mut self, bs: usize) -> Self {
        self.batch_test = bs;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    /// Reject settings no loader can run with.
    pub fn validate(&self) -> Result<()> {
        for (name, bs) in [("batch_train", self.batch_train), ("batch_test", self.batch_test)] {
            if bs == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }

    fn config(&self, mode: Mode) -> DataLoaderConfig {
        let config = match mode {
            Mode::Train => DataLoaderConfig::default()
                .batch_size(self.batch_train)
                .shuffle(true),
            Mode::Test => DataLoaderConfig::default().batch_size(self.batch_test),
        }
        .num_workers(self.num_workers);

        match self.seed {
            Some(seed) => config.seed(seed),
            None => config,
        }
    }
}

/// Build the `(train, test)` loaders of fold `split_index` of `video_type`.
///
/// The train loader reshuffles at the start of every pass; the test loader
/// keeps split order. Options are checked before anything is read; both
/// partitions are then loaded eagerly before this returns.
pub fn get_loader(
    registry: &DatasetRegistry,
    video_type: &str,
    split_index: usize,
    options: &LoaderOptions,
) -> Result<(DataLoader<VideoDataset>, DataLoader<VideoDataset>)> {
    options.validate()?;
    let train = VideoDataset::new(registry, Mode::Train, video_type, split_index)?;
    let test = VideoDataset::new(registry, Mode::Test, video_type, split_index)?;
    Ok((
        DataLoader::new(train, options.config(Mode::Train))?,
        DataLoader::new(test, options.config(Mode::Test))?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = LoaderOptions::default();
        assert_eq!((opts.batch_train, opts.batch_test), (1, 1));

        let train = opts.config(Mode::Train);
        assert!(train.shuffle);
        assert_eq!(train.batch_size, 1);
        let test = opts.config(Mode::Test);
        assert!(!test.shuffle);
    }

    #[test]
    fn test_options_flow_into_configs() {
        let opts = LoaderOptions::default()
            .batch_train(4)
            .batch_test(2)
            .seed(11)
            .num_workers(2);
        let train = opts.config(Mode::Train);
        assert_eq!((train.batch_size, train.seed, train.num_workers), (4, Some(11), 2));
        assert_eq!(opts.config(Mode::Test).batch_size, 2);
    }

    #[test]
    fn test_validate_batch_sizes() {
        assert!(LoaderOptions::default().validate().is_ok());
        let err = LoaderOptions::default().batch_test(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref m) if m.contains("batch_test")));
    }

    #[test]
    fn test_bad_options_fail_before_loading() {
        // The store does not exist: reaching it would give an Io error instead.
        let registry = DatasetRegistry::new("/nonexistent/splits")
            .with_store(crate::DatasetKind::SumMe, "/nonexistent/summe.safetensors");
        let options = LoaderOptions::default().batch_train(0);
        let err = get_loader(&registry, "SumMe", 0, &options).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref m) if m.contains("batch_train")));
    }
}
