// VideoDataset — one partition of one split, loaded eagerly
//
// Construction resolves the split, opens the dataset's feature store, reads
// `<id>/feature` and `<id>/label` for every video of the partition in split
// order, and drops the store handle before returning. Any failure aborts the
// whole load.

use vsumm_core::Tensor;

use crate::dataset::{Collate, Dataset};
use crate::error::{Error, Result};
use crate::registry::{DatasetKind, DatasetRegistry};
use crate::splits::{Mode, SplitRecord};
use crate::store::{open_store, FeatureStore};

/// One video: its identifier, `[T, D]` features and `[T]` importance scores.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSample {
    pub video: String,
    pub features: Tensor,
    pub scores: Tensor,
}

impl VideoSample {
    /// Number of time steps `T`.
    pub fn num_frames(&self) -> usize {
        self.scores.elem_count()
    }

    /// Feature dimension `D`.
    pub fn feature_dim(&self) -> usize {
        self.features.dims().get(1).copied().unwrap_or(0)
    }
}

/// The samples of one loader step, in presentation order.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoBatch {
    pub videos: Vec<String>,
    pub features: Vec<Tensor>,
    pub scores: Vec<Tensor>,
}

impl VideoBatch {
    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// Stack into `[B, T, D]` features and `[B, T]` scores.
    ///
    /// Only possible when every video in the batch has the same length;
    /// otherwise fails with a shape mismatch. With the default batch size of
    /// one this always succeeds.
    pub fn stack(&self) -> Result<(Tensor, Tensor)> {
        let features = Tensor::stack(&self.features)?;
        let scores = Tensor::stack(&self.scores)?;
        Ok((features, scores))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor, &Tensor)> {
        self.videos
            .iter()
            .zip(&self.features)
            .zip(&self.scores)
            .map(|((v, f), s)| (v.as_str(), f, s))
    }
}

impl Collate for VideoSample {
    type Batch = VideoBatch;

    fn collate(samples: Vec<Self>) -> Result<VideoBatch> {
        let mut batch = VideoBatch {
            videos: Vec::with_capacity(samples.len()),
            features: Vec::with_capacity(samples.len()),
            scores: Vec::with_capacity(samples.len()),
        };
        for s in samples {
            batch.videos.push(s.video);
            batch.features.push(s.features);
            batch.scores.push(s.scores);
        }
        Ok(batch)
    }
}

/// A train or test partition held fully in memory.
#[derive(Debug, Clone)]
pub struct VideoDataset {
    mode: Mode,
    kind: Option<DatasetKind>,
    split_index: Option<usize>,
    samples: Vec<VideoSample>,
}

impl VideoDataset {
    /// Load partition `mode` of fold `split_index` of dataset `video_type`.
    ///
    /// `video_type` is matched case-insensitively against the registry.
    pub fn new(
        registry: &DatasetRegistry,
        mode: Mode,
        video_type: &str,
        split_index: usize,
    ) -> Result<Self> {
        let (kind, record) = registry.resolve_split(video_type, split_index)?;
        let store = open_store(registry.store_path(kind)?)?;
        let mut dataset = Self::from_store(mode, &record, store.as_ref())?;
        drop(store);

        dataset.kind = Some(kind);
        dataset.split_index = Some(split_index);
        tracing::info!(
            dataset = %kind,
            mode = %mode,
            split = split_index,
            videos = dataset.len(),
            frames = dataset.total_frames(),
            "loaded partition"
        );
        Ok(dataset)
    }

    /// Load partition `mode` of `record` from a store the caller manages.
    pub fn from_store(mode: Mode, record: &SplitRecord, store: &dyn FeatureStore) -> Result<Self> {
        let keys = record.keys(mode);
        let mut samples = Vec::with_capacity(keys.len());
        for video in keys {
            let (features, scores) = store.read_video(video)?;
            tracing::debug!(video = %video, shape = %features.shape(), "read video");
            samples.push(VideoSample {
                video: video.clone(),
                features,
                scores,
            });
        }

        Ok(Self {
            mode,
            kind: None,
            split_index: None,
            samples,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The corpus, when loaded through a registry.
    pub fn kind(&self) -> Option<DatasetKind> {
        self.kind
    }

    /// The fold, when loaded through a registry.
    pub fn split_index(&self) -> Option<usize> {
        self.split_index
    }

    /// Video identifiers in partition order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.samples.iter().map(|s| s.video.as_str())
    }

    /// Feature dimension shared by the partition, or `None` when empty.
    pub fn feature_dim(&self) -> Option<usize> {
        self.samples.first().map(VideoSample::feature_dim)
    }

    /// Sum of `T` over all videos.
    pub fn total_frames(&self) -> usize {
        self.samples.iter().map(VideoSample::num_frames).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VideoSample> {
        self.samples.iter()
    }
}

impl Dataset for VideoDataset {
    type Sample = VideoSample;

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn get(&self, index: usize) -> Result<VideoSample> {
        self.samples
            .get(index)
            .cloned()
            .ok_or(Error::SampleIndexOutOfRange {
                index,
                len: self.samples.len(),
            })
    }

    fn name(&self) -> &str {
        self.kind.map(|k| k.name()).unwrap_or("videos")
    }
}
