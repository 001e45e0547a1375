// Tests for vsumm-data: split resolution, VideoDataset, DataLoader, get_loader

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use safetensors::tensor::{Dtype, TensorView};
use tempfile::TempDir;
use vsumm_data::{
    get_loader, DataLoader, DataLoaderConfig, Dataset, DatasetKind, DatasetRegistry, Error,
    LoaderOptions, Mode, VideoDataset,
};

const FEATURE_DIM: usize = 10;

// Fixture: a SumMe-shaped corpus in a temp dir

struct Corpus {
    dir: TempDir,
    registry: DatasetRegistry,
}

/// Write `videos` (name, frames) into a safetensors store. Feature row `t`
/// of a video is filled with `t`, its score is `t / frames`.
fn write_store(path: &Path, videos: &[(&str, usize)]) {
    let mut buffers: Vec<(String, Vec<usize>, Vec<u8>)> = Vec::new();
    for &(name, frames) in videos {
        let features: Vec<u8> = (0..frames)
            .flat_map(|t| std::iter::repeat(t as f32).take(FEATURE_DIM))
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let labels: Vec<u8> = (0..frames)
            .map(|t| t as f32 / frames as f32)
            .flat_map(|v| v.to_le_bytes())
            .collect();
        buffers.push((format!("{name}/feature"), vec![frames, FEATURE_DIM], features));
        buffers.push((format!("{name}/label"), vec![frames], labels));
    }

    let views: Vec<(&str, TensorView<'_>)> = buffers
        .iter()
        .map(|(key, shape, bytes)| {
            let view = TensorView::new(Dtype::F32, shape.clone(), bytes).unwrap();
            (key.as_str(), view)
        })
        .collect();
    fs::write(path, safetensors::serialize(views, None).unwrap()).unwrap();
}

fn corpus(splits_json: &str, videos: &[(&str, usize)]) -> Corpus {
    let dir = TempDir::new().unwrap();
    let splits_dir = dir.path().join("splits");
    fs::create_dir_all(&splits_dir).unwrap();
    fs::write(splits_dir.join("summe_splits.json"), splits_json).unwrap();

    let store = dir.path().join("summe.safetensors");
    write_store(&store, videos);

    let registry = DatasetRegistry::new(&splits_dir).with_store(DatasetKind::SumMe, &store);
    Corpus { dir, registry }
}

const ONE_FOLD: &str = r#"[{"train_keys": ["v1", "v2"], "test_keys": ["v3"]}]"#;
const VIDEOS: &[(&str, usize)] = &[("v1", 5), ("v2", 3), ("v3", 4)];

// Split resolution

#[test]
fn test_resolve_split() {
    let c = corpus(ONE_FOLD, VIDEOS);
    let (kind, record) = c.registry.resolve_split("SUMME", 0).unwrap();
    assert_eq!(kind, DatasetKind::SumMe);
    assert_eq!(record.keys(Mode::Train), &["v1", "v2"]);
    assert_eq!(record.keys(Mode::Test), &["v3"]);
}

#[test]
fn test_train_and_test_keys_disjoint() {
    let folds = r#"[
        {"train_keys": ["v1", "v2"], "test_keys": ["v3"]},
        {"train_keys": ["v2", "v3"], "test_keys": ["v1"]},
        {"train_keys": ["v3", "v1"], "test_keys": ["v2"]}
    ]"#;
    let c = corpus(folds, VIDEOS);
    for split in 0..3 {
        let (_, record) = c.registry.resolve_split("summe", split).unwrap();
        let train: HashSet<&String> = record.train_keys.iter().collect();
        assert!(record.test_keys.iter().all(|k| !train.contains(k)));
    }
}

#[test]
fn test_overlapping_fold_rejected() {
    let c = corpus(
        r#"[{"train_keys": ["v1", "v2"], "test_keys": ["v2"]}]"#,
        VIDEOS,
    );
    let err = VideoDataset::new(&c.registry, Mode::Train, "SumMe", 0).unwrap_err();
    assert!(matches!(err, Error::OverlappingKeys { record: 0, ref video } if video == "v2"));
}

// VideoDataset

#[test]
fn test_scenario_one_fold() {
    let c = corpus(ONE_FOLD, VIDEOS);
    let train = VideoDataset::new(&c.registry, Mode::Train, "SumMe", 0).unwrap();
    let test = VideoDataset::new(&c.registry, Mode::Test, "SumMe", 0).unwrap();

    assert_eq!(train.len(), 2);
    assert_eq!(test.len(), 1);
    assert_eq!(train.kind(), Some(DatasetKind::SumMe));
    assert_eq!(train.split_index(), Some(0));
    assert_eq!(train.name(), "SumMe");

    let first = train.get(0).unwrap();
    assert_eq!(first.video, "v1");
    assert_eq!(first.features.dims(), &[5, FEATURE_DIM]);
    assert_eq!(first.scores.dims(), &[5]);
    assert_eq!(first.features.row(3).unwrap(), &[3.0; FEATURE_DIM]);
    assert_eq!(first.scores.as_slice()[1], 0.2);
}

#[test]
fn test_feature_rows_match_scores() {
    let c = corpus(ONE_FOLD, VIDEOS);
    for mode in Mode::ALL {
        let ds = VideoDataset::new(&c.registry, mode, "summe", 0).unwrap();
        for sample in ds.iter() {
            assert_eq!(sample.features.dims()[0], sample.scores.dims()[0]);
        }
    }
}

#[test]
fn test_get_in_range_and_past_end() {
    let c = corpus(ONE_FOLD, VIDEOS);
    let ds = VideoDataset::new(&c.registry, Mode::Train, "SumMe", 0).unwrap();
    for i in 0..ds.len() {
        assert!(ds.get(i).is_ok());
    }
    let err = ds.get(ds.len()).unwrap_err();
    assert!(matches!(err, Error::SampleIndexOutOfRange { index: 2, len: 2 }));
}

#[test]
fn test_split_index_out_of_range() {
    let c = corpus(ONE_FOLD, VIDEOS);
    let err = VideoDataset::new(&c.registry, Mode::Train, "SumMe", 1).unwrap_err();
    assert!(matches!(err, Error::SplitIndexOutOfRange { index: 1, len: 1 }));
}

#[test]
fn test_unknown_dataset() {
    let c = corpus(ONE_FOLD, VIDEOS);
    let err = VideoDataset::new(&c.registry, Mode::Train, "XSum", 0).unwrap_err();
    assert!(matches!(err, Error::UnknownDataset { ref name, .. } if name == "XSum"));
}

#[test]
fn test_registered_but_absent_dataset() {
    // TVSum is a known corpus but this registry has no store for it.
    let c = corpus(ONE_FOLD, VIDEOS);
    let err = VideoDataset::new(&c.registry, Mode::Train, "TVSum", 0).unwrap_err();
    assert!(matches!(err, Error::UnknownDataset { .. }));
}

#[test]
fn test_video_missing_from_store() {
    let c = corpus(ONE_FOLD, &[("v1", 5), ("v3", 4)]);
    let err = VideoDataset::new(&c.registry, Mode::Train, "SumMe", 0).unwrap_err();
    assert!(matches!(err, Error::MissingKey { ref video, .. } if video == "v2"));
}

#[test]
fn test_missing_split_file() {
    let c = corpus(ONE_FOLD, VIDEOS);
    fs::remove_file(c.dir.path().join("splits/summe_splits.json")).unwrap();
    let err = VideoDataset::new(&c.registry, Mode::Test, "SumMe", 0).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn test_malformed_split_file() {
    let c = corpus("{not json", VIDEOS);
    let err = VideoDataset::new(&c.registry, Mode::Test, "SumMe", 0).unwrap_err();
    assert!(matches!(err, Error::Json { .. }));
}

#[test]
fn test_registry_from_json_file() {
    let c = corpus(ONE_FOLD, VIDEOS);
    let config = c.dir.path().join("registry.json");
    fs::write(
        &config,
        r#"{"splits_dir": "splits", "stores": {"SumMe": "summe.safetensors"}}"#,
    )
    .unwrap();

    let registry = DatasetRegistry::from_json_file(&config).unwrap();
    let ds = VideoDataset::new(&registry, Mode::Train, "summe", 0).unwrap();
    assert_eq!(ds.len(), 2);
}

// DataLoader / get_loader

#[test]
fn test_iteration_yields_every_key_once() {
    let c = corpus(ONE_FOLD, VIDEOS);
    let options = LoaderOptions::default();
    let (mut train, mut test) = get_loader(&c.registry, "SumMe", 0, &options).unwrap();

    for _ in 0..3 {
        let seen: Vec<String> = train.iter().flat_map(|b| b.unwrap().videos).collect();
        let unique: HashSet<&String> = seen.iter().collect();
        assert_eq!(seen.len(), 2);
        assert_eq!(unique.len(), 2);
        assert!(unique.contains(&"v1".to_string()) && unique.contains(&"v2".to_string()));
    }
    assert_eq!(train.epoch(), 3);

    let test_batches = test.epoch_batches().unwrap();
    assert_eq!(test_batches.len(), 1);
    assert_eq!(test_batches[0].videos, vec!["v3"]);
}

#[test]
fn test_test_loader_keeps_split_order() {
    let folds = r#"[{"train_keys": ["v1"], "test_keys": ["v3", "v2", "v4"]}]"#;
    let c = corpus(folds, &[("v1", 2), ("v2", 3), ("v3", 4), ("v4", 5)]);
    let options = LoaderOptions::default().batch_test(2);
    let (_, mut test) = get_loader(&c.registry, "SumMe", 0, &options).unwrap();

    let batches = test.epoch_batches().unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].videos, vec!["v3", "v2"]);
    assert_eq!(batches[1].videos, vec!["v4"]);
    assert_eq!(batches[1].features[0].dims(), &[5, FEATURE_DIM]);

    // Ragged batch cannot be stacked; a single-video batch can.
    assert!(batches[0].stack().is_err());
    let (features, scores) = batches[1].stack().unwrap();
    assert_eq!(features.dims(), &[1, 5, FEATURE_DIM]);
    assert_eq!(scores.dims(), &[1, 5]);
}

#[test]
fn test_train_loader_reshuffles_each_epoch() {
    let names: Vec<String> = (0..32).map(|i| format!("video_{i}")).collect();
    let videos: Vec<(&str, usize)> = names.iter().map(|n| (n.as_str(), 2)).collect();
    let folds = serde_json::json!([{ "train_keys": &names, "test_keys": [] }]).to_string();
    let c = corpus(&folds, &videos);

    let options = LoaderOptions::default().batch_train(32).seed(3);
    let (mut train, _) = get_loader(&c.registry, "SumMe", 0, &options).unwrap();
    let first = train.epoch_batches().unwrap().remove(0).videos;
    let second = train.epoch_batches().unwrap().remove(0).videos;
    assert_ne!(first, second);

    let mut a = first.clone();
    let mut b = second.clone();
    a.sort();
    b.sort();
    assert_eq!(a, b);

    // Same seed, fresh loader: same first epoch.
    let (mut again, _) = get_loader(&c.registry, "SumMe", 0, &options).unwrap();
    assert_eq!(again.epoch_batches().unwrap().remove(0).videos, first);
}

#[test]
fn test_zero_batch_size_rejected() {
    let c = corpus(ONE_FOLD, VIDEOS);
    let options = LoaderOptions::default().batch_train(0);
    let err = get_loader(&c.registry, "SumMe", 0, &options).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn test_custom_loader_over_video_dataset() {
    let c = corpus(ONE_FOLD, VIDEOS);
    let ds = VideoDataset::new(&c.registry, Mode::Train, "SumMe", 0).unwrap();
    let config = DataLoaderConfig::default().batch_size(2).num_workers(2);
    let mut loader = DataLoader::new(ds, config).unwrap();
    assert_eq!(loader.num_batches(), 1);

    let batch = loader.iter().next().unwrap().unwrap();
    assert_eq!(batch.videos, vec!["v1", "v2"]);
    assert_eq!(loader.dataset().total_frames(), 8);
}
