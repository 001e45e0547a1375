// split-inspect — resolve one fold of SumMe/TVSum and summarise it
//
// Run from a directory holding the conventional `data/` layout:
//   cargo run -p split-inspect --features hdf5 -- summe 0
// or point it at a registry file:
//   cargo run -p split-inspect -- tvsum 2 --config my_registry.json

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vsumm_data::{get_loader, Dataset, DatasetRegistry, LoaderOptions, Mode};

#[derive(Debug, Parser)]
#[command(about = "Load both partitions of a split and print what they hold")]
struct Args {
    /// Dataset name (SumMe or TVSum, any case).
    video_type: String,

    /// Fold index into the dataset's split file.
    split_index: usize,

    /// Registry JSON mapping dataset names to feature stores.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 1)]
    batch_train: usize,

    #[arg(long, default_value_t = 1)]
    batch_test: usize,

    /// Seed for the train shuffle.
    #[arg(long)]
    seed: Option<u64>,

    /// Print only one partition ("train" or "test").
    #[arg(long)]
    only: Option<Mode>,
}

fn run(args: Args) -> vsumm_data::Result<()> {
    let registry = match &args.config {
        Some(path) => DatasetRegistry::from_json_file(path)?,
        None => DatasetRegistry::default(),
    };

    let mut options = LoaderOptions::default()
        .batch_train(args.batch_train)
        .batch_test(args.batch_test);
    if let Some(seed) = args.seed {
        options = options.seed(seed);
    }

    let (mut train, mut test) =
        get_loader(&registry, &args.video_type, args.split_index, &options)?;

    for (mode, loader) in [(Mode::Train, &mut train), (Mode::Test, &mut test)] {
        if args.only.is_some_and(|only| only != mode) {
            continue;
        }
        let ds = loader.dataset();
        println!(
            "{mode}: {} videos, {} frames, feature dim {}",
            ds.len(),
            ds.total_frames(),
            ds.feature_dim().map_or("-".to_string(), |d| d.to_string()),
        );
        for batch in loader.iter() {
            let batch = batch?;
            for (video, features, scores) in batch.iter() {
                let total: f32 = scores.as_slice().iter().sum();
                let mean = total / scores.elem_count().max(1) as f32;
                println!("  {video:<16} {} mean score {mean:.3}", features.shape());
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
