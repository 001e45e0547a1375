// Dataset registry — where each corpus lives on disk
//
// Each supported corpus is bound to exactly one feature store, and all
// corpora share a splits directory holding `<name>_splits.json` files. The
// default registry mirrors the conventional layout:
//
//   data/
//   ├── SumMe/fcsn_summe.h5
//   ├── TVSum/fcsn_tvsum.h5
//   └── splits/
//       ├── summe_splits.json
//       └── tvsum_splits.json
//
// The registry can also be read from a JSON file:
//
//   {
//     "splits_dir": "splits",
//     "stores": { "SumMe": "summe.safetensors", "TVSum": "tvsum.safetensors" }
//   }
//
// Relative paths in such a file are resolved against the file's directory.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::splits::{SplitDefinition, SplitRecord};

/// The video-summarization corpora this crate knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatasetKind {
    SumMe,
    TVSum,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [DatasetKind::SumMe, DatasetKind::TVSum];

    /// Canonical display name.
    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::SumMe => "SumMe",
            DatasetKind::TVSum => "TVSum",
        }
    }

    /// Lowercased name, used to derive the split file name.
    pub fn slug(&self) -> &'static str {
        match self {
            DatasetKind::SumMe => "summe",
            DatasetKind::TVSum => "tvsum",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Result<Self> {
        DatasetKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownDataset {
                name: name.to_string(),
                known: known_names(&DatasetKind::ALL),
            })
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DatasetKind::from_name(s)
    }
}

fn known_names(kinds: &[DatasetKind]) -> String {
    kinds.iter().map(|k| k.name()).collect::<Vec<_>>().join(", ")
}

/// On-disk shape of a registry file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    splits_dir: Option<PathBuf>,
    #[serde(default)]
    stores: BTreeMap<String, PathBuf>,
}

/// Maps dataset names to feature stores and locates split files.
#[derive(Debug, Clone)]
pub struct DatasetRegistry {
    splits_dir: PathBuf,
    stores: HashMap<DatasetKind, PathBuf>,
}

impl Default for DatasetRegistry {
    fn default() -> Self {
        Self::new("./data/splits")
            .with_store(DatasetKind::SumMe, "./data/SumMe/fcsn_summe.h5")
            .with_store(DatasetKind::TVSum, "./data/TVSum/fcsn_tvsum.h5")
    }
}

impl DatasetRegistry {
    /// An empty registry reading split files from `splits_dir`.
    pub fn new(splits_dir: impl Into<PathBuf>) -> Self {
        Self {
            splits_dir: splits_dir.into(),
            stores: HashMap::new(),
        }
    }

    /// Bind `kind` to the feature store at `path`, replacing any earlier binding.
    pub fn with_store(mut self, kind: DatasetKind, path: impl Into<PathBuf>) -> Self {
        self.stores.insert(kind, path.into());
        self
    }

    pub fn with_splits_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.splits_dir = dir.into();
        self
    }

    /// Read a registry from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let file: RegistryFile = serde_json::from_str(&content).map_err(|e| Error::json(path, e))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_file(file, base)
    }

    /// Parse registry JSON held in memory; relative paths resolve against `base_dir`.
    pub fn from_json_str(json: &str, base_dir: impl AsRef<Path>) -> Result<Self> {
        let file: RegistryFile =
            serde_json::from_str(json).map_err(|e| Error::json("<inline registry json>", e))?;
        Self::from_file(file, base_dir.as_ref())
    }

    fn from_file(file: RegistryFile, base: &Path) -> Result<Self> {
        let splits_dir = match file.splits_dir {
            Some(dir) => base.join(dir),
            None => base.join("splits"),
        };

        let mut registry = Self::new(splits_dir);
        for (name, store) in file.stores {
            let kind = DatasetKind::from_name(&name).map_err(|_| {
                Error::InvalidConfig(format!(
                    "registry names unknown dataset {name:?} (known: {})",
                    known_names(&DatasetKind::ALL)
                ))
            })?;
            registry.stores.insert(kind, base.join(store));
        }
        Ok(registry)
    }

    pub fn splits_dir(&self) -> &Path {
        &self.splits_dir
    }

    /// Datasets with a bound store, in canonical order.
    pub fn kinds(&self) -> Vec<DatasetKind> {
        let mut kinds: Vec<DatasetKind> = self.stores.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Resolve a dataset name against the registered stores.
    pub fn kind(&self, name: &str) -> Result<DatasetKind> {
        match DatasetKind::from_name(name) {
            Ok(kind) if self.stores.contains_key(&kind) => Ok(kind),
            _ => Err(Error::UnknownDataset {
                name: name.to_string(),
                known: known_names(&self.kinds()),
            }),
        }
    }

    /// Feature store path bound to `kind`.
    pub fn store_path(&self, kind: DatasetKind) -> Result<&Path> {
        self.stores
            .get(&kind)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::UnknownDataset {
                name: kind.name().to_string(),
                known: known_names(&self.kinds()),
            })
    }

    /// `<splits_dir>/<lowercased name>_splits.json`
    pub fn splits_path(&self, kind: DatasetKind) -> PathBuf {
        self.splits_dir.join(format!("{}_splits.json", kind.slug()))
    }

    /// Parse the split file of `kind`.
    pub fn load_splits(&self, kind: DatasetKind) -> Result<SplitDefinition> {
        SplitDefinition::load(self.splits_path(kind))
    }

    /// Resolve `(video_type, split_index)` to a validated fold.
    pub fn resolve_split(
        &self,
        video_type: &str,
        split_index: usize,
    ) -> Result<(DatasetKind, SplitRecord)> {
        let kind = self.kind(video_type)?;
        let def = self.load_splits(kind)?;
        let record = def.record(split_index)?.clone();
        tracing::debug!(
            dataset = %kind,
            split = split_index,
            train = record.train_keys.len(),
            test = record.test_keys.len(),
            "resolved split"
        );
        Ok((kind, record))
    }
}
