// Split definitions — precomputed train/test folds
//
// A split file is a JSON array with one object per cross-validation fold:
//
//   [
//     { "train_keys": ["video_1", "video_4", ...], "test_keys": ["video_2", ...] },
//     { "train_keys": [...], "test_keys": [...] },
//     ...
//   ]
//
// The published SumMe/TVSum files carry five folds. Extra keys on a record
// are ignored.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which partition of a split to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Train,
    Test,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Train, Mode::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Train => "train",
            Mode::Test => "test",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownMode(s.to_string()))
    }
}

/// One fold: the videos assigned to training and to testing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRecord {
    pub train_keys: Vec<String>,
    pub test_keys: Vec<String>,
}

impl SplitRecord {
    pub fn new(
        train_keys: impl IntoIterator<Item = impl Into<String>>,
        test_keys: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            train_keys: train_keys.into_iter().map(Into::into).collect(),
            test_keys: test_keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Video identifiers of one partition, in file order.
    pub fn keys(&self, mode: Mode) -> &[String] {
        match mode {
            Mode::Train => &self.train_keys,
            Mode::Test => &self.test_keys,
        }
    }

    /// Check that no video is listed twice and that the partitions are
    /// disjoint. `record` is the fold position, used in error messages.
    pub fn validate(&self, record: usize) -> Result<()> {
        let mut seen: [HashSet<&str>; 2] = [HashSet::new(), HashSet::new()];
        for (slot, mode) in Mode::ALL.into_iter().enumerate() {
            for key in self.keys(mode) {
                if !seen[slot].insert(key.as_str()) {
                    return Err(Error::DuplicateKey {
                        record,
                        mode,
                        video: key.clone(),
                    });
                }
            }
        }

        // Report in test-key order so the message points at the later list.
        if let Some(video) = self.test_keys.iter().find(|k| seen[0].contains(k.as_str())) {
            return Err(Error::OverlappingKeys {
                record,
                video: video.clone(),
            });
        }
        Ok(())
    }
}

/// All folds of one dataset's split file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SplitDefinition {
    records: Vec<SplitRecord>,
}

impl SplitDefinition {
    pub fn new(records: Vec<SplitRecord>) -> Self {
        Self { records }
    }

    /// Parse a split file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let def: SplitDefinition =
            serde_json::from_str(&content).map_err(|e| Error::json(path, e))?;
        tracing::debug!(path = %path.display(), folds = def.len(), "parsed split file");
        Ok(def)
    }

    /// Parse split JSON held in memory.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::json("<inline split json>", e))
    }

    /// Number of folds.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SplitRecord] {
        &self.records
    }

    /// The validated fold at `index`.
    pub fn record(&self, index: usize) -> Result<&SplitRecord> {
        let record = self
            .records
            .get(index)
            .ok_or(Error::SplitIndexOutOfRange {
                index,
                len: self.records.len(),
            })?;
        record.validate(index)?;
        Ok(record)
    }
}
