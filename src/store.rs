/// Persistence — named model records and raw lyric records.
///
/// [`RonStore`] keeps one RON file per record under a root directory:
///
/// ```text
/// <root>/markov/<name>.ron   ModelRecord { name, order, counts }
/// <root>/lyrics/<name>.ron   LyricRecord { name, body }
/// ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::core::markov::{MarkovError, MarkovModel};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("model not found: {0:?}")]
    ModelNotFound(String),
    #[error("invalid record name: {0:?}")]
    InvalidName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),
    #[error("markov error: {0}")]
    Markov(#[from] MarkovError),
}

/// Persisted form of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub name: String,
    pub order: usize,
    pub counts: BTreeMap<String, u32>,
}

impl ModelRecord {
    pub fn from_model(name: &str, model: &MarkovModel) -> Self {
        Self {
            name: name.to_string(),
            order: model.order(),
            counts: model.counts().into_iter().collect(),
        }
    }

    pub fn into_model(self) -> Result<MarkovModel, MarkovError> {
        MarkovModel::from_counts(self.order, self.counts)
    }
}

/// One raw corpus entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricRecord {
    pub name: String,
    pub body: String,
}

/// Storage for models and corpus text.
pub trait Store {
    /// Load a model by name. Fails with [`StoreError::ModelNotFound`].
    fn load_model(&self, name: &str) -> Result<MarkovModel, StoreError>;
    /// Insert or replace a model.
    fn save_model(&self, name: &str, model: &MarkovModel) -> Result<(), StoreError>;
    /// Names of all stored models, sorted.
    fn list_models(&self) -> Result<Vec<String>, StoreError>;
    /// Insert or replace a lyric.
    fn save_lyric(&self, name: &str, body: &str) -> Result<(), StoreError>;
    /// Every lyric body, ordered by record name.
    fn load_lyrics(&self) -> Result<Vec<String>, StoreError>;
}

/// Directory of RON files.
#[derive(Debug, Clone)]
pub struct RonStore {
    root: PathBuf,
}

impl RonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn models_dir(&self) -> PathBuf {
        self.root.join("markov")
    }

    fn lyrics_dir(&self) -> PathBuf {
        self.root.join("lyrics")
    }

    fn record_path(dir: &Path, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(dir.join(format!("{}.ron", name)))
    }
}

/// Record names become file stems, so path syntax is rejected.
fn validate_name(name: &str) -> Result<(), StoreError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn write_ron<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())?;
    fs::write(path, serialized)?;
    Ok(())
}

/// Sorted stems of the `.ron` files in `dir`; a missing directory is empty.
fn record_names(dir: &Path) -> Result<Vec<String>, StoreError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "ron") {
            if let Some(stem) = path.file_stem() {
                names.push(stem.to_string_lossy().to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

impl Store for RonStore {
    fn load_model(&self, name: &str) -> Result<MarkovModel, StoreError> {
        let path = Self::record_path(&self.models_dir(), name)?;
        if !path.is_file() {
            return Err(StoreError::ModelNotFound(name.to_string()));
        }
        let contents = fs::read_to_string(&path)?;
        let record: ModelRecord = ron::from_str(&contents)?;
        let model = record.into_model()?;
        info!(name, order = model.order(), grams = model.len(), "loaded model");
        Ok(model)
    }

    fn save_model(&self, name: &str, model: &MarkovModel) -> Result<(), StoreError> {
        let path = Self::record_path(&self.models_dir(), name)?;
        write_ron(&path, &ModelRecord::from_model(name, model))?;
        info!(name, path = %path.display(), grams = model.len(), "saved model");
        Ok(())
    }

    fn list_models(&self) -> Result<Vec<String>, StoreError> {
        record_names(&self.models_dir())
    }

    fn save_lyric(&self, name: &str, body: &str) -> Result<(), StoreError> {
        let path = Self::record_path(&self.lyrics_dir(), name)?;
        let record = LyricRecord {
            name: name.to_string(),
            body: body.to_string(),
        };
        write_ron(&path, &record)
    }

    fn load_lyrics(&self) -> Result<Vec<String>, StoreError> {
        let dir = self.lyrics_dir();
        let mut bodies = Vec::new();
        for name in record_names(&dir)? {
            let contents = fs::read_to_string(dir.join(format!("{}.ron", name)))?;
            let record: LyricRecord = ron::from_str(&contents)?;
            bodies.push(record.body);
        }
        info!(count = bodies.len(), "loaded lyrics");
        Ok(bodies)
    }
}
