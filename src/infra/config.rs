// ============================================================
// Layer 6 — Configuration
// ============================================================
// Two kinds of configuration live here:
//
//   ManagerConfig   where things are on disk:
//     config/               model YAML files (one per catalog entry)
//     cached_data/<dataset>/{train,valid,test}.txt
//     cached_data/records/  persisted state recordings
//     models/<model-name>/  trained weights
//
//   TrainConfig     the YAML file describing one trained model.
//     It is read once when the model is loaded and paired with
//     the model handle for the rest of the process lifetime.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub config_dir: PathBuf,
    pub data_dir:   PathBuf,
    pub model_dir:  PathBuf,
    pub record_dir: PathBuf,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("config"),
            data_dir:   PathBuf::from("cached_data"),
            model_dir:  PathBuf::from("models"),
            record_dir: PathBuf::from("cached_data/records"),
        }
    }
}

impl ManagerConfig {
    /// All four roots below a single base directory
    #[cfg(test)]
    pub fn rooted_at(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            config_dir: base.join("config"),
            data_dir:   base.join("cached_data"),
            model_dir:  base.join("models"),
            record_dir: base.join("cached_data").join("records"),
        }
    }

    pub fn config_file(&self, file_name: &str) -> PathBuf {
        self.config_dir.join(file_name)
    }

    /// Directory holding a model's weights and vocabulary
    pub fn checkpoint_dir(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(model_name)
    }

    pub fn dataset_dir(&self, dataset: &str) -> PathBuf {
        self.data_dir.join(dataset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Lstm,
    Gru,
}

/// Architecture and data settings of one trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub name:           String,
    pub dataset:        String,
    pub cell_type:      CellType,
    pub layer_num:      usize,
    pub layer_size:     usize,
    pub embedding_size: usize,
    pub vocab_size:     usize,
    /// Window length the model was trained with
    pub num_steps:      usize,
    #[serde(default = "default_batch_size")]
    pub batch_size:     usize,
}

fn default_batch_size() -> usize {
    20
}

impl TrainConfig {
    /// Parse a model YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Cannot read model config '{}'", path.display()))?;
        let cfg: TrainConfig = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Malformed model config '{}'", path.display()))?;
        anyhow::ensure!(cfg.layer_num > 0, "'{}' declares no layers", path.display());
        anyhow::ensure!(cfg.num_steps > 0, "'{}' declares num_steps = 0", path.display());
        Ok(cfg)
    }
}
