// ============================================================
// Layer 2 — Model Cache
// ============================================================
// Maps a logical model name to a loaded model, its training
// configuration and its evaluator. Loading happens on first
// use and at most once per name:
//
//   1. Look the name up in the catalog     (unknown → None)
//   2. Build the model from its YAML file  (ModelBuilder)
//   3. Restore trained weights, unless the model is opened
//      for training                        (missing → fatal)
//   4. Install model + config together
//
// Nothing is inserted when any step fails, so a cached entry
// always holds a fully restored model.

use std::{collections::HashMap, path::PathBuf};

use crate::application::outcome::ManagerError;
use crate::domain::traits::RnnModel;
use crate::infra::config::{ManagerConfig, TrainConfig};
use crate::ml::builder::ModelBuilder;
use crate::ml::evaluator::Evaluator;

/// Logical name → model YAML file in the config directory
pub const CATALOG: [(&str, &str); 4] = [
    ("PTB-LSTM",    "lstm.yml"),
    ("Shakespeare", "shakespeare.yml"),
    ("IMDB",        "imdb-tiny.yml"),
    ("PTB-GRU",     "gru.yml"),
];

// Evaluator construction parameters shared by every model
const EVAL_BATCH_SIZE: usize = 1;
const EVAL_NUM_STEPS: usize = 1;
const EVAL_BUFFER_SIZE: usize = 100;

pub struct LoadedModel {
    pub model:     Box<dyn RnnModel>,
    pub config:    TrainConfig,
    pub evaluator: Evaluator,
}

pub struct ModelCache {
    paths:   ManagerConfig,
    builder: Box<dyn ModelBuilder>,
    models:  HashMap<String, LoadedModel>,
}

impl ModelCache {
    pub fn new(paths: ManagerConfig, builder: Box<dyn ModelBuilder>) -> Self {
        Self { paths, builder, models: HashMap::new() }
    }

    pub fn available_models() -> Vec<&'static str> {
        CATALOG.iter().map(|(name, _)| *name).collect()
    }

    fn catalog_file(name: &str) -> Option<&'static str> {
        CATALOG.iter().find(|(n, _)| *n == name).map(|(_, file)| *file)
    }

    /// Path of the YAML file behind `name`, if it is in the catalog
    pub fn config_filename(&self, name: &str) -> Option<PathBuf> {
        Self::catalog_file(name).map(|file| self.paths.config_file(file))
    }

    /// Loaded model for `name`, loading it on first use.
    /// `Ok(None)` means the name is not in the catalog.
    pub fn resolve(&mut self, name: &str, train: bool) -> Result<Option<&mut LoadedModel>, ManagerError> {
        let Some(file) = Self::catalog_file(name) else {
            tracing::warn!("Cannot find model with name {}", name);
            return Ok(None);
        };

        if !self.models.contains_key(name) {
            let loaded = self.load(name, file, train)?;
            self.models.insert(name.to_string(), loaded);
        }
        Ok(self.models.get_mut(name))
    }

    fn load(&self, name: &str, file: &str, train: bool) -> Result<LoadedModel, ManagerError> {
        let config_path = self.paths.config_file(file);
        let (mut model, config) = self
            .builder
            .build(&config_path)
            .map_err(|error| ManagerError::Build { name: name.to_string(), error })?;

        if !train {
            let ckpt_dir = self.paths.checkpoint_dir(model.name());
            if !ckpt_dir.is_dir() {
                return Err(ManagerError::MissingCheckpoint {
                    model: model.name().to_string(),
                    path:  ckpt_dir,
                });
            }
            model
                .restore(&ckpt_dir)
                .map_err(|error| ManagerError::Restore { name: name.to_string(), error })?;
        }

        tracing::info!(
            "Loaded model '{}' as {} (dataset={}, num_steps={}, train={})",
            model.name(), name, config.dataset, config.num_steps, train
        );
        let evaluator = Evaluator::new(EVAL_BATCH_SIZE, EVAL_NUM_STEPS, EVAL_BUFFER_SIZE, true);
        Ok(LoadedModel { model, config, evaluator })
    }

    /// Drop a loaded model together with its configuration.
    /// Returns whether anything was cached under `name`.
    pub fn invalidate(&mut self, name: &str) -> bool {
        let removed = self.models.remove(name).is_some();
        if removed {
            tracing::info!("Dropped cached model {}", name);
        }
        removed
    }
}
