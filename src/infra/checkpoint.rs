// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores RnnLm weights as full-precision named
// MessagePack, so a restored model computes exactly what the
// trained one did.
//
// Layout of a model's checkpoint directory:
//   models/<model-name>/
//     model.mpk        ← weights
//
// The architecture itself comes from the model's YAML config,
// so loading fails if the config and the checkpoint disagree.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use std::path::PathBuf;

use crate::ml::model::RnnLm;

const WEIGHTS_FILE: &str = "model";

type WeightsRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write weights to {dir}/model.mpk, creating the directory.
    /// Training lives outside this crate; tests use this to produce checkpoints.
    #[cfg(test)]
    pub fn save_model<B: Backend>(&self, model: &RnnLm<B>) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.dir.join(WEIGHTS_FILE);

        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        tracing::debug!("Saved checkpoint to '{}'", path.display());
        Ok(())
    }

    /// Load weights into `model`, which must have the saved architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  RnnLm<B>,
        device: &B::Device,
    ) -> Result<RnnLm<B>> {
        let path = self.dir.join(WEIGHTS_FILE);

        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Has the model been trained?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }
}
