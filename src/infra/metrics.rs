// ============================================================
// Layer 6 — Evaluation Metrics Logger
// ============================================================
// Appends one row per canonical recording run to
//   <record_dir>/<dataset>/<model>/eval_metrics.csv
//
// Example:
//   split,windows,steps,perplexity
//   valid,3685,73700,121.532100
//   test,4121,82430,118.004500
//
// Perplexity is exp(mean negative log-likelihood) over every
// step whose next token was known.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Summary of one evaluation run over a feeder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub windows:    usize,
    pub steps:      usize,
    pub perplexity: f64,
}

impl EvalMetrics {
    pub fn new(windows: usize, steps: usize, perplexity: f64) -> Self {
        Self { windows, steps, perplexity }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("eval_metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "split,windows,steps,perplexity")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, split: &str, m: &EvalMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(f, "{},{},{},{:.6}", split, m.windows, m.steps, m.perplexity)?;

        tracing::debug!(
            "Logged {} metrics: steps={}, perplexity={:.4}",
            split, m.steps, m.perplexity,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
