// ============================================================
// Layer 6 — Record Store
// ============================================================
// Durable storage for recorded evaluations, keyed by
// (dataset, model):
//
//   <record_dir>/<dataset>/<model>/records.jsonl
//
// One RecordedEval per line. A recording is written to a
// sibling temp file and renamed into place, so readers see
// either the previous recording or the complete new one.

use anyhow::{Context, Result};
use std::{
    fs,
    io::{BufRead, BufReader, BufWriter, Write},
    path::PathBuf,
};

use crate::domain::record::RecordedEval;

const RECORDS_FILE: &str = "records.jsonl";
const PARTIAL_FILE: &str = "records.jsonl.partial";

#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding everything recorded for one (dataset, model)
    pub fn dir(&self, dataset: &str, model: &str) -> PathBuf {
        self.root.join(dataset).join(model)
    }

    fn records_path(&self, dataset: &str, model: &str) -> PathBuf {
        self.dir(dataset, model).join(RECORDS_FILE)
    }

    /// Make `evals` the recording for (dataset, model), dropping the previous one.
    pub fn replace(&self, dataset: &str, model: &str, evals: &[RecordedEval]) -> Result<()> {
        let dir = self.dir(dataset, model);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create record directory '{}'", dir.display()))?;

        let partial = dir.join(PARTIAL_FILE);
        let file = fs::File::create(&partial)
            .with_context(|| format!("Cannot create '{}'", partial.display()))?;

        let mut writer = BufWriter::new(file);
        for eval in evals {
            serde_json::to_writer(&mut writer, eval)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        drop(writer);

        let path = self.records_path(dataset, model);
        fs::rename(&partial, &path)
            .with_context(|| format!("Cannot move '{}' into place", partial.display()))?;

        tracing::debug!("Wrote {} records to '{}'", evals.len(), path.display());
        Ok(())
    }

    /// All records for (dataset, model); empty when nothing was recorded.
    pub fn load(&self, dataset: &str, model: &str) -> Result<Vec<RecordedEval>> {
        let path = self.records_path(dataset, model);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&path)
            .with_context(|| format!("Cannot open '{}'", path.display()))?;

        let mut evals = Vec::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let eval = serde_json::from_str(&line)
                .with_context(|| format!("Corrupt record at {}:{}", path.display(), n + 1))?;
            evals.push(eval);
        }
        Ok(evals)
    }
}
