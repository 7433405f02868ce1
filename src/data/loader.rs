// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Loads the plain-text split files of one dataset:
//
//   cached_data/<dataset>/
//     train.txt
//     valid.txt
//     test.txt
//
// Files hold one sentence per line with words separated by
// spaces (Penn Treebank style). Blank lines are dropped.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::data::preprocessor::Preprocessor;
use crate::domain::record::Split;

pub struct CorpusLoader {
    dir: PathBuf,
}

impl CorpusLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn split_path(&self, split: Split) -> PathBuf {
        self.dir.join(format!("{split}.txt"))
    }

    /// Cleaned, non-empty lines of one split
    pub fn load_lines(&self, split: Split) -> Result<Vec<String>> {
        let path = self.split_path(split);
        let raw  = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read dataset split '{}'", path.display()))?;

        let lines: Vec<String> = Preprocessor::new()
            .clean(&raw)
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        tracing::info!("Loaded {} lines from '{}'", lines.len(), path.display());
        Ok(lines)
    }
}
