// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Persists a dataset's vocabulary as a HuggingFace WordLevel
// tokenizer (cached_data/<dataset>/tokenizer-<vocab_size>.json).
// Models trained on the same dataset with the same vocabulary
// size share one file.
//
// Ids are assigned by descending corpus frequency so that the
// first k ids are the k most frequent words. `<unk>` and `<eos>`
// are always part of the vocabulary.
//
// The JSON is written directly instead of going through the
// trainer API, then loaded back with Tokenizer::from_file so the
// file on disk is always one the tokenizers crate accepts.

use anyhow::{Context, Result};
use std::{collections::HashMap, path::PathBuf};
use tokenizers::Tokenizer;

use crate::domain::token::{Vocabulary, EOS_TOKEN, UNK_TOKEN};

pub struct TokenizerStore {
    dir:  PathBuf,
    file: String,
}

impl TokenizerStore {
    /// Store whose file name records the vocabulary size
    pub fn for_vocab_size(dir: impl Into<PathBuf>, vocab_size: usize) -> Self {
        Self { dir: dir.into(), file: format!("tokenizer-{vocab_size}.json") }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Load an existing vocabulary or build one from corpus lines.
    /// `lines` is only called when nothing is on disk yet.
    pub fn load_or_build(
        &self,
        lines:      impl FnOnce() -> Result<Vec<String>>,
        vocab_size: usize,
    ) -> Result<Vocabulary> {
        if self.exists() {
            tracing::info!("Loading vocabulary from '{}'", self.path().display());
            self.load()
        } else {
            tracing::info!("Building new vocabulary (vocab_size={})", vocab_size);
            self.build_and_save(&lines()?, vocab_size)
        }
    }

    /// Load a previously saved vocabulary
    pub fn load(&self) -> Result<Vocabulary> {
        let path = self.path();
        let tokenizer = Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))?;
        Ok(to_vocabulary(&tokenizer))
    }

    fn build_and_save(&self, lines: &[String], vocab_size: usize) -> Result<Vocabulary> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // ── Step 1: Rank words by frequency ───────────────────────────────────
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for line in lines {
            for word in line.split_whitespace() {
                *freq.entry(word).or_insert(0) += 1;
            }
            *freq.entry(EOS_TOKEN).or_insert(0) += 1;
        }
        freq.entry(UNK_TOKEN).or_insert(0);

        let mut words: Vec<(&str, usize)> = freq.into_iter().collect();
        // Ties broken alphabetically so rebuilding gives identical ids
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut kept: Vec<String> = words
            .iter()
            .take(vocab_size.max(1))
            .map(|(w, _)| w.to_string())
            .collect();
        if !kept.iter().any(|w| w == UNK_TOKEN) {
            kept.pop();
            kept.push(UNK_TOKEN.to_string());
        }

        // ── Step 2: Write tokenizer JSON in HuggingFace format ────────────────
        let vocab: serde_json::Map<String, serde_json::Value> = kept
            .iter()
            .enumerate()
            .map(|(id, w)| (w.clone(), serde_json::json!(id)))
            .collect();

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": { "type": "WhitespaceSplit" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let tok_path = self.path();
        std::fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", tok_path.display()))?;

        tracing::info!(
            "Vocabulary built with {} words, saved to '{}'",
            kept.len(),
            tok_path.display()
        );

        // Load back so the saved file is known to be readable
        self.load()
    }
}

fn to_vocabulary(tokenizer: &Tokenizer) -> Vocabulary {
    let size  = tokenizer.get_vocab_size(true) as u32;
    let words = (0..size)
        .map(|id| tokenizer.id_to_token(id).unwrap_or_else(|| UNK_TOKEN.to_string()))
        .collect();
    Vocabulary::new(words)
}
