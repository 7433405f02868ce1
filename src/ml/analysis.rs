// ============================================================
// Layer 5 — Recorded State Analysis
// ============================================================
// Read-only statistics over the states persisted by canonical
// recording runs:
//
//   state_signature       random sample of step vectors
//   empirical_strength    mean state vector per frequent word
//   tsne_projection       2D t-SNE of one layer's states
//
// A step vector is one StepRecord's state for `state_name`,
// with the requested layers concatenated in the order given.

use rand::{rngs::StdRng, seq::index, SeedableRng};
use serde_json::{json, Value};
use thiserror::Error;

use crate::domain::record::StepRecord;
use crate::infra::record_store::RecordStore;
use crate::ml::tsne::{self, TsneConfig};

/// Fixed so that repeated requests return the same sample
const SAMPLE_SEED: u64 = 0x5eed;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no recorded states for model '{model}' on dataset '{dataset}'")]
    NoRecords { dataset: String, model: String },

    #[error("state '{0}' was not recorded")]
    UnknownState(String),

    #[error("layer {layer} is out of range for a model with {layer_num} layers")]
    LayerOutOfRange { layer: usize, layer_num: usize },

    #[error("cannot read recorded states: {0:#}")]
    Storage(anyhow::Error),
}

pub struct StateAnalyzer {
    store: RecordStore,
}

impl StateAnalyzer {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    fn steps(&self, dataset: &str, model: &str) -> Result<Vec<StepRecord>, AnalysisError> {
        let evals = self.store.load(dataset, model).map_err(AnalysisError::Storage)?;
        let steps: Vec<StepRecord> = evals.into_iter().flat_map(|e| e.steps).collect();
        if steps.is_empty() {
            return Err(AnalysisError::NoRecords {
                dataset: dataset.to_string(),
                model:   model.to_string(),
            });
        }
        Ok(steps)
    }

    /// (input word id, step vector) for every recorded step
    fn vectors(
        &self,
        dataset:    &str,
        model:      &str,
        state_name: &str,
        layers:     &[usize],
    ) -> Result<Vec<(u32, Vec<f32>)>, AnalysisError> {
        let steps = self.steps(dataset, model)?;

        let layer_num = steps[0]
            .states
            .get(state_name)
            .map(Vec::len)
            .ok_or_else(|| AnalysisError::UnknownState(state_name.to_string()))?;
        if let Some(&layer) = layers.iter().find(|&&l| l >= layer_num) {
            return Err(AnalysisError::LayerOutOfRange { layer, layer_num });
        }

        steps
            .iter()
            .map(|s| {
                s.flatten(state_name, layers)
                    .map(|v| (s.word_id, v))
                    .ok_or_else(|| AnalysisError::UnknownState(state_name.to_string()))
            })
            .collect()
    }

    /// Up to `sample_size` step vectors drawn without replacement.
    pub fn state_signature(
        &self,
        dataset:     &str,
        model:       &str,
        state_name:  &str,
        layers:      &[usize],
        sample_size: usize,
    ) -> Result<Vec<Vec<f32>>, AnalysisError> {
        let vectors = self.vectors(dataset, model, state_name, layers)?;
        let picked  = sample_indices(vectors.len(), sample_size);
        Ok(picked.into_iter().map(|i| vectors[i].1.clone()).collect())
    }

    /// Row `w` is the mean step vector over steps whose input was word `w`,
    /// for `w < top_k`. Words never seen as input get a zero row.
    pub fn empirical_strength(
        &self,
        dataset:    &str,
        model:      &str,
        state_name: &str,
        layers:     &[usize],
        top_k:      usize,
    ) -> Result<Vec<Vec<f32>>, AnalysisError> {
        let vectors = self.vectors(dataset, model, state_name, layers)?;
        let dim     = vectors[0].1.len();

        let mut sums   = vec![vec![0.0f64; dim]; top_k];
        let mut counts = vec![0usize; top_k];
        for (word_id, v) in &vectors {
            let w = *word_id as usize;
            if w >= top_k {
                continue;
            }
            for (s, x) in sums[w].iter_mut().zip(v) {
                *s += *x as f64;
            }
            counts[w] += 1;
        }

        Ok(sums
            .into_iter()
            .zip(counts)
            .map(|(row, n)| {
                if n == 0 {
                    vec![0.0; dim]
                } else {
                    row.into_iter().map(|s| (s / n as f64) as f32).collect()
                }
            })
            .collect())
    }

    /// t-SNE of up to `sample_size` states of one layer.
    pub fn tsne_projection(
        &self,
        dataset:     &str,
        model:       &str,
        state_name:  &str,
        layer:       usize,
        sample_size: usize,
        init_dims:   usize,
        perplexity:  f64,
    ) -> Result<Vec<[f32; 2]>, AnalysisError> {
        let vectors = self.vectors(dataset, model, state_name, &[layer])?;
        let sample: Vec<Vec<f32>> = sample_indices(vectors.len(), sample_size)
            .into_iter()
            .map(|i| vectors[i].1.clone())
            .collect();

        let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
        let reduced = tsne::random_projection(&sample, init_dims, &mut rng);

        tracing::info!(
            "Running t-SNE on {} states of layer {} ({} -> {} dims)",
            reduced.len(), layer, sample.first().map_or(0, Vec::len), init_dims
        );
        let cfg = TsneConfig { perplexity, seed: SAMPLE_SEED, ..TsneConfig::default() };
        Ok(tsne::tsne(&reduced, &cfg))
    }
}

/// Sorted indices of a seeded sample of `k` out of `n`
fn sample_indices(n: usize, k: usize) -> Vec<usize> {
    let mut rng    = StdRng::seed_from_u64(SAMPLE_SEED);
    let mut picked = index::sample(&mut rng, n, k.min(n)).into_vec();
    picked.sort_unstable();
    picked
}

pub fn strength_to_json(strength: &[Vec<f32>], words: &[String]) -> Value {
    json!({ "words": words, "strength": strength })
}

/// `labels[i]` is the layer of point `i`; `states_num[l]` counts points of layer `l`.
pub fn solution_to_json(points: &[[f32; 2]], labels: &[usize], states_num: &[usize]) -> Value {
    json!({ "points": points, "labels": labels, "states_num": states_num })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{EvalDoc, RecordedEval, STATE_H};
    use std::collections::BTreeMap;

    /// Two-layer hidden state: layer 0 = [word id], layer 1 = [word id * 10, 1]
    fn step(word_id: u32) -> StepRecord {
        let w = word_id as f32;
        let mut states = BTreeMap::new();
        states.insert(STATE_H.to_string(), vec![vec![w], vec![w * 10.0, 1.0]]);
        StepRecord { word_id, states }
    }

    fn store_with(ids: &[u32]) -> (tempfile::TempDir, StateAnalyzer) {
        let dir   = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let eval  = RecordedEval {
            doc: EvalDoc {
                dataset:      "toy".into(),
                model:        "m".into(),
                index:        0,
                record_every: ids.len(),
                inputs:       ids.to_vec(),
                loss:         None,
            },
            steps: ids.iter().map(|&i| step(i)).collect(),
        };
        store.replace("toy", "m", &[eval]).unwrap();
        (dir, StateAnalyzer::new(store))
    }

    #[test]
    fn test_signature_concatenates_layers() {
        let (_dir, a) = store_with(&[2]);
        let sig = a.state_signature("toy", "m", STATE_H, &[1, 0], 10).unwrap();
        assert_eq!(sig, vec![vec![20.0, 1.0, 2.0]]);
    }

    #[test]
    fn test_signature_sample_is_bounded_and_stable() {
        let (_dir, a) = store_with(&(0..50).collect::<Vec<_>>());
        let first = a.state_signature("toy", "m", STATE_H, &[0], 10).unwrap();
        let again = a.state_signature("toy", "m", STATE_H, &[0], 10).unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first, again);
    }

    #[test]
    fn test_strength_averages_per_word() {
        let (_dir, a) = store_with(&[0, 1, 1, 5]);
        let s = a.empirical_strength("toy", "m", STATE_H, &[1], 3).unwrap();
        assert_eq!(s, vec![vec![0.0, 1.0], vec![10.0, 1.0], vec![0.0, 0.0]]);
    }

    #[test]
    fn test_missing_records_and_bad_queries() {
        let (_dir, a) = store_with(&[1]);
        assert!(matches!(
            a.state_signature("toy", "other", STATE_H, &[0], 5),
            Err(AnalysisError::NoRecords { .. })
        ));
        assert!(matches!(
            a.state_signature("toy", "m", "state_c", &[0], 5),
            Err(AnalysisError::UnknownState(_))
        ));
        assert!(matches!(
            a.state_signature("toy", "m", STATE_H, &[2], 5),
            Err(AnalysisError::LayerOutOfRange { layer: 2, layer_num: 2 })
        ));
    }

    #[test]
    fn test_projection_has_one_point_per_sampled_state() {
        let (_dir, a) = store_with(&(0..12).collect::<Vec<_>>());
        let points = a.tsne_projection("toy", "m", STATE_H, 1, 8, 50, 40.0).unwrap();
        assert_eq!(points.len(), 8);
    }

    #[test]
    fn test_json_shapes() {
        let v = strength_to_json(&[vec![0.5]], &["the".to_string()]);
        assert_eq!(v["words"][0], "the");
        assert_eq!(v["strength"][0][0], 0.5);

        let v = solution_to_json(&[[1.0, 2.0]], &[0], &[1, 0]);
        assert_eq!(v["points"][0][1], 2.0);
        assert_eq!(v["states_num"], json!([1, 0]));
    }
}
