// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Streams a Feeder through a model one token at a time and
// hands per-step state to a Recorder.
//
// Documents:
//   A new EvalDoc opens at the start of every window and every
//   `record_every` steps inside a window. Each document carries
//   the ids streamed while it was open and one StepRecord per id.
//
// Validation happens before the first step, so a rejected feeder
// never reaches the recorder:
//   - batch size must be 1
//   - 0 < record_every <= buffer_size
//   - every id must be inside the model's vocabulary

use thiserror::Error;

use crate::data::producer::Feeder;
use crate::domain::record::{EvalDoc, StepRecord};
use crate::domain::traits::{Recorder, RnnModel};
use crate::infra::metrics::EvalMetrics;

/// Probability floor when scoring a target token
const MIN_PROB: f64 = 1e-12;

#[derive(Debug, Error)]
pub enum EvalError {
    /// The input does not fit the evaluator (too long, wrong batch, bad id)
    #[error("{0}")]
    Shape(String),

    #[error("model step failed: {0:#}")]
    Model(anyhow::Error),

    #[error("recorder failed: {0:#}")]
    Storage(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluator {
    pub batch_size:   usize,
    pub num_steps:    usize,
    /// Steps per recorded document
    pub record_every: usize,
    /// Most steps a single document may hold
    pub buffer_size:  usize,
    pub verbose:      bool,
}

impl Evaluator {
    pub fn new(batch_size: usize, num_steps: usize, buffer_size: usize, verbose: bool) -> Self {
        Self { batch_size, num_steps, record_every: num_steps, buffer_size, verbose }
    }

    fn validate(&self, model: &dyn RnnModel, feeder: &Feeder) -> Result<(), EvalError> {
        if self.batch_size != 1 {
            return Err(EvalError::Shape(format!(
                "batch size {} is not supported, expected 1", self.batch_size
            )));
        }
        if self.record_every == 0 {
            return Err(EvalError::Shape("record_every must be positive".into()));
        }
        if self.record_every > self.buffer_size {
            return Err(EvalError::Shape(format!(
                "sequence length {} exceeds the record buffer of {} steps",
                self.record_every, self.buffer_size
            )));
        }

        let vocab_size = model.vocabulary().len();
        let bad_id = feeder
            .windows()
            .iter()
            .flat_map(|w| w.inputs.iter())
            .find(|&&id| id as usize >= vocab_size);
        if let Some(id) = bad_id {
            return Err(EvalError::Shape(format!(
                "word id {id} outside vocabulary of {vocab_size}"
            )));
        }
        Ok(())
    }

    /// Run every window of `feeder` and record it under `dataset`.
    pub fn evaluate_and_record(
        &self,
        model:    &dyn RnnModel,
        feeder:   &Feeder,
        recorder: &mut dyn Recorder,
        dataset:  &str,
        verbose:  bool,
    ) -> Result<EvalMetrics, EvalError> {
        self.validate(model, feeder)?;
        if verbose {
            tracing::debug!(
                "Evaluating {} windows ({} steps) of {}", feeder.len(), feeder.total_steps(), dataset
            );
        }

        let mut state     = model.initial_state();
        let mut nll_sum   = 0.0f64;
        let mut nll_count = 0usize;
        let mut doc_index = 0usize;
        let mut steps     = 0usize;

        for (w, window) in feeder.windows().iter().enumerate() {
            if window.reset_state {
                state = model.initial_state();
            }

            let len = window.inputs.len();
            for start in (0..len).step_by(self.record_every) {
                let end = (start + self.record_every).min(len);
                let mut records = Vec::with_capacity(end - start);
                let mut doc_nll = 0.0f64;
                let mut doc_n   = 0usize;

                for i in start..end {
                    let word_id = window.inputs[i];
                    let out = model.step(&state, word_id).map_err(EvalError::Model)?;

                    if let Some(&target) = window.inputs.get(i + 1) {
                        let p = out.probs.get(target as usize).copied().unwrap_or(0.0) as f64;
                        doc_nll -= p.max(MIN_PROB).ln();
                        doc_n   += 1;
                    }

                    records.push(StepRecord { word_id, states: out.state.snapshot() });
                    state = out.state;
                }

                let doc = EvalDoc {
                    dataset:      dataset.to_string(),
                    model:        model.name().to_string(),
                    index:        doc_index,
                    record_every: self.record_every,
                    inputs:       window.inputs[start..end].to_vec(),
                    loss:         (doc_n > 0).then(|| (doc_nll / doc_n as f64) as f32),
                };
                recorder.record(doc, records).map_err(EvalError::Storage)?;

                doc_index += 1;
                nll_sum   += doc_nll;
                nll_count += doc_n;
                steps     += end - start;
            }

            if verbose && (w + 1) % 100 == 0 {
                tracing::debug!("Evaluated {}/{} windows ({} steps)", w + 1, feeder.len(), steps);
            }
        }

        recorder.flush().map_err(EvalError::Storage)?;

        let perplexity = if nll_count > 0 {
            (nll_sum / nll_count as f64).exp()
        } else {
            f64::NAN
        };
        let metrics = EvalMetrics::new(feeder.len(), steps, perplexity);

        if self.verbose {
            tracing::info!(
                "Evaluated '{}' on {}: {} windows, {} steps, {} documents, perplexity={:.3}",
                model.name(), dataset, metrics.windows, metrics.steps, doc_index, metrics.perplexity
            );
        }
        Ok(metrics)
    }
}
