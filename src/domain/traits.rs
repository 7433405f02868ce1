// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer drives models and recorders only
// through these traits:
//   - BurnRnnModel implements RnnModel (ml layer)
//   - BufferRecorder / StateRecorder implement Recorder (infra)
//   - Tests plug in a deterministic fake model

use anyhow::Result;
use std::path::Path;

use crate::domain::record::{EvalDoc, RecurrentState, StepOutput, StepRecord};
use crate::domain::token::Vocabulary;

// ─── RnnModel ─────────────────────────────────────────────────────────────────
/// A loaded, stateful-by-value recurrent language model.
///
/// `step` must not mutate the state it is given: callers that
/// explore several continuations from one prefix rely on every
/// branch owning an independent copy.
pub trait RnnModel {
    /// Model name from its configuration (keys checkpoints and records)
    fn name(&self) -> &str;

    fn vocabulary(&self) -> &Vocabulary;

    /// Number of stacked recurrent layers
    fn layer_num(&self) -> usize;

    /// Names of the per-layer states a StepRecord will contain
    fn state_names(&self) -> Vec<&'static str>;

    /// State before any token has been consumed
    fn initial_state(&self) -> RecurrentState;

    /// Consume `word_id` from `state` and return the next state
    /// together with the distribution over the following token.
    fn step(&self, state: &RecurrentState, word_id: u32) -> Result<StepOutput>;

    /// Load trained weights from a checkpoint directory
    fn restore(&mut self, checkpoint_dir: &Path) -> Result<()>;
}

// ─── Recorder ─────────────────────────────────────────────────────────────────
/// A sink for recorded evaluation documents.
pub trait Recorder {
    /// Accept one finished document and its per-step records
    fn record(&mut self, doc: EvalDoc, steps: Vec<StepRecord>) -> Result<()>;

    /// Make everything accepted so far durable (no-op for memory sinks)
    fn flush(&mut self) -> Result<()>;
}
