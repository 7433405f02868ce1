// ============================================================
// Layer 6 — Recorders
// ============================================================
// Two sinks for the evaluator:
//
//   BufferRecorder   keeps documents in memory and hands them
//                    back to the caller. Used for ad-hoc,
//                    caller-supplied sequences.
//
//   StateRecorder    keeps the first `capacity` documents and
//                    replaces the RecordStore entry with them on
//                    flush. Used for canonical dataset splits,
//                    whose recordings are read back later by the
//                    statistics layer. A run that never flushes
//                    leaves the previous recording untouched.
//
// Both keep at most `capacity` documents and drop later ones
// with a single warning.

use anyhow::Result;

use crate::domain::record::{EvalDoc, RecordedEval, StepRecord};
use crate::domain::traits::Recorder;
use crate::infra::record_store::RecordStore;

pub struct BufferRecorder {
    dataset:   String,
    model:     String,
    capacity:  usize,
    evals:     Vec<RecordedEval>,
    discarded: usize,
}

impl BufferRecorder {
    pub fn new(dataset: impl Into<String>, model: impl Into<String>, capacity: usize) -> Self {
        Self {
            dataset:   dataset.into(),
            model:     model.into(),
            capacity,
            evals:     Vec::new(),
            discarded: 0,
        }
    }

    #[cfg(test)]
    pub fn evals(&self) -> &[RecordedEval] {
        &self.evals
    }

    pub fn into_evals(self) -> Vec<RecordedEval> {
        self.evals
    }

    /// Documents dropped because the buffer was full
    pub fn discarded(&self) -> usize {
        self.discarded
    }
}

impl Recorder for BufferRecorder {
    fn record(&mut self, doc: EvalDoc, steps: Vec<StepRecord>) -> Result<()> {
        if self.evals.len() >= self.capacity {
            if self.discarded == 0 {
                tracing::warn!(
                    "Record buffer for {}/{} is full ({} documents), dropping the rest",
                    self.dataset, self.model, self.capacity
                );
            }
            self.discarded += 1;
            return Ok(());
        }
        self.evals.push(RecordedEval { doc, steps });
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

pub struct StateRecorder {
    store:     RecordStore,
    dataset:   String,
    model:     String,
    capacity:  usize,
    pending:   Vec<RecordedEval>,
    discarded: usize,
}

impl StateRecorder {
    pub fn new(
        store:    RecordStore,
        dataset:  impl Into<String>,
        model:    impl Into<String>,
        capacity: usize,
    ) -> Self {
        Self {
            store,
            dataset:   dataset.into(),
            model:     model.into(),
            capacity,
            pending:   Vec::new(),
            discarded: 0,
        }
    }
}

impl Recorder for StateRecorder {
    fn record(&mut self, doc: EvalDoc, steps: Vec<StepRecord>) -> Result<()> {
        if self.pending.len() >= self.capacity {
            if self.discarded == 0 {
                tracing::warn!(
                    "Recording of {}/{} reached {} documents, dropping the rest",
                    self.dataset, self.model, self.capacity
                );
            }
            self.discarded += 1;
            return Ok(());
        }
        self.pending.push(RecordedEval { doc, steps });
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.store.replace(&self.dataset, &self.model, &self.pending)?;
        tracing::info!(
            "Persisted {} recorded documents for {}/{} ({} dropped)",
            self.pending.len(), self.dataset, self.model, self.discarded
        );
        self.pending.clear();
        Ok(())
    }
}
