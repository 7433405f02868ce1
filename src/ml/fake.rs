// Deterministic stand-ins for the Burn model, used by unit tests.
//
// FakeModel has a single layer whose hidden state is
// [last word id, tokens consumed since reset]. Its next-token
// distribution is uniform unless a row was set for the word
// just consumed.

use anyhow::Result;
use std::{
    cell::Cell,
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::domain::record::{LayerState, RecurrentState, StepOutput, STATE_H};
use crate::domain::token::Vocabulary;
use crate::domain::traits::RnnModel;
use crate::infra::config::{CellType, TrainConfig};
use crate::ml::builder::ModelBuilder;

#[derive(Clone)]
pub struct FakeModel {
    name:        String,
    vocab:       Vocabulary,
    rows:        HashMap<u32, Vec<f32>>,
    fail_after:  Option<usize>,
    steps_taken: Rc<Cell<usize>>,
    restored:    Rc<Cell<bool>>,
}

impl FakeModel {
    /// Vocabulary of `size` words named w0, w1, ...
    pub fn new(size: usize) -> Self {
        Self::with_words(&(0..size).map(|i| format!("w{i}")).collect::<Vec<_>>())
    }

    pub fn with_words<S: AsRef<str>>(words: &[S]) -> Self {
        Self {
            name:        "fake".to_string(),
            vocab:       Vocabulary::new(words.iter().map(|w| w.as_ref().to_string()).collect()),
            rows:        HashMap::new(),
            fail_after:  None,
            steps_taken: Rc::new(Cell::new(0)),
            restored:    Rc::new(Cell::new(false)),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Distribution returned after consuming `word_id`
    pub fn with_row(mut self, word_id: u32, probs: Vec<f32>) -> Self {
        assert_eq!(probs.len(), self.vocab.len());
        self.rows.insert(word_id, probs);
        self
    }

    /// Every step after the first `n` fails
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn steps_taken(&self) -> usize {
        self.steps_taken.get()
    }

    pub fn restored(&self) -> bool {
        self.restored.get()
    }
}

impl RnnModel for FakeModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    fn layer_num(&self) -> usize {
        1
    }

    fn state_names(&self) -> Vec<&'static str> {
        vec![STATE_H]
    }

    fn initial_state(&self) -> RecurrentState {
        RecurrentState::zeros(&[2], false)
    }

    fn step(&self, state: &RecurrentState, word_id: u32) -> Result<StepOutput> {
        let taken = self.steps_taken.get();
        if self.fail_after.is_some_and(|n| taken >= n) {
            anyhow::bail!("injected failure at step {taken}");
        }
        self.steps_taken.set(taken + 1);

        let count = state.layers[0].hidden[1] + 1.0;
        let probs = self.rows.get(&word_id).cloned().unwrap_or_else(|| {
            vec![1.0 / self.vocab.len() as f32; self.vocab.len()]
        });
        Ok(StepOutput {
            state: RecurrentState {
                layers: vec![LayerState { cell: None, hidden: vec![word_id as f32, count] }],
            },
            probs,
        })
    }

    fn restore(&mut self, _checkpoint_dir: &Path) -> Result<()> {
        self.restored.set(true);
        Ok(())
    }
}

pub fn train_config(name: &str, dataset: &str, num_steps: usize) -> TrainConfig {
    TrainConfig {
        name:           name.to_string(),
        dataset:        dataset.to_string(),
        cell_type:      CellType::Lstm,
        layer_num:      1,
        layer_size:     2,
        embedding_size: 2,
        vocab_size:     10,
        num_steps,
        batch_size:     1,
    }
}

/// Builder handing out clones of one FakeModel and counting calls
pub struct FakeBuilder {
    pub model:  FakeModel,
    pub config: TrainConfig,
    pub builds: Rc<Cell<usize>>,
    pub paths:  Rc<std::cell::RefCell<Vec<PathBuf>>>,
}

impl FakeBuilder {
    pub fn new(model: FakeModel, config: TrainConfig) -> Self {
        Self { model, config, builds: Rc::default(), paths: Rc::default() }
    }
}

impl ModelBuilder for FakeBuilder {
    fn build(&self, config_path: &Path) -> Result<(Box<dyn RnnModel>, TrainConfig)> {
        self.builds.set(self.builds.get() + 1);
        self.paths.borrow_mut().push(config_path.to_path_buf());
        Ok((Box::new(self.model.clone()), self.config.clone()))
    }
}
