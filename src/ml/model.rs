// ============================================================
// Layer 5 — Recurrent Language Model (Burn)
// ============================================================
// Embedding → N stacked LSTM or GRU layers → Linear → softmax.
//
// The module itself is stateless: recurrent state travels in
// and out of every call as a RecurrentState value. That keeps
// the RnnModel contract (step never mutates its input) trivially
// true, at the cost of a host <-> device copy per step, which is
// negligible for one token at batch size 1.

use anyhow::Result;
use burn::{
    nn::{
        Embedding, EmbeddingConfig,
        gru::{Gru, GruConfig},
        Linear, LinearConfig,
        Lstm, LstmConfig, LstmState,
    },
    prelude::*,
};
use std::path::Path;

use crate::domain::record::{LayerState, RecurrentState, StepOutput, STATE_C, STATE_H};
use crate::domain::token::Vocabulary;
use crate::domain::traits::RnnModel;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::config::{CellType, TrainConfig};

#[derive(Config, Debug)]
pub struct RnnLmConfig {
    pub vocab_size:     usize,
    pub embedding_size: usize,
    pub hidden_size:    usize,
    pub num_layers:     usize,
    #[config(default = false)]
    pub gru:            bool,
}

impl RnnLmConfig {
    pub fn from_train_config(cfg: &TrainConfig, vocab_size: usize) -> Self {
        RnnLmConfig::new(vocab_size, cfg.embedding_size, cfg.layer_size, cfg.layer_num)
            .with_gru(cfg.cell_type == CellType::Gru)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> RnnLm<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_size).init(device);
        let input_size = |layer: usize| {
            if layer == 0 { self.embedding_size } else { self.hidden_size }
        };

        let (lstm, gru) = if self.gru {
            let gru = (0..self.num_layers)
                .map(|l| GruConfig::new(input_size(l), self.hidden_size, true).init(device))
                .collect();
            (Vec::new(), gru)
        } else {
            let lstm = (0..self.num_layers)
                .map(|l| LstmConfig::new(input_size(l), self.hidden_size, true).init(device))
                .collect();
            (lstm, Vec::new())
        };

        let projection = LinearConfig::new(self.hidden_size, self.vocab_size).init(device);
        RnnLm { embedding, lstm, gru, projection, hidden_size: self.hidden_size }
    }
}

/// Exactly one of `lstm` / `gru` is populated.
#[derive(Module, Debug)]
pub struct RnnLm<B: Backend> {
    pub embedding:   Embedding<B>,
    pub lstm:        Vec<Lstm<B>>,
    pub gru:         Vec<Gru<B>>,
    pub projection:  Linear<B>,
    pub hidden_size: usize,
}

/// Per-layer (cell, hidden) tensors, each shaped [1, hidden]
pub type LayerTensors<B> = Vec<(Option<Tensor<B, 2>>, Tensor<B, 2>)>;

impl<B: Backend> RnnLm<B> {
    pub fn num_layers(&self) -> usize {
        self.lstm.len().max(self.gru.len())
    }

    pub fn is_lstm(&self) -> bool {
        !self.lstm.is_empty()
    }

    /// input: [1, 1] token id → (next-token probabilities [1, vocab], new layer states)
    pub fn forward_step(
        &self,
        input:  Tensor<B, 2, Int>,
        layers: LayerTensors<B>,
    ) -> (Tensor<B, 2>, LayerTensors<B>) {
        let mut x = self.embedding.forward(input); // [1, 1, embedding]
        let mut next = Vec::with_capacity(layers.len());

        for (l, (cell, hidden)) in layers.into_iter().enumerate() {
            if let Some(lstm) = self.lstm.get(l) {
                let cell = cell.unwrap_or_else(|| hidden.zeros_like());
                let (out, state) = lstm.forward(x, Some(LstmState::new(cell, hidden)));
                next.push((Some(state.cell), state.hidden));
                x = out;
            } else {
                let out = self.gru[l].forward(x, Some(hidden));
                next.push((None, out.clone().reshape([1, self.hidden_size])));
                x = out;
            }
        }

        let logits = self.projection.forward(x.reshape([1, self.hidden_size]));
        let probs  = burn::tensor::activation::softmax(logits, 1);
        (probs, next)
    }
}

/// RnnModel implementation backed by a Burn module.
pub struct BurnRnnModel<B: Backend> {
    name:   String,
    vocab:  Vocabulary,
    module: RnnLm<B>,
    device: B::Device,
}

impl<B: Backend> BurnRnnModel<B> {
    pub fn new(cfg: &TrainConfig, vocab: Vocabulary, device: &B::Device) -> Self {
        let module = RnnLmConfig::from_train_config(cfg, vocab.len()).init(device);
        tracing::info!(
            "Model '{}' ready: {} {:?} layers of {}, vocab={}",
            cfg.name, cfg.layer_num, cfg.cell_type, cfg.layer_size, vocab.len()
        );
        Self { name: cfg.name.clone(), vocab, module, device: device.clone() }
    }

    fn to_tensor(&self, values: &[f32]) -> Tensor<B, 2> {
        Tensor::<B, 1>::from_floats(values, &self.device).reshape([1, values.len()])
    }
}

fn to_vec<B: Backend>(tensor: Tensor<B, 2>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Cannot read tensor back: {e:?}"))
}

impl<B: Backend> RnnModel for BurnRnnModel<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    fn layer_num(&self) -> usize {
        self.module.num_layers()
    }

    fn state_names(&self) -> Vec<&'static str> {
        if self.module.is_lstm() { vec![STATE_C, STATE_H] } else { vec![STATE_H] }
    }

    fn initial_state(&self) -> RecurrentState {
        RecurrentState::zeros(
            &vec![self.module.hidden_size; self.layer_num()],
            self.module.is_lstm(),
        )
    }

    fn step(&self, state: &RecurrentState, word_id: u32) -> Result<StepOutput> {
        anyhow::ensure!(
            (word_id as usize) < self.vocab.len(),
            "word id {} outside vocabulary of {}", word_id, self.vocab.len()
        );
        anyhow::ensure!(
            state.layers.len() == self.layer_num(),
            "state has {} layers, model has {}", state.layers.len(), self.layer_num()
        );

        let layers: LayerTensors<B> = state
            .layers
            .iter()
            .map(|l| (l.cell.as_deref().map(|c| self.to_tensor(c)), self.to_tensor(&l.hidden)))
            .collect();
        let input = Tensor::<B, 1, Int>::from_ints([word_id as i32], &self.device).reshape([1, 1]);

        let (probs, next) = self.module.forward_step(input, layers);

        let mut layers = Vec::with_capacity(next.len());
        for (cell, hidden) in next {
            layers.push(LayerState {
                cell:   cell.map(to_vec).transpose()?,
                hidden: to_vec(hidden)?,
            });
        }

        Ok(StepOutput { state: RecurrentState { layers }, probs: to_vec(probs)? })
    }

    fn restore(&mut self, checkpoint_dir: &Path) -> Result<()> {
        let ckpt = CheckpointManager::new(checkpoint_dir);
        self.module = ckpt.load_model(self.module.clone(), &self.device)?;
        tracing::info!("Restored '{}' from '{}'", self.name, checkpoint_dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn train_config(cell_type: CellType) -> TrainConfig {
        TrainConfig {
            name:           "tiny".into(),
            dataset:        "toy".into(),
            cell_type,
            layer_num:      2,
            layer_size:     4,
            embedding_size: 3,
            vocab_size:     6,
            num_steps:      5,
            batch_size:     1,
        }
    }

    fn model(cell_type: CellType) -> BurnRnnModel<TestBackend> {
        let vocab = Vocabulary::new((0..6).map(|i| format!("w{i}")).collect());
        BurnRnnModel::new(&train_config(cell_type), vocab, &Default::default())
    }

    #[test]
    fn test_lstm_step_shapes() {
        let m   = model(CellType::Lstm);
        let out = m.step(&m.initial_state(), 2).unwrap();

        assert_eq!(out.probs.len(), 6);
        assert!((out.probs.iter().sum::<f32>() - 1.0).abs() < 1e-4);
        assert_eq!(out.state.layers.len(), 2);
        assert_eq!(out.state.layers[1].cell.as_ref().map(Vec::len), Some(4));
        assert_eq!(m.state_names(), vec![STATE_C, STATE_H]);
    }

    #[test]
    fn test_gru_has_no_cell_state() {
        let m   = model(CellType::Gru);
        let out = m.step(&m.initial_state(), 0).unwrap();
        assert!(out.state.layers.iter().all(|l| l.cell.is_none()));
        assert_eq!(out.state.layers[0].hidden.len(), 4);
    }

    #[test]
    fn test_step_leaves_input_state_untouched() {
        let m      = model(CellType::Lstm);
        let start  = m.initial_state();
        let before = start.clone();
        let _      = m.step(&start, 1).unwrap();
        assert_eq!(start, before);
    }

    #[test]
    fn test_out_of_vocabulary_id_rejected() {
        let m = model(CellType::Lstm);
        assert!(m.step(&m.initial_state(), 6).is_err());
    }

    #[test]
    fn test_restore_round_trip() {
        let dir   = tempfile::tempdir().unwrap();
        let saved = model(CellType::Lstm);
        CheckpointManager::new(dir.path()).save_model(&saved.module).unwrap();
        assert!(dir.path().join("model.mpk").is_file());

        let mut fresh = model(CellType::Lstm);
        fresh.restore(dir.path()).unwrap();

        let a = saved.step(&saved.initial_state(), 3).unwrap().probs;
        let b = fresh.step(&fresh.initial_state(), 3).unwrap().probs;
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-6);
        }
    }
}
