// ============================================================
// Layer 3 — Recurrent State and Evaluation Records
// ============================================================
// RecurrentState is a plain value: advancing a model returns a
// new state and never touches the one passed in. Branches of the
// generator and windows of the evaluator each own their copy.
//
// Evaluations are recorded as a document (what was streamed)
// plus one StepRecord per consumed token (what the network
// looked like after it).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Named state of an LSTM cell's memory
pub const STATE_C: &str = "state_c";
/// Named hidden state (every cell type has one)
pub const STATE_H: &str = "state_h";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerState {
    /// Cell memory, only present for LSTM layers
    pub cell:   Option<Vec<f32>>,
    pub hidden: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecurrentState {
    pub layers: Vec<LayerState>,
}

impl RecurrentState {
    /// All-zero state for the given layer sizes.
    pub fn zeros(layer_sizes: &[usize], with_cell: bool) -> Self {
        let layers = layer_sizes
            .iter()
            .map(|&n| LayerState {
                cell:   with_cell.then(|| vec![0.0; n]),
                hidden: vec![0.0; n],
            })
            .collect();
        Self { layers }
    }

    /// Named per-layer vectors, as stored in a StepRecord.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<Vec<f32>>> {
        let mut states = BTreeMap::new();
        if self.layers.iter().all(|l| l.cell.is_some()) && !self.layers.is_empty() {
            let cells = self
                .layers
                .iter()
                .filter_map(|l| l.cell.clone())
                .collect();
            states.insert(STATE_C.to_string(), cells);
        }
        states.insert(
            STATE_H.to_string(),
            self.layers.iter().map(|l| l.hidden.clone()).collect(),
        );
        states
    }
}

/// Result of feeding one token to a model.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// State after consuming the token
    pub state: RecurrentState,
    /// Distribution over the next token, indexed by word id
    pub probs: Vec<f32>,
}

/// The network's internals after consuming `word_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub word_id: u32,
    /// state name -> one vector per layer
    pub states:  BTreeMap<String, Vec<Vec<f32>>>,
}

impl StepRecord {
    /// Concatenate the vectors of `layers` for `state_name`.
    /// Returns `None` when the state or a layer is missing.
    pub fn flatten(&self, state_name: &str, layers: &[usize]) -> Option<Vec<f32>> {
        let per_layer = self.states.get(state_name)?;
        let mut out = Vec::new();
        for &layer in layers {
            out.extend_from_slice(per_layer.get(layer)?);
        }
        Some(out)
    }
}

/// Describes one recorded stretch of evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalDoc {
    pub dataset:      String,
    pub model:        String,
    /// Position of this document within the recording run
    pub index:        usize,
    pub record_every: usize,
    /// Token ids streamed while this document was open
    pub inputs:       Vec<u32>,
    /// Mean negative log-likelihood over steps with a known next token
    pub loss:         Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEval {
    pub doc:   EvalDoc,
    pub steps: Vec<StepRecord>,
}

/// The three canonical dataset partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Valid, Split::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test  => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Split::ALL
            .into_iter()
            .find(|split| split.as_str() == s)
            .ok_or_else(|| format!("dataset split should be 'train', 'valid' or 'test', got '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lstm_snapshot_has_cell_and_hidden() {
        let state = RecurrentState::zeros(&[3, 2], true);
        let snap  = state.snapshot();
        assert_eq!(snap[STATE_C].len(), 2);
        assert_eq!(snap[STATE_H][1].len(), 2);
    }

    #[test]
    fn test_gru_snapshot_has_only_hidden() {
        let snap = RecurrentState::zeros(&[4], false).snapshot();
        assert!(!snap.contains_key(STATE_C));
        assert!(snap.contains_key(STATE_H));
    }

    #[test]
    fn test_flatten_concatenates_layers() {
        let mut states = BTreeMap::new();
        states.insert(STATE_H.to_string(), vec![vec![1.0, 2.0], vec![3.0]]);
        let step = StepRecord { word_id: 0, states };
        assert_eq!(step.flatten(STATE_H, &[1, 0]), Some(vec![3.0, 1.0, 2.0]));
        assert_eq!(step.flatten(STATE_H, &[2]), None);
        assert_eq!(step.flatten(STATE_C, &[0]), None);
    }

    #[test]
    fn test_split_parsing() {
        assert_eq!("valid".parse::<Split>(), Ok(Split::Valid));
        assert!("dev".parse::<Split>().is_err());
    }
}
