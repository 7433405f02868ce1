// ============================================================
// Layer 4 — Window Producers
// ============================================================
// A Feeder is an ordered list of windows of token ids. The
// evaluator streams each window one token at a time.
//
//   SentenceProducer   independent caller sentences. Each
//                      sentence starts from a fresh recurrent
//                      state; a sentence longer than `window`
//                      continues in the next window.
//
//   CorpusProducer     a whole dataset split as one continuous
//                      id stream, cut every `num_steps` tokens.
//                      Recurrent state carries across windows.
//
// Example, CorpusProducer with num_steps=3:
//   ids:      a b c d e f g
//   windows:  [a b c] [d e f] [g]
//   reset:     yes     no      no

use anyhow::Result;

use crate::domain::token::{Vocabulary, EOS_TOKEN};

#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub inputs:      Vec<u32>,
    /// Start this window from the model's initial state
    pub reset_state: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feeder {
    windows: Vec<Window>,
}

impl Feeder {
    pub fn new(windows: Vec<Window>) -> Self {
        Self { windows }
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Longest window, 0 for an empty feeder
    pub fn max_window_len(&self) -> usize {
        self.windows.iter().map(|w| w.inputs.len()).max().unwrap_or(0)
    }

    pub fn total_steps(&self) -> usize {
        self.windows.iter().map(|w| w.inputs.len()).sum()
    }
}

pub struct SentenceProducer {
    sequences: Vec<Vec<u32>>,
    window:    usize,
}

impl SentenceProducer {
    /// # Panics
    /// Panics if `window` is 0.
    pub fn new(sequences: Vec<Vec<u32>>, window: usize) -> Self {
        assert!(window > 0, "window must be positive");
        Self { sequences, window }
    }

    pub fn get_feeder(&self) -> Feeder {
        let windows = self
            .sequences
            .iter()
            .flat_map(|seq| {
                seq.chunks(self.window).enumerate().map(|(i, chunk)| Window {
                    inputs:      chunk.to_vec(),
                    reset_state: i == 0,
                })
            })
            .collect();
        Feeder::new(windows)
    }
}

pub struct CorpusProducer {
    ids:       Vec<u32>,
    num_steps: usize,
}

impl CorpusProducer {
    /// # Panics
    /// Panics if `num_steps` is 0.
    pub fn new(ids: Vec<u32>, num_steps: usize) -> Self {
        assert!(num_steps > 0, "num_steps must be positive");
        Self { ids, num_steps }
    }

    /// Map corpus lines to ids, closing every line with `<eos>`.
    pub fn from_lines(lines: &[String], vocab: &Vocabulary, num_steps: usize) -> Result<Self> {
        let eos = vocab
            .id_from_word(EOS_TOKEN)
            .ok_or_else(|| anyhow::anyhow!("vocabulary has neither {EOS_TOKEN} nor <unk>"))?;

        let mut ids = Vec::new();
        for line in lines {
            ids.extend(vocab.sentence_to_ids(line));
            ids.push(eos);
        }
        Ok(Self::new(ids, num_steps))
    }

    pub fn get_feeder(&self) -> Feeder {
        let windows = self
            .ids
            .chunks(self.num_steps)
            .enumerate()
            .map(|(i, chunk)| Window { inputs: chunk.to_vec(), reset_state: i == 0 })
            .collect();
        Feeder::new(windows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_window_per_sentence() {
        let feeder = SentenceProducer::new(vec![vec![1, 2], vec![3, 4, 5]], 3).get_feeder();
        assert_eq!(feeder.len(), 2);
        assert!(feeder.windows().iter().all(|w| w.reset_state));
        assert_eq!(feeder.max_window_len(), 3);
        assert_eq!(feeder.total_steps(), 5);
    }

    #[test]
    fn test_long_sentence_continues_in_next_window() {
        let feeder = SentenceProducer::new(vec![vec![1, 2, 3, 4, 5]], 2).get_feeder();
        let resets: Vec<bool> = feeder.windows().iter().map(|w| w.reset_state).collect();
        assert_eq!(resets, vec![true, false, false]);
        assert_eq!(feeder.windows()[2].inputs, vec![5]);
    }

    #[test]
    fn test_empty_sentence_yields_no_window() {
        let feeder = SentenceProducer::new(vec![vec![], vec![7]], 4).get_feeder();
        assert_eq!(feeder.len(), 1);
    }

    #[test]
    fn test_corpus_windows_carry_state() {
        let feeder = CorpusProducer::new((0..7).collect(), 3).get_feeder();
        assert_eq!(feeder.len(), 3);
        assert_eq!(feeder.windows()[1].inputs, vec![3, 4, 5]);
        assert!(feeder.windows()[0].reset_state);
        assert!(!feeder.windows()[2].reset_state);
    }

    #[test]
    fn test_corpus_lines_end_with_eos() {
        let vocab = Vocabulary::new(
            ["<eos>", "the", "cat", "<unk>"].iter().map(|w| w.to_string()).collect(),
        );
        let lines = vec!["the cat".to_string(), "the dog".to_string()];
        let producer = CorpusProducer::from_lines(&lines, &vocab, 10).unwrap();
        assert_eq!(producer.get_feeder().windows()[0].inputs, vec![1, 2, 0, 1, 3, 0]);
    }

    #[test]
    #[should_panic]
    fn test_zero_window_panics() {
        let _ = SentenceProducer::new(vec![vec![1]], 0);
    }
}
