// ============================================================
// Layer 3 — Tokens and Vocabulary
// ============================================================
// A Vocabulary is the bidirectional word <-> id mapping of a
// trained language model. Ids are dense and ordered by corpus
// frequency, so the first `k` ids are the `k` most frequent
// words. Strength matrices rely on that ordering.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placeholder for out-of-vocabulary words
pub const UNK_TOKEN: &str = "<unk>";

/// Appended to every corpus line when streaming a dataset split
pub const EOS_TOKEN: &str = "<eos>";

/// A caller-supplied token: either a surface form or a raw id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Token {
    Id(u32),
    Word(String),
}

impl From<&str> for Token {
    fn from(word: &str) -> Self {
        Token::Word(word.to_string())
    }
}

impl From<String> for Token {
    fn from(word: String) -> Self {
        Token::Word(word)
    }
}

impl From<u32> for Token {
    fn from(id: u32) -> Self {
        Token::Id(id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    id_to_word: Vec<String>,
    word_to_id: HashMap<String, u32>,
}

impl Vocabulary {
    /// Build from words listed in id order.
    pub fn new(words: Vec<String>) -> Self {
        let word_to_id = words
            .iter()
            .enumerate()
            .map(|(id, w)| (w.clone(), id as u32))
            .collect();
        Self { id_to_word: words, word_to_id }
    }

    pub fn len(&self) -> usize {
        self.id_to_word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_word.is_empty()
    }

    /// Words in id order
    pub fn words(&self) -> &[String] {
        &self.id_to_word
    }

    pub fn word(&self, id: u32) -> Option<&str> {
        self.id_to_word.get(id as usize).map(String::as_str)
    }

    pub fn unk_id(&self) -> Option<u32> {
        self.word_to_id.get(UNK_TOKEN).copied()
    }

    /// Id of `word`, falling back to `<unk>` when the word is unknown.
    /// Returns `None` only if neither is present.
    pub fn id_from_word(&self, word: &str) -> Option<u32> {
        self.word_to_id.get(word).copied().or_else(|| self.unk_id())
    }

    /// Resolve a caller token. Raw ids must lie inside the vocabulary.
    pub fn resolve(&self, token: &Token) -> Option<u32> {
        match token {
            Token::Id(id) if (*id as usize) < self.len() => Some(*id),
            Token::Id(_) => None,
            Token::Word(w) => self.id_from_word(w),
        }
    }

    /// Whitespace-split a sentence and map every word to an id.
    pub fn sentence_to_ids(&self, sentence: &str) -> Vec<u32> {
        sentence
            .split_whitespace()
            .filter_map(|w| self.id_from_word(w))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::new(
            ["the", "<unk>", "cat", "<eos>"].iter().map(|w| w.to_string()).collect(),
        )
    }

    #[test]
    fn test_known_word_lookup() {
        let v = vocab();
        assert_eq!(v.id_from_word("cat"), Some(2));
        assert_eq!(v.word(2), Some("cat"));
    }

    #[test]
    fn test_unknown_word_maps_to_unk() {
        let v = vocab();
        assert_eq!(v.id_from_word("zebra"), Some(1));
    }

    #[test]
    fn test_no_unk_means_no_id() {
        let v = Vocabulary::new(vec!["a".to_string()]);
        assert_eq!(v.id_from_word("b"), None);
    }

    #[test]
    fn test_resolve_rejects_out_of_range_id() {
        let v = vocab();
        assert_eq!(v.resolve(&Token::Id(3)), Some(3));
        assert_eq!(v.resolve(&Token::Id(4)), None);
        assert_eq!(v.resolve(&Token::from("the")), Some(0));
    }

    #[test]
    fn test_sentence_to_ids() {
        let v = vocab();
        assert_eq!(v.sentence_to_ids("the  cat sat"), vec![0, 2, 1]);
    }
}
