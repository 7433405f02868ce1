// ============================================================
// Layer 2 — Model Manager
// ============================================================
// The public operations of the backend. Each one resolves a
// model name through the ModelCache and then coordinates the
// lower layers:
//
//   generate          → ml/generator
//   record_sequence   → ml/evaluator + BufferRecorder (in memory)
//   record_default    → ml/evaluator + StateRecorder  (persisted)
//   state_signature   ┐
//   strength          ├ ml/analysis over persisted recordings
//   state_projection  ┘
//
// Unknown names come back as Outcome::UnknownModel without
// loading anything. Streaming and statistics failures are
// logged and come back as Outcome::Unavailable (or `false` for
// record_default). Only ManagerError escapes as an error.

use serde_json::Value;
use std::path::PathBuf;

use crate::application::model_cache::{LoadedModel, ModelCache};
use crate::application::outcome::{ManagerError, Outcome};
use crate::data::{
    loader::CorpusLoader,
    producer::{CorpusProducer, Feeder, SentenceProducer},
};
use crate::domain::generation::{GenerateParams, GenerationTree};
use crate::domain::record::{RecordedEval, Split};
use crate::domain::token::{Token, Vocabulary};
use crate::infra::{
    config::{ManagerConfig, TrainConfig},
    metrics::MetricsLogger,
    record_store::RecordStore,
    recorder::{BufferRecorder, StateRecorder},
};
use crate::ml::{
    analysis::{self, AnalysisError, StateAnalyzer},
    builder::ModelBuilder,
    evaluator::EvalError,
    generator,
};

/// Documents a recorder keeps per call
const RECORDER_CAPACITY: usize = 500;

const TSNE_SAMPLE_SIZE: usize = 5000;
const TSNE_INIT_DIMS: usize = 50;
const TSNE_PERPLEXITY: f64 = 40.0;

/// Input of an ad-hoc recording: raw token sequences, or a feeder
/// that is already in streaming form.
#[derive(Debug, Clone)]
pub enum Sequences {
    Tokens(Vec<Vec<Token>>),
    Feeder(Feeder),
}

impl From<Vec<Vec<Token>>> for Sequences {
    fn from(tokens: Vec<Vec<Token>>) -> Self {
        Sequences::Tokens(tokens)
    }
}

/// Store key and shape of a model's recordings
struct RecordKey {
    dataset:   String,
    model:     String,
    layer_num: usize,
}

pub struct ModelManager {
    paths: ManagerConfig,
    cache: ModelCache,
    store: RecordStore,
}

impl ModelManager {
    pub fn new(paths: ManagerConfig, builder: Box<dyn ModelBuilder>) -> Self {
        let store = RecordStore::new(&paths.record_dir);
        let cache = ModelCache::new(paths.clone(), builder);
        Self { paths, cache, store }
    }

    pub fn available_models(&self) -> Vec<&'static str> {
        ModelCache::available_models()
    }

    pub fn config_filename(&self, name: &str) -> Option<PathBuf> {
        self.cache.config_filename(name)
    }

    /// Load `name` now instead of on first use; returns its training configuration.
    pub fn load(&mut self, name: &str, train: bool) -> Result<Outcome<TrainConfig>, ManagerError> {
        Ok(match self.cache.resolve(name, train)? {
            Some(loaded) => Outcome::Ready(loaded.config.clone()),
            None => Outcome::UnknownModel(name.to_string()),
        })
    }

    pub fn invalidate(&mut self, name: &str) -> bool {
        self.cache.invalidate(name)
    }

    // ─── Generation ───────────────────────────────────────────────────────────

    pub fn generate(
        &mut self,
        name:   &str,
        seeds:  &[Token],
        params: &GenerateParams,
    ) -> Result<Outcome<GenerationTree>, ManagerError> {
        let Some(loaded) = self.cache.resolve(name, false)? else {
            return Ok(Outcome::UnknownModel(name.to_string()));
        };
        if seeds.is_empty() {
            return Ok(Outcome::Unavailable("generation needs at least one seed token".into()));
        }

        let vocab = loaded.model.vocabulary();
        let mut ids = Vec::with_capacity(seeds.len());
        for token in seeds {
            match vocab.resolve(token) {
                Some(id) => ids.push(id),
                None => {
                    tracing::warn!("Seed token {:?} is not in the vocabulary of {}", token, name);
                    return Ok(Outcome::Unavailable(format!("seed token {token:?} is not in the vocabulary")));
                }
            }
        }

        let tree = generator::generate(loaded.model.as_ref(), &ids, params)
            .map_err(|error| ManagerError::Model { name: name.to_string(), error })?;
        Ok(Outcome::Ready(tree))
    }

    // ─── Recording ────────────────────────────────────────────────────────────

    /// Evaluate caller-supplied sequences and return their recorded states.
    /// Nothing is persisted. One document is recorded per sequence.
    pub fn record_sequence(
        &mut self,
        name:      &str,
        sequences: Sequences,
    ) -> Result<Outcome<Vec<RecordedEval>>, ManagerError> {
        let Some(loaded) = self.cache.resolve(name, false)? else {
            return Ok(Outcome::UnknownModel(name.to_string()));
        };

        let feeder = match sequences {
            Sequences::Feeder(feeder) => feeder,
            Sequences::Tokens(tokens) => {
                let ids = match tokens_to_ids(loaded.model.vocabulary(), &tokens) {
                    Ok(ids) => ids,
                    Err(why) => return Ok(Outcome::Unavailable(why)),
                };
                let max_len = ids.iter().map(Vec::len).max().unwrap_or(0);
                if max_len == 0 {
                    return Ok(Outcome::Unavailable("no tokens to record".into()));
                }
                SentenceProducer::new(ids, max_len).get_feeder()
            }
        };

        let max_len = feeder.max_window_len();
        if max_len == 0 {
            return Ok(Outcome::Unavailable("no tokens to record".into()));
        }
        loaded.evaluator.record_every = max_len;

        let LoadedModel { model, config, evaluator } = loaded;
        let mut recorder = BufferRecorder::new(&config.dataset, model.name(), RECORDER_CAPACITY);

        match evaluator.evaluate_and_record(model.as_ref(), &feeder, &mut recorder, &config.dataset, evaluator.verbose) {
            Ok(_) => {
                if recorder.discarded() > 0 {
                    tracing::warn!(
                        "Returning the first {} documents for {}, {} more were dropped",
                        RECORDER_CAPACITY, name, recorder.discarded()
                    );
                }
                Ok(Outcome::Ready(recorder.into_evals()))
            }
            Err(EvalError::Shape(why)) => {
                tracing::error!("Fail to evaluate given sequence! Sequence length too large! ({})", why);
                Ok(Outcome::Unavailable(why))
            }
            Err(err @ (EvalError::Model(_) | EvalError::Storage(_))) => {
                tracing::error!("Fail to evaluate given sequence: {}", err);
                Ok(Outcome::Unavailable(err.to_string()))
            }
        }
    }

    /// Evaluate one canonical split of the model's dataset and persist
    /// the first `RECORDER_CAPACITY` recorded documents for the
    /// statistics operations. The previous recording is replaced only
    /// when the whole split was evaluated.
    ///
    /// # Errors
    /// `ManagerError::InvalidSplit` when `split` is not train / valid / test.
    /// The split is checked before the model is resolved.
    pub fn record_default(&mut self, name: &str, split: &str) -> Result<Outcome<bool>, ManagerError> {
        let split: Split = split.parse().map_err(ManagerError::InvalidSplit)?;

        let Some(loaded) = self.cache.resolve(name, false)? else {
            return Ok(Outcome::UnknownModel(name.to_string()));
        };
        let num_steps = loaded.config.num_steps;
        loaded.evaluator.record_every = num_steps;

        let LoadedModel { model, config, evaluator } = loaded;
        let dataset_dir = self.paths.dataset_dir(&config.dataset);
        let producer = CorpusLoader::new(&dataset_dir)
            .load_lines(split)
            .and_then(|lines| CorpusProducer::from_lines(&lines, model.vocabulary(), num_steps));
        let feeder = match producer {
            Ok(producer) => producer.get_feeder(),
            Err(e) => {
                tracing::error!("Cannot stream {} split of {}: {:#}", split, config.dataset, e);
                return Ok(Outcome::Ready(false));
            }
        };
        if feeder.is_empty() {
            tracing::error!("The {} split of {} has no text", split, config.dataset);
            return Ok(Outcome::Ready(false));
        }

        let mut recorder = StateRecorder::new(
            self.store.clone(), &config.dataset, model.name(), RECORDER_CAPACITY,
        );
        let result = evaluator.evaluate_and_record(
            model.as_ref(), &feeder, &mut recorder, &config.dataset, evaluator.verbose,
        );

        match result {
            Ok(metrics) => {
                let dir = self.store.dir(&config.dataset, model.name());
                let logged = MetricsLogger::new(&dir).and_then(|logger| {
                    logger.log(split.as_str(), &metrics)?;
                    Ok(logger)
                });
                match logged {
                    Ok(logger) => tracing::info!(
                        "Recorded {} split for {} (perplexity {:.3}), metrics in '{}'",
                        split, name, metrics.perplexity, logger.csv_path().display()
                    ),
                    Err(e) => tracing::warn!("Cannot log evaluation metrics to '{}': {:#}", dir.display(), e),
                }
                Ok(Outcome::Ready(true))
            }
            Err(EvalError::Shape(why)) => {
                tracing::error!("Fail to record {} split for {}: {}", split, name, why);
                Ok(Outcome::Ready(false))
            }
            Err(err @ (EvalError::Model(_) | EvalError::Storage(_))) => {
                tracing::error!("Fail to record {} split for {}: {}", split, name, err);
                Ok(Outcome::Ready(false))
            }
        }
    }

    /// Whitespace-tokenise each sentence and map words to ids.
    pub fn sentences_to_ids(
        &mut self,
        name:      &str,
        sentences: &[String],
    ) -> Result<Outcome<Vec<Vec<u32>>>, ManagerError> {
        let Some(loaded) = self.cache.resolve(name, false)? else {
            return Ok(Outcome::UnknownModel(name.to_string()));
        };
        let vocab = loaded.model.vocabulary();
        Ok(Outcome::Ready(sentences.iter().map(|s| vocab.sentence_to_ids(s)).collect()))
    }

    // ─── Recorded-state statistics ────────────────────────────────────────────

    /// Where the recordings of `name` live, once `state_name` is known
    /// to be one of its states. Nothing is read from the store.
    fn record_key(&mut self, name: &str, state_name: &str) -> Result<Outcome<RecordKey>, ManagerError> {
        let Some(loaded) = self.cache.resolve(name, false)? else {
            return Ok(Outcome::UnknownModel(name.to_string()));
        };
        if !loaded.model.state_names().iter().any(|s| *s == state_name) {
            tracing::warn!("Model {} has no state named '{}'", name, state_name);
            return Ok(Outcome::Unavailable(format!("'{state_name}' is not a state of {name}")));
        }
        Ok(Outcome::Ready(RecordKey {
            dataset:   loaded.config.dataset.clone(),
            model:     loaded.model.name().to_string(),
            layer_num: loaded.model.layer_num(),
        }))
    }

    fn analyzer(&self) -> StateAnalyzer {
        StateAnalyzer::new(self.store.clone())
    }

    pub fn state_signature(
        &mut self,
        name:        &str,
        state_name:  &str,
        layers:      &[usize],
        sample_size: usize,
    ) -> Result<Outcome<Vec<Vec<f32>>>, ManagerError> {
        let key = match self.record_key(name, state_name)?.or_early() {
            Ok(key) => key,
            Err(early) => return Ok(early),
        };
        Ok(unavailable_on_error(
            self.analyzer().state_signature(&key.dataset, &key.model, state_name, layers, sample_size),
        ))
    }

    /// Mean state of each of the `top_k` most frequent words, with the words.
    pub fn strength(
        &mut self,
        name:       &str,
        state_name: &str,
        layers:     &[usize],
        top_k:      usize,
    ) -> Result<Outcome<Value>, ManagerError> {
        let key = match self.record_key(name, state_name)?.or_early() {
            Ok(key) => key,
            Err(early) => return Ok(early),
        };
        let words: Vec<String> = self
            .cache
            .resolve(name, false)?
            .map(|loaded| {
                let words = loaded.model.vocabulary().words();
                words[..top_k.min(words.len())].to_vec()
            })
            .unwrap_or_default();

        let strength = self
            .analyzer()
            .empirical_strength(&key.dataset, &key.model, state_name, layers, words.len());
        Ok(unavailable_on_error(strength).map(|s| analysis::strength_to_json(&s, &words)))
    }

    /// 2D projection of one layer's recorded states. A negative `layer`
    /// counts from the last layer. Only `"tsne"` is supported.
    ///
    /// The state sample, the random projection and the t-SNE start are
    /// all seeded with a fixed value, so repeating a request over the
    /// same recording returns the same points.
    pub fn state_projection(
        &mut self,
        name:       &str,
        state_name: &str,
        layer:      i64,
        method:     &str,
    ) -> Result<Outcome<Value>, ManagerError> {
        let key = match self.record_key(name, state_name)?.or_early() {
            Ok(key) => key,
            Err(early) => return Ok(early),
        };
        if method != "tsne" {
            return Ok(Outcome::Unavailable(format!("projection method '{method}' is not supported")));
        }
        let layer_num = key.layer_num;
        let Some(layer) = resolve_layer(layer, layer_num) else {
            return Ok(Outcome::Unavailable(format!(
                "layer {layer} is out of range for a model with {layer_num} layers"
            )));
        };

        let points = self.analyzer().tsne_projection(
            &key.dataset, &key.model, state_name, layer, TSNE_SAMPLE_SIZE, TSNE_INIT_DIMS, TSNE_PERPLEXITY,
        );
        Ok(unavailable_on_error(points).map(|points| {
            let labels = vec![layer; points.len()];
            let mut states_num = vec![0; layer_num];
            states_num[layer] = points.len();
            analysis::solution_to_json(&points, &labels, &states_num)
        }))
    }
}

fn tokens_to_ids(vocab: &Vocabulary, sequences: &[Vec<Token>]) -> Result<Vec<Vec<u32>>, String> {
    sequences
        .iter()
        .map(|seq| {
            seq.iter()
                .map(|token| match token {
                    // Range is checked by the evaluator
                    Token::Id(id) => Ok(*id),
                    Token::Word(w) => vocab
                        .id_from_word(w)
                        .ok_or_else(|| format!("word '{w}' is not in the vocabulary")),
                })
                .collect::<Result<Vec<u32>, String>>()
        })
        .collect()
}

/// Negative indices count back from `layer_num`
fn resolve_layer(layer: i64, layer_num: usize) -> Option<usize> {
    let resolved = if layer < 0 { layer_num as i64 + layer } else { layer };
    (0..layer_num as i64).contains(&resolved).then_some(resolved as usize)
}

fn unavailable_on_error<T>(result: Result<T, AnalysisError>) -> Outcome<T> {
    match result {
        Ok(v) => Outcome::Ready(v),
        Err(e) => {
            tracing::warn!("{}", e);
            Outcome::Unavailable(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{STATE_C, STATE_H};
    use crate::ml::fake::{train_config, FakeBuilder, FakeModel};
    use std::fs;

    const WORDS: [&str; 7] = ["<eos>", "<unk>", "the", "cat", "a", "dog", "ran"];

    struct Fixture {
        _root:   tempfile::TempDir,
        paths:   ManagerConfig,
        manager: ModelManager,
        model:   FakeModel,
    }

    fn fixture_with(model: FakeModel) -> Fixture {
        let root  = tempfile::tempdir().unwrap();
        let paths = ManagerConfig::rooted_at(root.path());
        let model = model.named("LSTM-PTB");
        fs::create_dir_all(paths.checkpoint_dir("LSTM-PTB")).unwrap();
        fs::create_dir_all(paths.dataset_dir("toy")).unwrap();
        fs::write(paths.dataset_dir("toy").join("valid.txt"), "the cat ran\na dog ran\n").unwrap();

        let builder = FakeBuilder::new(model.clone(), train_config("LSTM-PTB", "toy", 3));
        let manager = ModelManager::new(paths.clone(), Box::new(builder));
        Fixture { _root: root, paths, manager, model }
    }

    fn fixture() -> Fixture {
        fixture_with(FakeModel::with_words(&WORDS))
    }

    fn words(seqs: &[&[&str]]) -> Sequences {
        seqs.iter()
            .map(|s| s.iter().map(|&w| Token::from(w)).collect())
            .collect::<Vec<Vec<Token>>>()
            .into()
    }

    #[test]
    fn test_unknown_model_everywhere() {
        let mut f = fixture();
        let m = &mut f.manager;
        let unknown = |o: bool| assert!(o);

        unknown(matches!(m.generate("GPT", &[Token::from("the")], &GenerateParams::default()).unwrap(), Outcome::UnknownModel(_)));
        unknown(matches!(m.record_sequence("GPT", words(&[&["the"]])).unwrap(), Outcome::UnknownModel(_)));
        unknown(matches!(m.record_default("GPT", "valid").unwrap(), Outcome::UnknownModel(_)));
        unknown(matches!(m.sentences_to_ids("GPT", &["the".to_string()]).unwrap(), Outcome::UnknownModel(_)));
        unknown(matches!(m.state_signature("GPT", STATE_H, &[0], 10).unwrap(), Outcome::UnknownModel(_)));
        unknown(matches!(m.strength("GPT", STATE_H, &[0], 10).unwrap(), Outcome::UnknownModel(_)));
        unknown(matches!(m.state_projection("GPT", STATE_H, -1, "tsne").unwrap(), Outcome::UnknownModel(_)));
        assert!(m.config_filename("GPT").is_none());
        assert_eq!(f.model.steps_taken(), 0);
    }

    #[test]
    fn test_generate_from_words() {
        let model = FakeModel::with_words(&WORDS)
            .with_row(2, vec![0.0, 0.5, 0.0, 0.3, 0.0, 0.2, 0.0]);
        let mut f = fixture_with(model);
        let mut params = GenerateParams { max_branch: 2, accum_cond_prob: 1.0, min_cond_prob: 0.01, max_step: 1, ..GenerateParams::default() };
        params.neg_word_ids.insert(1);

        let tree = f.manager.generate("PTB-LSTM", &[Token::from("the")], &params).unwrap().ready().unwrap();
        assert_eq!(tree.root.word, "the");
        let kids: Vec<&str> = tree.root.children.iter().map(|c| c.word.as_str()).collect();
        assert_eq!(kids, vec!["cat", "dog"]);
    }

    #[test]
    fn test_generate_rejects_out_of_range_seed() {
        let mut f = fixture();
        let out = f.manager.generate("PTB-LSTM", &[Token::Id(99)], &GenerateParams::default()).unwrap();
        assert!(matches!(out, Outcome::Unavailable(_)));
    }

    #[test]
    fn test_record_sequence_uses_longest_sequence() {
        let mut f = fixture();
        let evals = f
            .manager
            .record_sequence("PTB-LSTM", words(&[&["the", "cat"], &["a", "dog", "ran"]]))
            .unwrap()
            .ready()
            .unwrap();

        assert_eq!(evals.len(), 2);
        assert!(evals.iter().all(|e| e.doc.record_every == 3));
        assert_eq!(evals[1].doc.inputs, vec![4, 5, 6]);
        assert_eq!(evals[0].doc.dataset, "toy");
        // nothing persisted
        assert!(!f.paths.record_dir.exists());
    }

    #[test]
    fn test_record_sequence_accepts_a_feeder() {
        let mut f = fixture();
        let feeder = SentenceProducer::new(vec![vec![2, 3, 0, 4]], 4).get_feeder();
        let evals = f.manager.record_sequence("PTB-LSTM", Sequences::Feeder(feeder)).unwrap().ready().unwrap();
        assert_eq!(evals.len(), 1);
        assert_eq!(evals[0].doc.record_every, 4);
    }

    #[test]
    fn test_record_sequence_too_long_is_unavailable() {
        let mut f = fixture();
        let long: Vec<Token> = (0..101).map(|_| Token::from("the")).collect();
        let out = f.manager.record_sequence("PTB-LSTM", Sequences::Tokens(vec![long])).unwrap();
        assert!(matches!(out, Outcome::Unavailable(_)));
        assert_eq!(f.model.steps_taken(), 0);
    }

    #[test]
    fn test_record_sequence_model_failure_is_unavailable() {
        let mut f = fixture_with(FakeModel::with_words(&WORDS).failing_after(1));
        let out = f.manager.record_sequence("PTB-LSTM", words(&[&["the", "cat"]])).unwrap();
        assert!(matches!(out, Outcome::Unavailable(_)));
    }

    #[test]
    fn test_record_default_persists_and_logs_metrics() {
        let mut f = fixture();
        assert_eq!(f.manager.record_default("PTB-LSTM", "valid").unwrap(), Outcome::Ready(true));

        let store = RecordStore::new(&f.paths.record_dir);
        let evals = store.load("toy", "LSTM-PTB").unwrap();
        // "the cat ran <eos> a dog ran <eos>" in windows of 3
        let sizes: Vec<usize> = evals.iter().map(|e| e.steps.len()).collect();
        assert_eq!(sizes, vec![3, 3, 2]);
        assert!(evals.iter().all(|e| e.doc.record_every == 3));

        let csv = fs::read_to_string(store.dir("toy", "LSTM-PTB").join("eval_metrics.csv")).unwrap();
        assert!(csv.lines().nth(1).unwrap().starts_with("valid,3,8,"));
    }

    #[test]
    fn test_record_default_rejects_bad_split_before_loading() {
        let mut f = fixture();
        let err = f.manager.record_default("PTB-LSTM", "dev").unwrap_err();
        assert!(matches!(err, ManagerError::InvalidSplit(_)));
        assert_eq!(f.model.steps_taken(), 0);

        // even for names outside the catalog
        assert!(f.manager.record_default("GPT", "dev").is_err());
    }

    #[test]
    fn test_record_default_failure_returns_false_without_writes() {
        let mut f = fixture_with(FakeModel::with_words(&WORDS).failing_after(4));
        assert_eq!(f.manager.record_default("PTB-LSTM", "valid").unwrap(), Outcome::Ready(false));

        let store = RecordStore::new(&f.paths.record_dir);
        assert!(store.load("toy", "LSTM-PTB").unwrap().is_empty());
        assert_eq!(f.model.steps_taken(), 4);
    }

    #[test]
    fn test_record_default_keeps_first_documents_only() {
        let mut f = fixture();
        // 4 tokens per line with <eos>, so 1600 tokens in windows of 3
        let corpus = "the cat ran\n".repeat(400);
        fs::write(f.paths.dataset_dir("toy").join("train.txt"), corpus).unwrap();

        assert_eq!(f.manager.record_default("PTB-LSTM", "train").unwrap(), Outcome::Ready(true));
        let evals = RecordStore::new(&f.paths.record_dir).load("toy", "LSTM-PTB").unwrap();
        assert_eq!(evals.len(), RECORDER_CAPACITY);
        assert_eq!(evals[RECORDER_CAPACITY - 1].doc.index, RECORDER_CAPACITY - 1);
        // the whole split was still evaluated
        assert_eq!(f.model.steps_taken(), 1600);
    }

    #[test]
    fn test_failed_record_default_keeps_previous_recording() {
        let mut f = fixture_with(FakeModel::with_words(&WORDS).failing_after(12));
        assert_eq!(f.manager.record_default("PTB-LSTM", "valid").unwrap(), Outcome::Ready(true));
        assert_eq!(f.manager.record_default("PTB-LSTM", "valid").unwrap(), Outcome::Ready(false));

        let evals = RecordStore::new(&f.paths.record_dir).load("toy", "LSTM-PTB").unwrap();
        let sizes: Vec<usize> = evals.iter().map(|e| e.steps.len()).collect();
        assert_eq!(sizes, vec![3, 3, 2]);
    }

    #[test]
    fn test_record_default_empty_split_returns_false() {
        let mut f = fixture();
        fs::write(f.paths.dataset_dir("toy").join("test.txt"), "\n\n").unwrap();
        assert_eq!(f.manager.record_default("PTB-LSTM", "test").unwrap(), Outcome::Ready(false));
        assert_eq!(f.model.steps_taken(), 0);
    }

    #[test]
    fn test_record_sequence_returns_at_most_capacity() {
        let mut f = fixture();
        let pair: &[&str] = &["the", "cat"];
        let many = vec![pair; RECORDER_CAPACITY + 20];
        let evals = f.manager.record_sequence("PTB-LSTM", words(&many)).unwrap().ready().unwrap();
        assert_eq!(evals.len(), RECORDER_CAPACITY);
    }

    #[test]
    fn test_statistics_reject_states_the_model_lacks() {
        let mut f = fixture();
        let m = &mut f.manager;
        m.record_default("PTB-LSTM", "valid").unwrap();

        assert!(matches!(m.state_signature("PTB-LSTM", STATE_C, &[0], 5).unwrap(), Outcome::Unavailable(_)));
        assert!(matches!(m.strength("PTB-LSTM", "state_x", &[0], 3).unwrap(), Outcome::Unavailable(_)));
        assert!(matches!(m.state_projection("PTB-LSTM", STATE_C, -1, "tsne").unwrap(), Outcome::Unavailable(_)));
    }

    #[test]
    fn test_record_default_missing_split_file_returns_false() {
        let mut f = fixture();
        assert_eq!(f.manager.record_default("PTB-LSTM", "test").unwrap(), Outcome::Ready(false));
    }

    #[test]
    fn test_sentences_to_ids() {
        let mut f = fixture();
        let ids = f
            .manager
            .sentences_to_ids("PTB-LSTM", &["the cat".to_string(), "a zebra".to_string()])
            .unwrap()
            .ready()
            .unwrap();
        assert_eq!(ids, vec![vec![2, 3], vec![4, 1]]);
    }

    #[test]
    fn test_statistics_over_recorded_split() {
        let mut f = fixture();
        let m = &mut f.manager;
        assert!(matches!(m.state_signature("PTB-LSTM", STATE_H, &[0], 5).unwrap(), Outcome::Unavailable(_)));

        m.record_default("PTB-LSTM", "valid").unwrap();

        let sig = m.state_signature("PTB-LSTM", STATE_H, &[0], 5).unwrap().ready().unwrap();
        assert_eq!(sig.len(), 5);
        assert!(sig.iter().all(|v| v.len() == 2));

        let strength = m.strength("PTB-LSTM", STATE_H, &[0], 3).unwrap().ready().unwrap();
        assert_eq!(strength["words"], serde_json::json!(["<eos>", "<unk>", "the"]));
        assert_eq!(strength["strength"].as_array().unwrap().len(), 3);

        let proj = m.state_projection("PTB-LSTM", STATE_H, -1, "tsne").unwrap().ready().unwrap();
        assert_eq!(proj["points"].as_array().unwrap().len(), 8);
        assert_eq!(proj["states_num"], serde_json::json!([8]));
        assert!(proj["labels"].as_array().unwrap().iter().all(|l| l == 0));
    }

    #[test]
    fn test_projection_rejects_method_and_layer() {
        let mut f = fixture();
        let m = &mut f.manager;
        assert!(matches!(m.state_projection("PTB-LSTM", STATE_H, -1, "pca").unwrap(), Outcome::Unavailable(_)));
        assert!(matches!(m.state_projection("PTB-LSTM", STATE_H, 1, "tsne").unwrap(), Outcome::Unavailable(_)));
        assert!(matches!(m.state_projection("PTB-LSTM", STATE_H, -2, "tsne").unwrap(), Outcome::Unavailable(_)));
    }

    #[test]
    fn test_resolve_layer() {
        assert_eq!(resolve_layer(-1, 2), Some(1));
        assert_eq!(resolve_layer(0, 2), Some(0));
        assert_eq!(resolve_layer(2, 2), None);
        assert_eq!(resolve_layer(-3, 2), None);
    }
}
