// ============================================================
// Layer 5 — Model Builder
// ============================================================
// Turns a model YAML file into a ready (but untrained) model:
//
//   Step 1: Parse the TrainConfig             (infra/config)
//   Step 2: Load or build the vocabulary      (infra/tokenizer_store)
//           from the dataset's train split    (data/loader)
//   Step 3: Initialise the Burn module        (ml/model)
//
// Restoring trained weights is a separate step owned by the
// model cache, since models opened for training skip it.

use anyhow::Result;
use burn::prelude::*;
use std::path::Path;

use crate::data::loader::CorpusLoader;
use crate::domain::record::Split;
use crate::domain::traits::RnnModel;
use crate::infra::config::{ManagerConfig, TrainConfig};
use crate::infra::tokenizer_store::TokenizerStore;
use crate::ml::model::BurnRnnModel;

pub trait ModelBuilder {
    fn build(&self, config_path: &Path) -> Result<(Box<dyn RnnModel>, TrainConfig)>;
}

pub struct BurnModelBuilder<B: Backend> {
    paths:  ManagerConfig,
    device: B::Device,
}

impl<B: Backend> BurnModelBuilder<B> {
    pub fn new(paths: ManagerConfig, device: B::Device) -> Self {
        Self { paths, device }
    }
}

impl<B: Backend + 'static> ModelBuilder for BurnModelBuilder<B> {
    fn build(&self, config_path: &Path) -> Result<(Box<dyn RnnModel>, TrainConfig)> {
        let cfg = TrainConfig::load(config_path)?;
        tracing::info!("Building model '{}' from '{}'", cfg.name, config_path.display());

        let dataset_dir = self.paths.dataset_dir(&cfg.dataset);
        let store  = TokenizerStore::for_vocab_size(&dataset_dir, cfg.vocab_size);
        let loader = CorpusLoader::new(&dataset_dir);
        let vocab  = store.load_or_build(|| loader.load_lines(Split::Train), cfg.vocab_size)?;
        anyhow::ensure!(!vocab.is_empty(), "Vocabulary of '{}' is empty", cfg.dataset);

        let model = BurnRnnModel::<B>::new(&cfg, vocab, &self.device);
        Ok((Box::new(model), cfg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use std::fs;

    const TINY_YML: &str = "\
name: GRU-Toy
dataset: toy
cell_type: gru
layer_num: 1
layer_size: 3
embedding_size: 2
vocab_size: 50
num_steps: 4
";

    #[test]
    fn test_builds_model_and_vocabulary() {
        let root  = tempfile::tempdir().unwrap();
        let paths = ManagerConfig::rooted_at(root.path());
        fs::create_dir_all(paths.dataset_dir("toy")).unwrap();
        fs::write(paths.dataset_dir("toy").join("train.txt"), "the cat\nthe dog\n").unwrap();
        fs::create_dir_all(&paths.config_dir).unwrap();
        fs::write(paths.config_file("toy.yml"), TINY_YML).unwrap();

        let builder = BurnModelBuilder::<NdArray>::new(paths.clone(), Default::default());
        let (model, cfg) = builder.build(&paths.config_file("toy.yml")).unwrap();

        assert_eq!(cfg.name, "GRU-Toy");
        assert_eq!(model.name(), "GRU-Toy");
        assert_eq!(model.layer_num(), 1);
        // the, cat, dog, <eos>, <unk>
        assert_eq!(model.vocabulary().len(), 5);
        assert!(paths.dataset_dir("toy").join("tokenizer-50.json").exists());
    }

    #[test]
    fn test_missing_dataset_fails_build() {
        let root  = tempfile::tempdir().unwrap();
        let paths = ManagerConfig::rooted_at(root.path());
        fs::create_dir_all(&paths.config_dir).unwrap();
        fs::write(paths.config_file("toy.yml"), TINY_YML).unwrap();

        let builder = BurnModelBuilder::<NdArray>::new(paths.clone(), Default::default());
        assert!(builder.build(&paths.config_file("toy.yml")).is_err());
    }
}
