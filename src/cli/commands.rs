// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// One subcommand per public manager operation, plus the global
// directory flags every command shares.
//
// clap's derive macros generate --help, error messages for
// missing args and the string → number conversions.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::domain::generation::GenerateParams;
use crate::domain::record::STATE_H;
use crate::domain::token::Token;
use crate::infra::config::ManagerConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the logical model names in the catalog
    Models,

    /// Print the YAML config path behind a model name
    ConfigPath(NameArgs),

    /// Load a model (and restore its checkpoint) without running anything
    Load(LoadArgs),

    /// Branching text generation from seed tokens
    Generate(GenerateArgs),

    /// Record hidden states for ad-hoc sentences and print them
    RecordSequence(RecordSequenceArgs),

    /// Record hidden states for a dataset split and persist them
    RecordDefault(RecordDefaultArgs),

    /// Map sentences to vocabulary ids
    ToIds(ToIdsArgs),

    /// Sample of recorded state vectors
    Signature(SignatureArgs),

    /// Mean recorded state per frequent word
    Strength(StrengthArgs),

    /// 2D projection of one layer's recorded states
    Projection(ProjectionArgs),
}

/// Where configs, datasets, checkpoints and recordings live
#[derive(Args, Debug, Clone)]
pub struct PathArgs {
    /// Directory of model YAML files
    #[arg(long, global = true, default_value = "config")]
    pub config_dir: PathBuf,

    /// Directory of datasets (<data-dir>/<dataset>/<split>.txt)
    #[arg(long, global = true, default_value = "cached_data")]
    pub data_dir: PathBuf,

    /// Directory of trained checkpoints (<model-dir>/<model-name>/)
    #[arg(long, global = true, default_value = "models")]
    pub model_dir: PathBuf,

    /// Directory of persisted state recordings
    #[arg(long, global = true, default_value = "cached_data/records")]
    pub record_dir: PathBuf,
}

impl From<PathArgs> for ManagerConfig {
    fn from(a: PathArgs) -> Self {
        ManagerConfig {
            config_dir: a.config_dir,
            data_dir:   a.data_dir,
            model_dir:  a.model_dir,
            record_dir: a.record_dir,
        }
    }
}

#[derive(Args, Debug)]
pub struct NameArgs {
    /// Logical model name, e.g. PTB-LSTM
    pub model: String,
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    pub model: String,

    /// Open for training: skip the checkpoint requirement
    #[arg(long)]
    pub train: bool,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    pub model: String,

    /// Seed tokens, in order
    #[arg(required = true)]
    pub seeds: Vec<String>,

    /// Treat seeds as vocabulary ids instead of words
    #[arg(long)]
    pub ids: bool,

    /// Maximum children per node
    #[arg(long, default_value_t = 1)]
    pub max_branch: usize,

    /// Upper bound on the summed probability of a node's children
    #[arg(long, default_value_t = 0.9)]
    pub accum_cond_prob: f32,

    /// Lower bound on a child's conditional probability
    #[arg(long, default_value_t = 0.0)]
    pub min_cond_prob: f32,

    /// Lower bound on a node's path probability
    #[arg(long, default_value_t = 0.0)]
    pub min_prob: f32,

    /// Maximum depth below the last seed
    #[arg(long, default_value_t = 10)]
    pub max_step: usize,

    /// Comma-separated ids that may never be generated
    #[arg(long, value_delimiter = ',')]
    pub neg_word_ids: Vec<u32>,
}

impl GenerateArgs {
    /// Seeds as tokens, parsed as ids when --ids is set
    pub fn seed_tokens(&self) -> anyhow::Result<Vec<Token>> {
        self.seeds
            .iter()
            .map(|s| {
                if self.ids {
                    s.parse::<u32>()
                        .map(Token::Id)
                        .map_err(|_| anyhow::anyhow!("'{s}' is not a word id"))
                } else {
                    Ok(Token::from(s.as_str()))
                }
            })
            .collect()
    }
}

impl From<&GenerateArgs> for GenerateParams {
    fn from(a: &GenerateArgs) -> Self {
        GenerateParams {
            max_branch:      a.max_branch,
            accum_cond_prob: a.accum_cond_prob,
            min_cond_prob:   a.min_cond_prob,
            min_prob:        a.min_prob,
            max_step:        a.max_step,
            neg_word_ids:    a.neg_word_ids.iter().copied().collect(),
        }
    }
}

#[derive(Args, Debug)]
pub struct RecordSequenceArgs {
    pub model: String,

    /// One whitespace-separated sentence; repeat for several
    #[arg(long = "sentence", required = true)]
    pub sentences: Vec<String>,
}

impl RecordSequenceArgs {
    pub fn tokens(&self) -> Vec<Vec<Token>> {
        self.sentences
            .iter()
            .map(|s| s.split_whitespace().map(Token::from).collect())
            .collect()
    }
}

#[derive(Args, Debug)]
pub struct RecordDefaultArgs {
    pub model: String,

    /// train, valid or test
    pub split: String,
}

#[derive(Args, Debug)]
pub struct ToIdsArgs {
    pub model: String,

    #[arg(required = true)]
    pub sentences: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SignatureArgs {
    pub model: String,

    #[arg(long, default_value = STATE_H)]
    pub state: String,

    /// Comma-separated layer indices, concatenated in order
    #[arg(long, value_delimiter = ',', required = true)]
    pub layers: Vec<usize>,

    #[arg(long, default_value_t = 1000)]
    pub sample_size: usize,
}

#[derive(Args, Debug)]
pub struct StrengthArgs {
    pub model: String,

    #[arg(long, default_value = STATE_H)]
    pub state: String,

    #[arg(long, value_delimiter = ',', required = true)]
    pub layers: Vec<usize>,

    /// Number of most frequent words to include
    #[arg(long, default_value_t = 100)]
    pub top_k: usize,
}

#[derive(Args, Debug)]
pub struct ProjectionArgs {
    pub model: String,

    #[arg(long, default_value = STATE_H)]
    pub state: String,

    /// Layer index; negative counts from the last layer
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    pub layer: i64,

    #[arg(long, default_value = "tsne")]
    pub method: String,
}
