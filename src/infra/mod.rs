// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several layers:
//
//   config.rs            on-disk layout (ManagerConfig) and the
//                        per-model YAML TrainConfig
//
//   checkpoint.rs        full-precision Burn weights, one
//                        directory per model
//
//   tokenizer_store.rs   the vocabulary, persisted as a WordLevel
//                        tokenizer JSON next to the dataset
//
//   record_store.rs      JSON-lines storage of recorded states,
//                        keyed by (dataset, model), replaced whole
//
//   recorder.rs          the in-memory and persistent Recorder
//                        sinks driven by the evaluator
//
//   metrics.rs           per-run evaluation metrics CSV

pub mod config;

pub mod checkpoint;

pub mod tokenizer_store;

pub mod record_store;

pub mod recorder;

pub mod metrics;
