// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn framework code lives in this layer; the layers above
// only see the RnnModel trait.
//
//   model.rs        embedding → stacked LSTM/GRU → softmax
//   builder.rs      YAML config + vocabulary → model
//   generator.rs    probability-pruned branching search
//   evaluator.rs    streams a Feeder and records per-step state
//   analysis.rs     signature / strength / projection statistics
//   tsne.rs         exact t-SNE used by the projection
//
// Reference: Burn Book §3 (Building Blocks)
//            van der Maaten & Hinton (2008) Visualizing Data using t-SNE

/// Recurrent language model architecture
pub mod model;

/// Turns a model YAML file into a model handle
pub mod builder;

/// Branching text generation
pub mod generator;

/// Evaluation with state recording
pub mod evaluator;

/// Statistics over recorded states
pub mod analysis;

pub mod tsne;

#[cfg(test)]
pub mod fake;
