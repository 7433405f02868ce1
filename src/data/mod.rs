// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Turns token sequences into the windows the evaluator streams.
//
//   cached_data/<dataset>/<split>.txt
//       │
//       ▼
//   CorpusLoader      → reads one split, line by line
//       │
//       ▼
//   Preprocessor      → normalises whitespace and control chars
//       │
//       ▼
//   CorpusProducer    → one long id stream cut into num_steps windows
//
//   caller sequences
//       │
//       ▼
//   SentenceProducer  → one window per sentence
//
// Both producers emit a Feeder, the only input type the
// evaluator understands.

/// Reads dataset split files from disk
pub mod loader;

/// Cleans raw corpus text
pub mod preprocessor;

/// Window producers and the Feeder they emit
pub mod producer;
