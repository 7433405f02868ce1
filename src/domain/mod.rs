// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits describing what the backend
// works with: tokens and vocabularies, recurrent states,
// recorded evaluations, generation trees, and the contracts
// every model, builder and recorder must satisfy.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain structs, enums, and traits
//
// The ML layer implements RnnModel on top of Burn, the infra
// layer implements Recorder on top of the file system, and
// the application layer only talks to the traits.

// Tokens, seeds and the word <-> id vocabulary
pub mod token;

// Recurrent state, per-step records and dataset splits
pub mod record;

// Nodes and parameters of the branching generator
pub mod generation;

// Core abstractions (traits) that other layers implement
pub mod traits;
