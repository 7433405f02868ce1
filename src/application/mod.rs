// ============================================================
// Layer 2 — Application / Orchestration
// ============================================================
// Resolves model names and coordinates the other layers for
// each public operation.
//
// Rules for this layer:
//   - No model math here (Layer 5)
//   - No printing here (Layer 1)
//   - No direct file formats here (Layer 6)
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Result types shared by every operation
pub mod outcome;

// Name → loaded model, built at most once
pub mod model_cache;

// The public operations
pub mod model_manager;
