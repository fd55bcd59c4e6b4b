// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: validate the run configuration,
// pick a backend, build the split provider and hand off to the
// training controller in the ML layer.

// Run configuration shared by every layer
pub mod config;

// The training workflow and phase dispatch
pub mod train_use_case;
