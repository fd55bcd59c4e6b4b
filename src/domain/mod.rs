// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing what the classifier works on:
// piano-roll samples, the two genre domains and the dataset
// splits. No Burn types and no file I/O in this layer.

// A single piano-roll sample with its two-way label
pub mod piano_roll;

// Abstractions the data layer implements
pub mod traits;
