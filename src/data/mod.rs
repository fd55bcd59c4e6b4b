// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From split files on disk to device tensors:
//
//   {data_dir}/{genre}/{split}.json
//       │
//       ▼
//   JsonSplitLoader   → one PianoRoll per row, labelled by genre
//       │
//       ▼
//   GenrePairDataset  → shape-checked, implements Burn's Dataset
//       │
//       ▼
//   BatchLoader       → seeded shuffle, full batches, worker threads
//       │
//       ▼
//   ClassifierBatcher → [N, c, h, w] rolls and [N, 2] labels

/// Reads genre split files
pub mod loader;

/// Implements Burn's Dataset trait for one split
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffling, batching and background prefetch
pub mod prefetcher;
