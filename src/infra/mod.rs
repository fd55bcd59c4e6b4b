// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the training controller:
//
//   checkpoint.rs — epoch-indexed parameter snapshots
//                   ({run}_C_{epoch}.mpk), latest-epoch lookup
//   run_dirs.rs   — the save/checkpoint/model/test tree,
//                   reset on fresh runs
//   metrics.rs    — moving-average loss and the evaluation CSV
//   logging.rs    — tracing subscriber with a file mirror that
//                   can be attached mid-run

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Run directory layout
pub mod run_dirs;

/// Loss meter and evaluation CSV
pub mod metrics;

/// Tracing setup and the file-mirroring sink
pub mod logging;
