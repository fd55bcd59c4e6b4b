// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that touches autodiff lives here:
//
//   model.rs     — three strided convolutions, global pooling
//                  and a two-way softmax head
//   loss.rs      — binary cross-entropy on probabilities
//   schedule.rs  — step decay, evaluation cadence, save policy
//   evaluator.rs — accuracy on the held-out split, computed
//                  on the inner (non-autodiff) backend
//   trainer.rs   — resume/reset decision and the epoch loop

/// Genre classifier architecture
pub mod model;

/// Training objective
pub mod loss;

/// Learning-rate decay and step/epoch bookkeeping
pub mod schedule;

/// Held-out accuracy
pub mod evaluator;

/// Training controller
pub mod trainer;
