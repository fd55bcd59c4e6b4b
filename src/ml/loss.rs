// ============================================================
// Layer 5 — Binary Cross-Entropy on Probabilities
// ============================================================
// loss = -mean( y * ln(p) + (1 - y) * ln(1 - p) )
//
// `p` are the model's probabilities, not logits. They are
// clamped to [EPS, 1 - EPS] first so neither log sees zero.
// Targets may be one-hot or soft.

use burn::prelude::*;

const EPS: f64 = 1e-7;

pub fn binary_cross_entropy<B: Backend, const D: usize>(
    probs:   Tensor<B, D>,
    targets: Tensor<B, D>,
) -> Tensor<B, 1> {
    let probs = probs.clamp(EPS, 1.0 - EPS);

    let log_p     = probs.clone().log();
    let log_not_p = probs.neg().add_scalar(1.0).log();
    let not_y     = targets.clone().neg().add_scalar(1.0);

    (targets * log_p + not_y * log_not_p).mean().neg()
}
