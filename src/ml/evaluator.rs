// ============================================================
// Layer 5 — Held-Out Evaluation
// ============================================================
// The whole test split is materialised once per run as dense
// tensors on the inference backend and reused unchanged for
// every periodic evaluation.
//
// accuracy = mean( argmax(softmax(scores)) == argmax(labels) )
//
// Optional: N(0, std) noise added to the held-out rolls once,
// at construction, when the run enables it.

use anyhow::{ensure, Result};
use burn::{
    data::dataset::Dataset,
    prelude::*,
    tensor::{activation::softmax, Distribution},
};

use crate::data::{batcher::ClassifierBatcher, dataset::GenrePairDataset};
use crate::ml::model::GenreClassifier;

pub struct EvalSet<B: Backend> {
    rolls: Tensor<B, 4>,
    /// Class index of every label row: [len]
    truth: Tensor<B, 1, Int>,
    len:   usize,
}

impl<B: Backend> EvalSet<B> {
    pub fn from_dataset(
        dataset:   &GenrePairDataset,
        device:    &B::Device,
        noise_std: Option<f64>,
    ) -> Result<Self> {
        ensure!(!dataset.is_empty(), "held-out split is empty");

        let batcher = ClassifierBatcher::<B>::new(device.clone(), dataset.input_shape());
        let batch   = batcher.from_flat(&dataset.data(), &dataset.labels());

        let rolls = match noise_std {
            Some(std) if std > 0.0 => {
                tracing::info!("Perturbing held-out samples with N(0, {})", std);
                let noise = Tensor::random(batch.rolls.shape(), Distribution::Normal(0.0, std), device);
                batch.rolls + noise
            }
            _ => batch.rolls,
        };

        Ok(Self {
            rolls,
            truth: batch.labels.argmax(1).flatten::<1>(0, 1),
            len:   dataset.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Fraction of held-out samples the model classifies correctly.
    pub fn accuracy(&self, model: &GenreClassifier<B>) -> f64 {
        let scores = model.forward(self.rolls.clone());
        match_rate(scores, self.truth.clone())
    }
}

/// Share of rows whose highest softmax score is the true class.
pub fn match_rate<B: Backend>(scores: Tensor<B, 2>, truth: Tensor<B, 1, Int>) -> f64 {
    let rows = truth.dims()[0];
    if rows == 0 {
        return 0.0;
    }

    let predicted = softmax(scores, 1).argmax(1).flatten::<1>(0, 1);
    let correct: i64 = predicted
        .equal(truth)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();

    correct as f64 / rows as f64
}
