// ============================================================
// Layer 4 — Piano-Roll Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<PianoRoll>
// into device tensors:
//
//   Input:  N samples, each c*h*w values and a 2-wide label
//   Output: rolls  [N, c, h, w]
//           labels [N, 2]
//
// The same batcher builds training batches on the autodiff
// backend and the full held-out set on the inner backend.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::piano_roll::PianoRoll;

#[derive(Debug, Clone)]
pub struct ClassifierBatch<B: Backend> {
    /// [batch, channels, pitch, time]
    pub rolls:  Tensor<B, 4>,
    /// [batch, 2], one-hot or soft
    pub labels: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct ClassifierBatcher<B: Backend> {
    pub device:      B::Device,
    pub input_shape: [usize; 3],
}

impl<B: Backend> ClassifierBatcher<B> {
    pub fn new(device: B::Device, input_shape: [usize; 3]) -> Self {
        Self { device, input_shape }
    }

    /// Build a batch from already flattened sample and label buffers.
    pub fn from_flat(&self, data: &[f32], labels: &[f32]) -> ClassifierBatch<B> {
        let n = labels.len() / 2;
        let [c, h, w] = self.input_shape;

        let rolls = Tensor::<B, 1>::from_floats(data, &self.device).reshape([n, c, h, w]);
        let labels = Tensor::<B, 1>::from_floats(labels, &self.device).reshape([n, 2]);

        ClassifierBatch { rolls, labels }
    }
}

impl<B: Backend> Batcher<PianoRoll, ClassifierBatch<B>> for ClassifierBatcher<B> {
    fn batch(&self, items: Vec<PianoRoll>) -> ClassifierBatch<B> {
        let data: Vec<f32> = items.iter().flat_map(|s| s.data.iter().copied()).collect();
        let labels: Vec<f32> = items.iter().flat_map(|s| s.label).collect();
        self.from_flat(&data, &labels)
    }
}
