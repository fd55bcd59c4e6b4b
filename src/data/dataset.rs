use anyhow::{ensure, Result};
use burn::data::dataset::Dataset;

use crate::domain::piano_roll::PianoRoll;

/// One split of a genre pair, shape-checked at construction.
#[derive(Debug, Clone)]
pub struct GenrePairDataset {
    samples:     Vec<PianoRoll>,
    input_shape: [usize; 3],
}

impl GenrePairDataset {
    pub fn new(samples: Vec<PianoRoll>, input_shape: [usize; 3]) -> Result<Self> {
        let expected: usize = input_shape.iter().product();
        for (i, s) in samples.iter().enumerate() {
            ensure!(
                s.data.len() == expected,
                "sample {} has {} values, expected {} for shape {:?}",
                i,
                s.data.len(),
                expected,
                input_shape
            );
        }
        Ok(Self { samples, input_shape })
    }

    pub fn input_shape(&self) -> [usize; 3] {
        self.input_shape
    }

    /// Number of samples labelled class 0 and class 1
    pub fn class_counts(&self) -> [usize; 2] {
        self.samples.iter().fold([0, 0], |mut acc, s| {
            acc[s.class_index()] += 1;
            acc
        })
    }

    /// Every sample flattened back to back: [len * c * h * w]
    pub fn data(&self) -> Vec<f32> {
        self.samples.iter().flat_map(|s| s.data.iter().copied()).collect()
    }

    /// Every label flattened back to back: [len * 2]
    pub fn labels(&self) -> Vec<f32> {
        self.samples.iter().flat_map(|s| s.label).collect()
    }
}

impl Dataset<PianoRoll> for GenrePairDataset {
    fn get(&self, index: usize) -> Option<PianoRoll> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
