// ============================================================
// Layer 3 — Piano-Roll Domain Types
// ============================================================
// A piano roll is an image-like tensor: [channels, pitch, time].
// It is stored flattened in row-major order; the shape lives in
// the run configuration and is checked when a split is loaded.
//
// Labels are two-wide vectors. Genre A is [1, 0] and genre B is
// [0, 1]; soft labels (e.g. [0.9, 0.1]) are also accepted.

use std::fmt;

/// Which side of the genre pair a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreSide {
    A,
    B,
}

impl GenreSide {
    /// One-hot label for this side of the pair
    pub fn one_hot(self) -> [f32; 2] {
        match self {
            GenreSide::A => [1.0, 0.0],
            GenreSide::B => [0.0, 1.0],
        }
    }
}

/// Dataset split names understood by the split providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test  => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labelled sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PianoRoll {
    /// Flattened [channels, pitch, time] values
    pub data:  Vec<f32>,
    /// Two-way label, one-hot or soft
    pub label: [f32; 2],
}

impl PianoRoll {
    pub fn new(data: Vec<f32>, side: GenreSide) -> Self {
        Self { data, label: side.one_hot() }
    }

    /// Index of the highest label entry. Ties go to class 0.
    pub fn class_index(&self) -> usize {
        if self.label[1] > self.label[0] { 1 } else { 0 }
    }
}
