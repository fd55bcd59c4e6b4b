// ============================================================
// Layer 4 — JSON Split Loader
// ============================================================
// Reads the pre-processed piano rolls of a genre pair:
//
//   {data_dir}/{genre}/{split}.json
//
//   {
//     "shape":   [1, 64, 84],
//     "samples": [[0.0, 1.0, ...], ...]   ← one flat row per sample
//   }
//
// Samples of genre A are labelled [1, 0], genre B [0, 1].
// The file's shape must equal the configured input shape.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::domain::piano_roll::{GenreSide, PianoRoll, Split};
use crate::domain::traits::SplitProvider;

/// On-disk format of one genre's split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitFile {
    pub shape:   [usize; 3],
    pub samples: Vec<Vec<f32>>,
}

pub struct JsonSplitLoader {
    data_dir:    PathBuf,
    genre_a:     String,
    genre_b:     String,
    input_shape: [usize; 3],
}

impl JsonSplitLoader {
    pub fn new(
        data_dir:    impl Into<PathBuf>,
        genre_a:     impl Into<String>,
        genre_b:     impl Into<String>,
        input_shape: [usize; 3],
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            genre_a:  genre_a.into(),
            genre_b:  genre_b.into(),
            input_shape,
        }
    }

    pub fn split_path(&self, genre: &str, split: Split) -> PathBuf {
        self.data_dir.join(genre).join(format!("{}.json", split.as_str()))
    }

    fn load_genre(&self, genre: &str, side: GenreSide, split: Split) -> Result<Vec<PianoRoll>> {
        let path = self.split_path(genre, split);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read {} split of '{}' at '{}'", split, genre, path.display()))?;
        let file: SplitFile = serde_json::from_str(&json)
            .with_context(|| format!("Invalid split file '{}'", path.display()))?;

        ensure!(
            file.shape == self.input_shape,
            "'{}' holds shape {:?}, configured input shape is {:?}",
            path.display(),
            file.shape,
            self.input_shape
        );

        tracing::debug!("Read {} {} samples of '{}'", file.samples.len(), split, genre);
        Ok(file.samples.into_iter().map(|data| PianoRoll::new(data, side)).collect())
    }
}

impl SplitProvider for JsonSplitLoader {
    fn load_split(&self, split: Split) -> Result<Vec<PianoRoll>> {
        let mut samples = self.load_genre(&self.genre_a, GenreSide::A, split)?;
        samples.extend(self.load_genre(&self.genre_b, GenreSide::B, split)?);
        Ok(samples)
    }
}
