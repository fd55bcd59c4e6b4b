// ============================================================
// Layer 2 — Run Configuration
// ============================================================
// Every parameter of a run lives here. It is built once by the
// CLI (from flags or a JSON file), validated, and then only
// read. Resuming from a checkpoint does not mutate it; the
// trainer keeps its own effective start epoch.
//
// Directory layout derived from `save_dir` and `name`:
//
//   {save_dir}/{name}/
//     checkpoints/        ← {name}_C_{epoch}.mpk
//     models/
//     test/
//     info.log
//     run_config.json
//     metrics.csv

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

/// What the process should do with the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Train,
    Test,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub name:           String,
    pub phase:          Phase,
    /// Train on the wgpu backend instead of the ndarray CPU backend
    pub gpu:            bool,
    pub genre_a:        String,
    pub genre_b:        String,
    pub data_dir:       String,
    pub save_dir:       String,
    /// [channels, pitch, time]
    pub input_shape:    [usize; 3],
    pub batch_size:     usize,
    /// Background batch-loading threads, 0 loads on the training thread
    pub num_threads:    usize,
    pub lr:             f64,
    pub beta1:          f64,
    pub beta2:          f64,
    pub weight_decay:   f64,
    pub start_epoch:    usize,
    /// Exclusive upper bound; the last trained epoch is max_epoch - 1
    pub max_epoch:      usize,
    pub save_every:     usize,
    /// Window of the moving-average training loss
    pub plot_every:     usize,
    pub gaussian_std:   f64,
    /// Add N(0, gaussian_std) noise to the held-out samples before evaluating
    pub perturb_eval:   bool,
    pub continue_train: bool,
    /// Base seed for per-epoch shuffling
    pub seed:           u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            name:           "classifier".to_string(),
            phase:          Phase::Train,
            gpu:            false,
            genre_a:        "pop".to_string(),
            genre_b:        "jazz".to_string(),
            data_dir:       "data".to_string(),
            save_dir:       "checkpoints".to_string(),
            input_shape:    [1, 64, 84],
            batch_size:     32,
            num_threads:    4,
            lr:             2e-4,
            beta1:          0.5,
            beta2:          0.999,
            weight_decay:   0.0,
            start_epoch:    0,
            max_epoch:      30,
            save_every:     5,
            plot_every:     10,
            gaussian_std:   1.0,
            perturb_eval:   false,
            continue_train: false,
            seed:           42,
        }
    }
}

impl RunConfig {
    /// Read a complete configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid run config in '{}'", path.display()))
    }

    /// Reject configurations the trainer cannot run.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.name.is_empty(), "run name must not be empty");
        // The recorder replaces anything after a '.' with its own extension.
        ensure!(
            !self.name.contains(['.', '/', '\\']),
            "run name '{}' must not contain '.' or path separators",
            self.name
        );
        ensure!(self.batch_size > 0, "batch_size must be at least 1");
        ensure!(self.save_every > 0, "save_every must be at least 1");
        ensure!(self.plot_every > 0, "plot_every must be at least 1");
        ensure!(
            self.input_shape.iter().all(|&d| d > 0),
            "input_shape {:?} has a zero dimension",
            self.input_shape
        );
        ensure!(
            self.start_epoch <= self.max_epoch,
            "start_epoch ({}) is past max_epoch ({})",
            self.start_epoch,
            self.max_epoch
        );
        ensure!(self.lr > 0.0, "learning rate must be positive");
        ensure!(self.gaussian_std >= 0.0, "gaussian_std must not be negative");
        Ok(())
    }

    pub fn save_path(&self) -> PathBuf {
        PathBuf::from(&self.save_dir).join(&self.name)
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.save_path().join("checkpoints")
    }

    pub fn model_path(&self) -> PathBuf {
        self.save_path().join("models")
    }

    pub fn test_path(&self) -> PathBuf {
        self.save_path().join("test")
    }

    pub fn log_path(&self) -> PathBuf {
        self.save_path().join("info.log")
    }
}
