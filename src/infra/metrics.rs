// ============================================================
// Layer 6 — Training Metrics
// ============================================================
// Two pieces:
//
//   LossMeter     — moving average over the last `window`
//                   per-batch losses, used for progress lines
//   MetricsLogger — appends one CSV row per periodic evaluation
//
// Output file: {save_root}/metrics.csv
//
//   epoch,step,progress,loss,accuracy,lr
//   0,0,0.000000,0.693147,0.500000,0.000200
//   0,12,0.100000,0.681204,0.562500,0.000200
//   ...

use anyhow::{Context, Result};
use std::{
    collections::VecDeque,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

// ─── LossMeter ────────────────────────────────────────────────────────────────
/// Bounded moving average of recent loss values.
#[derive(Debug, Clone)]
pub struct LossMeter {
    window: usize,
    values: VecDeque<f64>,
    sum:    f64,
}

impl LossMeter {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self { window, values: VecDeque::with_capacity(window), sum: 0.0 }
    }

    pub fn add(&mut self, value: f64) {
        if self.values.len() == self.window {
            if let Some(oldest) = self.values.pop_front() {
                self.sum -= oldest;
            }
        }
        self.values.push_back(value);
        self.sum += value;
    }

    /// Mean of the values currently in the window, 0 when empty
    pub fn value(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum / self.values.len() as f64
        }
    }
}

// ─── EvalRecord ───────────────────────────────────────────────────────────────
/// One periodic held-out evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalRecord {
    pub epoch:    usize,
    /// Step index within the epoch
    pub step:     usize,
    /// step / steps_per_epoch, in [0, 1)
    pub progress: f64,
    /// Moving-average training loss at the time of the evaluation
    pub loss:     f64,
    /// Fraction of held-out samples classified correctly, in [0, 1]
    pub accuracy: f64,
    pub lr:       f64,
}

// ─── MetricsLogger ────────────────────────────────────────────────────────────
/// Appends evaluation records to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header only if the file does not exist yet,
    /// so a resumed run keeps appending to the same file.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "epoch,step,progress,loss,accuracy,lr")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, r: &EvalRecord) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6},{:.6}",
            r.epoch, r.step, r.progress, r.loss, r.accuracy, r.lr,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
