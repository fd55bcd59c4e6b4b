// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// `train` and `test` take the same arguments. A run is built
// in three layers, later ones winning:
//
//   1. RunConfig::default()
//   2. --config <file.json>      (a complete serialised RunConfig)
//   3. individual --flags
//
// Boolean flags can only switch a setting on.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::application::config::{Phase, RunConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the genre classifier
    Train(RunArgs),

    /// Evaluate a trained classifier (not available yet)
    Test(RunArgs),
}

impl Commands {
    pub fn phase(&self) -> Phase {
        match self {
            Commands::Train(_) => Phase::Train,
            Commands::Test(_)  => Phase::Test,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// JSON file holding a full run configuration
    #[arg(long)]
    pub config: Option<String>,

    /// Run name; outputs go to {save_dir}/{name}
    #[arg(long)]
    pub name: Option<String>,

    /// Train on the wgpu backend
    #[arg(long)]
    pub gpu: bool,

    #[arg(long)]
    pub genre_a: Option<String>,

    #[arg(long)]
    pub genre_b: Option<String>,

    /// Root of the {genre}/{split}.json files
    #[arg(long)]
    pub data_dir: Option<String>,

    #[arg(long)]
    pub save_dir: Option<String>,

    /// channels,pitch,time
    #[arg(long, value_delimiter = ',')]
    pub input_shape: Option<Vec<usize>>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Background batch loaders, 0 loads on the training thread
    #[arg(long)]
    pub num_threads: Option<usize>,

    #[arg(long)]
    pub lr: Option<f64>,

    #[arg(long)]
    pub beta1: Option<f64>,

    #[arg(long)]
    pub beta2: Option<f64>,

    #[arg(long)]
    pub weight_decay: Option<f64>,

    #[arg(long)]
    pub start_epoch: Option<usize>,

    /// Training stops after epoch max_epoch - 1
    #[arg(long)]
    pub max_epoch: Option<usize>,

    #[arg(long)]
    pub save_every: Option<usize>,

    /// Window of the moving-average loss
    #[arg(long)]
    pub plot_every: Option<usize>,

    #[arg(long)]
    pub gaussian_std: Option<f64>,

    /// Add Gaussian noise to the held-out samples
    #[arg(long)]
    pub perturb_eval: bool,

    /// Resume from the newest checkpoint of this run
    #[arg(long)]
    pub continue_train: bool,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl RunArgs {
    /// Merge the arguments over the JSON file (if any) and the defaults.
    pub fn into_config(self, phase: Phase) -> Result<RunConfig> {
        let mut cfg = match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None       => RunConfig::default(),
        };
        cfg.phase = phase;

        if let Some(v) = self.name         { cfg.name = v; }
        if let Some(v) = self.genre_a      { cfg.genre_a = v; }
        if let Some(v) = self.genre_b      { cfg.genre_b = v; }
        if let Some(v) = self.data_dir     { cfg.data_dir = v; }
        if let Some(v) = self.save_dir     { cfg.save_dir = v; }
        if let Some(v) = self.batch_size   { cfg.batch_size = v; }
        if let Some(v) = self.num_threads  { cfg.num_threads = v; }
        if let Some(v) = self.lr           { cfg.lr = v; }
        if let Some(v) = self.beta1        { cfg.beta1 = v; }
        if let Some(v) = self.beta2        { cfg.beta2 = v; }
        if let Some(v) = self.weight_decay { cfg.weight_decay = v; }
        if let Some(v) = self.start_epoch  { cfg.start_epoch = v; }
        if let Some(v) = self.max_epoch    { cfg.max_epoch = v; }
        if let Some(v) = self.save_every   { cfg.save_every = v; }
        if let Some(v) = self.plot_every   { cfg.plot_every = v; }
        if let Some(v) = self.gaussian_std { cfg.gaussian_std = v; }
        if let Some(v) = self.seed         { cfg.seed = v; }

        if let Some(shape) = self.input_shape {
            cfg.input_shape = shape
                .try_into()
                .map_err(|s: Vec<usize>| anyhow::anyhow!("--input-shape needs 3 values, got {:?}", s))?;
        }

        cfg.gpu            |= self.gpu;
        cfg.perturb_eval   |= self.perturb_eval;
        cfg.continue_train |= self.continue_train;
        Ok(cfg)
    }
}
