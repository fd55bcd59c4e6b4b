// ============================================================
// Layer 6 — Run Directory Tree
// ============================================================
// Owns the on-disk layout of one run:
//
//   {save}/             ← save root, info.log, run_config.json, metrics.csv
//   {save}/checkpoints/
//   {save}/models/
//   {save}/test/
//
// A fresh run wipes the whole tree and recreates it empty.
// A resumed run keeps it and only creates what is missing.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::application::config::RunConfig;

#[derive(Debug, Clone)]
pub struct RunDirs {
    pub save:        PathBuf,
    pub checkpoints: PathBuf,
    pub models:      PathBuf,
    pub test:        PathBuf,
    pub log_file:    PathBuf,
}

impl RunDirs {
    pub fn from_config(cfg: &RunConfig) -> Self {
        Self {
            save:        cfg.save_path(),
            checkpoints: cfg.checkpoint_path(),
            models:      cfg.model_path(),
            test:        cfg.test_path(),
            log_file:    cfg.log_path(),
        }
    }

    /// Delete the save root (if any) and recreate every directory empty.
    pub fn reset(&self) -> Result<()> {
        if self.save.exists() {
            fs::remove_dir_all(&self.save)
                .with_context(|| format!("Cannot remove '{}'", self.save.display()))?;
        }
        self.ensure()?;
        tracing::info!("Reset run directory '{}'", self.save.display());
        Ok(())
    }

    /// Create any missing directory without touching existing contents.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.save, &self.checkpoints, &self.models, &self.test] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }
        Ok(())
    }

    /// Write the effective configuration next to the run's outputs.
    pub fn write_config(&self, cfg: &RunConfig) -> Result<()> {
        let path = self.save.join("run_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved run config to '{}'", path.display());
        Ok(())
    }
}
