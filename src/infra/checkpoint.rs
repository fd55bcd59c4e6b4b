// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores classifier parameters with Burn's
// NamedMpkFileRecorder at full precision, so a reload gives
// back exactly the values that were saved.
//
// File naming convention (one file per saved epoch):
//   {checkpoint_dir}/
//     {run}_C_0.mpk
//     {run}_C_5.mpk
//     ...
//
// The set of matching files IS the resume point; there is no
// separate "latest" pointer. Files that do not start with
// "{run}_C_" and end with ".mpk" are ignored. A file that does
// match but carries a non-numeric epoch is reported as
// Malformed. Optimizer state is not saved.
//
// The recorder does not check tensor shapes, so a load compares
// every float parameter against the model it was loaded into.
// A mismatch is a Record error, same as an unreadable file.

use burn::{
    module::{Module, ModuleVisitor, ParamId},
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
    tensor::{backend::Backend, Tensor},
};
use std::{
    fs,
    io,
    path::PathBuf,
};
use thiserror::Error;

pub type CheckpointRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Extension the recorder appends to every checkpoint stem
pub const CHECKPOINT_EXTENSION: &str = "mpk";

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("no checkpoint for run '{run}' in '{}'", dir.display())]
    NotFound { run: String, dir: PathBuf },

    #[error("checkpoint file '{file}' has no parseable epoch number")]
    Malformed { file: String },

    #[error("cannot access checkpoint directory '{}': {source}", dir.display())]
    Io {
        dir:    PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read or write checkpoint '{}': {reason}", path.display())]
    Record { path: PathBuf, reason: String },
}

/// Manages the epoch-indexed checkpoints of one run.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir:      PathBuf,
    run_name: String,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>, run_name: impl Into<String>) -> Self {
        Self { dir: dir.into(), run_name: run_name.into() }
    }

    /// File name without extension; the recorder adds ".mpk".
    fn stem(&self, epoch: usize) -> String {
        format!("{}_C_{}", self.run_name, epoch)
    }

    /// Full path of the checkpoint for `epoch`
    pub fn checkpoint_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("{}.{}", self.stem(epoch), CHECKPOINT_EXTENSION))
    }

    /// Extract the epoch from a checkpoint file name.
    ///
    /// Returns None for files that are not checkpoints of this run.
    fn parse_epoch(&self, file_name: &str) -> Option<Result<usize, CheckpointError>> {
        let prefix = format!("{}_C_", self.run_name);
        let suffix = format!(".{CHECKPOINT_EXTENSION}");
        let digits = file_name.strip_prefix(&prefix)?.strip_suffix(&suffix)?;

        let parsed = match digits.parse::<usize>() {
            Ok(epoch) if digits.chars().all(|c| c.is_ascii_digit()) => Ok(epoch),
            _ => Err(CheckpointError::Malformed { file: file_name.to_string() }),
        };
        Some(parsed)
    }

    /// Highest epoch with a checkpoint on disk.
    pub fn find_latest(&self) -> Result<usize, CheckpointError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(self.not_found()),
            Err(source) => return Err(CheckpointError::Io { dir: self.dir.clone(), source }),
        };

        let mut latest: Option<usize> = None;
        for entry in entries {
            let entry = entry.map_err(|source| CheckpointError::Io {
                dir: self.dir.clone(),
                source,
            })?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };

            match self.parse_epoch(file_name) {
                Some(epoch) => {
                    let epoch = epoch?;
                    latest = Some(latest.map_or(epoch, |l| l.max(epoch)));
                }
                None => tracing::debug!("Ignoring non-checkpoint file '{}'", file_name),
            }
        }

        latest.ok_or_else(|| self.not_found())
    }

    /// Restore the latest checkpoint into `model`.
    ///
    /// Returns the restored model and the epoch training should
    /// continue from (latest saved epoch + 1). `model` is consumed
    /// either way, so callers that need a fallback pass a clone.
    pub fn load_latest<B: Backend, M: Module<B>>(
        &self,
        model:  M,
        device: &B::Device,
    ) -> Result<(M, usize), CheckpointError> {
        let latest = self.find_latest()?;
        let path   = self.dir.join(self.stem(latest));

        tracing::info!("Loading checkpoint for epoch {} from '{}'", latest, self.dir.display());

        let expected = param_shapes::<B, M>(&model);
        let model = model
            .load_file(path, &CheckpointRecorder::new(), device)
            .map_err(|e| CheckpointError::Record {
                path:   self.checkpoint_path(latest),
                reason: format!("{e:?}"),
            })?;

        let loaded = param_shapes::<B, M>(&model);
        if loaded != expected {
            return Err(CheckpointError::Record {
                path:   self.checkpoint_path(latest),
                reason: format!(
                    "parameter shapes {:?} do not fit the model's {:?}",
                    loaded, expected
                ),
            });
        }

        Ok((model, latest + 1))
    }

    /// Save parameters for `epoch`, overwriting an earlier save of the same epoch.
    pub fn save<B: Backend, M: Module<B>>(
        &self,
        model: &M,
        epoch: usize,
    ) -> Result<PathBuf, CheckpointError> {
        fs::create_dir_all(&self.dir).map_err(|source| CheckpointError::Io {
            dir: self.dir.clone(),
            source,
        })?;

        let path = self.checkpoint_path(epoch);
        model
            .clone()
            .save_file(self.dir.join(self.stem(epoch)), &CheckpointRecorder::new())
            .map_err(|e| CheckpointError::Record {
                path:   path.clone(),
                reason: format!("{e:?}"),
            })?;

        tracing::debug!("Saved checkpoint '{}'", path.display());
        Ok(path)
    }

    fn not_found(&self) -> CheckpointError {
        CheckpointError::NotFound { run: self.run_name.clone(), dir: self.dir.clone() }
    }
}

/// Dims of every float parameter, in visiting order.
#[derive(Default)]
struct ParamShapes(Vec<Vec<usize>>);

impl<B: Backend> ModuleVisitor<B> for ParamShapes {
    fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
        self.0.push(tensor.dims().to_vec());
    }
}

fn param_shapes<B: Backend, M: Module<B>>(model: &M) -> Vec<Vec<usize>> {
    let mut shapes = ParamShapes::default();
    model.visit(&mut shapes);
    shapes.0
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::{GenreClassifier, GenreClassifierConfig};
    use burn::backend::{ndarray::NdArrayDevice, NdArray};
    use std::path::Path;

    type TestBackend = NdArray<f32>;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_find_latest_returns_max_epoch() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "run");
        for epoch in [0, 5, 12, 3] {
            touch(dir.path(), &format!("run_C_{epoch}.mpk"));
        }
        assert_eq!(ckpt.find_latest().unwrap(), 12);
    }

    #[test]
    fn test_empty_directory_is_not_found() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "run");
        assert!(matches!(ckpt.find_latest(), Err(CheckpointError::NotFound { .. })));
    }

    #[test]
    fn test_missing_directory_is_not_found() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("absent"), "run");
        assert!(matches!(ckpt.find_latest(), Err(CheckpointError::NotFound { .. })));
    }

    #[test]
    fn test_unrelated_files_are_ignored() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "run");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "other_C_40.mpk");
        touch(dir.path(), "run_C_2.mpk");
        assert_eq!(ckpt.find_latest().unwrap(), 2);
    }

    #[test]
    fn test_only_unrelated_files_is_not_found() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "run");
        touch(dir.path(), "readme.md");
        assert!(matches!(ckpt.find_latest(), Err(CheckpointError::NotFound { .. })));
    }

    #[test]
    fn test_non_numeric_epoch_is_malformed() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "run");
        touch(dir.path(), "run_C_1.mpk");
        touch(dir.path(), "run_C_final.mpk");
        assert!(matches!(ckpt.find_latest(), Err(CheckpointError::Malformed { .. })));
    }

    #[test]
    fn test_save_then_load_restores_identical_parameters() {
        let device = NdArrayDevice::Cpu;
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path().join("checkpoints"), "run");

        let config = GenreClassifierConfig::new(1).with_base_filters(4);
        let saved: GenreClassifier<TestBackend> = config.init(&device);
        let path = ckpt.save::<TestBackend, _>(&saved, 3).unwrap();
        assert_eq!(path, ckpt.checkpoint_path(3));
        assert!(path.exists());

        // A freshly initialised model has different random weights.
        let fresh: GenreClassifier<TestBackend> = config.init(&device);
        let (loaded, next_epoch) = ckpt.load_latest::<TestBackend, _>(fresh, &device).unwrap();
        assert_eq!(next_epoch, 4);

        let expected = saved.head.weight.val().into_data().to_vec::<f32>().unwrap();
        let actual   = loaded.head.weight.val().into_data().to_vec::<f32>().unwrap();
        assert_eq!(expected, actual);

        let expected = saved.conv1.weight.val().into_data().to_vec::<f32>().unwrap();
        let actual   = loaded.conv1.weight.val().into_data().to_vec::<f32>().unwrap();
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_corrupt_checkpoint_is_record_error() {
        let device = NdArrayDevice::Cpu;
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path(), "run");
        fs::write(dir.path().join("run_C_0.mpk"), b"not a record").unwrap();

        let model: GenreClassifier<TestBackend> =
            GenreClassifierConfig::new(1).with_base_filters(4).init(&device);
        let result = ckpt.load_latest::<TestBackend, _>(model, &device);
        assert!(matches!(result, Err(CheckpointError::Record { .. })));
    }

    #[test]
    fn test_checkpoint_of_another_shape_is_record_error() {
        let device = NdArrayDevice::Cpu;
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path(), "run");

        let narrow: GenreClassifier<TestBackend> =
            GenreClassifierConfig::new(1).with_base_filters(4).init(&device);
        ckpt.save::<TestBackend, _>(&narrow, 0).unwrap();

        let wide: GenreClassifier<TestBackend> =
            GenreClassifierConfig::new(1).with_base_filters(8).init(&device);
        let result = ckpt.load_latest::<TestBackend, _>(wide, &device);
        assert!(matches!(result, Err(CheckpointError::Record { .. })));

        let two_channels: GenreClassifier<TestBackend> =
            GenreClassifierConfig::new(2).with_base_filters(4).init(&device);
        let result = ckpt.load_latest::<TestBackend, _>(two_channels, &device);
        assert!(matches!(result, Err(CheckpointError::Record { .. })));
    }

    #[test]
    fn test_param_shapes_follow_the_config() {
        let device = NdArrayDevice::Cpu;
        let model: GenreClassifier<TestBackend> =
            GenreClassifierConfig::new(2).with_base_filters(4).init(&device);

        let shapes = param_shapes::<TestBackend, _>(&model);
        assert!(shapes.contains(&vec![4, 2, 3, 3]));
        assert!(shapes.contains(&vec![16, 2]));
    }

    #[test]
    fn test_saving_same_epoch_overwrites() {
        let device = NdArrayDevice::Cpu;
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path(), "run");
        let model: GenreClassifier<TestBackend> =
            GenreClassifierConfig::new(1).with_base_filters(4).init(&device);

        ckpt.save::<TestBackend, _>(&model, 1).unwrap();
        ckpt.save::<TestBackend, _>(&model, 1).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
