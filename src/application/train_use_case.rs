// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Runs one phase of the classifier:
//
//   Step 1: Validate the run configuration
//   Step 2: Dispatch on the phase (test is not available yet)
//   Step 3: Pick the backend   (--gpu → wgpu, else ndarray)
//   Step 4: Build the split provider           (Layer 4 - data)
//   Step 5: Resume or reset, then train        (Layer 5 - ml)

use anyhow::Result;
use burn::{
    backend::{
        ndarray::NdArrayDevice,
        wgpu::WgpuDevice,
        Autodiff, NdArray, Wgpu,
    },
    tensor::backend::AutodiffBackend,
};

use crate::application::config::{Phase, RunConfig};
use crate::data::loader::JsonSplitLoader;
use crate::domain::traits::SplitProvider;
use crate::infra::logging::LogSink;
use crate::ml::trainer::{build_trainer, TrainingReport};

pub struct TrainUseCase {
    config:   RunConfig,
    log_sink: LogSink,
}

impl TrainUseCase {
    pub fn new(config: RunConfig, log_sink: LogSink) -> Self {
        Self { config, log_sink }
    }

    /// Execute the configured phase end to end.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;
        cfg.validate()?;

        match cfg.phase {
            Phase::Test => {
                tracing::warn!("The test phase is not implemented; nothing to do");
                Ok(())
            }
            Phase::Train => {
                let provider = JsonSplitLoader::new(
                    &cfg.data_dir,
                    &cfg.genre_a,
                    &cfg.genre_b,
                    cfg.input_shape,
                );

                let report = if cfg.gpu {
                    let device = WgpuDevice::default();
                    tracing::info!("Training on wgpu device {:?}", device);
                    self.train::<Autodiff<Wgpu>>(&provider, device)?
                } else {
                    tracing::info!("Training on the ndarray CPU backend");
                    self.train::<Autodiff<NdArray>>(&provider, NdArrayDevice::Cpu)?
                };

                tracing::info!(
                    "Training finished: {} steps from epoch {}, checkpoints for epochs {:?}",
                    report.steps,
                    report.start_epoch,
                    report.saved_epochs
                );
                Ok(())
            }
        }
    }

    /// Resume or reset, then run the epoch loop on backend `B`.
    pub fn train<B: AutodiffBackend>(
        &self,
        provider: &dyn SplitProvider,
        device:   B::Device,
    ) -> Result<TrainingReport> {
        let mut trainer = build_trainer::<B>(self.config.clone(), device);
        trainer.prepare(&self.log_sink)?;
        trainer.fit(provider)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::piano_roll::{GenreSide, PianoRoll, Split};
    use std::{fs, path::Path};

    type TestBackend = Autodiff<NdArray<f32>>;

    /// Genre A rolls are all zeros, genre B rolls all ones.
    struct SyntheticPair {
        train: usize,
        test:  usize,
    }

    impl SplitProvider for SyntheticPair {
        fn load_split(&self, split: Split) -> Result<Vec<PianoRoll>> {
            let n = match split {
                Split::Train => self.train,
                Split::Test  => self.test,
            };
            Ok((0..n)
                .map(|i| {
                    let side = if i < n / 2 { GenreSide::A } else { GenreSide::B };
                    let v    = if side == GenreSide::A { 0.0 } else { 1.0 };
                    PianoRoll::new(vec![v; 16], side)
                })
                .collect())
        }
    }

    fn config(root: &Path) -> RunConfig {
        RunConfig {
            name: "e2e".into(),
            save_dir: root.to_string_lossy().into_owned(),
            input_shape: [1, 4, 4],
            batch_size: 4,
            num_threads: 2,
            max_epoch: 1,
            save_every: 1,
            ..RunConfig::default()
        }
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn run(cfg: RunConfig) -> TrainingReport {
        let provider = SyntheticPair { train: 8, test: 6 };
        TrainUseCase::new(cfg, LogSink::new())
            .train::<TestBackend>(&provider, NdArrayDevice::Cpu)
            .unwrap()
    }

    #[test]
    fn test_single_epoch_run() {
        let root   = tempfile::tempdir().unwrap();
        let cfg    = config(root.path());
        let report = run(cfg.clone());

        assert!(!report.resumed);
        assert_eq!(report.steps_per_epoch, 2);
        assert_eq!(report.steps, 2);
        assert_eq!(report.saved_epochs, vec![0]);
        assert_eq!(file_names(&cfg.checkpoint_path()), vec!["e2e_C_0.mpk".to_string()]);

        // cadence is max(2 / 10, 1) = 1, so both steps evaluate
        assert_eq!(report.evaluations.len(), 2);
        for record in &report.evaluations {
            assert!((0.0..=1.0).contains(&record.accuracy));
            assert!(record.loss.is_finite());
            assert_eq!(record.lr, cfg.lr);
        }

        assert!(cfg.log_path().exists());
        assert!(cfg.save_path().join("run_config.json").exists());
        let csv = fs::read_to_string(cfg.save_path().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_resume_continues_after_latest_checkpoint() {
        let root = tempfile::tempdir().unwrap();
        run(config(root.path()));

        let cfg = RunConfig {
            continue_train: true,
            max_epoch: 3,
            num_threads: 0,
            ..config(root.path())
        };
        let report = run(cfg.clone());

        assert!(report.resumed);
        assert_eq!(report.start_epoch, 1);
        assert_eq!(report.steps, 4);
        assert_eq!(report.saved_epochs, vec![1, 2]);
        assert_eq!(
            file_names(&cfg.checkpoint_path()),
            vec!["e2e_C_0.mpk", "e2e_C_1.mpk", "e2e_C_2.mpk"]
        );

        // the CSV keeps rows of the first run under a single header
        let csv = fs::read_to_string(cfg.save_path().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().filter(|l| l.starts_with("epoch")).count(), 1);
        assert_eq!(csv.lines().count(), 1 + 2 + 4);
    }

    fn lrs_by_epoch(report: &TrainingReport) -> Vec<(usize, f64)> {
        let mut lrs: Vec<(usize, f64)> = report.evaluations.iter().map(|r| (r.epoch, r.lr)).collect();
        lrs.dedup();
        lrs
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_learning_rate_decays_after_fifth_epoch() {
        let root   = tempfile::tempdir().unwrap();
        let cfg    = RunConfig { max_epoch: 7, save_every: 10, ..config(root.path()) };
        let report = run(cfg.clone());

        let lrs = lrs_by_epoch(&report);
        assert_eq!(lrs.len(), 7);
        for &(epoch, lr) in &lrs {
            let expected = if epoch <= 5 { cfg.lr } else { cfg.lr * 0.2 };
            assert!(close(lr, expected), "epoch {epoch}: lr {lr}, expected {expected}");
        }
        assert!(close(report.final_lr, cfg.lr * 0.2));
    }

    #[test]
    fn test_resumed_run_picks_up_decayed_learning_rate() {
        let root = tempfile::tempdir().unwrap();
        let cfg  = RunConfig { max_epoch: 6, save_every: 10, ..config(root.path()) };
        run(cfg.clone());

        let resumed = RunConfig { max_epoch: 7, continue_train: true, ..cfg.clone() };
        let report  = run(resumed);

        assert_eq!(report.start_epoch, 6);
        let lrs = lrs_by_epoch(&report);
        assert_eq!(lrs.len(), 1);
        assert_eq!(lrs[0].0, 6);
        assert!(close(lrs[0].1, cfg.lr * 0.2));
    }

    #[test]
    fn test_save_cadence_and_final_epoch() {
        let root = tempfile::tempdir().unwrap();
        let cfg  = RunConfig { max_epoch: 4, save_every: 3, ..config(root.path()) };

        let report = run(cfg);
        // epoch 0 and 3 by cadence, epoch 3 is also the last
        assert_eq!(report.saved_epochs, vec![0, 3]);
        assert_eq!(report.steps, 8);
    }

    #[test]
    fn test_perturbed_evaluation_runs() {
        let root = tempfile::tempdir().unwrap();
        let cfg  = RunConfig { perturb_eval: true, gaussian_std: 0.5, ..config(root.path()) };

        let report = run(cfg);
        assert!(report.evaluations.iter().all(|r| (0.0..=1.0).contains(&r.accuracy)));
    }

    #[test]
    fn test_split_smaller_than_batch_trains_nothing() {
        let root     = tempfile::tempdir().unwrap();
        let cfg      = RunConfig { batch_size: 16, ..config(root.path()) };
        let provider = SyntheticPair { train: 8, test: 4 };

        let report = TrainUseCase::new(cfg, LogSink::new())
            .train::<TestBackend>(&provider, NdArrayDevice::Cpu)
            .unwrap();
        assert_eq!(report.steps, 0);
        assert!(report.evaluations.is_empty());
        // the last epoch is still saved
        assert_eq!(report.saved_epochs, vec![0]);
    }

    #[test]
    fn test_empty_test_split_is_an_error() {
        let root     = tempfile::tempdir().unwrap();
        let provider = SyntheticPair { train: 8, test: 0 };

        let result = TrainUseCase::new(config(root.path()), LogSink::new())
            .train::<TestBackend>(&provider, NdArrayDevice::Cpu);
        assert!(result.is_err());
    }

    #[test]
    fn test_test_phase_is_a_no_op() {
        let root = tempfile::tempdir().unwrap();
        let cfg  = RunConfig { phase: Phase::Test, ..config(root.path()) };

        TrainUseCase::new(cfg.clone(), LogSink::new()).execute().unwrap();
        assert!(!cfg.save_path().exists());
    }

    #[test]
    fn test_invalid_config_is_rejected_before_training() {
        let root = tempfile::tempdir().unwrap();
        let cfg  = RunConfig { batch_size: 0, ..config(root.path()) };

        assert!(TrainUseCase::new(cfg.clone(), LogSink::new()).execute().is_err());
        assert!(!cfg.save_path().exists());
    }
}
