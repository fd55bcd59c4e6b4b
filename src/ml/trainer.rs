// ============================================================
// Layer 5 — Training Controller
// ============================================================
// Owns everything that changes during a run: the model, the
// Adam optimiser, the step-decay schedule and the effective
// start epoch. Lifecycle:
//
//   build_trainer  INIT      model + Adam + StepDecay
//   prepare        RESUMING  latest checkpoint restored, tree kept
//                  RESETTING no/unreadable checkpoint, tree wiped
//   fit            RUNNING   epoch loop with periodic evaluation
//                  DONE      after epoch max_epoch - 1
//
// Only a missing or undeserialisable checkpoint downgrades a
// resume to a fresh run. Every other error aborts.
//
// Key Burn details:
//   - training runs on B (Autodiff<...>)
//   - model.valid() gives the model on B::InnerBackend, which
//     is also where the held-out tensors live
//   - gradients are rebuilt from scratch by every backward(),
//     so there is no explicit zero_grad

use anyhow::{Context, Result};
use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    module::AutodiffModule,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::{sync::Arc, time::Instant};

use crate::application::config::RunConfig;
use crate::data::{
    batcher::ClassifierBatcher, dataset::GenrePairDataset, prefetcher::BatchLoader,
};
use crate::domain::piano_roll::{PianoRoll, Split};
use crate::domain::traits::SplitProvider;
use crate::infra::{
    checkpoint::{CheckpointError, CheckpointManager},
    logging::LogSink,
    metrics::{EvalRecord, LossMeter, MetricsLogger},
    run_dirs::RunDirs,
};
use crate::ml::{
    evaluator::EvalSet,
    loss::binary_cross_entropy,
    model::{GenreClassifier, GenreClassifierConfig},
    schedule::{steps_per_epoch, EvalCadence, SavePolicy, StepDecay},
};

/// Outcome of the resume decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePoint {
    Resumed { start_epoch: usize },
    Fresh,
}

/// What a finished run did.
#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    pub start_epoch:     usize,
    pub resumed:         bool,
    pub steps_per_epoch: usize,
    /// Optimiser steps taken over the whole run
    pub steps:           usize,
    pub evaluations:     Vec<EvalRecord>,
    pub saved_epochs:    Vec<usize>,
    pub final_lr:        f64,
}

pub struct Trainer<B: AutodiffBackend, O> {
    cfg:         RunConfig,
    device:      B::Device,
    model:       GenreClassifier<B>,
    optim:       O,
    schedule:    StepDecay,
    ckpt:        CheckpointManager,
    dirs:        RunDirs,
    start_epoch: usize,
    resumed:     bool,
}

/// INIT: build the model, the optimiser and the schedule.
pub fn build_trainer<B: AutodiffBackend>(
    cfg:    RunConfig,
    device: B::Device,
) -> Trainer<B, impl Optimizer<GenreClassifier<B>, B>> {
    let model: GenreClassifier<B> = GenreClassifierConfig::new(cfg.input_shape[0]).init(&device);
    tracing::info!(
        "Classifier ready: {} parameters, input shape {:?}",
        model.num_params(),
        cfg.input_shape
    );

    let weight_decay = (cfg.weight_decay > 0.0)
        .then(|| WeightDecayConfig::new(cfg.weight_decay as f32));
    let optim = AdamConfig::new()
        .with_beta_1(cfg.beta1 as f32)
        .with_beta_2(cfg.beta2 as f32)
        .with_epsilon(1e-8)
        .with_weight_decay(weight_decay)
        .init::<B, GenreClassifier<B>>();

    Trainer {
        schedule:    StepDecay::new(cfg.lr),
        ckpt:        CheckpointManager::new(cfg.checkpoint_path(), cfg.name.clone()),
        dirs:        RunDirs::from_config(&cfg),
        start_epoch: cfg.start_epoch,
        resumed:     false,
        cfg,
        device,
        model,
        optim,
    }
}

impl<B, O> Trainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<GenreClassifier<B>, B>,
{
    pub fn start_epoch(&self) -> usize {
        self.start_epoch
    }

    pub fn dirs(&self) -> &RunDirs {
        &self.dirs
    }

    /// Decide between resuming and starting fresh, then attach the
    /// run's log file.
    pub fn prepare(&mut self, log_sink: &LogSink) -> Result<ResumePoint> {
        let point = if self.cfg.continue_train {
            self.try_resume()?
        } else {
            self.dirs.reset()?;
            ResumePoint::Fresh
        };

        match point {
            ResumePoint::Resumed { start_epoch } => {
                self.start_epoch = start_epoch;
                self.resumed     = true;
            }
            ResumePoint::Fresh => {
                self.start_epoch = self.cfg.start_epoch;
                self.resumed     = false;
            }
        }

        log_sink.attach_file(&self.dirs.log_file)?;
        self.dirs.write_config(&self.cfg)?;
        tracing::info!("Run '{}' starts at epoch {}", self.cfg.name, self.start_epoch);
        Ok(point)
    }

    fn try_resume(&mut self) -> Result<ResumePoint> {
        match self.ckpt.load_latest::<B, _>(self.model.clone(), &self.device) {
            Ok((model, start_epoch)) => {
                self.model = model;
                self.dirs.ensure()?;
                tracing::info!("Loaded model from epoch {}", start_epoch - 1);
                Ok(ResumePoint::Resumed { start_epoch })
            }
            Err(e @ (CheckpointError::NotFound { .. } | CheckpointError::Record { .. })) => {
                tracing::error!("{}; starting a fresh run instead", e);
                self.dirs.reset()?;
                Ok(ResumePoint::Fresh)
            }
            Err(e) => Err(e).context("Cannot resume training"),
        }
    }

    /// RUNNING → DONE.
    pub fn fit(self, provider: &dyn SplitProvider) -> Result<TrainingReport> {
        let Trainer {
            cfg, device, mut model, mut optim, schedule, ckpt, dirs, start_epoch, resumed,
        } = self;

        // ── Dataset ───────────────────────────────────────────────────────────
        let train_set = GenrePairDataset::new(provider.load_split(Split::Train)?, cfg.input_shape)
            .context("Invalid training split")?;
        let test_set = GenrePairDataset::new(provider.load_split(Split::Test)?, cfg.input_shape)
            .context("Invalid test split")?;

        let dataset_size = train_set.len();
        let steps        = steps_per_epoch(dataset_size, cfg.batch_size);
        let cadence      = EvalCadence::from_steps(steps);
        let [count_a, count_b] = train_set.class_counts();
        tracing::info!(
            "Dataset loaded, genreA: {} ({}), genreB: {} ({}), total size: {}",
            cfg.genre_a, count_a, cfg.genre_b, count_b, dataset_size
        );
        if steps == 0 {
            tracing::warn!(
                "Training split ({} samples) is smaller than one batch ({}); no steps will run",
                dataset_size,
                cfg.batch_size
            );
        }

        // ── Held-out set, materialised once ───────────────────────────────────
        let noise    = cfg.perturb_eval.then_some(cfg.gaussian_std);
        let eval_set = EvalSet::<B::InnerBackend>::from_dataset(&test_set, &device, noise)?;
        tracing::info!("Held-out set ready: {} samples, noise {:?}", eval_set.len(), noise);

        let batcher     = ClassifierBatcher::<B>::new(device.clone(), cfg.input_shape);
        let save_policy = SavePolicy { save_every: cfg.save_every, max_epoch: cfg.max_epoch };
        let metrics     = MetricsLogger::new(&dirs.save)?;
        tracing::info!(
            "Evaluating every {} steps, records go to '{}'",
            cadence.every(),
            metrics.csv_path().display()
        );
        let mut meter   = LossMeter::new(cfg.plot_every);
        let train_set: Arc<dyn Dataset<PianoRoll>> = Arc::new(train_set);

        let mut lr = schedule.lr_for_epoch(start_epoch);
        let mut report = TrainingReport {
            start_epoch,
            resumed,
            steps_per_epoch: steps,
            ..TrainingReport::default()
        };

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in start_epoch..cfg.max_epoch {
            let started = Instant::now();
            let loader  = BatchLoader::new(
                Arc::clone(&train_set),
                cfg.batch_size,
                cfg.num_threads,
                cfg.seed.wrapping_add(epoch as u64),
            );
            tracing::debug!("Epoch {}: {} batches planned", epoch, loader.len());

            for (step, items) in loader.enumerate() {
                let batch = batcher.batch(items?);

                let probs = model.forward(batch.rolls);
                let loss  = binary_cross_entropy(probs, batch.labels);
                let loss_value: f64 = loss.clone().into_scalar().elem::<f64>();

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(lr, model, grads);

                meter.add(loss_value);
                report.steps += 1;

                if cadence.fires_at(step) {
                    let accuracy = eval_set.accuracy(&model.valid());
                    let record = EvalRecord {
                        epoch,
                        step,
                        progress: step as f64 / steps as f64,
                        loss: meter.value(),
                        accuracy,
                        lr,
                    };
                    tracing::info!(
                        "Epoch {} progress {:.2}%: Loss: {:.6}, Accuracy: {:.4}",
                        epoch,
                        record.progress * 100.0,
                        record.loss,
                        record.accuracy
                    );
                    metrics.log(&record)?;
                    report.evaluations.push(record);
                }
            }

            if save_policy.should_save(epoch) {
                let path = ckpt.save::<B, _>(&model, epoch)?;
                tracing::info!("Model saved to '{}'", path.display());
                report.saved_epochs.push(epoch);
            }

            lr = schedule.lr_after(epoch);
            tracing::info!(
                "Epoch {} finished, cost time {}s, next lr {:.3e}",
                epoch,
                started.elapsed().as_secs(),
                lr
            );
        }

        report.final_lr = lr;
        Ok(report)
    }
}
