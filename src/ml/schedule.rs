// ============================================================
// Layer 5 — Training Schedule Rules
// ============================================================
// The small integer rules that decide *when* things happen in
// the epoch loop. Each one is pure and tested on its own.
//
//   steps_per_epoch  floor(size / batch), trailing partial batch dropped
//   EvalCadence      step 0, then every max(steps / 10, 1) steps
//   SavePolicy       epoch % save_every == 0, or the final epoch
//   StepDecay        lr after epoch e = initial * 0.2^floor(e / 5)

/// Full batches in one epoch.
pub fn steps_per_epoch(dataset_size: usize, batch_size: usize) -> usize {
    dataset_size / batch_size.max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalCadence {
    every: usize,
}

impl EvalCadence {
    /// Roughly ten evaluations per epoch; every step when an epoch
    /// has fewer than ten steps.
    pub fn from_steps(steps_per_epoch: usize) -> Self {
        Self { every: (steps_per_epoch / 10).max(1) }
    }

    pub fn every(&self) -> usize {
        self.every
    }

    pub fn fires_at(&self, step: usize) -> bool {
        step % self.every == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavePolicy {
    pub save_every: usize,
    pub max_epoch:  usize,
}

impl SavePolicy {
    pub fn should_save(&self, epoch: usize) -> bool {
        epoch % self.save_every.max(1) == 0 || epoch + 1 == self.max_epoch
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDecay {
    pub initial:   f64,
    pub step_size: usize,
    pub gamma:     f64,
}

impl StepDecay {
    pub fn new(initial: f64) -> Self {
        Self { initial, step_size: 5, gamma: 0.2 }
    }

    /// Rate in effect once `epoch` has finished.
    pub fn lr_after(&self, epoch: usize) -> f64 {
        let decays = (epoch / self.step_size) as i32;
        self.initial * self.gamma.powi(decays)
    }

    /// Rate used while training `epoch`: the initial rate for
    /// epoch 0, otherwise the rate left by the previous epoch.
    pub fn lr_for_epoch(&self, epoch: usize) -> f64 {
        match epoch {
            0 => self.initial,
            e => self.lr_after(e - 1),
        }
    }
}
