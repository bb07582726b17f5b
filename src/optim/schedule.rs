use crate::error::{Result, VslNetError};
use burn::LearningRate;
use burn::lr_scheduler::LrScheduler;
use burn::prelude::*;

/// Configuration to create a [LinearWarmupScheduler] using the [init function](LinearWarmupSchedulerConfig::init).
#[derive(Config, Debug)]
pub struct LinearWarmupSchedulerConfig {
    /// Peak learning rate, reached at the end of the warmup.
    pub init_lr: LearningRate,
    /// Length of the warmup, possibly fractional.
    pub num_warmup_steps: f64,
    /// Step at which the learning rate reaches zero.
    pub num_training_steps: usize,
}

impl LinearWarmupSchedulerConfig {
    pub fn init(&self) -> Result<LinearWarmupScheduler> {
        if self.init_lr <= 0.0 {
            return Err(VslNetError::invalid(format!(
                "init_lr must be positive, got {}",
                self.init_lr
            )));
        }
        if self.num_training_steps == 0 {
            return Err(VslNetError::invalid("num_training_steps must be positive"));
        }
        if !(0.0..=self.num_training_steps as f64).contains(&self.num_warmup_steps) {
            return Err(VslNetError::invalid(format!(
                "num_warmup_steps must be in [0, {}], got {}",
                self.num_training_steps, self.num_warmup_steps
            )));
        }

        Ok(LinearWarmupScheduler {
            init_lr: self.init_lr,
            num_warmup_steps: self.num_warmup_steps,
            num_training_steps: self.num_training_steps,
            current_step: 0,
        })
    }
}

/// Linear increase from zero to `init_lr` during the warmup, then linear
/// decrease back to zero at `num_training_steps`.
///
/// Example: init_lr = 1, warmup = 2, training steps = 6:
/// (0→0, 1→0.5), (2→1, 3→0.75, 4→0.5, 5→0.25), (6→0, 7→0, ...)
#[derive(Clone, Debug)]
pub struct LinearWarmupScheduler {
    init_lr: LearningRate,
    num_warmup_steps: f64,
    num_training_steps: usize,
    current_step: usize,
}

impl LinearWarmupScheduler {
    /// Multiplier applied to `init_lr` at `step`.
    pub fn lr_lambda(&self, step: usize) -> f64 {
        let step = step as f64;
        let total = self.num_training_steps as f64;
        if step < self.num_warmup_steps {
            step / self.num_warmup_steps.max(1.0)
        } else {
            ((total - step) / (total - self.num_warmup_steps).max(1.0)).max(0.0)
        }
    }

    /// Number of times [LrScheduler::step] was called.
    pub fn current_step(&self) -> usize {
        self.current_step
    }
}

impl LrScheduler for LinearWarmupScheduler {
    type Record<B: Backend> = usize;

    fn step(&mut self) -> LearningRate {
        let lr = self.init_lr * self.lr_lambda(self.current_step);
        self.current_step += 1;
        lr
    }

    fn to_record<B: Backend>(&self) -> Self::Record<B> {
        self.current_step
    }

    fn load_record<B: Backend>(mut self, record: Self::Record<B>) -> Self {
        self.current_step = record;
        self
    }
}
