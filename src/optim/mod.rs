//! Optimizer and learning-rate schedule used to train the model.

mod groups;
mod schedule;

pub use groups::{GroupedOptimizer, ParamGroups, decays, param_groups, split_no_decay};
pub use schedule::{LinearWarmupScheduler, LinearWarmupSchedulerConfig};

use crate::error::{Result, VslNetError};
use burn::LearningRate;
use burn::module::AutodiffModule;
use burn::optim::{AdamWConfig, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

#[derive(Config, Debug)]
pub struct OptimizerConfig {
    /// Peak learning rate.
    #[config(default = 0.0025)]
    pub init_lr: LearningRate,
    /// Total number of optimizer steps of the run.
    pub num_train_steps: usize,
    /// Fraction of `num_train_steps` spent warming up.
    #[config(default = 0.0)]
    pub warmup_proportion: f64,
    /// Weight decay of the decaying group. The other group uses none.
    #[config(default = 0.01)]
    pub weight_decay: f32,
    #[config(default = 1e-8)]
    pub epsilon: f32,
}

/// Builds AdamW with two weight-decay groups (see [param_groups]) and the
/// linear warmup schedule.
pub fn build_optimizer_and_scheduler<B, M>(
    config: &OptimizerConfig,
) -> Result<(GroupedOptimizer<impl Optimizer<M, B> + use<B, M>>, LinearWarmupScheduler)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    if !(0.0..=1.0).contains(&config.warmup_proportion) {
        return Err(VslNetError::invalid(format!(
            "warmup_proportion must be in [0, 1], got {}",
            config.warmup_proportion
        )));
    }

    let num_warmup_steps = config.num_train_steps as f64 * config.warmup_proportion;
    let scheduler =
        LinearWarmupSchedulerConfig::new(config.init_lr, num_warmup_steps, config.num_train_steps)
            .init()?;

    let adamw = AdamWConfig::new().with_epsilon(config.epsilon);
    let optimizer = GroupedOptimizer::new(
        adamw
            .clone()
            .with_weight_decay(config.weight_decay)
            .init::<B, M>(),
        adamw.with_weight_decay(0.0).init::<B, M>(),
    );

    tracing::info!(
        init_lr = config.init_lr,
        num_train_steps = config.num_train_steps,
        num_warmup_steps,
        weight_decay = config.weight_decay,
        "built AdamW optimizer and linear warmup scheduler"
    );
    Ok((optimizer, scheduler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::nn::Linear;
    use burn::optim::GradientsParams;

    type AB = Autodiff<NdArray>;

    #[test]
    fn warmup_proportion_must_be_a_fraction() {
        let config = OptimizerConfig::new(100).with_warmup_proportion(1.5);
        assert!(build_optimizer_and_scheduler::<AB, Linear<AB>>(&config).is_err());
    }

    #[test]
    fn zero_steps_are_rejected() {
        let config = OptimizerConfig::new(0);
        assert!(build_optimizer_and_scheduler::<AB, Linear<AB>>(&config).is_err());
    }

    #[test]
    fn optimizer_outlives_its_config() {
        let (mut optim, _scheduler) = {
            let config = OptimizerConfig::new(10);
            build_optimizer_and_scheduler::<AB, Linear<AB>>(&config).unwrap()
        };
        let model = burn::nn::LinearConfig::new(2, 2).init::<AB>(&Default::default());
        let model = optim.step(0.1, model, GradientsParams::new());
        assert_eq!(model.weight.dims(), [2, 2]);
    }

    #[test]
    fn scheduler_warms_up_over_the_requested_fraction() {
        use burn::lr_scheduler::LrScheduler;

        let config = OptimizerConfig::new(10)
            .with_init_lr(1.0)
            .with_warmup_proportion(0.2);
        let (_optim, mut scheduler) =
            build_optimizer_and_scheduler::<AB, Linear<AB>>(&config).unwrap();

        let lrs: Vec<f64> = (0..3).map(|_| scheduler.step()).collect();
        assert_eq!(lrs, vec![0.0, 0.5, 1.0]);
    }
}
