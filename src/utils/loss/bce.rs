use burn::module::Module;
use burn::prelude::*;

/// Configuration to create a [Binary Cross-entropy loss](BinaryCrossEntropyLoss) using the [init function](BinaryCrossEntropyLossConfig::init).
#[derive(Config, Debug)]
pub struct BinaryCrossEntropyLossConfig {
    /// Lower bound applied to each log term, keeping `log(0)` finite.
    #[config(default = -100.0)]
    pub log_floor: f64,
}

impl BinaryCrossEntropyLossConfig {
    /// Initialize [Binary Cross-entropy loss](BinaryCrossEntropyLoss).
    pub fn init(&self) -> BinaryCrossEntropyLoss {
        BinaryCrossEntropyLoss {
            log_floor: self.log_floor,
        }
    }
}

/// Binary cross entropy between probabilities and (possibly soft) targets.
///
/// Should be created using [BinaryCrossEntropyLossConfig]
#[derive(Module, Clone, Debug)]
pub struct BinaryCrossEntropyLoss {
    pub log_floor: f64,
}

impl Default for BinaryCrossEntropyLoss {
    fn default() -> Self {
        BinaryCrossEntropyLossConfig::new().init()
    }
}

impl BinaryCrossEntropyLoss {
    /// Element-wise `-(t * log(p) + (1 - t) * log(1 - p))`.
    ///
    /// # Shapes
    ///
    /// - probs: `[..., any]`, values in `[0, 1]`
    /// - targets: same shape as `probs`
    /// - output: same shape as `probs`
    pub fn forward_no_reduction<const D: usize, B: Backend>(
        &self,
        probs: Tensor<B, D>,
        targets: Tensor<B, D>,
    ) -> Tensor<B, D> {
        // https://github.com/tracel-ai/burn/issues/2739: clamp to avoid undefined values
        let log_p = probs.clone().log().clamp_min(self.log_floor);
        let log_not_p = probs.neg().log1p().clamp_min(self.log_floor);
        (targets.clone() - 1.0) * log_not_p - targets * log_p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn matches_the_closed_form() {
        let device = Default::default();
        let probs = Tensor::<B, 1>::from_floats([0.8, 0.25], &device);
        let targets = Tensor::<B, 1>::from_floats([1.0, 0.0], &device);

        let loss = BinaryCrossEntropyLoss::default()
            .forward_no_reduction(probs, targets)
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert!((loss[0] - (-(0.8f32).ln())).abs() < 1e-5);
        assert!((loss[1] - (-(0.75f32).ln())).abs() < 1e-5);
    }

    #[test]
    fn saturated_probabilities_are_clamped() {
        let device = Default::default();
        let probs = Tensor::<B, 1>::from_floats([0.0, 1.0], &device);
        let targets = Tensor::<B, 1>::from_floats([1.0, 0.0], &device);

        let loss = BinaryCrossEntropyLoss::default()
            .forward_no_reduction(probs, targets)
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert_eq!(loss, vec![100.0, 100.0]);
    }
}
