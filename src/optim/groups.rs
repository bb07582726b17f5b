//! Weight-decay parameter groups.
//!
//! Biases and layer-norm scales/shifts are excluded from weight decay. In this
//! model those are exactly the rank-1 parameters; every weight matrix,
//! convolution kernel and embedding table has rank 2 or more.

use burn::module::{AutodiffModule, ModuleVisitor, ParamId};
use burn::optim::{GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::LearningRate;

/// Whether a parameter of the given rank is subject to weight decay.
pub fn decays(rank: usize) -> bool {
    rank >= 2
}

/// Parameter ids split by weight-decay group.
#[derive(Debug, Default, Clone)]
pub struct ParamGroups {
    pub decay: Vec<ParamId>,
    pub no_decay: Vec<ParamId>,
}

/// Lists the parameters of `module` by weight-decay group.
pub fn param_groups<B: Backend, M: Module<B>>(module: &M) -> ParamGroups {
    let mut groups = ParamGroups::default();
    module.visit(&mut groups);
    groups
}

impl<B: Backend> ModuleVisitor<B> for ParamGroups {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if decays(D) {
            self.decay.push(id);
        } else {
            self.no_decay.push(id);
        }
    }
}

/// Moves the gradients of the no-decay parameters out of `grads`.
struct NoDecaySplitter<'a> {
    grads: &'a mut GradientsParams,
    no_decay: GradientsParams,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for NoDecaySplitter<'_> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if decays(D) {
            return;
        }
        if let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id) {
            self.no_decay.register::<B::InnerBackend, D>(id, grad);
        }
    }
}

/// Splits `grads` in place, returning the gradients of the no-decay group.
pub fn split_no_decay<B: AutodiffBackend, M: AutodiffModule<B>>(
    module: &M,
    grads: &mut GradientsParams,
) -> GradientsParams {
    let mut splitter = NoDecaySplitter {
        grads,
        no_decay: GradientsParams::new(),
    };
    module.visit(&mut splitter);
    splitter.no_decay
}

/// Two optimizers of the same kind, one with weight decay and one without,
/// each updating only its own parameter group.
#[derive(Clone)]
pub struct GroupedOptimizer<O> {
    pub decay: O,
    pub no_decay: O,
}

impl<O> GroupedOptimizer<O> {
    pub fn new(decay: O, no_decay: O) -> Self {
        Self { decay, no_decay }
    }
}

impl<M, B, O> Optimizer<M, B> for GroupedOptimizer<O>
where
    M: AutodiffModule<B>,
    B: AutodiffBackend,
    O: Optimizer<M, B>,
{
    type Record = (O::Record, O::Record);

    fn step(&mut self, lr: LearningRate, module: M, mut grads: GradientsParams) -> M {
        let no_decay = split_no_decay::<B, M>(&module, &mut grads);
        let module = self.decay.step(lr, module, grads);
        self.no_decay.step(lr, module, no_decay)
    }

    fn to_record(&self) -> Self::Record {
        (self.decay.to_record(), self.no_decay.to_record())
    }

    fn load_record(self, record: Self::Record) -> Self {
        let (decay, no_decay) = record;
        Self {
            decay: self.decay.load_record(decay),
            no_decay: self.no_decay.load_record(no_decay),
        }
    }
}
