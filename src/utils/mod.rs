use burn::prelude::*;
use burn::tensor::{DType, Element, ElementConversion};

pub mod init;
pub mod loss;

/// Logit written into masked-out positions for full precision floats.
pub const MASK_VALUE: f32 = -1e30;

/// Returns the logit value used for masked-out positions.
///
/// `-1e30` does not fit in f16, so the lowest finite f16 is used there.
pub fn mask_value<B: Backend>() -> B::FloatElem {
    match <B::FloatElem as Element>::dtype() {
        DType::F64 | DType::F32 | DType::Flex32 | DType::BF16 => MASK_VALUE.elem(),
        DType::F16 => burn::tensor::f16::MIN.elem(),
        _ => unreachable!("float element expected"),
    }
}

/// Replaces every logit whose mask is `false` by [mask_value].
///
/// # Shapes
///   - logits: `[..., any]`
///   - mask: same shape as `logits`
///   - output: same shape as `logits`
pub fn mask_logits<B: Backend, const D: usize>(
    logits: Tensor<B, D>,
    mask: Tensor<B, D, Bool>,
) -> Tensor<B, D> {
    debug_assert_eq!(logits.dims(), mask.dims());
    logits.mask_fill(mask.bool_not(), mask_value::<B>())
}
