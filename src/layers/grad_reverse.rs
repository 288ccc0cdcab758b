//! Functions with a hand-written backward pass, and the gradient reversal
//! layer used for adversarial domain adaptation.
//!
//! See "Unsupervised Domain Adaptation by Backpropagation", Ganin and
//! Lempitsky 2015.
use tch::nn::Module;
use tch::Tensor;

/// A differentiable function given by its forward value and its backward
/// map.
///
/// `value` computes the output of the forward pass. `backward` maps the
/// gradient of the output to the gradient of the input; it must be linear
/// and elementwise (a diagonal Jacobian), which covers scaling and sign
/// flips.
pub trait GradientFn {
    fn value(&self, xs: &Tensor) -> Tensor;

    fn backward(&self, grad: &Tensor) -> Tensor;
}

/// Applies `f` to `xs` so that autograd uses `f.backward` for the gradient.
///
/// The result is `value(xs)` detached plus `s - s.detach()` with
/// `s = backward(xs)`. The second term is zero in value and carries the
/// gradient `backward(grad)` back to `xs`. Where `s` is not finite
/// (infinite inputs, or `0 * inf`) the term is replaced by zero, so the
/// output is still exactly `value(xs)` and those entries get no gradient.
pub fn apply_custom_grad<F: GradientFn + ?Sized>(f: &F, xs: &Tensor) -> Tensor {
    let surrogate = f.backward(xs);
    let carrier = (&surrogate - surrogate.detach())
        .where_self(&surrogate.isfinite(), &surrogate.zeros_like());
    f.value(xs).detach() + carrier
}

/// Identity on the forward pass, multiplies the gradient by `-alpha` on the
/// backward pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientReversal {
    pub alpha: f64,
}

impl GradientReversal {
    pub fn new(alpha: f64) -> GradientReversal {
        GradientReversal { alpha }
    }
}

impl GradientFn for GradientReversal {
    fn value(&self, xs: &Tensor) -> Tensor {
        xs.shallow_clone()
    }

    fn backward(&self, grad: &Tensor) -> Tensor {
        grad * (-self.alpha)
    }
}

impl Module for GradientReversal {
    fn forward(&self, xs: &Tensor) -> Tensor {
        apply_custom_grad(self, xs)
    }
}

/// Shorthand for `xs.apply(&GradientReversal::new(alpha))`.
pub fn reverse_grad(xs: &Tensor, alpha: f64) -> Tensor {
    apply_custom_grad(&GradientReversal::new(alpha), xs)
}
