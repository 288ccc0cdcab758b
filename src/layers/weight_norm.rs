//! Weight-normalized one dimension convolution.
//!
//! See "Weight Normalization: A Simple Reparameterization to Accelerate
//! Training of Deep Neural Networks", Salimans and Kingma 2016.
use std::borrow::Borrow;

use tch::nn::{self, Module};
use tch::Tensor;

/// A conv1d layer whose kernel is `g * v / ||v||`, the norm being taken per
/// output channel.
#[derive(Debug)]
pub struct WeightNormConv1D {
    pub g: Tensor,
    pub v: Tensor,
    pub bs: Option<Tensor>,
    config: nn::ConvConfig,
}

pub fn weight_norm_conv1d<'a, T: Borrow<nn::Path<'a>>>(
    vs: T,
    in_dim: i64,
    out_dim: i64,
    ksize: i64,
    config: nn::ConvConfig,
) -> WeightNormConv1D {
    let vs = vs.borrow();
    let v = vs.var("weight_v", &[out_dim, in_dim / config.groups, ksize], config.ws_init);
    // The magnitude starts at the norm of the direction so that the initial
    // kernel equals `v`.
    let g = vs.var_copy("weight_g", &tch::no_grad(|| channel_norm(&v)));
    let bs = if config.bias { Some(vs.var("bias", &[out_dim], config.bs_init)) } else { None };
    WeightNormConv1D { g, v, bs, config }
}

fn channel_norm(v: &Tensor) -> Tensor {
    v.norm_scalaropt_dim(2.0, [1, 2], true)
}

impl WeightNormConv1D {
    /// The effective convolution kernel.
    pub fn weight(&self) -> Tensor {
        &self.g * &self.v / channel_norm(&self.v)
    }
}

impl Module for WeightNormConv1D {
    fn forward(&self, xs: &Tensor) -> Tensor {
        xs.conv1d(
            &self.weight(),
            self.bs.as_ref(),
            [self.config.stride],
            [self.config.padding],
            [self.config.dilation],
            self.config.groups,
        )
    }
}
