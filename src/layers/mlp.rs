//! Stacks of linear layers with relu activations.
use std::borrow::Borrow;

use tch::nn::{self, Module};
use tch::Tensor;

/// Activation applied to the last layer of an [`Mlp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputActivation {
    /// Raw logits.
    #[default]
    Identity,
    Sigmoid,
}

/// `linear -> relu -> ... -> linear`, optionally followed by a sigmoid.
///
/// Layers are registered as `0`, `2`, `4`, ... under the given path, the
/// indexes a torch `Sequential` interleaving linears and relus would use.
#[derive(Debug)]
pub struct Mlp {
    layers: Vec<nn::Linear>,
    output: OutputActivation,
}

pub fn mlp<'a, T: Borrow<nn::Path<'a>>>(
    vs: T,
    in_dim: i64,
    hidden_dims: &[i64],
    out_dim: i64,
    output: OutputActivation,
) -> Mlp {
    let vs = vs.borrow();
    let mut layers = Vec::with_capacity(hidden_dims.len() + 1);
    let mut dim = in_dim;
    for (index, &next_dim) in hidden_dims.iter().chain(std::iter::once(&out_dim)).enumerate() {
        layers.push(nn::linear(vs / (2 * index).to_string(), dim, next_dim, Default::default()));
        dim = next_dim;
    }
    Mlp { layers, output }
}

impl Mlp {
    pub fn layers(&self) -> &[nn::Linear] {
        &self.layers
    }

    pub fn in_dim(&self) -> i64 {
        self.layers.first().map_or(0, |l| l.ws.size()[1])
    }

    pub fn out_dim(&self) -> i64 {
        self.layers.last().map_or(0, |l| l.ws.size()[0])
    }
}

impl Module for Mlp {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let last = self.layers.len().saturating_sub(1);
        let ys = self.layers.iter().enumerate().fold(xs.shallow_clone(), |ys, (index, layer)| {
            let ys = ys.apply(layer);
            if index < last {
                ys.relu()
            } else {
                ys
            }
        });
        match self.output {
            OutputActivation::Identity => ys,
            OutputActivation::Sigmoid => ys.sigmoid(),
        }
    }
}
