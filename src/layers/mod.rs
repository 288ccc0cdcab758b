//! Layers that `tch::nn` does not provide: causal chomping, weight
//! normalization, gradient reversal, CDAN conditioning and MLP heads.
mod chomp;
pub use chomp::Chomp1d;

mod weight_norm;
pub use weight_norm::{weight_norm_conv1d, WeightNormConv1D};

mod grad_reverse;
pub use grad_reverse::{apply_custom_grad, reverse_grad, GradientFn, GradientReversal};

mod random_layer;
pub use random_layer::{multilinear_map, RandomLayer, DEFAULT_OUTPUT_DIM};

mod mlp;
pub use mlp::{mlp, Mlp, OutputActivation};
