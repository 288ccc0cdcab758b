//! Temporal convolutional network.
//!
//! See "An Empirical Evaluation of Generic Convolutional and Recurrent
//! Networks for Sequence Modeling", Bai et al. 2018.
use serde::{Deserialize, Serialize};
use tch::nn::{self, ModuleT, SequentialT};

use crate::config::EncoderConfig;
use crate::layers::{weight_norm_conv1d, Chomp1d};

/// Normalization of the causal convolutions of a temporal block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TcnNorm {
    /// Bias-free convolutions followed by batch normalization.
    #[default]
    Batch,
    /// Weight-normalized convolutions with bias.
    Weight,
}

fn causal_conv(
    p: nn::Path,
    c_in: i64,
    c_out: i64,
    ksize: i64,
    dilation: i64,
    norm: TcnNorm,
) -> SequentialT {
    let padding = (ksize - 1) * dilation;
    let conv_cfg = nn::ConvConfig {
        padding,
        dilation,
        bias: norm == TcnNorm::Weight,
        ..Default::default()
    };
    let seq = match norm {
        TcnNorm::Batch => nn::seq_t()
            .add(nn::conv1d(&p / "conv", c_in, c_out, ksize, conv_cfg))
            .add(Chomp1d::new(padding))
            .add(nn::batch_norm1d(&p / "bn", c_out, Default::default())),
        TcnNorm::Weight => nn::seq_t()
            .add(weight_norm_conv1d(&p / "conv", c_in, c_out, ksize, conv_cfg))
            .add(Chomp1d::new(padding)),
    };
    seq.add_fn(|xs| xs.relu())
}

/// A residual block of two causal dilated convolutions.
///
/// The shortcut is the identity when `c_in == c_out` and a 1x1 convolution
/// otherwise. The time length is preserved.
pub fn temporal_block(
    p: nn::Path,
    c_in: i64,
    c_out: i64,
    ksize: i64,
    dilation: i64,
    norm: TcnNorm,
) -> impl ModuleT {
    residual_block(p, c_in, c_out, ksize, dilation, norm, c_in != c_out)
}

fn residual_block(
    p: nn::Path,
    c_in: i64,
    c_out: i64,
    ksize: i64,
    dilation: i64,
    norm: TcnNorm,
    project: bool,
) -> impl ModuleT {
    let conv1 = causal_conv(&p / "conv1", c_in, c_out, ksize, dilation, norm);
    let conv2 = causal_conv(&p / "conv2", c_out, c_out, ksize, dilation, norm);
    let downsample = if project {
        Some(nn::conv1d(&p / "downsample", c_in, c_out, 1, Default::default()))
    } else {
        None
    };
    nn::func_t(move |xs, train| {
        let ys = xs.apply_t(&conv1, train).apply_t(&conv2, train);
        let residual = match &downsample {
            Some(downsample) => xs.apply(downsample),
            None => xs.shallow_clone(),
        };
        (ys + residual).relu()
    })
}

/// Creates the temporal convolutional encoder.
///
/// Two temporal blocks, with dilations 1 and 2, both `tcn_layers.last()`
/// channels wide. The first entry of `tcn_layers` only decides the shortcut
/// of the second block: a 1x1 projection when it differs from the last
/// entry, the identity otherwise. The embedding is the last timestep of the
/// second block, `(N, tcn_layers.last())`.
pub fn tcn(p: &nn::Path, c: &EncoderConfig) -> impl ModuleT {
    let width = c.tcn_out_dim();
    let project = c.tcn_layers.first().map_or(false, |&first| first != width);
    let block0 = residual_block(
        p / "block0",
        c.input_channels,
        width,
        c.tcn_kernel_size,
        1,
        c.tcn_norm,
        c.input_channels != width,
    );
    let block1 =
        residual_block(p / "block1", width, width, c.tcn_kernel_size, 2, c.tcn_norm, project);
    nn::func_t(move |xs, train| {
        let ys = xs.apply_t(&block0, train).apply_t(&block1, train);
        let len = ys.size()[2];
        ys.select(2, len - 1)
    })
}
