//! One dimension ResNet encoders.
//!
//! See "Deep Residual Learning for Image Recognition" He et al. 2015
//! https://arxiv.org/abs/1512.03385 and, for the Wang variant, "Time Series
//! Classification from Scratch with Deep Neural Networks: A Strong Baseline",
//! Wang et al. 2017.
use tch::nn::{self, Conv1D, ModuleT, SequentialT};

use crate::config::EncoderConfig;

/// Kernel sizes of the two convolutions of a basic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Two pointwise convolutions.
    Pointwise,
    /// Kernels 5 then 3.
    Wang,
}

impl BlockKind {
    pub fn kernel_sizes(self) -> [i64; 2] {
        match self {
            BlockKind::Pointwise => [1, 1],
            BlockKind::Wang => [5, 3],
        }
    }
}

/// Shape of a residual encoder: stage `i` stacks `blocks[i]` basic blocks of
/// width `widths[i]`, its first block using stride `strides[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResNetArch {
    pub blocks: Vec<i64>,
    pub block: BlockKind,
    pub widths: Vec<i64>,
    pub strides: Vec<i64>,
    /// Kernel size of an optional `conv -> bn -> relu` stem mapping the
    /// input to `widths[0]` channels.
    pub stem_kernel: Option<i64>,
}

impl ResNetArch {
    fn four_stages(c: &EncoderConfig, blocks: Vec<i64>) -> ResNetArch {
        ResNetArch {
            blocks,
            block: BlockKind::Pointwise,
            widths: vec![
                c.mid_channels,
                c.mid_channels * 2,
                c.final_out_channels,
                c.final_out_channels,
            ],
            strides: vec![c.stride, 1, 1, 1],
            stem_kernel: None,
        }
    }

    pub fn resnet18(c: &EncoderConfig) -> ResNetArch {
        Self::four_stages(c, vec![2, 2, 2, 2])
    }

    pub fn resnet34(c: &EncoderConfig) -> ResNetArch {
        Self::four_stages(c, vec![3, 4, 6, 3])
    }

    pub fn resnet1d_wang(c: &EncoderConfig) -> ResNetArch {
        ResNetArch {
            blocks: vec![1, 1, 1],
            block: BlockKind::Wang,
            widths: vec![c.mid_channels, c.mid_channels * 2, c.final_out_channels],
            strides: vec![c.stride, 1, 1],
            stem_kernel: Some(7),
        }
    }
}

fn conv1d(p: nn::Path, c_in: i64, c_out: i64, ksize: i64, stride: i64) -> Conv1D {
    let conv1d_cfg =
        nn::ConvConfig { stride, padding: (ksize - 1) / 2, bias: false, ..Default::default() };
    nn::conv1d(&p, c_in, c_out, ksize, conv1d_cfg)
}

fn downsample(p: nn::Path, c_in: i64, c_out: i64, stride: i64) -> impl ModuleT {
    if stride != 1 || c_in != c_out {
        nn::seq_t()
            .add(conv1d(&p / "0", c_in, c_out, 1, stride))
            .add(nn::batch_norm1d(&p / "1", c_out, Default::default()))
    } else {
        nn::seq_t()
    }
}

/// A basic residual block; the shortcut only holds parameters when the
/// stride or the width changes.
pub fn basic_block(
    p: nn::Path,
    c_in: i64,
    c_out: i64,
    stride: i64,
    kind: BlockKind,
) -> impl ModuleT {
    let [k1, k2] = kind.kernel_sizes();
    let conv1 = conv1d(&p / "conv1", c_in, c_out, k1, stride);
    let bn1 = nn::batch_norm1d(&p / "bn1", c_out, Default::default());
    let conv2 = conv1d(&p / "conv2", c_out, c_out, k2, 1);
    let bn2 = nn::batch_norm1d(&p / "bn2", c_out, Default::default());
    let downsample = downsample(&p / "downsample", c_in, c_out, stride);
    nn::func_t(move |xs, train| {
        let ys = xs
            .apply(&conv1)
            .apply_t(&bn1, train)
            .relu()
            .apply(&conv2)
            .apply_t(&bn2, train);
        (xs.apply_t(&downsample, train) + ys).relu()
    })
}

fn make_layer(
    p: nn::Path,
    c_in: i64,
    c_out: i64,
    stride: i64,
    cnt: i64,
    kind: BlockKind,
) -> SequentialT {
    let mut layer = nn::seq_t().add(basic_block(&p / "0", c_in, c_out, stride, kind));
    for block_index in 1..cnt {
        layer = layer.add(basic_block(&p / &block_index.to_string(), c_out, c_out, 1, kind))
    }
    layer
}

/// Creates a residual encoder mapping `(N, input_channels, L)` to
/// `(N, features_len * widths.last())`.
pub fn resnet(p: &nn::Path, c: &EncoderConfig, arch: &ResNetArch) -> impl ModuleT {
    let mut c_in = c.input_channels;
    let stem = arch.stem_kernel.map(|ksize| {
        let c_out = arch.widths.first().copied().unwrap_or(c.mid_channels);
        let stem_p = p / "stem";
        let stem = nn::seq_t()
            .add(conv1d(&stem_p / "0", c_in, c_out, ksize, 1))
            .add(nn::batch_norm1d(&stem_p / "1", c_out, Default::default()))
            .add_fn(|xs| xs.relu());
        c_in = c_out;
        stem
    });
    // Stages keep the numbering of the four-stage network, the stem standing
    // in for the first one.
    let first_layer = if stem.is_some() { 2 } else { 1 };
    let mut layers = nn::seq_t();
    let stages = arch.blocks.iter().zip(arch.widths.iter()).zip(arch.strides.iter());
    for (index, ((&cnt, &c_out), &stride)) in stages.enumerate() {
        let name = format!("layer{}", index + first_layer);
        layers = layers.add(make_layer(p / name, c_in, c_out, stride, cnt, arch.block));
        c_in = c_out;
    }
    let features_len = c.features_len;
    nn::func_t(move |xs, train| {
        let xs = match &stem {
            Some(stem) => xs.apply_t(stem, train),
            None => xs.shallow_clone(),
        };
        xs.apply_t(&layers, train).adaptive_avg_pool1d([features_len]).flat_view()
    })
}
