//! Three-stage convolutional encoder.
use tch::nn::{self, ModuleT, SequentialT};

use crate::config::EncoderConfig;

fn conv_stage(
    p: nn::Path,
    c_in: i64,
    c_out: i64,
    ksize: i64,
    stride: i64,
    padding: i64,
) -> SequentialT {
    let conv_cfg = nn::ConvConfig { stride, padding, bias: false, ..Default::default() };
    nn::seq_t()
        .add(nn::conv1d(&p / "0", c_in, c_out, ksize, conv_cfg))
        .add(nn::batch_norm1d(&p / "1", c_out, Default::default()))
        .add_fn(|xs| xs.relu().max_pool1d([2], [2], [1], [1], false))
}

/// The three convolution stages of [`cnn`], before adaptive pooling.
///
/// Channel widths go `input -> mid -> 2 * mid -> final`; the first stage
/// uses the configured kernel size and stride and is followed by dropout,
/// the two others use a kernel of 8. Every stage ends with a
/// `max_pool1d(2, 2, 1)`, so a stride-one input of length `L` leaves
/// roughly `L / 8` timesteps.
pub fn cnn_stages(p: &nn::Path, c: &EncoderConfig) -> SequentialT {
    let dropout = c.dropout;
    let block1 = conv_stage(
        p / "conv_block1",
        c.input_channels,
        c.mid_channels,
        c.kernel_size,
        c.stride,
        c.kernel_size / 2,
    )
    .add_fn_t(move |xs, train| xs.dropout(dropout, train));
    let block2 = conv_stage(p / "conv_block2", c.mid_channels, c.mid_channels * 2, 8, 1, 4);
    let block3 = conv_stage(p / "conv_block3", c.mid_channels * 2, c.final_out_channels, 8, 1, 4);
    nn::seq_t().add(block1).add(block2).add(block3)
}

/// Creates the convolutional encoder, mapping `(N, input_channels, L)` to
/// `(N, features_len * final_out_channels)`.
pub fn cnn(p: &nn::Path, c: &EncoderConfig) -> impl ModuleT {
    let stages = cnn_stages(p, c);
    let features_len = c.features_len;
    nn::func_t(move |xs, train| {
        xs.apply_t(&stages, train).adaptive_avg_pool1d([features_len]).flat_view()
    })
}
