use std::collections::HashMap;

use tch::nn::{self, ModuleT};
use tch::Device;
use tch_domain_adapt::backbones::{
    basic_block, cnn, cnn_stages, resnet, tcn, temporal_block, BlockKind, ResNetArch, TcnNorm,
};
use tch_domain_adapt::{
    backbone_by_name, AdaptError, Backbone, BackboneKind, EncoderConfig, ModelConfig, Role,
};

use test_utils::*;

const BATCH: i64 = 4;
const SEQ_LEN: i64 = 64;

fn check_backbone(kind: BackboneKind, cfg: &ModelConfig, expected_dim: i64) {
    let vs = nn::VarStore::new(Device::Cpu);
    let backbone = Backbone::new(&vs.root(), kind, cfg);
    assert_eq!(backbone.kind(), kind);
    assert_eq!(backbone.out_dim(), expected_dim);
    let xs = randn(&[BATCH, cfg.input_channels, SEQ_LEN]);
    for train in [true, false] {
        let ys = backbone.forward_t(&xs, train);
        assert_eq!(ys.size(), [BATCH, expected_dim], "{kind} train={train}");
    }
}

#[test]
fn pooled_backbones_output_shape() {
    tch::manual_seed(42);
    let cfg = small_config();
    let student = cfg.features_len * cfg.final_out_channels;
    check_backbone(BackboneKind::Cnn, &cfg, student);
    check_backbone(BackboneKind::ResNet18, &cfg, student);
    check_backbone(BackboneKind::ResNet34, &cfg, student);
    check_backbone(BackboneKind::ResNet1dWang, &cfg, student);
    let teacher = cfg.features_len * cfg.final_out_channels_t;
    check_backbone(BackboneKind::CnnTeacher, &cfg, teacher);
}

#[test]
fn pooled_backbones_with_stride() {
    tch::manual_seed(42);
    let cfg = ModelConfig { stride: 2, features_len: 3, ..small_config() };
    let dim = 3 * cfg.final_out_channels;
    check_backbone(BackboneKind::Cnn, &cfg, dim);
    check_backbone(BackboneKind::ResNet18, &cfg, dim);
    check_backbone(BackboneKind::ResNet1dWang, &cfg, dim);
}

#[test]
fn tcn_output_is_last_channel_count() {
    tch::manual_seed(42);
    let cfg = small_config();
    check_backbone(BackboneKind::Tcn, &cfg, 10);
    let cfg = ModelConfig { tcn_norm: TcnNorm::Weight, ..small_config() };
    check_backbone(BackboneKind::Tcn, &cfg, 10);
    let cfg = ModelConfig { tcn_layers: vec![7, 7], ..small_config() };
    check_backbone(BackboneKind::Tcn, &cfg, 7);
}

#[test]
fn tcn_blocks_use_last_width() {
    let cfg = small_config().encoder(Role::Student);
    let vs = nn::VarStore::new(Device::Cpu);
    let _net = tcn(&vs.root(), &cfg);
    let variables = vs.variables();
    let k = cfg.tcn_kernel_size;
    assert_eq!(variables["block0.conv1.conv.weight"].size(), [10, cfg.input_channels, k]);
    assert_eq!(variables["block0.conv2.conv.weight"].size(), [10, 10, k]);
    assert_eq!(variables["block0.downsample.weight"].size(), [10, cfg.input_channels, 1]);
    assert_eq!(variables["block1.conv1.conv.weight"].size(), [10, 10, k]);
    // tcn_layers = [6, 10]: the second block projects its input.
    assert_eq!(variables["block1.downsample.weight"].size(), [10, 10, 1]);
    assert!(!variables.keys().any(|name| name.starts_with("block2.")));

    let cfg = ModelConfig { tcn_layers: vec![10, 10], ..small_config() }.encoder(Role::Student);
    let vs = nn::VarStore::new(Device::Cpu);
    let _net = tcn(&vs.root(), &cfg);
    let variables = vs.variables();
    assert!(variables.contains_key("block0.downsample.weight"));
    assert!(!variables.contains_key("block1.downsample.weight"));
}

#[test]
fn tcn_weight_norm_layout() {
    let cfg = ModelConfig { tcn_norm: TcnNorm::Weight, ..small_config() }.encoder(Role::Student);
    let vs = nn::VarStore::new(Device::Cpu);
    let _net = tcn(&vs.root(), &cfg);
    let variables = vs.variables();
    assert_eq!(variables["block0.conv1.conv.weight_v"].size(), [10, cfg.input_channels, 3]);
    assert_eq!(variables["block0.conv1.conv.weight_g"].size(), [10, 1, 1]);
    assert!(variables.contains_key("block1.conv2.conv.bias"));
    assert!(!variables.keys().any(|name| name.contains(".bn.")));
}

#[test]
fn cnn_stage_layout() {
    let cfg = small_config();
    let vs = nn::VarStore::new(Device::Cpu);
    let _net = cnn(&vs.root(), &cfg.encoder(Role::Student));
    let variables = vs.variables();
    assert_eq!(variables["conv_block1.0.weight"].size(), [8, 3, cfg.kernel_size]);
    assert_eq!(variables["conv_block2.0.weight"].size(), [16, 8, 8]);
    assert_eq!(variables["conv_block3.0.weight"].size(), [16, 16, 8]);
    assert_eq!(variables["conv_block3.1.running_mean"].size(), [16]);
    assert!(!variables.contains_key("conv_block1.0.bias"));

    let vs = nn::VarStore::new(Device::Cpu);
    let _net = cnn(&vs.root(), &cfg.encoder(Role::Teacher));
    let variables = vs.variables();
    assert_eq!(variables["conv_block2.0.weight"].size(), [8, 4, 8]);
    assert_eq!(variables["conv_block3.0.weight"].size(), [12, 8, 8]);
}

#[test]
fn cnn_stages_time_length() {
    tch::manual_seed(42);
    let cfg = small_config().encoder(Role::Student);
    let vs = nn::VarStore::new(Device::Cpu);
    let stages = cnn_stages(&vs.root(), &cfg);
    // 64 -> conv 64 -> pool 33 -> conv 34 -> pool 18 -> conv 19 -> pool 10
    let ys = randn(&[2, cfg.input_channels, 64]).apply_t(&stages, false);
    assert_eq!(ys.size(), [2, cfg.final_out_channels, 10]);

    let cfg = ModelConfig { stride: 2, ..small_config() }.encoder(Role::Student);
    let vs = nn::VarStore::new(Device::Cpu);
    let stages = cnn_stages(&vs.root(), &cfg);
    // 64 -> conv 32 -> pool 17 -> conv 18 -> pool 10 -> conv 11 -> pool 6
    let ys = randn(&[2, cfg.input_channels, 64]).apply_t(&stages, false);
    assert_eq!(ys.size(), [2, cfg.final_out_channels, 6]);
}

#[test]
fn cnn_dropout_only_in_training() {
    tch::manual_seed(42);
    let cfg = ModelConfig { dropout: 1.0, ..small_config() }.encoder(Role::Student);
    let vs = nn::VarStore::new(Device::Cpu);
    let stages = cnn_stages(&vs.root(), &cfg);
    let xs = randn(&[2, cfg.input_channels, 64]);
    // Everything is dropped after the first stage: the later stages only see
    // zeros, and their bias-free convolutions and zero-initialized batch-norm
    // shifts keep them at zero.
    let train = xs.apply_t(&stages, true);
    assert_eq!(f64_from(&train.abs().max()), 0.0);
    let eval = xs.apply_t(&stages, false);
    assert!(f64_from(&eval.abs().max()) > 0.0);
}

fn resnet_variables(arch: fn(&EncoderConfig) -> ResNetArch) -> HashMap<String, tch::Tensor> {
    let cfg = small_config().encoder(Role::Student);
    let vs = nn::VarStore::new(Device::Cpu);
    let _net = resnet(&vs.root(), &cfg, &arch(&cfg));
    vs.variables()
}

#[test]
fn resnet_width_schedule() {
    // mid = 8, final = 16, pointwise kernels.
    for (arch, last_block) in [
        (ResNetArch::resnet18 as fn(&EncoderConfig) -> ResNetArch, 1),
        (ResNetArch::resnet34, 2),
    ] {
        let variables = resnet_variables(arch);
        assert_eq!(variables["layer1.0.conv1.weight"].size(), [8, 3, 1]);
        assert_eq!(variables["layer1.0.downsample.0.weight"].size(), [8, 3, 1]);
        assert_eq!(variables["layer2.0.conv1.weight"].size(), [16, 8, 1]);
        assert_eq!(variables["layer3.0.conv1.weight"].size(), [16, 16, 1]);
        assert!(!variables.contains_key("layer3.0.downsample.0.weight"));
        let name = format!("layer4.{last_block}.conv2.weight");
        assert_eq!(variables[&name].size(), [16, 16, 1]);
        assert!(!variables.keys().any(|name| name.starts_with("layer5.")));
    }
    let variables = resnet_variables(ResNetArch::resnet34);
    assert!(variables.contains_key("layer3.5.bn2.weight"));
    assert!(!variables.contains_key("layer3.6.bn2.weight"));
}

#[test]
fn tcn_is_causal() {
    tch::manual_seed(42);
    let vs = nn::VarStore::new(Device::Cpu);
    let block = temporal_block(&vs.root() / "block", 3, 3, 3, 2, TcnNorm::Batch);
    let xs = randn(&[2, 3, SEQ_LEN]);
    let perturbed = xs.copy();
    let _ = perturbed.narrow(2, SEQ_LEN - 1, 1).fill_(100.0);
    // Outputs before the perturbed timestep cannot see it.
    let ys = xs.apply_t(&block, false).narrow(2, 0, SEQ_LEN - 1);
    let zs = perturbed.apply_t(&block, false).narrow(2, 0, SEQ_LEN - 1);
    assert!(ys.allclose(&zs, 1e-5, 1e-5, false));
}

#[test]
fn temporal_block_keeps_length() {
    tch::manual_seed(42);
    for norm in [TcnNorm::Batch, TcnNorm::Weight] {
        for (ksize, dilation) in [(2, 1), (3, 2), (5, 4), (7, 1)] {
            let vs = nn::VarStore::new(Device::Cpu);
            let block = temporal_block(vs.root(), 3, 5, ksize, dilation, norm);
            let ys = randn(&[2, 3, 37]).apply_t(&block, true);
            assert_eq!(ys.size(), [2, 5, 37], "k={ksize} d={dilation} {norm:?}");
        }
    }
}

#[test]
fn residual_identity_shortcut_has_no_parameters() {
    // conv1 + bn1 + conv2 + bn2: each bias-free conv holds one variable, each
    // batch-norm four (weight, bias, running mean and variance).
    let vs = nn::VarStore::new(Device::Cpu);
    let _block = basic_block(vs.root(), 8, 8, 1, BlockKind::Pointwise);
    assert_eq!(vs.len(), 10);

    let vs = nn::VarStore::new(Device::Cpu);
    let _block = basic_block(vs.root(), 8, 16, 1, BlockKind::Pointwise);
    assert_eq!(vs.len(), 15);
    assert!(vs.variables().contains_key("downsample.0.weight"));

    let vs = nn::VarStore::new(Device::Cpu);
    let _block = basic_block(vs.root(), 8, 8, 2, BlockKind::Wang);
    assert_eq!(vs.len(), 15);
}

#[test]
fn resnet_block_counts() {
    let cfg = small_config().encoder(Role::Student);
    let count_blocks = |arch: &ResNetArch| {
        let vs = nn::VarStore::new(Device::Cpu);
        let _net = resnet(&vs.root(), &cfg, arch);
        let variables = vs.variables();
        variables.keys().filter(|name| name.ends_with(".conv1.weight")).count()
    };
    assert_eq!(count_blocks(&ResNetArch::resnet18(&cfg)), 8);
    assert_eq!(count_blocks(&ResNetArch::resnet34(&cfg)), 16);
    assert_eq!(count_blocks(&ResNetArch::resnet1d_wang(&cfg)), 3);
}

#[test]
fn resnet_wang_has_stem_and_wide_kernels() {
    let cfg = small_config().encoder(Role::Student);
    let vs = nn::VarStore::new(Device::Cpu);
    let _net = resnet(&vs.root(), &cfg, &ResNetArch::resnet1d_wang(&cfg));
    let variables = vs.variables();
    assert_eq!(variables["stem.0.weight"].size(), [cfg.mid_channels, cfg.input_channels, 7]);
    assert_eq!(variables["layer2.0.conv1.weight"].size(), [8, 8, 5]);
    assert_eq!(variables["layer2.0.conv2.weight"].size(), [8, 8, 3]);
    // Same width and stride one: identity shortcut.
    assert!(!variables.contains_key("layer2.0.downsample.0.weight"));
    assert!(variables.contains_key("layer3.0.downsample.0.weight"));
}

#[test]
fn backbones_by_name() -> anyhow::Result<()> {
    let cfg = small_config();
    for kind in BackboneKind::ALL {
        let vs = nn::VarStore::new(Device::Cpu);
        let backbone = backbone_by_name(&vs.root(), kind.name(), &cfg)?;
        assert_eq!(backbone.kind(), kind);
        assert_eq!(kind.name().parse::<BackboneKind>()?, kind);
    }
    Ok(())
}

#[test]
fn unknown_backbone() {
    let vs = nn::VarStore::new(Device::Cpu);
    let err = backbone_by_name(&vs.root(), "Foo123", &small_config()).unwrap_err();
    assert!(matches!(err, AdaptError::NotImplemented(_)));
    assert!(err.to_string().contains("Foo123"), "{err}");
}
