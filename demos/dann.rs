// Domain-adversarial training (DANN) on synthetic time-series.
//
// Source and target windows share the class structure, a per-class sine
// frequency, but the target domain is rescaled and shifted. The encoder is
// trained to classify source windows while fooling a domain discriminator
// placed behind a gradient reversal layer.
//
// Usage: cargo run --example dann [config.json]
use anyhow::{bail, Result};
use tch::{kind, nn, nn::ModuleT, nn::OptimizerConfig, Device, Kind, Tensor};
use tch_domain_adapt::{heads, layers, Backbone, BackboneKind, BackendOptions, ModelConfig, Role};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SEQ_LEN: i64 = 128;
const BATCH_SIZE: i64 = 32;
const LEARNING_RATE: f64 = 1e-3;
const STEPS: i64 = 500;

// Windows of `cfg.input_channels` noisy sines whose frequency depends on the label.
fn synthetic_batch(cfg: &ModelConfig, scale: f64, shift: f64, device: Device) -> (Tensor, Tensor) {
    let labels = Tensor::randint(cfg.num_classes, [BATCH_SIZE], kind::INT64_CPU);
    let freqs = (labels.to_kind(Kind::Float) + 1.0).view([BATCH_SIZE, 1, 1]);
    let phases = Tensor::rand([BATCH_SIZE, cfg.input_channels, 1], kind::FLOAT_CPU) * 6.28;
    let steps = Tensor::arange(SEQ_LEN, kind::FLOAT_CPU).view([1, 1, SEQ_LEN]) / SEQ_LEN as f64;
    let noise = Tensor::randn([BATCH_SIZE, cfg.input_channels, SEQ_LEN], kind::FLOAT_CPU) * 0.1;
    let xs = (freqs * steps * 6.28 + phases).sin() * scale + shift + noise;
    (xs.to_device(device), labels.to_device(device))
}

// Reversal coefficient ramping from 0 to 1 over training.
fn alpha_schedule(step: i64) -> f64 {
    let progress = step as f64 / STEPS as f64;
    2. / (1. + (-10. * progress).exp()) - 1.
}

pub fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    tch_domain_adapt::init_backend(BackendOptions::default());

    let args: Vec<_> = std::env::args().collect();
    let cfg = match args.as_slice() {
        [_] => ModelConfig::default(),
        [_, path] => ModelConfig::from_json(path)?,
        _ => bail!("usage: dann [config.json]"),
    };
    tch::manual_seed(42);
    let device = Device::cuda_if_available();
    let vs = nn::VarStore::new(device);
    let root = vs.root();
    let encoder = Backbone::new(&(&root / "feature_extractor"), BackboneKind::Cnn, &cfg);
    let classifier = heads::classifier(&(&root / "classifier"), &cfg, Role::Student);
    let discriminator = heads::discriminator(&(&root / "domain_classifier"), &cfg);
    let mut opt = nn::adam(0.5, 0.99, 3e-4).build(&vs, LEARNING_RATE)?;

    let domain_labels = Tensor::cat(
        &[
            Tensor::zeros([BATCH_SIZE], kind::INT64_CPU),
            Tensor::ones([BATCH_SIZE], kind::INT64_CPU),
        ],
        0,
    )
    .to_device(device);

    for step in 0..STEPS {
        let alpha = alpha_schedule(step);
        let (src_xs, src_ys) = synthetic_batch(&cfg, 1.0, 0.0, device);
        let (tgt_xs, _) = synthetic_batch(&cfg, 1.5, 0.3, device);

        let src_features = encoder.forward_t(&src_xs, true);
        let tgt_features = encoder.forward_t(&tgt_xs, true);
        let class_loss = src_features.apply(&classifier).cross_entropy_for_logits(&src_ys);

        let features = Tensor::cat(&[src_features, tgt_features], 0);
        let domain_loss = layers::reverse_grad(&features, alpha)
            .apply(&discriminator)
            .cross_entropy_for_logits(&domain_labels);
        opt.backward_step(&(&class_loss + &domain_loss));

        if step % 50 == 0 {
            let (xs, ys) = synthetic_batch(&cfg, 1.5, 0.3, device);
            let target_acc = tch::no_grad(|| {
                encoder.forward_t(&xs, false).apply(&classifier).accuracy_for_logits(&ys)
            });
            info!(
                step,
                alpha,
                class_loss = class_loss.double_value(&[]),
                domain_loss = domain_loss.double_value(&[]),
                target_acc = target_acc.double_value(&[]),
                "dann step"
            );
        }
    }
    Ok(())
}
