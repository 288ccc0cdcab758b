//! Domain discriminators.
//!
//! All of them are three linear layers of hidden width `disc_hid_dim` with
//! relu activations in between; they differ by their input width and their
//! output.
use tch::nn;

use crate::config::{ModelConfig, Role};
use crate::layers::{mlp, Mlp, OutputActivation};

/// Number of domains told apart by the logit discriminators.
pub const NUM_DOMAINS: i64 = 2;

fn three_layers(
    p: &nn::Path,
    cfg: &ModelConfig,
    in_dim: i64,
    out_dim: i64,
    output: OutputActivation,
) -> Mlp {
    mlp(p / "layer", in_dim, &[cfg.disc_hid_dim, cfg.disc_hid_dim], out_dim, output)
}

/// Source vs. target logits from the student embedding.
pub fn discriminator(p: &nn::Path, cfg: &ModelConfig) -> Mlp {
    let in_dim = cfg.embedding_dim(Role::Student);
    three_layers(p, cfg, in_dim, NUM_DOMAINS, OutputActivation::Identity)
}

/// Source vs. target logits from an input of width
/// [`ModelConfig::teacher_disc_input_dim`].
pub fn teacher_discriminator(p: &nn::Path, cfg: &ModelConfig) -> Mlp {
    let in_dim = cfg.teacher_disc_input_dim();
    three_layers(p, cfg, in_dim, NUM_DOMAINS, OutputActivation::Identity)
}

/// Probability, through a sigmoid, that a teacher embedding comes from the
/// source domain.
pub fn feature_discriminator(p: &nn::Path, cfg: &ModelConfig) -> Mlp {
    let in_dim = cfg.embedding_dim(Role::Teacher);
    three_layers(p, cfg, in_dim, 1, OutputActivation::Sigmoid)
}

/// Source vs. target logits from the class-conditioned embedding produced by
/// [`crate::layers::multilinear_map`].
pub fn cdan_discriminator(p: &nn::Path, cfg: &ModelConfig) -> Mlp {
    let in_dim = cfg.embedding_dim(Role::Student) * cfg.num_classes;
    three_layers(p, cfg, in_dim, NUM_DOMAINS, OutputActivation::Identity)
}
