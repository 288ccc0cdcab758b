//! Task classification heads.
use tch::nn;

use crate::config::{ModelConfig, Role};
use crate::layers::{mlp, Mlp, OutputActivation};

/// A single linear layer from the `role` embedding to the class logits.
pub fn classifier(p: &nn::Path, cfg: &ModelConfig, role: Role) -> nn::Linear {
    nn::linear(p / "logits", cfg.embedding_dim(role), cfg.num_classes, Default::default())
}

/// The CoDATS head: two hidden layers of `hidden_dim` units before the class
/// logits.
pub fn codats_classifier(p: &nn::Path, cfg: &ModelConfig) -> Mlp {
    mlp(
        p / "logits",
        cfg.embedding_dim(Role::Student),
        &[cfg.hidden_dim, cfg.hidden_dim],
        cfg.num_classes,
        OutputActivation::Identity,
    )
}
