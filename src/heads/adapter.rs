use tch::nn;

use crate::config::{ModelConfig, Role};

/// Maps the student embedding to the width of the teacher embedding, for
/// feature distillation losses.
pub fn adapter(p: &nn::Path, cfg: &ModelConfig) -> nn::Linear {
    nn::linear(
        p / "layer",
        cfg.embedding_dim(Role::Student),
        cfg.embedding_dim(Role::Teacher),
        Default::default(),
    )
}
