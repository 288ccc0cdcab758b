//! Time-series encoders.
//!
//! Every backbone maps a `(N, C_in, L)` batch to a `(N, F)` embedding with
//! `F` fixed by the configuration, so that heads and backbones can be freely
//! combined. Backbones can be created by name through [`backbone_by_name`].
use std::fmt;
use std::str::FromStr;

use tch::nn::{self, ModuleT};
use tch::Tensor;
use tracing::debug;

use crate::config::{ModelConfig, Role};
use crate::{AdaptError, Result};

mod cnn;
pub use cnn::{cnn, cnn_stages};

mod tcn;
pub use tcn::{tcn, temporal_block, TcnNorm};

mod resnet;
pub use resnet::{basic_block, resnet, BlockKind, ResNetArch};

/// The registered backbones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackboneKind {
    Cnn,
    /// The convolutional encoder built with the teacher widths.
    CnnTeacher,
    Tcn,
    ResNet18,
    ResNet34,
    ResNet1dWang,
}

impl BackboneKind {
    pub const ALL: [BackboneKind; 6] = [
        BackboneKind::Cnn,
        BackboneKind::CnnTeacher,
        BackboneKind::Tcn,
        BackboneKind::ResNet18,
        BackboneKind::ResNet34,
        BackboneKind::ResNet1dWang,
    ];

    /// The registry name of the backbone.
    pub fn name(self) -> &'static str {
        match self {
            BackboneKind::Cnn => "CNN",
            BackboneKind::CnnTeacher => "CNN_T",
            BackboneKind::Tcn => "TCN",
            BackboneKind::ResNet18 => "RESNET18",
            BackboneKind::ResNet34 => "RESNET34",
            BackboneKind::ResNet1dWang => "RESNET1D_WANG",
        }
    }

    pub fn role(self) -> Role {
        match self {
            BackboneKind::CnnTeacher => Role::Teacher,
            _ => Role::Student,
        }
    }
}

impl fmt::Display for BackboneKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackboneKind {
    type Err = AdaptError;

    fn from_str(name: &str) -> Result<Self> {
        BackboneKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| AdaptError::NotImplemented(format!("backbone not found: {name}")))
    }
}

/// A backbone together with the width of the embedding it produces.
#[derive(Debug)]
pub struct Backbone {
    kind: BackboneKind,
    out_dim: i64,
    net: Box<dyn ModuleT>,
}

impl Backbone {
    pub fn new(p: &nn::Path, kind: BackboneKind, cfg: &ModelConfig) -> Backbone {
        let role = kind.role();
        let c = cfg.encoder(role);
        let (net, out_dim): (Box<dyn ModuleT>, i64) = match kind {
            BackboneKind::Cnn | BackboneKind::CnnTeacher => (Box::new(cnn(p, &c)), c.embedding_dim()),
            BackboneKind::Tcn => (Box::new(tcn(p, &c)), c.tcn_out_dim()),
            BackboneKind::ResNet18 => {
                let arch = ResNetArch::resnet18(&c);
                (Box::new(resnet(p, &c, &arch)), c.embedding_dim())
            }
            BackboneKind::ResNet34 => {
                let arch = ResNetArch::resnet34(&c);
                (Box::new(resnet(p, &c, &arch)), c.embedding_dim())
            }
            BackboneKind::ResNet1dWang => {
                let arch = ResNetArch::resnet1d_wang(&c);
                (Box::new(resnet(p, &c, &arch)), c.embedding_dim())
            }
        };
        debug!(backbone = %kind, ?role, out_dim, "built backbone");
        Backbone { kind, out_dim, net }
    }

    pub fn kind(&self) -> BackboneKind {
        self.kind
    }

    /// Width `F` of the `(N, F)` embedding.
    pub fn out_dim(&self) -> i64 {
        self.out_dim
    }
}

impl ModuleT for Backbone {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        self.net.forward_t(xs, train)
    }
}

/// Resolves `name` (`CNN`, `CNN_T`, `TCN`, `RESNET18`, `RESNET34` or
/// `RESNET1D_WANG`) and builds the matching backbone.
pub fn backbone_by_name(p: &nn::Path, name: &str, cfg: &ModelConfig) -> Result<Backbone> {
    let kind = name.parse::<BackboneKind>()?;
    Ok(Backbone::new(p, kind, cfg))
}
