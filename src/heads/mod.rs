//! Networks consuming backbone embeddings: task classifiers, domain
//! discriminators and the student-to-teacher adapter.
use std::fmt;
use std::str::FromStr;

use tch::nn::{self, Module};
use tch::Tensor;
use tracing::debug;

use crate::config::{ModelConfig, Role};
use crate::{AdaptError, Result};

mod classifier;
pub use classifier::{classifier, codats_classifier};

mod discriminator;
pub use discriminator::{
    cdan_discriminator, discriminator, feature_discriminator, teacher_discriminator, NUM_DOMAINS,
};

mod adapter;
pub use adapter::adapter;

/// The registered heads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadKind {
    Classifier,
    /// The linear classifier sized for the teacher embedding.
    ClassifierTeacher,
    CodatsClassifier,
    Discriminator,
    TeacherDiscriminator,
    FeatureDiscriminator,
    CdanDiscriminator,
    Adapter,
}

impl HeadKind {
    pub const ALL: [HeadKind; 8] = [
        HeadKind::Classifier,
        HeadKind::ClassifierTeacher,
        HeadKind::CodatsClassifier,
        HeadKind::Discriminator,
        HeadKind::TeacherDiscriminator,
        HeadKind::FeatureDiscriminator,
        HeadKind::CdanDiscriminator,
        HeadKind::Adapter,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HeadKind::Classifier => "classifier",
            HeadKind::ClassifierTeacher => "classifier_T",
            HeadKind::CodatsClassifier => "codats_classifier",
            HeadKind::Discriminator => "Discriminator",
            HeadKind::TeacherDiscriminator => "Discriminator_t",
            HeadKind::FeatureDiscriminator => "Discriminator_fea",
            HeadKind::CdanDiscriminator => "Discriminator_CDAN",
            HeadKind::Adapter => "Adapter",
        }
    }
}

impl fmt::Display for HeadKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HeadKind {
    type Err = AdaptError;

    fn from_str(name: &str) -> Result<Self> {
        HeadKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| AdaptError::NotImplemented(format!("head not found: {name}")))
    }
}

/// A head together with its input and output widths.
#[derive(Debug)]
pub struct Head {
    kind: HeadKind,
    in_dim: i64,
    out_dim: i64,
    net: Box<dyn Module>,
}

impl Head {
    pub fn new(p: &nn::Path, kind: HeadKind, cfg: &ModelConfig) -> Head {
        let (net, in_dim, out_dim): (Box<dyn Module>, i64, i64) = match kind {
            HeadKind::Classifier | HeadKind::ClassifierTeacher => {
                let role =
                    if kind == HeadKind::Classifier { Role::Student } else { Role::Teacher };
                let linear = classifier(p, cfg, role);
                let (out_dim, in_dim) = linear_dims(&linear);
                (Box::new(linear), in_dim, out_dim)
            }
            HeadKind::Adapter => {
                let linear = adapter(p, cfg);
                let (out_dim, in_dim) = linear_dims(&linear);
                (Box::new(linear), in_dim, out_dim)
            }
            HeadKind::CodatsClassifier
            | HeadKind::Discriminator
            | HeadKind::TeacherDiscriminator
            | HeadKind::FeatureDiscriminator
            | HeadKind::CdanDiscriminator => {
                let mlp = match kind {
                    HeadKind::CodatsClassifier => codats_classifier(p, cfg),
                    HeadKind::Discriminator => discriminator(p, cfg),
                    HeadKind::TeacherDiscriminator => teacher_discriminator(p, cfg),
                    HeadKind::FeatureDiscriminator => feature_discriminator(p, cfg),
                    _ => cdan_discriminator(p, cfg),
                };
                let (in_dim, out_dim) = (mlp.in_dim(), mlp.out_dim());
                (Box::new(mlp), in_dim, out_dim)
            }
        };
        debug!(head = %kind, in_dim, out_dim, "built head");
        Head { kind, in_dim, out_dim, net }
    }

    pub fn kind(&self) -> HeadKind {
        self.kind
    }

    pub fn in_dim(&self) -> i64 {
        self.in_dim
    }

    pub fn out_dim(&self) -> i64 {
        self.out_dim
    }
}

fn linear_dims(linear: &nn::Linear) -> (i64, i64) {
    let size = linear.ws.size();
    (size[0], size[1])
}

impl Module for Head {
    fn forward(&self, xs: &Tensor) -> Tensor {
        self.net.forward(xs)
    }
}

/// Resolves `name` and builds the matching head.
pub fn head_by_name(p: &nn::Path, name: &str, cfg: &ModelConfig) -> Result<Head> {
    let kind = name.parse::<HeadKind>()?;
    Ok(Head::new(p, kind, cfg))
}
