//! Neural-network building blocks for time-series domain adaptation, based
//! on Torch through `tch`.
//!
//! The crate provides interchangeable encoders mapping `(N, C, L)` batches to
//! fixed-width embeddings ([`backbones`]), the classifiers, discriminators and
//! adapter consuming those embeddings ([`heads`]), and the layers adversarial
//! training needs on top of `tch::nn` ([`layers`]): gradient reversal, CDAN
//! conditioning, causal chomping and weight normalization.
//!
//! Parameters live in a caller-owned `tch::nn::VarStore`; training loops,
//! optimizers and losses are left to the caller.
//!
//! ```no_run
//! use tch::{nn, nn::Module, nn::ModuleT, Device, Kind, Tensor};
//! use tch_domain_adapt::{backbone_by_name, heads, layers, ModelConfig, Role};
//!
//! let cfg = ModelConfig::default();
//! let vs = nn::VarStore::new(Device::Cpu);
//! let encoder = backbone_by_name(&(&vs.root() / "feature_extractor"), "CNN", &cfg)?;
//! let classifier = heads::classifier(&(&vs.root() / "classifier"), &cfg, Role::Student);
//! let discriminator = heads::discriminator(&(&vs.root() / "domain_classifier"), &cfg);
//!
//! let xs = Tensor::randn([8, cfg.input_channels, 128], (Kind::Float, Device::Cpu));
//! let features = encoder.forward_t(&xs, true);
//! let logits = classifier.forward(&features);
//! let domains = discriminator.forward(&layers::reverse_grad(&features, 0.5));
//! # Ok::<(), tch_domain_adapt::AdaptError>(())
//! ```
pub mod backbones;
pub use backbones::{backbone_by_name, Backbone, BackboneKind};

pub mod heads;
pub use heads::{head_by_name, Head, HeadKind};

pub mod layers;

pub mod config;
pub use config::{EncoderConfig, ModelConfig, Role};

mod backend;
pub use backend::{init_backend, BackendOptions};

mod error;
pub use error::{AdaptError, Result};
